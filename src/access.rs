//! Access layer for column values.
//!
//! - **Value**: Type-safe representation of column values
//! - **DataType**: Declared column types with row serialization

pub mod value;

pub use value::{DataType, Value, deserialize_values, serialize_values};
