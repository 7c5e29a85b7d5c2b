pub mod access;
pub mod catalog;
pub mod error;
pub mod expression;
pub mod flag;
pub mod model;
pub mod resolver;
pub mod store;

pub use error::{FlagError, Result};
pub use flag::{ColumnFlag, FlagBuilder, FlagDefault, column_flag};
