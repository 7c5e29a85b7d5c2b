use crate::access::{DataType, Value};
use crate::catalog::ClassId;
use crate::expression::ExpressionError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlagError {
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    #[error("Column {column} is mapped ambiguously on {class} as {names:?}")]
    AmbiguousAttribute {
        class: ClassId,
        column: String,
        names: Vec<String>,
    },

    #[error("Column {column} is not mapped on {class}")]
    UnmappedColumn { class: ClassId, column: String },

    #[error("{class} is not registered with this resolver")]
    UnregisteredClass { class: ClassId },

    #[error("Resolver contains multiple columns")]
    MultipleColumns,

    #[error("Cannot use default for multi-column expression")]
    DefaultOnMultiColumn,

    #[error("Flag only accepts boolean values, got {value}")]
    NonBooleanAssignment { value: Value },

    #[error("Flag is read-only")]
    ReadOnly,

    #[error("Unknown attribute '{attribute}' on {class}")]
    UnknownAttribute { class: ClassId, attribute: String },

    #[error("Flag '{attribute}' shadows a mapped attribute of {class}")]
    AttributeConflict { class: ClassId, attribute: String },

    #[error("Value {value} does not fit attribute '{attribute}' of type {data_type:?}")]
    IncompatibleValue {
        attribute: String,
        data_type: DataType,
        value: Value,
    },
}

pub type Result<T> = std::result::Result<T, FlagError>;
