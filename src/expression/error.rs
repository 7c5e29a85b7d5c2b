//! Error types for expression compilation and evaluation.

use crate::access::DataType;
use std::fmt;

/// Errors that can occur while compiling or evaluating an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionError {
    /// Expression node the compiler has no translation for
    UnsupportedExpression { expression: String, kind: String },

    /// Custom or vendor-specific operator
    UnsupportedOperator { operator: String },

    /// Operator symbol built with an arity its function cannot take
    InvalidArity { operator: String, arity: usize },

    /// Invalid operand types for operator
    InvalidOperandTypes {
        operator: String,
        left_type: Option<DataType>,
        right_type: Option<DataType>,
    },

    /// Division by zero
    DivisionByZero,

    /// Integer arithmetic left the Int32 range
    ArithmeticOverflow { operator: String },

    /// Column value requested from a row that does not hold it
    ColumnNotFound { column: String },

    /// Compiled symbol sequence does not reduce to a single value
    MalformedExpression { message: String },
}

impl fmt::Display for ExpressionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpressionError::UnsupportedExpression { expression, kind } => {
                write!(f, "Unsupported expression {} of type {}", expression, kind)
            }

            ExpressionError::UnsupportedOperator { operator } => {
                write!(f, "Unsupported operator {}", operator)
            }

            ExpressionError::InvalidArity { operator, arity } => {
                write!(f, "Invalid arity {} for operator {}", arity, operator)
            }

            ExpressionError::InvalidOperandTypes {
                operator,
                left_type,
                right_type,
            } => {
                write!(
                    f,
                    "Invalid operand types for operator {}: left={:?}, right={:?}",
                    operator, left_type, right_type
                )
            }

            ExpressionError::DivisionByZero => write!(f, "Division by zero"),

            ExpressionError::ArithmeticOverflow { operator } => {
                write!(f, "Arithmetic overflow in operator {}", operator)
            }

            ExpressionError::ColumnNotFound { column } => {
                write!(f, "Column {} is not available for evaluation", column)
            }

            ExpressionError::MalformedExpression { message } => {
                write!(f, "Malformed compiled expression: {}", message)
            }
        }
    }
}

impl std::error::Error for ExpressionError {}

/// Result type for expression operations
pub type ExpressionResult<T> = Result<T, ExpressionError>;
