//! Flag expressions: building, rewriting, compiling and evaluating.
//!
//! This module provides:
//! - Expression AST representation with SQL rendering
//! - Presence coercion of non-boolean columns
//! - Compilation into reverse-Polish symbol sequences
//! - A stack evaluator replaying compiled expressions

pub mod compiler;
pub mod error;
pub mod eval;
pub mod expr;
pub mod operator;
pub mod rewrite;
pub mod symbol;

pub use compiler::CompiledExpression;
pub use error::{ExpressionError, ExpressionResult};
pub use eval::ExpressionEvaluator;
pub use expr::{Expression, Literal};
pub use operator::{BinaryOperator, BooleanTest, Conjunction, UnaryOperator};
pub use rewrite::rephrase_as_boolean;
pub use symbol::{Arity, Function, OperatorSymbol, Symbol};
