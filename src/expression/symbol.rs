//! Instruction set of compiled expressions.

use crate::access::Value;
use crate::catalog::Column;
use crate::expression::error::{ExpressionError, ExpressionResult};
use std::fmt;

/// How many stack operands a function consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Unary,
    Binary,
    /// Any positive count, fixed per symbol
    Variadic,
}

impl Arity {
    pub fn accepts(&self, arity: usize) -> bool {
        match self {
            Arity::Unary => arity == 1,
            Arity::Binary => arity == 2,
            Arity::Variadic => arity > 0,
        }
    }
}

/// Function invoked by an operator symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    // Null tests
    IsNull,
    IsNotNull,

    /// Truthiness negation
    LogicalNot,
    /// `~`: boolean or bitwise inversion
    Invert,
    Negate,

    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Two-clause conjunctions
    And,
    Or,

    // Membership
    In,
    NotIn,

    // Strings
    Contains,
    Concat,

    // N-ary reducers
    All,
    Any,

    /// Collect operands into a list
    Group,
}

impl Function {
    pub fn name(&self) -> &'static str {
        match self {
            Function::IsNull => "is_null",
            Function::IsNotNull => "is_not_null",
            Function::LogicalNot => "not",
            Function::Invert => "invert",
            Function::Negate => "neg",
            Function::Add => "add",
            Function::Sub => "sub",
            Function::Mul => "mul",
            Function::Div => "div",
            Function::Eq => "eq",
            Function::Ne => "ne",
            Function::Lt => "lt",
            Function::Le => "le",
            Function::Gt => "gt",
            Function::Ge => "ge",
            Function::And => "and",
            Function::Or => "or",
            Function::In => "in",
            Function::NotIn => "not_in",
            Function::Contains => "contains",
            Function::Concat => "concat",
            Function::All => "all",
            Function::Any => "any",
            Function::Group => "group",
        }
    }

    pub fn arity(&self) -> Arity {
        match self {
            Function::IsNull
            | Function::IsNotNull
            | Function::LogicalNot
            | Function::Invert
            | Function::Negate => Arity::Unary,
            Function::All | Function::Any | Function::Group => Arity::Variadic,
            _ => Arity::Binary,
        }
    }
}

/// Function together with the number of operands it pops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperatorSymbol {
    function: Function,
    arity: usize,
}

impl OperatorSymbol {
    pub fn new(function: Function, arity: usize) -> ExpressionResult<Self> {
        if !function.arity().accepts(arity) {
            return Err(ExpressionError::InvalidArity {
                operator: function.name().to_string(),
                arity,
            });
        }
        Ok(Self { function, arity })
    }

    pub fn unary(function: Function) -> ExpressionResult<Self> {
        Self::new(function, 1)
    }

    pub fn binary(function: Function) -> ExpressionResult<Self> {
        Self::new(function, 2)
    }

    pub fn function(&self) -> Function {
        self.function
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

/// One instruction of a compiled expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Symbol {
    /// Push the current value of a column
    Column(Column),
    /// Push a constant
    Literal(Value),
    /// Pop `arity` operands and push the result
    Operator(OperatorSymbol),
}

impl Symbol {
    pub fn as_column(&self) -> Option<&Column> {
        match self {
            Symbol::Column(column) => Some(column),
            _ => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Column(column) => write!(f, "{}", column),
            Symbol::Literal(value) => write!(f, "{}", value),
            Symbol::Operator(op) => write!(f, "{}/{}", op.function.name(), op.arity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_is_validated() {
        assert!(OperatorSymbol::new(Function::Add, 2).is_ok());
        assert!(OperatorSymbol::new(Function::Invert, 1).is_ok());
        assert!(OperatorSymbol::new(Function::All, 5).is_ok());

        assert_eq!(
            OperatorSymbol::new(Function::Add, 3),
            Err(ExpressionError::InvalidArity {
                operator: "add".to_string(),
                arity: 3,
            })
        );
        assert!(OperatorSymbol::new(Function::Invert, 2).is_err());
        assert!(OperatorSymbol::new(Function::Any, 0).is_err());
        assert!(OperatorSymbol::new(Function::Group, 0).is_err());
    }

    #[test]
    fn test_symbol_equality() {
        let add = Symbol::Operator(OperatorSymbol::binary(Function::Add).unwrap());
        assert_eq!(
            add,
            Symbol::Operator(OperatorSymbol::binary(Function::Add).unwrap())
        );
        assert_ne!(
            add,
            Symbol::Operator(OperatorSymbol::binary(Function::Sub).unwrap())
        );
        assert_ne!(
            Symbol::Operator(OperatorSymbol::new(Function::All, 3).unwrap()),
            Symbol::Operator(OperatorSymbol::new(Function::All, 4).unwrap())
        );
        assert_ne!(Symbol::Literal(Value::Int32(1)), Symbol::Literal(Value::Int32(2)));
        assert_ne!(Symbol::Literal(Value::Null), add);
    }

    #[test]
    fn test_symbol_display() {
        assert_eq!(Symbol::Literal(Value::from("a")).to_string(), "'a'");
        assert_eq!(
            Symbol::Operator(OperatorSymbol::new(Function::Any, 3).unwrap()).to_string(),
            "any/3"
        );
    }
}
