//! Operator definitions for expressions.

/// Binary operators supported in expressions
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
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

    // NULL-aware comparison
    Is,
    IsNot,

    // Membership
    In,
    NotIn,

    // String operators
    Contains,
    Concat,

    /// User-defined operator, rendered verbatim. Never compiled.
    Custom(String),
}

impl BinaryOperator {
    /// Get the display string for this operator
    pub fn as_str(&self) -> &str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::Is => "IS",
            BinaryOperator::IsNot => "IS NOT",
            BinaryOperator::In => "IN",
            BinaryOperator::NotIn => "NOT IN",
            BinaryOperator::Contains => "LIKE",
            BinaryOperator::Concat => "||",
            BinaryOperator::Custom(op) => op,
        }
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    /// `~`: boolean negation on booleans, bitwise inversion on integers
    Not,
    Neg,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::Neg => "-",
        }
    }
}

/// Truth test applied directly to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanTest {
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
}

impl BooleanTest {
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanTest::IsNull => "IS NULL",
            BooleanTest::IsNotNull => "IS NOT NULL",
            BooleanTest::IsTrue => "IS true",
            BooleanTest::IsFalse => "IS false",
        }
    }
}

/// Combining operator of an N-ary clause list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}
