//! Expression AST definitions.

use crate::access::Value;
use crate::catalog::Column;
use crate::expression::operator::{BinaryOperator, BooleanTest, Conjunction, UnaryOperator};
use std::fmt;
use std::ops;

/// Literal value in an expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub value: Value,
}

impl Literal {
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
        }
    }

    pub fn bool(val: bool) -> Self {
        Self::new(val)
    }

    pub fn int32(val: i32) -> Self {
        Self::new(val)
    }

    pub fn string(val: impl Into<String>) -> Self {
        Self::new(val.into())
    }
}

/// Expression tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    /// Bare column reference
    Column(Column),

    /// Bound literal value
    Literal(Literal),

    /// SQL NULL
    Null,

    /// Parenthesised list, the right-hand side of IN
    Grouping(Vec<Expression>),

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    /// Truth test wrapped directly around a column
    BooleanTest { column: Column, test: BooleanTest },

    /// Flattened N-ary AND/OR
    ClauseList {
        op: Conjunction,
        clauses: Vec<Expression>,
    },

    /// SQL function call; rendered but never compiled
    FunctionCall { name: String, args: Vec<Expression> },
}

impl Expression {
    /// Create a literal expression
    pub fn literal(value: impl Into<Value>) -> Self {
        Expression::Literal(Literal::new(value))
    }

    pub fn null() -> Self {
        Expression::Null
    }

    /// Create a column reference expression
    pub fn column(column: &Column) -> Self {
        Expression::Column(column.clone())
    }

    pub fn grouping(items: Vec<Expression>) -> Self {
        Expression::Grouping(items)
    }

    /// Create a binary operation expression
    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Create a unary operation expression
    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    /// N-ary AND; nested AND lists are flattened into this one
    pub fn and_(clauses: Vec<Expression>) -> Self {
        Self::clause_list(Conjunction::And, clauses)
    }

    /// N-ary OR; nested OR lists are flattened into this one
    pub fn or_(clauses: Vec<Expression>) -> Self {
        Self::clause_list(Conjunction::Or, clauses)
    }

    fn clause_list(op: Conjunction, clauses: Vec<Expression>) -> Self {
        let mut flattened = Vec::with_capacity(clauses.len());
        for clause in clauses {
            match clause {
                Expression::ClauseList {
                    op: inner,
                    clauses: nested,
                } if inner == op => flattened.extend(nested),
                other => flattened.push(other),
            }
        }
        Expression::ClauseList {
            op,
            clauses: flattened,
        }
    }

    /// Create an AND expression
    pub fn and(left: Expression, right: Expression) -> Self {
        Self::and_(vec![left, right])
    }

    /// Create an OR expression
    pub fn or(left: Expression, right: Expression) -> Self {
        Self::or_(vec![left, right])
    }

    /// Negate an expression.
    ///
    /// A bare boolean column becomes `column IS false`; anything else is
    /// wrapped in a NOT.
    pub fn not_expr(operand: Expression) -> Self {
        match operand {
            Expression::Column(column) if column.is_boolean() => Expression::BooleanTest {
                column,
                test: BooleanTest::IsFalse,
            },
            operand => Self::unary_op(UnaryOperator::Not, operand),
        }
    }

    /// Create an equality expression
    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    /// Create a not-equal expression
    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    /// Create a less-than expression
    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    /// Create a less-than-or-equal expression
    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    /// Create a greater-than expression
    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    /// Create a greater-than-or-equal expression
    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    /// Create an addition expression
    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    /// Create a subtraction expression
    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    /// Create a multiplication expression
    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    /// Create a division expression
    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    /// Create an `IS NULL` expression
    pub fn is_null(operand: Expression) -> Self {
        Self::binary_op(BinaryOperator::Is, operand, Expression::Null)
    }

    /// Create an `IS NOT NULL` expression
    pub fn is_not_null(operand: Expression) -> Self {
        Self::binary_op(BinaryOperator::IsNot, operand, Expression::Null)
    }

    /// `expr IN (items...)`
    pub fn in_list(expr: Expression, items: Vec<Expression>) -> Self {
        Self::binary_op(BinaryOperator::In, expr, Expression::Grouping(items))
    }

    /// `expr NOT IN (items...)`
    pub fn not_in_list(expr: Expression, items: Vec<Expression>) -> Self {
        Self::binary_op(BinaryOperator::NotIn, expr, Expression::Grouping(items))
    }

    /// Substring match, rendered as `LIKE '%' || needle || '%'`
    pub fn contains(expr: Expression, needle: Expression) -> Self {
        Self::binary_op(BinaryOperator::Contains, expr, needle)
    }

    pub fn concat(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Concat, left, right)
    }

    /// Binary expression with a user-defined operator
    pub fn custom_op(op: &str, left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Custom(op.to_string()), left, right)
    }

    pub fn function(name: &str, args: Vec<Expression>) -> Self {
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        }
    }

    pub fn boolean_test(column: &Column, test: BooleanTest) -> Self {
        Expression::BooleanTest {
            column: column.clone(),
            test,
        }
    }

    /// Node kind name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::Column(_) => "column",
            Expression::Literal(_) => "literal",
            Expression::Null => "null",
            Expression::Grouping(_) => "grouping",
            Expression::UnaryOp { .. } => "unary expression",
            Expression::BinaryOp { .. } => "binary expression",
            Expression::BooleanTest { .. } => "boolean test",
            Expression::ClauseList { .. } => "clause list",
            Expression::FunctionCall { .. } => "function call",
        }
    }

    /// Check if this expression is a constant (contains no column references)
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) | Expression::Null => true,
            Expression::Column(_) | Expression::BooleanTest { .. } => false,
            Expression::Grouping(items) => items.iter().all(|item| item.is_constant()),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::ClauseList { clauses, .. } => clauses.iter().all(|c| c.is_constant()),
            Expression::FunctionCall { args, .. } => args.iter().all(|arg| arg.is_constant()),
        }
    }

    /// Whether this node needs parentheses when nested as an operand
    fn is_compound(&self) -> bool {
        matches!(
            self,
            Expression::UnaryOp { .. } | Expression::BinaryOp { .. } | Expression::ClauseList { .. }
        )
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compound() {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

impl fmt::Display for Expression {
    /// Renders the expression as SQL text.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Column(column) => write!(f, "{}", column),
            Expression::Literal(lit) => write!(f, "{}", lit.value),
            Expression::Null => write!(f, "NULL"),
            Expression::Grouping(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Expression::UnaryOp { op, operand } => {
                match op {
                    UnaryOperator::Not => write!(f, "NOT ")?,
                    UnaryOperator::Neg => write!(f, "-")?,
                }
                operand.fmt_operand(f)
            }
            Expression::BinaryOp { op, left, right } => {
                left.fmt_operand(f)?;
                match op {
                    BinaryOperator::Contains => {
                        write!(f, " LIKE '%' || ")?;
                        right.fmt_operand(f)?;
                        write!(f, " || '%'")
                    }
                    op => {
                        write!(f, " {} ", op.as_str())?;
                        right.fmt_operand(f)
                    }
                }
            }
            Expression::BooleanTest { column, test } => match test {
                BooleanTest::IsFalse => write!(f, "NOT {}", column),
                test => write!(f, "{} {}", column, test.as_str()),
            },
            Expression::ClauseList { op, clauses } => {
                if clauses.is_empty() {
                    return write!(f, "true");
                }
                for (i, clause) in clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {} ", op.as_str())?;
                    }
                    if matches!(clause, Expression::ClauseList { .. }) {
                        write!(f, "({})", clause)?;
                    } else {
                        write!(f, "{}", clause)?;
                    }
                }
                Ok(())
            }
            Expression::FunctionCall { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl ops::BitAnd for Expression {
    type Output = Expression;

    fn bitand(self, rhs: Expression) -> Expression {
        Expression::and(self, rhs)
    }
}

impl ops::BitOr for Expression {
    type Output = Expression;

    fn bitor(self, rhs: Expression) -> Expression {
        Expression::or(self, rhs)
    }
}

impl ops::Not for Expression {
    type Output = Expression;

    fn not(self) -> Expression {
        Expression::not_expr(self)
    }
}

impl ops::Neg for Expression {
    type Output = Expression;

    fn neg(self) -> Expression {
        Expression::unary_op(UnaryOperator::Neg, self)
    }
}

impl ops::Add for Expression {
    type Output = Expression;

    fn add(self, rhs: Expression) -> Expression {
        Expression::add_expr(self, rhs)
    }
}

impl ops::Sub for Expression {
    type Output = Expression;

    fn sub(self, rhs: Expression) -> Expression {
        Expression::sub_expr(self, rhs)
    }
}

impl ops::Mul for Expression {
    type Output = Expression;

    fn mul(self, rhs: Expression) -> Expression {
        Expression::mul_expr(self, rhs)
    }
}

impl ops::Div for Expression {
    type Output = Expression;

    fn div(self, rhs: Expression) -> Expression {
        Expression::div_expr(self, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::DataType;
    use crate::catalog::{ColumnInfo, Table};

    fn columns() -> (Column, Column, Column) {
        let table = Table::new(
            "t",
            vec![
                ColumnInfo::new("flag", DataType::Boolean),
                ColumnInfo::new("num", DataType::Int32),
                ColumnInfo::new("text", DataType::Varchar),
            ],
        )
        .unwrap();
        let cols = table.columns();
        (cols[0].clone(), cols[1].clone(), cols[2].clone())
    }

    #[test]
    fn test_literal() {
        assert_eq!(Literal::bool(true).value, Value::Boolean(true));
        assert_eq!(Literal::int32(42).value, Value::Int32(42));
        assert_eq!(Literal::string("hello").value, Value::from("hello"));
    }

    #[test]
    fn test_clause_flattening() {
        let (flag, num, text) = columns();
        let expr = flag.expr() & num.expr() & text.expr();
        match &expr {
            Expression::ClauseList { op, clauses } => {
                assert_eq!(*op, Conjunction::And);
                assert_eq!(clauses.len(), 3);
            }
            other => panic!("expected clause list, got {:?}", other),
        }

        // Different operators nest instead of flattening
        let expr = (flag.expr() & num.expr()) | text.expr();
        match &expr {
            Expression::ClauseList { op, clauses } => {
                assert_eq!(*op, Conjunction::Or);
                assert_eq!(clauses.len(), 2);
            }
            other => panic!("expected clause list, got {:?}", other),
        }

        // Empty lists vanish into the parent
        let expr = Expression::and_(vec![Expression::and_(vec![]), Expression::and_(vec![])]);
        assert_eq!(expr, Expression::and_(vec![]));
    }

    #[test]
    fn test_negation_shapes() {
        let (flag, num, _) = columns();
        assert_eq!(
            !flag.expr(),
            Expression::boolean_test(&flag, BooleanTest::IsFalse)
        );
        assert_eq!(
            !num.expr(),
            Expression::unary_op(UnaryOperator::Not, num.expr())
        );
    }

    #[test]
    fn test_is_constant() {
        let (_, num, _) = columns();
        assert!(Expression::literal(42).is_constant());
        assert!(Expression::null().is_constant());
        assert!(!num.expr().is_constant());
        assert!((Expression::literal(1) + Expression::literal(2)).is_constant());
        assert!(!(num.expr() + Expression::literal(2)).is_constant());
        assert!(Expression::grouping(vec![Expression::literal(1), Expression::null()]).is_constant());
        assert!(!Expression::grouping(vec![num.expr()]).is_constant());
    }

    #[test]
    fn test_sql_rendering() {
        let (flag, num, text) = columns();

        assert_eq!(text.expr().to_string(), "t.text");
        assert_eq!(
            Expression::is_not_null(text.expr()).to_string(),
            "t.text IS NOT NULL"
        );
        assert_eq!(Expression::is_null(text.expr()).to_string(), "t.text IS NULL");
        assert_eq!((!flag.expr()).to_string(), "NOT t.flag");
        assert_eq!(
            ((num.expr() * Expression::literal(2)) + num.expr()).to_string(),
            "(t.num * 2) + t.num"
        );
        assert_eq!(
            Expression::in_list(num.expr(), vec![Expression::literal(1), Expression::literal(2)])
                .to_string(),
            "t.num IN (1, 2)"
        );
        assert_eq!(
            Expression::contains(text.expr(), Expression::literal("spam")).to_string(),
            "t.text LIKE '%' || 'spam' || '%'"
        );
        assert_eq!(
            ((flag.expr() & Expression::gt(num.expr(), Expression::literal(5))) | text.expr())
                .to_string(),
            "(t.flag AND t.num > 5) OR t.text"
        );
        assert_eq!(Expression::and_(vec![]).to_string(), "true");
        assert_eq!(
            Expression::function("exp", vec![num.expr(), Expression::literal(2)]).to_string(),
            "exp(t.num, 2)"
        );
        assert_eq!((-num.expr()).to_string(), "-t.num");
    }
}
