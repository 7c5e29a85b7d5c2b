//! Presence coercion of non-boolean columns.

use crate::expression::expr::Expression;
use crate::expression::operator::UnaryOperator;

/// Rewrite bare non-boolean columns into null checks.
///
/// `col` becomes `col IS NOT NULL` and `NOT col` becomes `col IS NULL`.
/// Clause lists are rewritten clause by clause; every other node, including
/// negations of anything but a bare column, is returned unchanged.
pub fn rephrase_as_boolean(expr: Expression) -> Expression {
    match expr {
        Expression::Column(column) if !column.is_boolean() => {
            Expression::is_not_null(Expression::Column(column))
        }

        Expression::UnaryOp {
            op: UnaryOperator::Not,
            operand,
        } => match *operand {
            Expression::Column(column) if !column.is_boolean() => {
                Expression::is_null(Expression::Column(column))
            }
            operand => Expression::unary_op(UnaryOperator::Not, operand),
        },

        Expression::ClauseList { op, clauses } => Expression::ClauseList {
            op,
            clauses: clauses.into_iter().map(rephrase_as_boolean).collect(),
        },

        expr => expr,
    }
}
