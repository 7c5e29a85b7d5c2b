//! Translation of expression trees into reverse-Polish symbol sequences.
//!
//! Operands are emitted before the operator consuming them. Binary nodes
//! emit their right operand first so that the evaluator's first pop yields
//! the left operand; variadic operators keep their operands in source order.

use crate::access::Value;
use crate::catalog::Column;
use crate::expression::error::{ExpressionError, ExpressionResult};
use crate::expression::eval::ExpressionEvaluator;
use crate::expression::expr::Expression;
use crate::expression::operator::{BinaryOperator, BooleanTest, Conjunction, UnaryOperator};
use crate::expression::symbol::{Function, OperatorSymbol, Symbol};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Immutable compiled form of an expression.
///
/// Keeps the source tree alongside the symbols so the same condition can be
/// rendered as SQL. Equality only looks at the symbols.
#[derive(Debug, Clone)]
pub struct CompiledExpression {
    symbols: Arc<[Symbol]>,
    sql: Expression,
}

impl CompiledExpression {
    pub fn new(expr: Expression) -> ExpressionResult<Self> {
        let mut symbols = Vec::new();
        serialize(&expr, &mut symbols)?;
        Ok(Self {
            symbols: symbols.into(),
            sql: expr,
        })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Source tree this expression was compiled from
    pub fn sql(&self) -> &Expression {
        &self.sql
    }

    /// Distinct columns referenced by the expression
    pub fn columns(&self) -> HashSet<Column> {
        self.symbols
            .iter()
            .filter_map(Symbol::as_column)
            .cloned()
            .collect()
    }

    /// Replay the expression, fetching column values through `lookup`.
    pub fn evaluate<F, E>(&self, lookup: F) -> Result<Value, E>
    where
        F: FnMut(&Column) -> Result<Value, E>,
        E: From<ExpressionError>,
    {
        ExpressionEvaluator::new(&self.symbols).evaluate(lookup)
    }
}

impl PartialEq for CompiledExpression {
    fn eq(&self, other: &Self) -> bool {
        self.symbols == other.symbols
    }
}

impl Eq for CompiledExpression {}

impl fmt::Display for CompiledExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, symbol) in self.symbols.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}

fn serialize(expr: &Expression, out: &mut Vec<Symbol>) -> ExpressionResult<()> {
    match expr {
        Expression::Literal(lit) => out.push(Symbol::Literal(lit.value.clone())),

        Expression::Null => out.push(Symbol::Literal(Value::Null)),

        Expression::Column(column) => out.push(Symbol::Column(column.clone())),

        Expression::Grouping(items) => match literal_list(items) {
            Some(values) => out.push(Symbol::Literal(Value::List(values))),
            None => {
                for item in items {
                    serialize(item, out)?;
                }
                out.push(Symbol::Operator(OperatorSymbol::new(
                    Function::Group,
                    items.len(),
                )?));
            }
        },

        Expression::BooleanTest { column, test } => {
            out.push(Symbol::Column(column.clone()));
            let function = match test {
                BooleanTest::IsNull => Some(Function::IsNull),
                BooleanTest::IsNotNull => Some(Function::IsNotNull),
                BooleanTest::IsTrue => None,
                BooleanTest::IsFalse => Some(Function::LogicalNot),
            };
            if let Some(function) = function {
                out.push(Symbol::Operator(OperatorSymbol::unary(function)?));
            }
        }

        Expression::UnaryOp { op, operand } => {
            serialize(operand, out)?;
            let function = match op {
                UnaryOperator::Not => Function::Invert,
                UnaryOperator::Neg => Function::Negate,
            };
            out.push(Symbol::Operator(OperatorSymbol::unary(function)?));
        }

        Expression::BinaryOp { op, left, right } => {
            let function = binary_function(op)?;
            serialize(right, out)?;
            serialize(left, out)?;
            out.push(Symbol::Operator(OperatorSymbol::binary(function)?));
        }

        Expression::ClauseList { op, clauses } => {
            if clauses.is_empty() {
                out.push(Symbol::Literal(Value::Boolean(true)));
                return Ok(());
            }
            for clause in clauses {
                serialize(clause, out)?;
            }
            let symbol = match (op, clauses.len()) {
                (Conjunction::And, 2) => OperatorSymbol::binary(Function::And)?,
                (Conjunction::Or, 2) => OperatorSymbol::binary(Function::Or)?,
                (Conjunction::And, n) => OperatorSymbol::new(Function::All, n)?,
                (Conjunction::Or, n) => OperatorSymbol::new(Function::Any, n)?,
            };
            out.push(Symbol::Operator(symbol));
        }

        Expression::FunctionCall { .. } => {
            return Err(ExpressionError::UnsupportedExpression {
                expression: expr.to_string(),
                kind: expr.kind().to_string(),
            })
        }
    }
    Ok(())
}

fn binary_function(op: &BinaryOperator) -> ExpressionResult<Function> {
    let function = match op {
        BinaryOperator::Add => Function::Add,
        BinaryOperator::Sub => Function::Sub,
        BinaryOperator::Mul => Function::Mul,
        BinaryOperator::Div => Function::Div,
        BinaryOperator::Eq | BinaryOperator::Is => Function::Eq,
        BinaryOperator::Ne | BinaryOperator::IsNot => Function::Ne,
        BinaryOperator::Lt => Function::Lt,
        BinaryOperator::Le => Function::Le,
        BinaryOperator::Gt => Function::Gt,
        BinaryOperator::Ge => Function::Ge,
        BinaryOperator::In => Function::In,
        BinaryOperator::NotIn => Function::NotIn,
        BinaryOperator::Contains => Function::Contains,
        BinaryOperator::Concat => Function::Concat,
        BinaryOperator::Custom(op) => {
            return Err(ExpressionError::UnsupportedOperator {
                operator: op.clone(),
            })
        }
    };
    Ok(function)
}

/// Values of a grouping made only of literals, folded into one constant
fn literal_list(items: &[Expression]) -> Option<Vec<Value>> {
    items
        .iter()
        .map(|item| match item {
            Expression::Literal(lit) => Some(lit.value.clone()),
            Expression::Null => Some(Value::Null),
            _ => None,
        })
        .collect()
}
