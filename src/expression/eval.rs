//! Stack machine evaluating compiled symbol sequences.

use crate::access::Value;
use crate::catalog::Column;
use crate::expression::error::{ExpressionError, ExpressionResult};
use crate::expression::symbol::{Arity, Function, OperatorSymbol, Symbol};
use std::cmp::Ordering;

/// Evaluator for compiled expressions
pub struct ExpressionEvaluator<'a> {
    symbols: &'a [Symbol],
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(symbols: &'a [Symbol]) -> Self {
        Self { symbols }
    }

    /// Evaluate the symbols and return the single remaining value.
    ///
    /// `lookup` is called once per column symbol, in sequence order.
    pub fn evaluate<F, E>(&self, mut lookup: F) -> Result<Value, E>
    where
        F: FnMut(&Column) -> Result<Value, E>,
        E: From<ExpressionError>,
    {
        let mut stack: Vec<Value> = Vec::with_capacity(self.symbols.len());
        for symbol in self.symbols {
            match symbol {
                Symbol::Literal(value) => stack.push(value.clone()),
                Symbol::Column(column) => stack.push(lookup(column)?),
                Symbol::Operator(op) => {
                    let result = apply(op, &mut stack)?;
                    stack.push(result);
                }
            }
        }

        if stack.len() != 1 {
            return Err(ExpressionError::MalformedExpression {
                message: format!("{} values left on the stack", stack.len()),
            }
            .into());
        }
        stack.pop().ok_or_else(|| {
            ExpressionError::MalformedExpression {
                message: "empty stack".to_string(),
            }
            .into()
        })
    }
}

fn pop(stack: &mut Vec<Value>, op: &OperatorSymbol) -> ExpressionResult<Value> {
    stack
        .pop()
        .ok_or_else(|| ExpressionError::MalformedExpression {
            message: format!("stack underflow in {}", op.function().name()),
        })
}

/// Pop the operands of `op` and apply its function.
fn apply(op: &OperatorSymbol, stack: &mut Vec<Value>) -> ExpressionResult<Value> {
    let function = op.function();
    match function.arity() {
        Arity::Unary => {
            let operand = pop(stack, op)?;
            evaluate_unary(function, operand)
        }
        Arity::Binary => {
            // Right operands are emitted first, so the left one is on top
            let left = pop(stack, op)?;
            let right = pop(stack, op)?;
            evaluate_binary(function, left, right)
        }
        Arity::Variadic => {
            if stack.len() < op.arity() {
                return Err(ExpressionError::MalformedExpression {
                    message: format!(
                        "{} needs {} operands, stack holds {}",
                        function.name(),
                        op.arity(),
                        stack.len()
                    ),
                });
            }
            let operands = stack.split_off(stack.len() - op.arity());
            Ok(evaluate_variadic(function, operands))
        }
    }
}

fn invalid_operands(function: Function, left: &Value, right: Option<&Value>) -> ExpressionError {
    ExpressionError::InvalidOperandTypes {
        operator: function.name().to_string(),
        left_type: left.data_type(),
        right_type: right.and_then(Value::data_type),
    }
}

fn overflow(function: Function) -> ExpressionError {
    ExpressionError::ArithmeticOverflow {
        operator: function.name().to_string(),
    }
}

fn evaluate_unary(function: Function, operand: Value) -> ExpressionResult<Value> {
    match function {
        Function::IsNull => Ok(Value::Boolean(operand.is_null())),
        Function::IsNotNull => Ok(Value::Boolean(!operand.is_null())),
        Function::LogicalNot => Ok(Value::Boolean(!operand.is_truthy())),
        Function::Invert => match operand {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            Value::Int32(n) => Ok(Value::Int32(!n)),
            _ => Err(invalid_operands(function, &operand, None)),
        },
        Function::Negate => match operand {
            Value::Null => Ok(Value::Null),
            Value::Int32(n) => n
                .checked_neg()
                .map(Value::Int32)
                .ok_or_else(|| overflow(function)),
            _ => Err(invalid_operands(function, &operand, None)),
        },
        _ => Err(ExpressionError::InvalidArity {
            operator: function.name().to_string(),
            arity: 1,
        }),
    }
}

fn evaluate_binary(function: Function, left: Value, right: Value) -> ExpressionResult<Value> {
    match function {
        // Python-level equality: NULL equals NULL
        Function::Eq => return Ok(Value::Boolean(left == right)),
        Function::Ne => return Ok(Value::Boolean(left != right)),
        Function::In => return membership(function, left, right),
        Function::NotIn => {
            return membership(function, left, right).map(|result| match result {
                Value::Boolean(b) => Value::Boolean(!b),
                other => other,
            })
        }
        Function::And | Function::Or => return logical(function, left, right),
        _ => {}
    }

    // Remaining operators propagate NULL
    if left.is_null() || right.is_null() {
        return Ok(Value::Null);
    }

    match function {
        Function::Add => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => a
                .checked_add(*b)
                .map(Value::Int32)
                .ok_or_else(|| overflow(function)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        Function::Sub => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => a
                .checked_sub(*b)
                .map(Value::Int32)
                .ok_or_else(|| overflow(function)),
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        Function::Mul => match (&left, &right) {
            (Value::Int32(a), Value::Int32(b)) => a
                .checked_mul(*b)
                .map(Value::Int32)
                .ok_or_else(|| overflow(function)),
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        Function::Div => match (&left, &right) {
            (Value::Int32(_), Value::Int32(0)) => Err(ExpressionError::DivisionByZero),
            // Truncates toward zero
            (Value::Int32(a), Value::Int32(b)) => a
                .checked_div(*b)
                .map(Value::Int32)
                .ok_or_else(|| overflow(function)),
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        Function::Lt => compare_values(function, &left, &right, |cmp| cmp == Ordering::Less),
        Function::Le => compare_values(function, &left, &right, |cmp| cmp != Ordering::Greater),
        Function::Gt => compare_values(function, &left, &right, |cmp| cmp == Ordering::Greater),
        Function::Ge => compare_values(function, &left, &right, |cmp| cmp != Ordering::Less),

        Function::Contains => match (&left, &right) {
            (Value::String(haystack), Value::String(needle)) => {
                Ok(Value::Boolean(haystack.contains(needle.as_str())))
            }
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        Function::Concat => match (&left, &right) {
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            _ => Err(invalid_operands(function, &left, Some(&right))),
        },

        _ => Err(ExpressionError::InvalidArity {
            operator: function.name().to_string(),
            arity: 2,
        }),
    }
}

/// `left IN right`
fn membership(function: Function, left: Value, right: Value) -> ExpressionResult<Value> {
    match (&left, &right) {
        (_, Value::List(items)) => Ok(Value::Boolean(items.contains(&left))),
        (Value::String(needle), Value::String(haystack)) => {
            Ok(Value::Boolean(haystack.contains(needle.as_str())))
        }
        (_, Value::Null) => Ok(Value::Null),
        _ => Err(invalid_operands(function, &left, Some(&right))),
    }
}

/// Two-clause AND/OR: boolean on booleans, bitwise on integers.
fn logical(function: Function, left: Value, right: Value) -> ExpressionResult<Value> {
    let is_and = function == Function::And;
    match (&left, &right) {
        (Value::Boolean(a), Value::Boolean(b)) => {
            Ok(Value::Boolean(if is_and { *a && *b } else { *a || *b }))
        }
        (Value::Int32(a), Value::Int32(b)) => Ok(Value::Int32(if is_and { a & b } else { a | b })),
        // NULL AND false = false, NULL OR true = true, otherwise NULL
        (Value::Null, other) | (other, Value::Null) => match other {
            Value::Boolean(b) if *b != is_and => Ok(Value::Boolean(*b)),
            _ => Ok(Value::Null),
        },
        _ => Err(invalid_operands(function, &left, Some(&right))),
    }
}

fn evaluate_variadic(function: Function, operands: Vec<Value>) -> Value {
    match function {
        Function::All => Value::Boolean(operands.iter().all(Value::is_truthy)),
        Function::Any => Value::Boolean(operands.iter().any(Value::is_truthy)),
        _ => Value::List(operands),
    }
}

/// Compare two values and apply a comparison function
fn compare_values<F>(
    function: Function,
    left: &Value,
    right: &Value,
    cmp_fn: F,
) -> ExpressionResult<Value>
where
    F: FnOnce(Ordering) -> bool,
{
    let cmp_result = match (left, right) {
        (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
        (Value::Timestamp(a), Value::Timestamp(b)) => a.cmp(b),
        _ => return Err(invalid_operands(function, left, Some(right))),
    };
    Ok(Value::Boolean(cmp_fn(cmp_result)))
}
