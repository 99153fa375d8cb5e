use refract_api::Value;

use crate::engine::Operation;
use crate::error::{ExprError, Result};

/// Math ops combine the threaded input (left) with the reduced operand
/// (right): `apply({"add": 3}, 4)` is `7`. Integer pairs stay integral with
/// checked arithmetic; any float widens the result.
fn numeric_pair(op: &'static str, input: &Value, operand: &Value) -> Result<(f64, f64)> {
    let left = input
        .as_f64()
        .ok_or_else(|| ExprError::type_error(op, "a numeric input", input))?;
    let right = operand
        .as_f64()
        .ok_or_else(|| ExprError::type_error(op, "a numeric operand", operand))?;
    Ok((left, right))
}

fn arithmetic(
    op: &'static str,
    operand: &Value,
    input: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    if let (Value::Int(l), Value::Int(r)) = (input, operand) {
        return int_op(*l, *r)
            .map(Value::Int)
            .ok_or(ExprError::Overflow { op });
    }
    let (l, r) = numeric_pair(op, input, operand)?;
    Ok(Value::Float(float_op(l, r)))
}

pub struct Add;

impl Operation for Add {
    fn name(&self) -> &'static str {
        "add"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        arithmetic(self.name(), operand, input, i64::checked_add, |l, r| l + r)
    }
}

pub struct Subtract;

impl Operation for Subtract {
    fn name(&self) -> &'static str {
        "subtract"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        arithmetic(self.name(), operand, input, i64::checked_sub, |l, r| l - r)
    }
}

pub struct Multiply;

impl Operation for Multiply {
    fn name(&self) -> &'static str {
        "multiply"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        arithmetic(self.name(), operand, input, i64::checked_mul, |l, r| l * r)
    }
}

/// Division always widens to a float; a zero divisor is an error.
pub struct Divide;

impl Operation for Divide {
    fn name(&self) -> &'static str {
        "divide"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let (l, r) = numeric_pair(self.name(), input, operand)?;
        if r == 0.0 {
            return Err(ExprError::DivisionByZero { op: self.name() });
        }
        Ok(Value::Float(l / r))
    }
}

pub struct Modulo;

impl Operation for Modulo {
    fn name(&self) -> &'static str {
        "modulo"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        if operand.as_f64() == Some(0.0) {
            return Err(ExprError::DivisionByZero { op: self.name() });
        }
        arithmetic(self.name(), operand, input, i64::checked_rem, |l, r| l % r)
    }
}
