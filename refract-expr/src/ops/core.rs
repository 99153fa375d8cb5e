use refract_api::Value;

use crate::engine::{ControlOperation, Expr, ExpressionEngine, Operation};
use crate::error::{ExprError, Result};
use crate::ops::logical::expr_array;

/// `{"literal": value}` — the explicit non-expression escape hatch.
///
/// Parsing short-circuits `literal` operands into [`Expr::Literal`] verbatim,
/// so this implementation is only reached when the op is invoked directly.
pub struct Literal;

impl Operation for Literal {
    fn name(&self) -> &'static str {
        "literal"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        Ok(operand.clone())
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        Ok(operand.clone())
    }
}

/// `{"get": "path.to.field"}` — dotted field access on the input value.
///
/// A missing hop yields `Undefined`; a `null` somewhere along the path
/// short-circuits to `Null`. Array hops take numeric segments.
pub struct Get;

impl Operation for Get {
    fn name(&self) -> &'static str {
        "get"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let path = operand
            .as_str()
            .ok_or_else(|| ExprError::type_error(self.name(), "a string path", operand))?;
        let mut current = input.clone();
        for segment in path.split('.') {
            current = match current {
                Value::Null => return Ok(Value::Null),
                Value::Object(mut map) => map.remove(segment).unwrap_or(Value::Undefined),
                Value::Array(mut items) => match segment.parse::<usize>() {
                    Ok(index) if index < items.len() => items.swap_remove(index),
                    _ => Value::Undefined,
                },
                _ => return Ok(Value::Undefined),
            };
        }
        Ok(current)
    }
}

/// `{"pipe": [..exprs]}` — threads a changing input left to right.
///
/// Self-contained form: the first expression is evaluated standalone and the
/// remainder applied in sequence to its result.
pub struct Pipe;

impl ControlOperation for Pipe {
    fn name(&self) -> &'static str {
        "pipe"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let stages = expr_array(self.name(), operand)?;
        let mut current = input.clone();
        for stage in stages {
            current = engine.apply(stage, &current)?;
        }
        Ok(current)
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let stages = expr_array(self.name(), operand)?;
        let Some((first, rest)) = stages.split_first() else {
            return Ok(Value::Undefined);
        };
        let mut current = engine.evaluate(first)?;
        for stage in rest {
            current = engine.apply(stage, &current)?;
        }
        Ok(current)
    }
}

/// `{"compose": [..exprs]}` — [`Pipe`] in right-to-left order.
pub struct Compose;

impl ControlOperation for Compose {
    fn name(&self) -> &'static str {
        "compose"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let stages = expr_array(self.name(), operand)?;
        let mut current = input.clone();
        for stage in stages.iter().rev() {
            current = engine.apply(stage, &current)?;
        }
        Ok(current)
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let stages = expr_array(self.name(), operand)?;
        let Some((last, rest)) = stages.split_last() else {
            return Ok(Value::Undefined);
        };
        let mut current = engine.evaluate(last)?;
        for stage in rest.iter().rev() {
            current = engine.apply(stage, &current)?;
        }
        Ok(current)
    }
}

/// `{"debug": expr}` — passes the reduced operand through, emitting it on the
/// `tracing` debug channel.
pub struct Debug;

impl Operation for Debug {
    fn name(&self) -> &'static str {
        "debug"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        tracing::debug!(value = ?operand, "expression debug");
        Ok(operand.clone())
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        tracing::debug!(value = ?operand, "expression debug");
        Ok(operand.clone())
    }
}
