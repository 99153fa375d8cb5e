use rand::Rng;
use refract_api::Value;

use crate::engine::Operation;
use crate::error::{ExprError, Result};

/// `{"random": null}` or `{"random": {"min": a, "max": b}}` — a uniform
/// float in `[min, max)`, defaulting to `[0, 1)`.
pub struct Random;

impl Operation for Random {
    fn name(&self) -> &'static str {
        "random"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let (min, max) = match operand {
            Value::Undefined | Value::Null => (0.0, 1.0),
            Value::Object(map) => {
                let bound = |key: &str, fallback: f64| {
                    map.get(key).map_or(Ok(fallback), |v| {
                        v.as_f64()
                            .ok_or_else(|| ExprError::type_error(self.name(), "numeric bounds", v))
                    })
                };
                (bound("min", 0.0)?, bound("max", 1.0)?)
            }
            other => {
                return Err(ExprError::type_error(
                    self.name(),
                    "a null or {min, max} operand",
                    other,
                ));
            }
        };
        if min > max {
            return Err(ExprError::Type {
                op: self.name(),
                expected: "min <= max",
                got: format!("min {min}, max {max}"),
            });
        }
        if min == max {
            return Ok(Value::Float(min));
        }
        Ok(Value::Float(rand::thread_rng().gen_range(min..max)))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

/// `{"uuid": null}` — a fresh v4 UUID string.
pub struct Uuid;

impl Operation for Uuid {
    fn name(&self) -> &'static str {
        "uuid"
    }

    fn apply(&self, _operand: &Value, _input: &Value) -> Result<Value> {
        Ok(Value::String(uuid::Uuid::new_v4().to_string()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}
