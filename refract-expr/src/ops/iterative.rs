use refract_api::Value;

use crate::engine::{ControlOperation, Expr, ExpressionEngine, Operation};
use crate::error::{ExprError, Result};

/// The lambda-taking iterators (`map`, `filter`, `flat_map`, `find`, `any`,
/// `all`) control evaluation: the operand stays unreduced and is applied to
/// each element of the input collection in turn. Their self-contained form
/// takes a two-element operand `[collection, lambda]`.
fn input_items<'v>(op: &'static str, input: &'v Value) -> Result<&'v [Value]> {
    input
        .as_array()
        .ok_or_else(|| ExprError::type_error(op, "an array input", input))
}

/// Splits the `[collection, lambda]` self-contained operand.
fn evaluate_parts<'e>(
    op: &'static str,
    operand: &'e Expr,
    engine: &ExpressionEngine,
) -> Result<(Vec<Value>, &'e Expr)> {
    let Expr::Array(items) = operand else {
        return Err(ExprError::Type {
            op,
            expected: "a [collection, lambda] pair",
            got: "non-array operand".to_string(),
        });
    };
    let [collection, lambda] = items.as_slice() else {
        return Err(ExprError::Type {
            op,
            expected: "a [collection, lambda] pair",
            got: format!("array of {}", items.len()),
        });
    };
    let reduced = engine.evaluate(collection)?;
    match reduced {
        Value::Array(values) => Ok((values, lambda)),
        other => Err(ExprError::type_error(op, "a collection first element", &other)),
    }
}

pub struct Map;

impl ControlOperation for Map {
    fn name(&self) -> &'static str {
        "map"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let items = input_items(self.name(), input)?;
        items
            .iter()
            .map(|item| engine.apply(operand, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        items
            .iter()
            .map(|item| engine.apply(lambda, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array)
    }
}

pub struct Filter;

impl ControlOperation for Filter {
    fn name(&self) -> &'static str {
        "filter"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        let items = input_items(self.name(), input)?;
        let mut kept = Vec::new();
        for item in items {
            if engine.apply(operand, item)?.is_truthy() {
                kept.push(item.clone());
            }
        }
        Ok(Value::Array(kept))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        let mut kept = Vec::new();
        for item in items {
            if engine.apply(lambda, &item)?.is_truthy() {
                kept.push(item);
            }
        }
        Ok(Value::Array(kept))
    }
}

pub struct FlatMap;

impl FlatMap {
    fn run(&self, items: &[Value], lambda: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let mut out = Vec::new();
        for item in items {
            match engine.apply(lambda, item)? {
                Value::Array(inner) => out.extend(inner),
                other => out.push(other),
            }
        }
        Ok(Value::Array(out))
    }
}

impl ControlOperation for FlatMap {
    fn name(&self) -> &'static str {
        "flat_map"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        self.run(input_items(self.name(), input)?, operand, engine)
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        self.run(&items, lambda, engine)
    }
}

/// First element for which the lambda is truthy; `Undefined` when none is.
pub struct Find;

impl Find {
    fn run(&self, items: &[Value], lambda: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        for item in items {
            if engine.apply(lambda, item)?.is_truthy() {
                return Ok(item.clone());
            }
        }
        Ok(Value::Undefined)
    }
}

impl ControlOperation for Find {
    fn name(&self) -> &'static str {
        "find"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        self.run(input_items(self.name(), input)?, operand, engine)
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        self.run(&items, lambda, engine)
    }
}

pub struct Any;

impl ControlOperation for Any {
    fn name(&self) -> &'static str {
        "any"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        for item in input_items(self.name(), input)? {
            if engine.apply(operand, item)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        for item in &items {
            if engine.apply(lambda, item)?.is_truthy() {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }
}

pub struct All;

impl ControlOperation for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn apply(&self, operand: &Expr, input: &Value, engine: &ExpressionEngine) -> Result<Value> {
        for item in input_items(self.name(), input)? {
            if !engine.apply(operand, item)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }

    fn evaluate(&self, operand: &Expr, engine: &ExpressionEngine) -> Result<Value> {
        let (items, lambda) = evaluate_parts(self.name(), operand, engine)?;
        for item in &items {
            if !engine.apply(lambda, item)?.is_truthy() {
                return Ok(Value::Bool(false));
            }
        }
        Ok(Value::Bool(true))
    }
}

/// `{"concat": [..tail]}` — input array followed by the operand array.
pub struct Concat;

impl Operation for Concat {
    fn name(&self) -> &'static str {
        "concat"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let head = input
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array input", input))?;
        let tail = operand
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array operand", operand))?;
        let mut out = head.to_vec();
        out.extend(tail.iter().cloned());
        Ok(Value::Array(out))
    }
}

/// `{"join": separator}` — stringifies the input array's scalars.
pub struct Join;

impl Operation for Join {
    fn name(&self) -> &'static str {
        "join"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let separator = operand
            .as_str()
            .ok_or_else(|| ExprError::type_error(self.name(), "a string separator", operand))?;
        let items = input
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array input", input))?;
        let rendered = items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                Value::Int(i) => Ok(i.to_string()),
                Value::Float(f) => Ok(f.to_string()),
                Value::Bool(b) => Ok(b.to_string()),
                Value::Null | Value::Undefined => Ok(String::new()),
                other => Err(ExprError::type_error(self.name(), "scalar elements", other)),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::String(rendered.join(separator)))
    }
}

/// `{"reverse": collection}` — reverses its reduced operand, so it composes
/// with path gathering the way the aggregative family does.
pub struct Reverse;

impl Operation for Reverse {
    fn name(&self) -> &'static str {
        "reverse"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let items = operand
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array operand", operand))?;
        Ok(Value::Array(items.iter().rev().cloned().collect()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}
