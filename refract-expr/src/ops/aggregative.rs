use refract_api::{Value, compare_values, values_equal};

use crate::engine::Operation;
use crate::error::{ExprError, Result};

/// The aggregative family folds its *operand* — already reduced to a
/// collection by the engine (or by the executor's path gathering) — and
/// ignores the threaded input. Empty collections yield `0` for `count` and
/// `sum` and `Undefined` for the rest.
fn collection<'v>(op: &'static str, operand: &'v Value) -> Result<&'v [Value]> {
    match operand {
        Value::Array(items) => Ok(items),
        Value::Undefined | Value::Null => Ok(&[]),
        other => Err(ExprError::type_error(op, "an array operand", other)),
    }
}

fn numbers(op: &'static str, items: &[Value]) -> Result<Vec<f64>> {
    items
        .iter()
        .map(|item| {
            item.as_f64()
                .ok_or_else(|| ExprError::type_error(op, "numeric elements", item))
        })
        .collect()
}

pub struct Count;

impl Operation for Count {
    fn name(&self) -> &'static str {
        "count"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        Ok(Value::Int(collection(self.name(), operand)?.len() as i64))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

pub struct Sum;

impl Operation for Sum {
    fn name(&self) -> &'static str {
        "sum"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let items = collection(self.name(), operand)?;
        if items.iter().all(|item| matches!(item, Value::Int(_))) {
            let mut total: i64 = 0;
            for item in items {
                if let Value::Int(i) = item {
                    total = total
                        .checked_add(*i)
                        .ok_or(ExprError::Overflow { op: self.name() })?;
                }
            }
            Ok(Value::Int(total))
        } else {
            Ok(Value::Float(numbers(self.name(), items)?.iter().sum()))
        }
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

pub struct Mean;

impl Operation for Mean {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let items = collection(self.name(), operand)?;
        if items.is_empty() {
            return Ok(Value::Undefined);
        }
        let nums = numbers(self.name(), items)?;
        Ok(Value::Float(nums.iter().sum::<f64>() / nums.len() as f64))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

pub struct Median;

impl Operation for Median {
    fn name(&self) -> &'static str {
        "median"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let items = collection(self.name(), operand)?;
        if items.is_empty() {
            return Ok(Value::Undefined);
        }
        let mut indexed: Vec<(f64, &Value)> = numbers(self.name(), items)?
            .into_iter()
            .zip(items)
            .collect();
        indexed.sort_by(|a, b| a.0.total_cmp(&b.0));
        let mid = indexed.len() / 2;
        if indexed.len() % 2 == 1 {
            // Odd count: the median is an element of the collection.
            Ok(indexed[mid].1.clone())
        } else {
            Ok(Value::Float((indexed[mid - 1].0 + indexed[mid].0) / 2.0))
        }
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

pub struct Mode;

impl Operation for Mode {
    fn name(&self) -> &'static str {
        "mode"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        let items = collection(self.name(), operand)?;
        if items.is_empty() {
            return Ok(Value::Undefined);
        }
        // Grouped by deep equality; ties resolve to the earliest value seen.
        let mut groups: Vec<(&Value, usize)> = Vec::new();
        for item in items {
            match groups.iter_mut().find(|(v, _)| values_equal(v, item)) {
                Some((_, count)) => *count += 1,
                None => groups.push((item, 1)),
            }
        }
        let best = groups.iter().max_by_key(|(_, count)| *count);
        Ok(best.map_or(Value::Undefined, |(v, _)| (*v).clone()))
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

fn extremum(op: &'static str, operand: &Value, keep_right: fn(std::cmp::Ordering) -> bool) -> Result<Value> {
    let items = collection(op, operand)?;
    let mut best: Option<&Value> = None;
    for item in items {
        match best {
            None => best = Some(item),
            Some(current) => {
                let ordering = compare_values(item, current).ok_or_else(|| {
                    ExprError::type_error(op, "mutually comparable elements", item)
                })?;
                if keep_right(ordering) {
                    best = Some(item);
                }
            }
        }
    }
    Ok(best.cloned().unwrap_or(Value::Undefined))
}

pub struct Min;

impl Operation for Min {
    fn name(&self) -> &'static str {
        "min"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        extremum(self.name(), operand, std::cmp::Ordering::is_lt)
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

pub struct Max;

impl Operation for Max {
    fn name(&self) -> &'static str {
        "max"
    }

    fn apply(&self, operand: &Value, _input: &Value) -> Result<Value> {
        extremum(self.name(), operand, std::cmp::Ordering::is_gt)
    }

    fn evaluate(&self, operand: &Value) -> Result<Value> {
        self.apply(operand, &Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::Array(values.iter().map(|i| Value::Int(*i)).collect())
    }

    #[test]
    fn empty_collections_have_documented_identities() {
        let empty = Value::Array(vec![]);
        assert_eq!(Count.apply(&empty, &Value::Undefined).unwrap(), Value::Int(0));
        assert_eq!(Sum.apply(&empty, &Value::Undefined).unwrap(), Value::Int(0));
        assert_eq!(Mean.apply(&empty, &Value::Undefined).unwrap(), Value::Undefined);
        assert_eq!(Min.apply(&empty, &Value::Undefined).unwrap(), Value::Undefined);
        assert_eq!(Max.apply(&empty, &Value::Undefined).unwrap(), Value::Undefined);
    }

    #[test]
    fn median_of_odd_count_is_an_element() {
        let out = Median.apply(&ints(&[9, 1, 5]), &Value::Undefined).unwrap();
        assert_eq!(out, Value::Int(5));
        let out = Median.apply(&ints(&[4, 1, 3, 2]), &Value::Undefined).unwrap();
        assert_eq!(out, Value::Float(2.5));
    }

    #[test]
    fn mode_breaks_ties_by_first_seen() {
        let out = Mode
            .apply(&ints(&[2, 7, 7, 2, 5]), &Value::Undefined)
            .unwrap();
        assert_eq!(out, Value::Int(2));
    }
}
