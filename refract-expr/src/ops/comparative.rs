use std::cmp::Ordering;

use refract_api::{Value, compare_values, values_equal};

use crate::engine::Operation;
use crate::error::{ExprError, Result};

/// `{"eq": operand}` — deep equality against the input, numbers cross-typed.
pub struct Eq;

impl Operation for Eq {
    fn name(&self) -> &'static str {
        "eq"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        Ok(Value::Bool(values_equal(input, operand)))
    }
}

pub struct Ne;

impl Operation for Ne {
    fn name(&self) -> &'static str {
        "ne"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        Ok(Value::Bool(!values_equal(input, operand)))
    }
}

fn relational(
    op: &'static str,
    operand: &Value,
    input: &Value,
    accept: fn(Ordering) -> bool,
) -> Result<Value> {
    match compare_values(input, operand) {
        Some(ordering) => Ok(Value::Bool(accept(ordering))),
        None => Err(ExprError::Type {
            op,
            expected: "comparable operands",
            got: format!("{} vs {}", input.kind(), operand.kind()),
        }),
    }
}

pub struct Gt;

impl Operation for Gt {
    fn name(&self) -> &'static str {
        "gt"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        relational(self.name(), operand, input, Ordering::is_gt)
    }
}

pub struct Gte;

impl Operation for Gte {
    fn name(&self) -> &'static str {
        "gte"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        relational(self.name(), operand, input, Ordering::is_ge)
    }
}

pub struct Lt;

impl Operation for Lt {
    fn name(&self) -> &'static str {
        "lt"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        relational(self.name(), operand, input, Ordering::is_lt)
    }
}

pub struct Lte;

impl Operation for Lte {
    fn name(&self) -> &'static str {
        "lte"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        relational(self.name(), operand, input, Ordering::is_le)
    }
}

/// `{"in": [..candidates]}` — membership of the input in the operand array.
pub struct In;

impl Operation for In {
    fn name(&self) -> &'static str {
        "in"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let candidates = operand
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array operand", operand))?;
        Ok(Value::Bool(
            candidates.iter().any(|c| values_equal(c, input)),
        ))
    }
}

pub struct Nin;

impl Operation for Nin {
    fn name(&self) -> &'static str {
        "nin"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let candidates = operand
            .as_array()
            .ok_or_else(|| ExprError::type_error(self.name(), "an array operand", operand))?;
        Ok(Value::Bool(
            !candidates.iter().any(|c| values_equal(c, input)),
        ))
    }
}

fn match_pattern(op: &'static str, pattern: &str, input: &Value) -> Result<Value> {
    let subject = input
        .as_str()
        .ok_or_else(|| ExprError::type_error(op, "a string input", input))?;
    let re = regex::Regex::new(pattern).map_err(|source| ExprError::Pattern { op, source })?;
    Ok(Value::Bool(re.is_match(subject)))
}

/// `{"matches_regex": pattern}` — regular-expression match on a string input.
pub struct MatchesRegex;

impl Operation for MatchesRegex {
    fn name(&self) -> &'static str {
        "matches_regex"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let pattern = operand
            .as_str()
            .ok_or_else(|| ExprError::type_error(self.name(), "a string pattern", operand))?;
        match_pattern(self.name(), pattern, input)
    }
}

/// `{"matches_like": pattern}` — SQL LIKE: `%` any run, `_` one character.
pub struct MatchesLike;

impl Operation for MatchesLike {
    fn name(&self) -> &'static str {
        "matches_like"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let pattern = operand
            .as_str()
            .ok_or_else(|| ExprError::type_error(self.name(), "a string pattern", operand))?;
        let translated = translate_wildcards(pattern, '%', '_');
        match_pattern(self.name(), &translated, input)
    }
}

/// `{"matches_glob": pattern}` — shell glob: `*` any run, `?` one character.
pub struct MatchesGlob;

impl Operation for MatchesGlob {
    fn name(&self) -> &'static str {
        "matches_glob"
    }

    fn apply(&self, operand: &Value, input: &Value) -> Result<Value> {
        let pattern = operand
            .as_str()
            .ok_or_else(|| ExprError::type_error(self.name(), "a string pattern", operand))?;
        let translated = translate_wildcards(pattern, '*', '?');
        match_pattern(self.name(), &translated, input)
    }
}

/// Anchored translation of a wildcard pattern into regex syntax.
fn translate_wildcards(pattern: &str, many: char, one: char) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    for ch in pattern.chars() {
        if ch == many {
            out.push_str(".*");
        } else if ch == one {
            out.push('.');
        } else if regex_syntax_char(ch) {
            out.push('\\');
            out.push(ch);
        } else {
            out.push(ch);
        }
    }
    out.push('$');
    out
}

fn regex_syntax_char(ch: char) -> bool {
    matches!(
        ch,
        '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '^' | '$' | '|' | '\\'
    )
}
