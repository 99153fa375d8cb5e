use refract_api::{ResourceSchema, Schema, ValidationError};
use refract_expr::ExpressionEngine;
use serde_json::Value as Json;

/// Two-phase query validator.
///
/// Phase 1 checks the document's shape independent of any schema; phase 2
/// checks select keys, where attributes, order entries, and pagination
/// bounds against the schema, recursing into relationship subqueries with
/// the related type. Problems are *returned*, all of them, as a list —
/// validation never fails out of band.
///
/// Construct one per `(schema, engine)` pair and reuse it across queries;
/// the validator value itself is the reuse handle. With an engine supplied,
/// expression-shaped select values are checked strictly against the
/// operation registry; without one they are accepted leniently.
pub struct QueryValidator<'a> {
    schema: &'a Schema,
    engine: Option<&'a ExpressionEngine>,
}

impl<'a> QueryValidator<'a> {
    pub fn new(schema: &'a Schema, engine: Option<&'a ExpressionEngine>) -> Self {
        Self { schema, engine }
    }

    /// Validates a raw query document. An empty list means valid.
    pub fn validate(&self, raw: &Json) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        self.check_shape(raw, &[], &mut errors);
        if !errors.is_empty() {
            return errors;
        }
        let Some(ty) = raw.get("type").and_then(Json::as_str) else {
            return vec![
                ValidationError::new("query requires a \"type\"", vec!["type".into()])
                    .with_code("missing_type"),
            ];
        };
        self.check_semantics(raw, ty, &[], &mut errors);
        errors
    }

    // ---- phase 1: shape ----------------------------------------------

    fn check_shape(&self, raw: &Json, path: &[String], errors: &mut Vec<ValidationError>) {
        let Some(query) = raw.as_object() else {
            errors.push(
                ValidationError::new("query must be an object", path.to_vec())
                    .with_code("invalid_query")
                    .with_value(raw),
            );
            return;
        };

        match query.get("select") {
            // Subqueries may omit select (they project a bare ref); the
            // semantic phase rejects a top-level query without one.
            None => {}
            Some(Json::String(_)) | Some(Json::Object(_)) => {}
            Some(Json::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    if !item.is_string() {
                        errors.push(
                            ValidationError::new(
                                "select array entries must be attribute names or \"*\"",
                                child(path, &["select".into(), index.to_string()]),
                            )
                            .with_code("invalid_select")
                            .with_value(item),
                        );
                    }
                }
            }
            Some(other) => {
                errors.push(
                    ValidationError::new(
                        "select must be \"*\", an array of names, or an object",
                        child(path, &["select".into()]),
                    )
                    .with_code("invalid_select")
                    .with_value(other),
                );
            }
        }

        if let Some(Json::Object(select)) = query.get("select") {
            for (key, value) in select {
                match value {
                    Json::String(_) => {}
                    Json::Object(map) => {
                        // Subquery shapes recurse; expression shapes are
                        // one-key objects checked semantically.
                        if map.contains_key("select") {
                            self.check_shape(value, &child(path, &["select".into(), key.clone()]), errors);
                        }
                    }
                    other => {
                        errors.push(
                            ValidationError::new(
                                "select values must be paths, expressions, or subqueries",
                                child(path, &["select".into(), key.clone()]),
                            )
                            .with_code("invalid_select")
                            .with_value(other),
                        );
                    }
                }
            }
        }

        if let Some(where_clause) = query.get("where")
            && !where_clause.is_object()
        {
            errors.push(
                ValidationError::new(
                    "where must be an object",
                    child(path, &["where".into()]),
                )
                .with_code("invalid_where")
                .with_value(where_clause),
            );
        }

        if let Some(order) = query.get("order") {
            let entries: Vec<&Json> = match order {
                Json::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            for (index, entry) in entries.iter().enumerate() {
                let ok = entry.as_object().is_some_and(|map| {
                    map.len() == 1
                        && map
                            .values()
                            .all(|dir| dir == "asc" || dir == "desc")
                });
                if !ok {
                    errors.push(
                        ValidationError::new(
                            "order entries must be single-key {attribute: \"asc\"|\"desc\"} objects",
                            child(path, &["order".into(), index.to_string()]),
                        )
                        .with_code("invalid_order")
                        .with_value(*entry),
                    );
                }
            }
        }

        for key in ["limit", "offset"] {
            if let Some(value) = query.get(key)
                && value.as_i64().is_none()
            {
                errors.push(
                    ValidationError::new(
                        format!("{key} must be an integer"),
                        child(path, &[key.into()]),
                    )
                    .with_code("invalid_pagination")
                    .with_value(value),
                );
            }
        }

        if let Some(id) = query.get("id")
            && !(id.is_string() || id.is_number())
        {
            errors.push(
                ValidationError::new("id must be a string or number", child(path, &["id".into()]))
                    .with_code("invalid_id")
                    .with_value(id),
            );
        }
    }

    // ---- phase 2: semantics ------------------------------------------

    fn check_semantics(
        &self,
        raw: &Json,
        ty: &str,
        path: &[String],
        errors: &mut Vec<ValidationError>,
    ) {
        let Some(resource) = self.schema.resource(ty) else {
            errors.push(
                ValidationError::new(
                    format!("unknown resource type \"{ty}\""),
                    child(path, &["type".into()]),
                )
                .with_code("unknown_type"),
            );
            return;
        };
        let query = raw.as_object().expect("shape phase admitted an object");

        match query.get("select") {
            None if path.is_empty() => errors.push(
                ValidationError::new("query requires a select", child(path, &["select".into()]))
                    .with_code("missing_select"),
            ),
            None | Some(Json::String(_)) => {
                if let Some(Json::String(s)) = query.get("select")
                    && s != "*"
                {
                    errors.push(
                        ValidationError::new(
                            "a string select must be \"*\"",
                            child(path, &["select".into()]),
                        )
                        .with_code("invalid_select"),
                    );
                }
            }
            Some(Json::Array(items)) => {
                for item in items.iter().filter_map(Json::as_str) {
                    if item != "*" && resource.attribute(item).is_none() {
                        errors.push(
                            ValidationError::new(
                                format!("\"{item}\" is not an attribute of \"{ty}\""),
                                child(path, &["select".into(), item.to_string()]),
                            )
                            .with_code("unknown_attribute"),
                        );
                    }
                }
            }
            Some(Json::Object(select)) => {
                for (key, value) in select {
                    self.check_select_entry(resource, ty, key, value, path, errors);
                }
            }
            Some(_) => {}
        }

        if let Some(Json::Object(where_clause)) = query.get("where") {
            let expression_like = where_clause.len() == 1
                && where_clause.keys().next().is_some_and(|key| {
                    self.engine
                        .map_or(resource.attribute(key).is_none(), |e| e.has_operation(key))
                });
            if !expression_like {
                for key in where_clause.keys() {
                    if resource.attribute(key).is_none() {
                        errors.push(
                            ValidationError::new(
                                format!("\"{key}\" is not an attribute of \"{ty}\""),
                                child(path, &["where".into(), key.clone()]),
                            )
                            .with_code("unknown_attribute"),
                        );
                    }
                }
            }
        }

        if let Some(order) = query.get("order") {
            let entries: Vec<&Json> = match order {
                Json::Array(items) => items.iter().collect(),
                single => vec![single],
            };
            for entry in entries {
                let Some(map) = entry.as_object() else { continue };
                for attr in map.keys() {
                    if resource.attribute(attr).is_none() {
                        errors.push(
                            ValidationError::new(
                                format!("\"{attr}\" is not an attribute of \"{ty}\""),
                                child(path, &["order".into(), attr.clone()]),
                            )
                            .with_code("unknown_attribute"),
                        );
                    }
                }
            }
        }

        if let Some(limit) = query.get("limit").and_then(Json::as_i64)
            && limit < 1
        {
            errors.push(
                ValidationError::new(
                    format!("limit must be at least 1, got {limit}"),
                    child(path, &["limit".into()]),
                )
                .with_code("invalid_limit"),
            );
        }
        if let Some(offset) = query.get("offset").and_then(Json::as_i64)
            && offset < 0
        {
            errors.push(
                ValidationError::new(
                    format!("offset must be at least 0, got {offset}"),
                    child(path, &["offset".into()]),
                )
                .with_code("invalid_offset"),
            );
        }
    }

    fn check_select_entry(
        &self,
        resource: &ResourceSchema,
        ty: &str,
        key: &str,
        value: &Json,
        path: &[String],
        errors: &mut Vec<ValidationError>,
    ) {
        let entry_path = child(path, &["select".into(), key.to_string()]);
        match value {
            Json::String(s) if s == "*" => {}
            Json::String(s) => self.check_select_path(resource, ty, s, &entry_path, errors),
            Json::Object(map) => {
                if let Some(rel) = resource.relationship(key) {
                    // Relationship key: the value is a subquery of the target
                    // type. Subqueries never address a single id.
                    if map.contains_key("id") {
                        errors.push(
                            ValidationError::new(
                                "subqueries must not carry an id",
                                entry_path.clone(),
                            )
                            .with_code("invalid_subquery"),
                        );
                    }
                    if let Some(declared) = map.get("type").and_then(Json::as_str)
                        && declared != rel.target
                    {
                        errors.push(
                            ValidationError::new(
                                format!(
                                    "subquery type \"{declared}\" conflicts with relationship target \"{}\"",
                                    rel.target
                                ),
                                entry_path.clone(),
                            )
                            .with_code("invalid_subquery"),
                        );
                    }
                    self.check_semantics(value, &rel.target, &entry_path, errors);
                } else if map.len() == 1 {
                    let op = map.keys().next().expect("one key");
                    if let Some(engine) = self.engine
                        && !engine.has_operation(op)
                    {
                        errors.push(
                            ValidationError::new(
                                format!("\"{op}\" is not a known operation"),
                                entry_path,
                            )
                            .with_code("unknown_expression"),
                        );
                    }
                    // Lenient without an engine: accepted as expression-like.
                } else {
                    errors.push(
                        ValidationError::new(
                            format!(
                                "\"{key}\" is neither a relationship of \"{ty}\" nor an expression"
                            ),
                            entry_path,
                        )
                        .with_code("invalid_select"),
                    );
                }
            }
            _ => {}
        }
    }

    /// Validates a dotted select path hop by hop while relationships carry
    /// it; a `$` segment must follow a to-many hop. Validation stops at the
    /// first attribute hop — attribute values may nest arbitrarily.
    fn check_select_path(
        &self,
        resource: &ResourceSchema,
        ty: &str,
        dotted: &str,
        path: &[String],
        errors: &mut Vec<ValidationError>,
    ) {
        let mut current = resource;
        let mut current_ty = ty.to_string();
        let mut expect_dollar = false;
        for segment in dotted.split('.') {
            if segment == "$" {
                if !expect_dollar {
                    errors.push(
                        ValidationError::new(
                            format!("\"$\" must follow a to-many relationship in \"{dotted}\""),
                            path.to_vec(),
                        )
                        .with_code("invalid_path"),
                    );
                    return;
                }
                expect_dollar = false;
                continue;
            }
            if expect_dollar {
                errors.push(
                    ValidationError::new(
                        format!("to-many hop must be followed by \"$\" in \"{dotted}\""),
                        path.to_vec(),
                    )
                    .with_code("invalid_path"),
                );
                return;
            }
            if let Some(rel) = current.relationship(segment) {
                expect_dollar = rel.cardinality == refract_api::Cardinality::Many;
                current_ty = rel.target.clone();
                current = match self.schema.resource(&rel.target) {
                    Some(next) => next,
                    None => return,
                };
            } else if current.attribute(segment).is_some() {
                return;
            } else {
                errors.push(
                    ValidationError::new(
                        format!(
                            "\"{segment}\" is neither an attribute nor a relationship of \"{current_ty}\""
                        ),
                        path.to_vec(),
                    )
                    .with_code("unknown_path_segment"),
                );
                return;
            }
        }
    }
}

fn child(path: &[String], tail: &[String]) -> Vec<String> {
    let mut out = path.to_vec();
    out.extend(tail.iter().cloned());
    out
}
