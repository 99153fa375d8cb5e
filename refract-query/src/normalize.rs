use std::collections::BTreeMap;

use refract_api::{Schema, id_from_json};
use refract_expr::{Expr, ExpressionEngine};
use serde_json::Value as Json;

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// One select entry in canonical form.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    /// A dotted path, possibly traversing relationships (`"home.name"`,
    /// `"residents.$.year_introduced"`).
    Path(String),
    /// A compiled expression applied to each resource.
    Expression(Expr),
    /// A nested query over the relationship the select key names.
    Subquery(Box<NormalQuery>),
}

/// The canonical, schema-resolved form of a query.
///
/// Select is always in map form (`"*"` and list shorthands expanded), every
/// subquery is stamped with its relationship's target type, `order` is always
/// a list, and `where` is compiled to an expression. A subquery with no
/// select (`select: None`) projects the bare `{type, id}` ref.
///
/// `limit`/`offset` keep their raw values; the executor enforces the
/// `limit >= 1` / `offset >= 0` invariants fatally at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalQuery {
    pub ty: String,
    pub id: Option<String>,
    pub select: Option<BTreeMap<String, Projection>>,
    pub where_clause: Option<Expr>,
    pub order: Vec<(String, Direction)>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Normalizes a raw query document. Assumes [`QueryValidator`] admitted it;
/// structural surprises still surface as [`QueryError::Malformed`] rather
/// than panics.
///
/// [`QueryValidator`]: crate::QueryValidator
pub fn normalize_query(
    schema: &Schema,
    raw: &Json,
    engine: &ExpressionEngine,
) -> Result<NormalQuery> {
    let ty = raw
        .get("type")
        .and_then(Json::as_str)
        .ok_or_else(|| QueryError::Malformed("query requires a \"type\"".to_string()))?;
    normalize_level(schema, ty, raw, engine, true)
}

fn normalize_level(
    schema: &Schema,
    ty: &str,
    raw: &Json,
    engine: &ExpressionEngine,
    top_level: bool,
) -> Result<NormalQuery> {
    if schema.resource(ty).is_none() {
        return Err(QueryError::UnknownType(ty.to_string()));
    }
    let query = raw
        .as_object()
        .ok_or_else(|| QueryError::Malformed("query must be an object".to_string()))?;

    let select = match query.get("select") {
        None if top_level => {
            return Err(QueryError::Malformed("query requires a select".to_string()));
        }
        None => None,
        Some(raw_select) => Some(normalize_select(schema, ty, raw_select, engine)?),
    };

    let where_clause = query
        .get("where")
        .map(|w| engine.normalize_where_clause(w))
        .transpose()?;

    let order = match query.get("order") {
        None => Vec::new(),
        Some(order) => normalize_order(order)?,
    };

    Ok(NormalQuery {
        ty: ty.to_string(),
        id: query.get("id").and_then(id_from_json),
        select,
        where_clause,
        order,
        limit: query.get("limit").and_then(Json::as_i64),
        offset: query.get("offset").and_then(Json::as_i64),
    })
}

fn normalize_select(
    schema: &Schema,
    ty: &str,
    raw_select: &Json,
    engine: &ExpressionEngine,
) -> Result<BTreeMap<String, Projection>> {
    let resource = schema
        .resource(ty)
        .ok_or_else(|| QueryError::UnknownType(ty.to_string()))?;
    let star = || {
        resource
            .attributes
            .keys()
            .map(|attr| (attr.clone(), Projection::Path(attr.clone())))
    };

    let mut select = BTreeMap::new();
    match raw_select {
        Json::String(s) if s == "*" => select.extend(star()),
        Json::Array(items) => {
            for item in items {
                match item.as_str() {
                    Some("*") => select.extend(star()),
                    Some(attr) => {
                        select.insert(attr.to_string(), Projection::Path(attr.to_string()));
                    }
                    None => {
                        return Err(QueryError::Malformed(
                            "select array entries must be strings".to_string(),
                        ));
                    }
                }
            }
        }
        Json::Object(entries) => {
            for (key, value) in entries {
                let projection = match value {
                    Json::String(s) if s == "*" => {
                        return Err(QueryError::Malformed(
                            "\"*\" is not a select value; use it as a key-less form".to_string(),
                        ));
                    }
                    Json::String(path) => Projection::Path(path.clone()),
                    Json::Object(_) => match resource.relationship(key) {
                        Some(rel) => Projection::Subquery(Box::new(normalize_level(
                            schema, &rel.target, value, engine, false,
                        )?)),
                        None => Projection::Expression(engine.parse(value)),
                    },
                    other => {
                        return Err(QueryError::Malformed(format!(
                            "invalid select value for \"{key}\": {other}"
                        )));
                    }
                };
                select.insert(key.clone(), projection);
            }
        }
        other => {
            return Err(QueryError::Malformed(format!("invalid select: {other}")));
        }
    }
    Ok(select)
}

fn normalize_order(order: &Json) -> Result<Vec<(String, Direction)>> {
    let entries: Vec<&Json> = match order {
        Json::Array(items) => items.iter().collect(),
        single => vec![single],
    };
    let mut out = Vec::new();
    for entry in entries {
        let map = entry.as_object().ok_or_else(|| {
            QueryError::Malformed("order entries must be objects".to_string())
        })?;
        for (attr, direction) in map {
            let direction = match direction.as_str() {
                Some("asc") => Direction::Asc,
                Some("desc") => Direction::Desc,
                _ => {
                    return Err(QueryError::Malformed(format!(
                        "order direction for \"{attr}\" must be \"asc\" or \"desc\""
                    )));
                }
            };
            out.push((attr.clone(), direction));
        }
    }
    Ok(out)
}
