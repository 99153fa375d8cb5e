use std::collections::BTreeMap;

use refract_api::{RelValue, Resource, Value, compare_values};
use refract_expr::{Expr, ExpressionEngine};

use crate::error::{QueryError, Result};
use crate::normalize::{Direction, NormalQuery, Projection};
use crate::prepared::PreparedGraph;

/// Runs a normalized query against a prepared graph view.
///
/// The pipeline is fixed and order-significant: `where` filters, `order`
/// sorts (stable, multi-key), `limit`/`offset` slice, `select` projects.
/// A query without an id returns the full projected array; a query with an
/// id returns one projected object, or `Null` when the resource is absent.
///
/// Any violated invariant — a bad limit or offset, a missing sort attribute,
/// an undefined relationship, a dangling ref — aborts the whole query; there
/// are no partial results.
pub fn run_query(
    query: &NormalQuery,
    view: &PreparedGraph<'_>,
    engine: &ExpressionEngine,
) -> Result<Value> {
    tracing::debug!(ty = %query.ty, id = ?query.id, "running query");
    let bucket = view
        .bucket(&query.ty)
        .ok_or_else(|| QueryError::UnknownType(query.ty.clone()))?;
    match &query.id {
        Some(id) => match bucket.get(id) {
            None => Ok(Value::Null),
            Some(resource) => {
                let projected = run_pipeline(vec![resource], query, view, engine)?;
                Ok(projected.into_iter().next().unwrap_or(Value::Null))
            }
        },
        None => run_pipeline(bucket.values().collect(), query, view, engine).map(Value::Array),
    }
}

fn run_pipeline(
    mut resources: Vec<&Resource>,
    query: &NormalQuery,
    view: &PreparedGraph<'_>,
    engine: &ExpressionEngine,
) -> Result<Vec<Value>> {
    if let Some(where_clause) = &query.where_clause {
        let mut kept = Vec::with_capacity(resources.len());
        for resource in resources {
            if engine
                .apply(where_clause, &resource.attribute_value())?
                .is_truthy()
            {
                kept.push(resource);
            }
        }
        resources = kept;
    }

    if !query.order.is_empty() {
        if let Some(first) = resources.first() {
            for (attr, _) in &query.order {
                if !first.attributes.contains_key(attr) {
                    return Err(QueryError::MissingSortAttribute(attr.clone()));
                }
            }
        }
        resources.sort_by(|a, b| {
            for (attr, direction) in &query.order {
                let left = a.attributes.get(attr).unwrap_or(&Value::Undefined);
                let right = b.attributes.get(attr).unwrap_or(&Value::Undefined);
                match compare_values(left, right) {
                    Some(std::cmp::Ordering::Equal) | None => continue,
                    Some(ordering) => {
                        return match direction {
                            Direction::Asc => ordering,
                            Direction::Desc => ordering.reverse(),
                        };
                    }
                }
            }
            std::cmp::Ordering::Equal
        });
    }

    let offset = match query.offset {
        Some(o) if o < 0 => return Err(QueryError::InvalidOffset(o)),
        Some(o) => o as usize,
        None => 0,
    };
    if let Some(limit) = query.limit {
        if limit < 1 {
            return Err(QueryError::InvalidLimit(limit));
        }
        resources = resources
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();
    } else if query.offset.is_some() {
        resources = resources.into_iter().skip(offset).collect();
    }

    match &query.select {
        // No select: the bare-ref projection of a selectless subquery.
        None => Ok(resources
            .iter()
            .map(|resource| resource.to_ref().to_value())
            .collect()),
        Some(select) => resources
            .iter()
            .map(|resource| project(resource, select, view, engine))
            .collect(),
    }
}

fn project(
    resource: &Resource,
    select: &BTreeMap<String, Projection>,
    view: &PreparedGraph<'_>,
    engine: &ExpressionEngine,
) -> Result<Value> {
    let mut out = BTreeMap::new();
    for (key, projection) in select {
        let value = match projection {
            Projection::Path(path) => walk_path(resource, path, view)?,
            Projection::Expression(expr) => {
                let distributed = distribute_paths(expr, resource, view)?;
                engine.apply(&distributed, &resource.attribute_value())?
            }
            Projection::Subquery(subquery) => {
                project_relationship(resource, key, subquery, view, engine)?
            }
        };
        // Undefined results leave the key off the projection entirely.
        if !value.is_undefined() {
            out.insert(key.clone(), value);
        }
    }
    Ok(Value::Object(out))
}

fn project_relationship(
    resource: &Resource,
    rel_name: &str,
    subquery: &NormalQuery,
    view: &PreparedGraph<'_>,
    engine: &ExpressionEngine,
) -> Result<Value> {
    // A relationship the resource does not carry at all is a graph/schema
    // inconsistency, not an empty result.
    let rel = resource.relationships.get(rel_name).ok_or_else(|| {
        QueryError::UndefinedRelationship {
            ty: resource.ty.clone(),
            id: resource.id.clone(),
            relationship: rel_name.to_string(),
        }
    })?;
    match rel {
        RelValue::One(None) => Ok(Value::Null),
        RelValue::One(Some(r)) => {
            let related = view.dereference(r)?;
            let projected = run_pipeline(vec![related], subquery, view, engine)?;
            Ok(projected.into_iter().next().unwrap_or(Value::Null))
        }
        RelValue::Many(refs) => {
            let related = refs
                .iter()
                .map(|r| view.dereference(r))
                .collect::<Result<Vec<_>>>()?;
            run_pipeline(related, subquery, view, engine).map(Value::Array)
        }
    }
}

/// Walks a dotted path from a resource, hopping relationships field by field.
///
/// A `$` segment maps over a to-many hop, flattening deeper `$` results and
/// dropping holes. A to-one hop that is `null` short-circuits the whole path
/// to `Null`; a missing attribute or non-terminal hop yields `Undefined`.
fn walk_path(resource: &Resource, path: &str, view: &PreparedGraph<'_>) -> Result<Value> {
    let segments: Vec<&str> = path.split('.').collect();
    walk_resource(resource, &segments, view, path)
}

fn walk_resource(
    resource: &Resource,
    segments: &[&str],
    view: &PreparedGraph<'_>,
    full_path: &str,
) -> Result<Value> {
    let Some((head, rest)) = segments.split_first() else {
        // The path ended on a resource; project its ref.
        return Ok(resource.to_ref().to_value());
    };
    if *head == "$" {
        return Err(QueryError::MalformedPath {
            path: full_path.to_string(),
            reason: "\"$\" must follow a to-many relationship",
        });
    }

    if let Some(rel) = resource.relationships.get(*head) {
        return match rel {
            RelValue::One(None) => Ok(Value::Null),
            RelValue::One(Some(r)) => walk_resource(view.dereference(r)?, rest, view, full_path),
            RelValue::Many(refs) => {
                let [dollar, tail @ ..] = rest else {
                    return Ok(Value::Array(refs.iter().map(|r| r.to_value()).collect()));
                };
                if *dollar != "$" {
                    return Err(QueryError::MalformedPath {
                        path: full_path.to_string(),
                        reason: "a to-many hop must be followed by \"$\"",
                    });
                }
                let flatten = tail.contains(&"$");
                let mut out = Vec::new();
                for r in refs {
                    match walk_resource(view.dereference(r)?, tail, view, full_path)? {
                        Value::Undefined => {}
                        Value::Array(items) if flatten => out.extend(items),
                        value => out.push(value),
                    }
                }
                Ok(Value::Array(out))
            }
        };
    }

    match resource.attributes.get(*head) {
        None => Ok(Value::Undefined),
        Some(value) => walk_value(value.clone(), rest),
    }
}

fn walk_value(mut current: Value, segments: &[&str]) -> Result<Value> {
    for segment in segments {
        current = match current {
            Value::Null => return Ok(Value::Null),
            Value::Object(mut map) => map.remove(*segment).unwrap_or(Value::Undefined),
            _ => return Ok(Value::Undefined),
        };
    }
    Ok(current)
}

/// Rewrites relationship-path strings inside a select expression into their
/// gathered values, so expressions reference nested to-many paths uniformly
/// (`{"count": "residents"}`, `{"min": "residents.$.year_introduced"}`).
///
/// Only strings whose first segment names a relationship of the projected
/// resource are rewritten; attribute references stay strings and are read
/// with `get`.
fn distribute_paths(
    expr: &Expr,
    resource: &Resource,
    view: &PreparedGraph<'_>,
) -> Result<Expr> {
    Ok(match expr {
        Expr::Literal(Value::String(path)) => {
            let first = path.split('.').next().unwrap_or_default();
            if resource.relationships.contains_key(first) {
                Expr::Literal(walk_path(resource, path, view)?)
            } else {
                expr.clone()
            }
        }
        Expr::Literal(_) => expr.clone(),
        Expr::Array(items) => Expr::Array(
            items
                .iter()
                .map(|item| distribute_paths(item, resource, view))
                .collect::<Result<Vec<_>>>()?,
        ),
        Expr::Object(map) => Expr::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), distribute_paths(v, resource, view)?)))
                .collect::<Result<BTreeMap<_, _>>>()?,
        ),
        Expr::Call { op, operand } => Expr::Call {
            op: op.clone(),
            operand: Box::new(distribute_paths(operand, resource, view)?),
        },
    })
}
