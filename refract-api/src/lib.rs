//! Shared data model for the Refract query engine.
//!
//! This crate defines the types every other Refract crate speaks:
//! [`Value`] (the JSON-shaped runtime value, with an explicit
//! [`Value::Undefined`] absence marker), [`Schema`] (the validated,
//! immutable description of resource types), and the normalized graph
//! surface ([`Graph`], [`Resource`], [`Ref`], [`RelValue`]).

mod error;
mod graph;
mod schema;
mod value;

pub use error::{SchemaError, ValidationError};
pub use graph::{Graph, Ref, RelValue, Resource, id_from_json};
pub use schema::{AttributeSchema, Cardinality, RelationshipSchema, ResourceSchema, Schema};
pub use value::{Value, compare_values, values_equal};
