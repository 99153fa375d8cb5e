use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError, ValidationError};

/// Declarative description of every resource type the graph may hold.
///
/// Constructed once via [`Schema::from_value`], checked against its own
/// invariants, and treated as immutable for the life of the process.
///
/// # Example
///
/// ```
/// use refract_api::Schema;
/// use serde_json::json;
///
/// let schema = Schema::from_value(&json!({
///     "resources": {
///         "bears": {
///             "attributes": { "id": {}, "name": { "type": "string" } },
///             "relationships": {
///                 "home": { "type": "homes", "cardinality": "one", "inverse": "residents" }
///             }
///         },
///         "homes": {
///             "attributes": { "id": {}, "name": { "type": "string" } },
///             "relationships": {
///                 "residents": { "type": "bears", "cardinality": "many", "inverse": "home" }
///             }
///         }
///     }
/// })).unwrap();
/// assert!(schema.resource("bears").is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub resources: BTreeMap<String, ResourceSchema>,
}

/// One resource type: its id attribute, plain attributes, and relationships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    #[serde(default = "default_id_attribute")]
    pub id_attribute: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeSchema>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipSchema>,
}

fn default_id_attribute() -> String {
    "id".to_string()
}

/// Attribute declaration. Structural validation of attribute *values* against
/// a metaschema is an external concern; the engine only needs the names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipSchema {
    /// The related resource type. Must be declared in the same schema.
    #[serde(rename = "type")]
    pub target: String,
    pub cardinality: Cardinality,
    /// Relationship name on the related type that mirrors this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inverse: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl Schema {
    /// Parses a schema document and checks its invariants: every relationship
    /// target must be a declared resource type, a declared `inverse` must name
    /// a relationship on the target type, and `idAttribute` must name a
    /// declared attribute.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self> {
        let schema: Schema = serde_json::from_value(raw.clone())?;
        let errors = schema.invariant_errors();
        if errors.is_empty() {
            Ok(schema)
        } else {
            Err(SchemaError::Invalid(errors))
        }
    }

    pub fn resource(&self, ty: &str) -> Option<&ResourceSchema> {
        self.resources.get(ty)
    }

    fn invariant_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for (type_name, resource) in &self.resources {
            if !resource.attributes.contains_key(&resource.id_attribute) {
                errors.push(
                    ValidationError::new(
                        format!(
                            "idAttribute \"{}\" is not a declared attribute",
                            resource.id_attribute
                        ),
                        vec!["resources".into(), type_name.clone(), "idAttribute".into()],
                    )
                    .with_code("unknown_id_attribute"),
                );
            }
            for (rel_name, rel) in &resource.relationships {
                let path = vec![
                    "resources".to_string(),
                    type_name.clone(),
                    "relationships".to_string(),
                    rel_name.clone(),
                ];
                let Some(target) = self.resources.get(&rel.target) else {
                    errors.push(
                        ValidationError::new(
                            format!("relationship targets undeclared type \"{}\"", rel.target),
                            path,
                        )
                        .with_code("unknown_relationship_type"),
                    );
                    continue;
                };
                if let Some(inverse) = &rel.inverse
                    && !target.relationships.contains_key(inverse)
                {
                    errors.push(
                        ValidationError::new(
                            format!(
                                "inverse \"{inverse}\" is not a relationship on \"{}\"",
                                rel.target
                            ),
                            path,
                        )
                        .with_code("unknown_inverse"),
                    );
                }
            }
        }
        errors
    }
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&AttributeSchema> {
        self.attributes.get(name)
    }

    pub fn relationship(&self, name: &str) -> Option<&RelationshipSchema> {
        self.relationships.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_schema() -> serde_json::Value {
        json!({
            "resources": {
                "bears": {
                    "attributes": { "id": {}, "name": { "type": "string" } },
                    "relationships": {
                        "home": { "type": "homes", "cardinality": "one", "inverse": "residents" }
                    }
                },
                "homes": {
                    "attributes": { "id": {}, "name": { "type": "string" } },
                    "relationships": {
                        "residents": { "type": "bears", "cardinality": "many", "inverse": "home" }
                    }
                }
            }
        })
    }

    #[test]
    fn parses_and_defaults_id_attribute() {
        let schema = Schema::from_value(&raw_schema()).unwrap();
        assert_eq!(schema.resource("bears").unwrap().id_attribute, "id");
        let home = schema.resource("bears").unwrap().relationship("home").unwrap();
        assert_eq!(home.target, "homes");
        assert_eq!(home.cardinality, Cardinality::One);
    }

    #[test]
    fn rejects_undeclared_relationship_target() {
        let mut raw = raw_schema();
        raw["resources"]["bears"]["relationships"]["home"]["type"] = json!("castles");
        let err = Schema::from_value(&raw).unwrap_err();
        match err {
            SchemaError::Invalid(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].code, Some("unknown_relationship_type"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_unknown_inverse_and_id_attribute() {
        let mut raw = raw_schema();
        raw["resources"]["homes"]["idAttribute"] = json!("uuid");
        raw["resources"]["bears"]["relationships"]["home"]["inverse"] = json!("tenants");
        let err = Schema::from_value(&raw).unwrap_err();
        match err {
            SchemaError::Invalid(errors) => {
                let codes: Vec<_> = errors.iter().filter_map(|e| e.code).collect();
                assert!(codes.contains(&"unknown_id_attribute"));
                assert!(codes.contains(&"unknown_inverse"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
