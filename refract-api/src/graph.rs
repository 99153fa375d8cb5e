use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::schema::Schema;
use crate::value::Value;

/// A typed pointer to a resource. Never an embedded value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ref {
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
}

impl Ref {
    pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            id: id.into(),
        }
    }

    /// The `{type, id}` object this ref projects to.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("type".to_string(), Value::String(self.ty.clone()));
        map.insert("id".to_string(), Value::String(self.id.clone()));
        Value::Object(map)
    }
}

/// Resource ids are strings; numeric ids in raw documents are stringified.
fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = serde_json::Value::deserialize(deserializer)?;
    id_from_json(&raw).ok_or_else(|| serde::de::Error::custom("id must be a string or number"))
}

/// Stringifies a scalar id. Returns `None` for non-scalar shapes.
pub fn id_from_json(raw: &serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The value of one relationship slot on a resource.
///
/// The cardinality invariant is structural: a to-one relationship holds
/// `Option<Ref>`, a to-many holds an id-deduped, insertion-ordered `Vec<Ref>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelValue {
    Many(Vec<Ref>),
    One(Option<Ref>),
}

impl RelValue {
    pub fn refs(&self) -> Vec<&Ref> {
        match self {
            RelValue::Many(refs) => refs.iter().collect(),
            RelValue::One(Some(r)) => vec![r],
            RelValue::One(None) => Vec::new(),
        }
    }

    /// Appends to a to-many slot, preserving order and deduping by id.
    pub fn push_unique(&mut self, r: Ref) {
        if let RelValue::Many(refs) = self
            && !refs.iter().any(|existing| existing.id == r.id)
        {
            refs.push(r);
        }
    }
}

/// A normalized resource: attributes plus relationship refs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type", default)]
    pub ty: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelValue>,
}

impl Resource {
    pub fn new(ty: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            ty: ty.into(),
            id: id.into(),
            attributes: BTreeMap::new(),
            relationships: BTreeMap::new(),
        }
    }

    pub fn to_ref(&self) -> Ref {
        Ref::new(self.ty.clone(), self.id.clone())
    }

    /// The attribute object expressions and filters run against.
    pub fn attribute_value(&self) -> Value {
        Value::Object(self.attributes.clone())
    }
}

/// The normalized in-memory store: `type -> id -> resource`.
///
/// Invariant (referential integrity): every [`Ref`] held by any relationship
/// resolves to an entry in the graph. Inverse consistency holds only after
/// the graph crate's `link_inverses` has run; it is not continuously
/// maintained.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Graph {
    pub types: BTreeMap<String, BTreeMap<String, Resource>>,
}

impl Graph {
    /// An empty graph with a bucket for every type the schema declares.
    pub fn empty_for(schema: &Schema) -> Self {
        Self {
            types: schema
                .resources
                .keys()
                .map(|ty| (ty.clone(), BTreeMap::new()))
                .collect(),
        }
    }

    /// Reads a raw normalized-graph document
    /// (`{ "<type>": { "<id>": { "attributes": …, "relationships": … } } }`),
    /// filling in each resource's positional type and id.
    pub fn from_value(raw: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let types: BTreeMap<String, BTreeMap<String, Resource>> =
            serde_json::from_value(raw.clone())?;
        let mut graph = Graph::default();
        for (ty, bucket) in types {
            let placed = bucket
                .into_iter()
                .map(|(id, mut resource)| {
                    resource.ty = ty.clone();
                    resource.id = id.clone();
                    (id, resource)
                })
                .collect();
            graph.types.insert(ty, placed);
        }
        Ok(graph)
    }

    pub fn get(&self, ty: &str, id: &str) -> Option<&Resource> {
        self.types.get(ty)?.get(id)
    }

    pub fn get_ref(&self, r: &Ref) -> Option<&Resource> {
        self.get(&r.ty, &r.id)
    }

    /// Inserts under the resource's own `(type, id)`, replacing any existing
    /// entry wholesale.
    pub fn insert(&mut self, resource: Resource) {
        self.types
            .entry(resource.ty.clone())
            .or_default()
            .insert(resource.id.clone(), resource);
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.types.values().flat_map(|bucket| bucket.values())
    }

    pub fn resources_of(&self, ty: &str) -> impl Iterator<Item = &Resource> {
        self.types.get(ty).into_iter().flat_map(|bucket| bucket.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn raw_graphs_gain_positional_type_and_id() {
        let graph = Graph::from_value(&json!({
            "bears": {
                "1": { "attributes": { "name": "Tenderheart Bear" } }
            }
        }))
        .unwrap();
        let bear = graph.get("bears", "1").unwrap();
        assert_eq!(bear.ty, "bears");
        assert_eq!(bear.id, "1");
        assert_eq!(
            bear.attributes.get("name"),
            Some(&Value::String("Tenderheart Bear".into()))
        );
    }

    #[test]
    fn rel_values_deserialize_by_shape() {
        let graph = Graph::from_value(&json!({
            "bears": {
                "1": {
                    "relationships": {
                        "home": { "type": "homes", "id": 5 },
                        "powers": [{ "type": "powers", "id": "stare" }]
                    }
                }
            }
        }))
        .unwrap();
        let bear = graph.get("bears", "1").unwrap();
        assert_eq!(
            bear.relationships.get("home"),
            Some(&RelValue::One(Some(Ref::new("homes", "5"))))
        );
        assert_eq!(
            bear.relationships.get("powers"),
            Some(&RelValue::Many(vec![Ref::new("powers", "stare")]))
        );
    }

    #[test]
    fn push_unique_dedupes_by_id() {
        let mut rel = RelValue::Many(vec![Ref::new("bears", "1")]);
        rel.push_unique(Ref::new("bears", "1"));
        rel.push_unique(Ref::new("bears", "2"));
        assert_eq!(rel.refs().len(), 2);
    }
}
