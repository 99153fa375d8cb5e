//! # Refract
//!
//! **Schema-driven in-memory resource graphs with declarative queries.**
//!
//! Refract takes a declarative schema describing typed resources, their
//! attributes, and their (possibly bidirectional) relationships, builds a
//! normalized in-memory graph from raw or tree-shaped data, and runs
//! declarative queries against it — filtering, sorting, paginating, and
//! projecting nested or aggregated data through a small extensible
//! expression language.
//!
//! ## Quickstart
//!
//! ```
//! use refract::MemoryStore;
//! use refract_api::Schema;
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "resources": {
//!         "bears": {
//!             "attributes": { "id": {}, "name": { "type": "string" } },
//!             "relationships": {
//!                 "home": { "type": "homes", "cardinality": "one", "inverse": "residents" }
//!             }
//!         },
//!         "homes": {
//!             "attributes": { "id": {}, "name": { "type": "string" } },
//!             "relationships": {
//!                 "residents": { "type": "bears", "cardinality": "many", "inverse": "home" }
//!             }
//!         }
//!     }
//! })).unwrap();
//!
//! let mut store = MemoryStore::new(schema);
//! store.load_trees("homes", &[json!({
//!     "id": "1",
//!     "name": "Care-a-Lot",
//!     "residents": [{ "id": "1", "name": "Tenderheart Bear" }]
//! })]).unwrap();
//!
//! let out = store.query(&json!({
//!     "type": "bears",
//!     "id": "1",
//!     "select": { "name": "name", "home_name": "home.name" }
//! })).unwrap();
//! assert_eq!(
//!     out.into_json(),
//!     json!({ "name": "Tenderheart Bear", "home_name": "Care-a-Lot" })
//! );
//! ```
//!
//! ## Crates
//!
//! - [`refract_api`]: the shared data model ([`Value`], [`Schema`],
//!   [`Graph`], refs and resources);
//! - [`refract_expr`]: the expression engine and its operation registry;
//! - [`refract_graph`]: inverse linking, merging, tree extraction;
//! - [`refract_query`]: validation, normalization, and the executor.
//!
//! The whole engine is synchronous and pure: no I/O, no hidden suspension
//! points, inputs treated as immutable. Callers needing async or
//! storage-backed behavior wrap the engine behind their own boundary.

mod error;

pub use error::{Error, Result};
pub use refract_api::{
    Cardinality, Graph, Ref, RelValue, Resource, Schema, ValidationError, Value,
};
pub use refract_expr::{ControlOperation, Expr, ExpressionEngine, Operation};
pub use refract_graph::{graph_from_trees, link_inverses, merge_graphs};
pub use refract_query::{
    GraphSource, NormalQuery, PreparedGraph, QueryValidator, normalize_query, prep_graph,
    run_query,
};

use serde_json::Value as Json;

/// An in-memory store: one schema, one expression engine, one graph.
///
/// `MemoryStore` wires the crates together for the common case — load
/// tree-shaped data, let inverse relationships link themselves, and query.
/// For finer control (custom ingestion, reusing a validator, running many
/// queries against one prepared view) use the member crates directly.
pub struct MemoryStore {
    schema: Schema,
    engine: ExpressionEngine,
    graph: Graph,
}

impl MemoryStore {
    /// An empty store over `schema` with the built-in operation catalogue.
    pub fn new(schema: Schema) -> Self {
        Self::with_engine(schema, ExpressionEngine::new())
    }

    /// An empty store with a caller-extended expression engine.
    pub fn with_engine(schema: Schema, engine: ExpressionEngine) -> Self {
        let graph = Graph::empty_for(&schema);
        Self {
            schema,
            engine,
            graph,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn engine(&self) -> &ExpressionEngine {
        &self.engine
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Extracts tree-shaped resources of `root_type`, links declared inverse
    /// relationships, and merges the result into the held graph (incoming
    /// data wins conflicts).
    pub fn load_trees(&mut self, root_type: &str, trees: &[Json]) -> Result<()> {
        let incoming = graph_from_trees(&self.schema, root_type, trees)?;
        let merged = merge_graphs(std::mem::take(&mut self.graph), incoming);
        self.graph = link_inverses(&self.schema, merged);
        tracing::debug!(root = root_type, trees = trees.len(), "loaded trees");
        Ok(())
    }

    /// Merges an already-normalized graph into the store, the incoming side
    /// winning conflicts. No inverse linking is performed.
    pub fn merge_graph(&mut self, incoming: Graph) {
        self.graph = merge_graphs(std::mem::take(&mut self.graph), incoming);
    }

    /// Validates, normalizes, and runs a raw query document.
    ///
    /// Validation problems are returned together as
    /// [`Error::InvalidQuery`]; execution-time invariant violations surface
    /// as [`Error::Query`].
    pub fn query(&self, raw: &Json) -> Result<Value> {
        let validator = QueryValidator::new(&self.schema, Some(&self.engine));
        let errors = validator.validate(raw);
        if !errors.is_empty() {
            return Err(Error::InvalidQuery(errors));
        }
        let normal = normalize_query(&self.schema, raw, &self.engine)?;
        let view = prep_graph(&self.graph);
        Ok(run_query(&normal, &view, &self.engine)?)
    }
}
