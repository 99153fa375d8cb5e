//! Graph construction and maintenance for Refract.
//!
//! Three operations turn raw or tree-shaped data into the normalized
//! [`Graph`](refract_api::Graph) the executor reads:
//!
//! - [`graph_from_trees`] extracts nested resource payloads into typed
//!   buckets, recording [`Ref`](refract_api::Ref)s where the trees embedded
//!   whole objects;
//! - [`link_inverses`] repairs declared inverse relationships with
//!   back-references (additive, idempotent);
//! - [`merge_graphs`] unions two graphs, the right side winning conflicts.

mod error;
mod link;
mod merge;
mod trees;

pub use error::{GraphError, Result};
pub use link::link_inverses;
pub use merge::merge_graphs;
pub use trees::graph_from_trees;
