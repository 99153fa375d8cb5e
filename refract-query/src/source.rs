use std::convert::Infallible;

use refract_api::Graph;

use crate::normalize::NormalQuery;

/// A backend that can materialize the resources a normalized query needs.
///
/// Implementors return a [`Graph`] in exactly the executor's shape, so the
/// projection pipeline runs unchanged against any source — the in-memory
/// graph, or a store that compiles the query into its own fetch plan. The
/// returned graph only has to cover the query's reachable resources;
/// referential integrity within it is the implementor's contract.
pub trait GraphSource {
    type Error;

    fn fetch(&self, query: &NormalQuery) -> Result<Graph, Self::Error>;
}

/// The trivial source: an in-memory graph already holds everything.
impl GraphSource for Graph {
    type Error = Infallible;

    fn fetch(&self, _query: &NormalQuery) -> Result<Graph, Self::Error> {
        Ok(self.clone())
    }
}
