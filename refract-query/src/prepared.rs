use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use refract_api::{Graph, Ref, Resource};

use crate::error::{QueryError, Result};

/// Read-only execution view over a graph.
///
/// Ref dereferencing goes through an explicit memo arena: the first
/// resolution of a given [`Ref`] does the bucket lookup (failing fatally on a
/// dangling ref), later ones are cache hits. The view never mutates its
/// source graph, and one view's memo lives only as long as the view.
pub struct PreparedGraph<'g> {
    graph: &'g Graph,
    memo: RefCell<HashMap<Ref, &'g Resource>>,
}

/// Wraps a graph for query execution.
pub fn prep_graph(graph: &Graph) -> PreparedGraph<'_> {
    PreparedGraph {
        graph,
        memo: RefCell::new(HashMap::new()),
    }
}

impl<'g> PreparedGraph<'g> {
    pub fn graph(&self) -> &'g Graph {
        self.graph
    }

    pub fn bucket(&self, ty: &str) -> Option<&'g BTreeMap<String, Resource>> {
        self.graph.types.get(ty)
    }

    /// Resolves a ref to its resource, memoized per view.
    pub fn dereference(&self, r: &Ref) -> Result<&'g Resource> {
        if let Some(hit) = self.memo.borrow().get(r).copied() {
            return Ok(hit);
        }
        let resolved = self
            .graph
            .get_ref(r)
            .ok_or_else(|| QueryError::DanglingRef(r.clone()))?;
        self.memo.borrow_mut().insert(r.clone(), resolved);
        Ok(resolved)
    }
}
