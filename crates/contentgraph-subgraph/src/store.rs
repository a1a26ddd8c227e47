//! Backing store contract.
//!
//! [`HierarchyStore`] is the boundary to whatever holds the materialized
//! hierarchy (a database projection, the in-memory [`HierarchyIndex`]).
//! Every call is scoped to one [`SubgraphScope`]; a store must never return
//! a node or edge from another scope.
//!
//! The subgraph treats all calls as potentially expensive and caches what
//! they return. Failures are passed through to the caller untouched.
//!
//! [`HierarchyIndex`]: crate::HierarchyIndex

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use contentgraph_core::{
    ContentStreamIdentifier, DimensionSpacePoint, NodeAggregateIdentifier, NodeIdentifier,
    NodeName, NodeTypeName, PropertyName, Result,
};
use serde::{Deserialize, Serialize};

use crate::Node;

/// The fixed (content stream, dimension space point) pair of a subgraph.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubgraphScope {
    pub content_stream_identifier: ContentStreamIdentifier,
    pub dimension_space_point: DimensionSpacePoint,
}

impl SubgraphScope {
    pub fn new(
        content_stream_identifier: ContentStreamIdentifier,
        dimension_space_point: DimensionSpacePoint,
    ) -> Self {
        Self {
            content_stream_identifier,
            dimension_space_point,
        }
    }
}

impl fmt::Display for SubgraphScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{{{}}}",
            self.content_stream_identifier, self.dimension_space_point
        )
    }
}

/// A child node together with the edge that connects it to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ChildEdge {
    pub node: Arc<Node>,
    pub name: NodeName,
    pub position: i64,
}

/// The edge from a child up to its parent.
#[derive(Clone, Debug, PartialEq)]
pub struct ParentEdge {
    pub parent: Arc<Node>,
    pub name: NodeName,
    pub position: i64,
}

/// Read access to the materialized hierarchy.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Resolve a node by its identifier.
    async fn node_by_identifier(
        &self,
        scope: &SubgraphScope,
        identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>>;

    /// Resolve the variant of an aggregate materialized in `scope`.
    async fn node_by_aggregate_identifier(
        &self,
        scope: &SubgraphScope,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>>;

    /// Children of `parent`, ordered by position then edge name.
    ///
    /// Empty for leaves and for unknown parents.
    async fn child_edges(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
    ) -> Result<Vec<ChildEdge>>;

    /// The edge to the parent of `child`, `None` for roots and unknown nodes.
    async fn parent_edge(
        &self,
        scope: &SubgraphScope,
        child: &NodeIdentifier,
    ) -> Result<Option<ParentEdge>>;

    /// The child of `parent` connected through `name`.
    ///
    /// The default scans [`child_edges`](Self::child_edges); indexed stores
    /// should override it.
    async fn child_by_edge_name(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
        name: &NodeName,
    ) -> Result<Option<Arc<Node>>> {
        Ok(self
            .child_edges(scope, parent)
            .await?
            .into_iter()
            .find(|edge| &edge.name == name)
            .map(|edge| edge.node))
    }

    /// Nodes referenced by `source`, through one property or all of them.
    ///
    /// Ordered by property name, then position within the property. Targets
    /// without a variant in `scope` are skipped.
    async fn references(
        &self,
        scope: &SubgraphScope,
        source: &NodeIdentifier,
        property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>>;

    /// All nodes in `scope` whose type is one of `type_names`.
    async fn nodes_by_type_names(
        &self,
        scope: &SubgraphScope,
        type_names: &[NodeTypeName],
    ) -> Result<Vec<Arc<Node>>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        let scope = SubgraphScope::new(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en,region=us".parse().unwrap(),
        );
        assert_eq!(scope.to_string(), "live@{language=en,region=us}");
    }

    #[test]
    fn test_scope_equality() {
        let a = SubgraphScope::new(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en".parse().unwrap(),
        );
        let b = SubgraphScope::new(
            ContentStreamIdentifier::new("draft").unwrap(),
            "language=en".parse().unwrap(),
        );
        assert_ne!(a, b);
        assert_eq!(a.clone(), a);
    }

    #[test]
    fn test_store_is_object_safe() {
        fn assert_object_safe(_: Option<&dyn HierarchyStore>) {}
        assert_object_safe(None);
    }
}
