//! Nodes, hierarchy edges and reference edges.
//!
//! A [`Node`] is one concrete variant of an aggregate inside a single
//! (content stream, dimension space point). Nodes are immutable; the store
//! hands them out as `Arc<Node>` and an edit would produce a new value.

use std::collections::BTreeMap;

use contentgraph_core::{
    ContentStreamIdentifier, DimensionSpacePoint, NodeAggregateIdentifier, NodeIdentifier,
    NodeName, NodeTypeName, PropertyName,
};
use serde::{Deserialize, Serialize};

use crate::store::SubgraphScope;

/// A single variant-specific content unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub identifier: NodeIdentifier,
    pub aggregate_identifier: NodeAggregateIdentifier,
    pub content_stream_identifier: ContentStreamIdentifier,
    pub dimension_space_point: DimensionSpacePoint,
    pub node_type_name: NodeTypeName,
    /// Property values by name.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Hidden nodes are left out of subtrees unless invisible content is shown.
    #[serde(default)]
    pub hidden: bool,
}

impl Node {
    /// Create a node without properties.
    pub fn new(
        identifier: NodeIdentifier,
        aggregate_identifier: NodeAggregateIdentifier,
        scope: &SubgraphScope,
        node_type_name: NodeTypeName,
    ) -> Self {
        Self {
            identifier,
            aggregate_identifier,
            content_stream_identifier: scope.content_stream_identifier.clone(),
            dimension_space_point: scope.dimension_space_point.clone(),
            node_type_name,
            properties: BTreeMap::new(),
            hidden: false,
        }
    }

    /// Set a property value.
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Get a property value.
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// The (content stream, dimension space point) this node belongs to.
    pub fn scope(&self) -> SubgraphScope {
        SubgraphScope::new(
            self.content_stream_identifier.clone(),
            self.dimension_space_point.clone(),
        )
    }

    /// Whether this node belongs to `scope`.
    pub fn is_in_scope(&self, scope: &SubgraphScope) -> bool {
        self.content_stream_identifier == scope.content_stream_identifier
            && self.dimension_space_point == scope.dimension_space_point
    }
}

/// Parent-child link inside one scope.
///
/// `position` orders siblings; gaps are allowed. `name` is unique among the
/// direct children of `parent`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEdge {
    pub content_stream_identifier: ContentStreamIdentifier,
    pub dimension_space_point: DimensionSpacePoint,
    pub parent: NodeIdentifier,
    pub child: NodeIdentifier,
    pub name: NodeName,
    pub position: i64,
}

impl HierarchyEdge {
    pub fn new(
        scope: &SubgraphScope,
        parent: NodeIdentifier,
        child: NodeIdentifier,
        name: NodeName,
        position: i64,
    ) -> Self {
        Self {
            content_stream_identifier: scope.content_stream_identifier.clone(),
            dimension_space_point: scope.dimension_space_point.clone(),
            parent,
            child,
            name,
            position,
        }
    }

    pub fn scope(&self) -> SubgraphScope {
        SubgraphScope::new(
            self.content_stream_identifier.clone(),
            self.dimension_space_point.clone(),
        )
    }
}

/// A reference-valued property pointing at another aggregate.
///
/// Targets are aggregates, resolved to a node within the reading subgraph.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub source: NodeIdentifier,
    pub property_name: PropertyName,
    /// Order within the reference property.
    pub position: i64,
    pub target: NodeAggregateIdentifier,
}

impl ReferenceEdge {
    pub fn new(
        source: NodeIdentifier,
        property_name: PropertyName,
        position: i64,
        target: NodeAggregateIdentifier,
    ) -> Self {
        Self {
            source,
            property_name,
            position,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope() -> SubgraphScope {
        SubgraphScope::new(
            ContentStreamIdentifier::new("live").unwrap(),
            "language=en".parse().unwrap(),
        )
    }

    #[test]
    fn test_node_builder() {
        let node = Node::new(
            NodeIdentifier::new("n1").unwrap(),
            NodeAggregateIdentifier::new("agg-1").unwrap(),
            &scope(),
            NodeTypeName::new("Acme:Page").unwrap(),
        )
        .with_property("title", "Home")
        .with_hidden(true);

        assert_eq!(node.property("title"), Some(&serde_json::json!("Home")));
        assert!(node.property("missing").is_none());
        assert!(node.hidden);
        assert!(node.is_in_scope(&scope()));
        assert_eq!(node.scope(), scope());
    }

    #[test]
    fn test_node_not_in_other_scope() {
        let node = Node::new(
            NodeIdentifier::new("n1").unwrap(),
            NodeAggregateIdentifier::new("agg-1").unwrap(),
            &scope(),
            NodeTypeName::new("Acme:Page").unwrap(),
        );
        let draft = SubgraphScope::new(
            ContentStreamIdentifier::new("draft").unwrap(),
            "language=en".parse().unwrap(),
        );
        assert!(!node.is_in_scope(&draft));
    }

    #[test]
    fn test_node_deserialize_defaults() {
        let json = r#"{
            "identifier": "n1",
            "aggregate_identifier": "agg-1",
            "content_stream_identifier": "live",
            "dimension_space_point": {"language": "en"},
            "node_type_name": "Acme:Page"
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert!(node.properties.is_empty());
        assert!(!node.hidden);
        assert_eq!(node.dimension_space_point.coordinate("language"), Some("en"));
    }
}
