//! Structured document view of a subgraph.
//!
//! A [`SubgraphDocument`] records the coordinates of a subgraph and every
//! node and hierarchy edge its cache has materialized so far. It is meant
//! for inspection tooling and renders to JSON.

use std::collections::BTreeMap;

use contentgraph_core::{
    ContentStreamIdentifier, DimensionSpacePoint, Error, NodeAggregateIdentifier, NodeIdentifier,
    NodeName, NodeTypeName, Result,
};
use serde::{Deserialize, Serialize};

use crate::cache::MaterializedEdge;
use crate::node::Node;
use crate::subgraph::ContentSubgraph;

// ============================================================================
// Node / Edge summaries
// ============================================================================

/// Summary of a materialized node.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub identifier: NodeIdentifier,
    pub aggregate_identifier: NodeAggregateIdentifier,
    pub node_type_name: NodeTypeName,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl From<&Node> for NodeSummary {
    fn from(node: &Node) -> Self {
        Self {
            identifier: node.identifier.clone(),
            aggregate_identifier: node.aggregate_identifier.clone(),
            node_type_name: node.node_type_name.clone(),
            properties: node.properties.clone(),
            hidden: node.hidden,
        }
    }
}

/// Summary of a materialized hierarchy edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeSummary {
    pub parent: NodeIdentifier,
    pub child: NodeIdentifier,
    pub name: NodeName,
    pub position: i64,
}

impl From<&MaterializedEdge> for EdgeSummary {
    fn from(edge: &MaterializedEdge) -> Self {
        Self {
            parent: edge.parent.clone(),
            child: edge.child.clone(),
            name: edge.name.clone(),
            position: edge.position,
        }
    }
}

// ============================================================================
// Document
// ============================================================================

/// What a subgraph has materialized, with its coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubgraphDocument {
    pub content_stream_identifier: ContentStreamIdentifier,
    pub dimension_space_point: DimensionSpacePoint,
    /// Sorted by identifier.
    pub nodes: Vec<NodeSummary>,
    /// Sorted by parent, position, name.
    pub edges: Vec<EdgeSummary>,
}

impl SubgraphDocument {
    /// Render as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::serialization(format!("Failed to serialize subgraph: {e}")))
    }

    /// Identifiers of the children recorded for `parent`, in order.
    pub fn children_of(&self, parent: &NodeIdentifier) -> Vec<&NodeIdentifier> {
        self.edges
            .iter()
            .filter(|edge| &edge.parent == parent)
            .map(|edge| &edge.child)
            .collect()
    }
}

impl ContentSubgraph {
    /// Snapshot the cache as a [`SubgraphDocument`].
    pub fn to_document(&self) -> SubgraphDocument {
        let cache = self.in_memory_cache();
        SubgraphDocument {
            content_stream_identifier: self.content_stream_identifier().clone(),
            dimension_space_point: self.dimension_space_point().clone(),
            nodes: cache
                .materialized_nodes()
                .iter()
                .map(|node| NodeSummary::from(node.as_ref()))
                .collect(),
            edges: cache
                .materialized_edges()
                .iter()
                .map(EdgeSummary::from)
                .collect(),
        }
    }
}
