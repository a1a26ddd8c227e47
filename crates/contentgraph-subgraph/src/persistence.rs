//! JSON hierarchy fixtures.
//!
//! A fixture holds node type declarations, nodes of any number of scopes,
//! hierarchy edges and reference edges. Loading replays it into a
//! [`HierarchyIndex`], so an inconsistent fixture fails with the same
//! errors the index raises while loading.

use std::path::Path;

use contentgraph_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyIndex;
use crate::node::{HierarchyEdge, Node, ReferenceEdge};
use crate::node_type::{NodeTypeDeclaration, NodeTypeSchema, StaticNodeTypeSchema};

// ============================================================================
// Serializable types
// ============================================================================

/// On-disk form of a hierarchy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SerializableHierarchy {
    #[serde(default)]
    pub node_types: Vec<NodeTypeDeclaration>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<HierarchyEdge>,
    #[serde(default)]
    pub references: Vec<ReferenceEdge>,
}

impl SerializableHierarchy {
    /// Capture an index and its schema.
    pub fn capture(index: &HierarchyIndex, schema: &StaticNodeTypeSchema) -> Self {
        let scopes = index.scopes();
        Self {
            node_types: schema.declarations(),
            nodes: scopes
                .iter()
                .flat_map(|scope| index.nodes_in_scope(scope))
                .map(|node| node.as_ref().clone())
                .collect(),
            edges: scopes
                .iter()
                .flat_map(|scope| index.edges_in_scope(scope))
                .collect(),
            references: index.all_references(),
        }
    }

    /// Replay into a fresh index and schema.
    pub fn into_hierarchy(self) -> Result<(HierarchyIndex, StaticNodeTypeSchema)> {
        let schema = StaticNodeTypeSchema::from_declarations(self.node_types)?;

        let mut index = HierarchyIndex::new();
        for node in self.nodes {
            if !schema.has_node_type(&node.node_type_name) {
                return Err(Error::unknown_node_type(format!(
                    "{} (node '{}')",
                    node.node_type_name, node.identifier
                )));
            }
            index.add_node(node)?;
        }
        for edge in self.edges {
            index.connect(edge)?;
        }
        for reference in self.references {
            index.add_reference(reference)?;
        }

        Ok((index, schema))
    }
}

// ============================================================================
// Save / Load
// ============================================================================

/// Save an index and its schema as a JSON fixture.
pub fn save_hierarchy(
    index: &HierarchyIndex,
    schema: &StaticNodeTypeSchema,
    path: impl AsRef<Path>,
) -> Result<()> {
    let serializable = SerializableHierarchy::capture(index, schema);

    let json = serde_json::to_string_pretty(&serializable)
        .map_err(|e| Error::serialization(format!("Failed to serialize hierarchy: {e}")))?;

    std::fs::write(path.as_ref(), json).map_err(|e| Error::io_with_path(e, path.as_ref()))?;

    log::info!(
        "saved {} nodes and {} edges to {}",
        index.node_count(),
        index.edge_count(),
        path.as_ref().display()
    );
    Ok(())
}

/// Load a JSON fixture.
pub fn load_hierarchy(path: impl AsRef<Path>) -> Result<(HierarchyIndex, StaticNodeTypeSchema)> {
    let json = std::fs::read_to_string(path.as_ref())
        .map_err(|e| Error::io_with_path(e, path.as_ref()))?;

    let loaded = load_hierarchy_from_str(&json)?;
    log::info!(
        "loaded {} nodes and {} edges from {}",
        loaded.0.node_count(),
        loaded.0.edge_count(),
        path.as_ref().display()
    );
    Ok(loaded)
}

/// Load a fixture from a JSON string.
pub fn load_hierarchy_from_str(json: &str) -> Result<(HierarchyIndex, StaticNodeTypeSchema)> {
    let serializable: SerializableHierarchy = serde_json::from_str(json)
        .map_err(|e| Error::parse(format!("Failed to parse hierarchy JSON: {e}")))?;

    serializable.into_hierarchy()
}
