//! Contentgraph Subgraph: read-side queries over one content stream and
//! dimension space point.
//!
//! A [`ContentGraph`] hands out [`ContentSubgraph`]s; each subgraph answers
//! structural queries (lookup, children, parent, siblings, paths,
//! references, traversal, subtrees) for its fixed scope, caching what it
//! resolves from the [`HierarchyStore`].
//!
//! # Modules
//!
//! - [`node`]: Nodes, hierarchy edges, reference edges
//! - [`node_type`]: Node type schema and resolved constraints
//! - [`store`]: Backing store contract
//! - [`hierarchy`]: petgraph-backed in-memory store
//! - [`cache`]: Per-subgraph cache
//! - [`subgraph`]: The query surface
//! - [`traversal`]: Depth-first walks
//! - [`subtree`]: Bounded subtree extraction
//! - [`graph`]: Subgraph factory
//! - [`document`]: Serializable view of a subgraph
//! - [`persistence`]: JSON fixtures
//! - [`validation`]: Hierarchy checks

#![doc = include_str!("../README.md")]

pub mod cache;
pub mod document;
pub mod graph;
pub mod hierarchy;
pub mod node;
pub mod node_type;
pub mod persistence;
pub mod store;
pub mod subgraph;
pub mod subtree;
pub mod traversal;
pub mod validation;

#[cfg(any(test, feature = "test-utils"))]
pub mod fixtures;

// Re-export key types at crate root for convenience
pub use cache::{InMemoryCache, MaterializedEdge};
pub use document::{EdgeSummary, NodeSummary, SubgraphDocument};
pub use graph::ContentGraph;
pub use hierarchy::HierarchyIndex;
pub use node::{HierarchyEdge, Node, ReferenceEdge};
pub use node_type::{
    NodeTypeDeclaration, NodeTypeSchema, ResolvedNodeTypeConstraints, StaticNodeTypeSchema,
};
pub use persistence::{
    SerializableHierarchy, load_hierarchy, load_hierarchy_from_str, save_hierarchy,
};
pub use store::{ChildEdge, HierarchyStore, ParentEdge, SubgraphScope};
pub use subgraph::{ContentSubgraph, SubgraphSettings};
pub use subtree::{ContextParameters, Subtree, Subtrees};
pub use traversal::HierarchyTraversalDirection;
pub use validation::{ValidationIssue, ValidationReport, validate_hierarchy};
