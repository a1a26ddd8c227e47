//! Per-subgraph in-memory cache.
//!
//! Every [`ContentSubgraph`](crate::ContentSubgraph) owns exactly one
//! [`InMemoryCache`]. It memoizes what the subgraph resolved from the store
//! (nodes, aggregate lookups, parent and child edges, edge name lookups,
//! paths, references, subtrees) and
//! lives exactly as long as the subgraph; nothing is ever evicted.
//!
//! Lookups may race to populate the same key. The first writer wins and
//! every racer gets the winning value back; resolutions are idempotent, so
//! either value is correct.
//!
//! Collaborators get a narrow surface: read-only introspection plus
//! `warm_*` operations for bulk prefetching.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use contentgraph_core::{
    Error, NodeAggregateIdentifier, NodeIdentifier, NodeName, NodePath, NodeTypeConstraints,
    PropertyName, Result,
};

use crate::node::Node;
use crate::store::{ChildEdge, ParentEdge, SubgraphScope};
use crate::subtree::Subtree;

/// A hierarchy edge the cache has seen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MaterializedEdge {
    pub parent: NodeIdentifier,
    pub child: NodeIdentifier,
    pub name: NodeName,
    pub position: i64,
}

/// Cache key for one subtree entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct SubtreeKey {
    pub aggregate_identifier: NodeAggregateIdentifier,
    pub max_levels: usize,
    pub constraints: NodeTypeConstraints,
    pub invisible_content_shown: bool,
}

#[derive(Debug, Default)]
struct CacheState {
    nodes: HashMap<NodeIdentifier, Arc<Node>>,
    aggregates: HashMap<NodeAggregateIdentifier, NodeIdentifier>,
    /// `None` records a known root.
    parents: HashMap<NodeIdentifier, Option<ParentEdge>>,
    children: HashMap<NodeIdentifier, Arc<Vec<ChildEdge>>>,
    /// `None` records a known miss.
    edge_names: HashMap<(NodeIdentifier, NodeName), Option<NodeIdentifier>>,
    paths: HashMap<NodeIdentifier, NodePath>,
    path_lookups: HashMap<(NodeIdentifier, String), NodeIdentifier>,
    references: HashMap<(NodeIdentifier, Option<PropertyName>), Vec<NodeIdentifier>>,
    subtrees: HashMap<SubtreeKey, Subtree>,
}

impl CacheState {
    fn remember_node(&mut self, node: Arc<Node>) -> Arc<Node> {
        self.aggregates
            .entry(node.aggregate_identifier.clone())
            .or_insert_with(|| node.identifier.clone());
        self.nodes
            .entry(node.identifier.clone())
            .or_insert(node)
            .clone()
    }

    fn resolve(&self, identifiers: &[NodeIdentifier]) -> Vec<Arc<Node>> {
        identifiers
            .iter()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect()
    }
}

/// Process-local cache owned by one subgraph.
#[derive(Debug)]
pub struct InMemoryCache {
    scope: SubgraphScope,
    state: RwLock<CacheState>,
}

impl InMemoryCache {
    /// Create an empty cache for `scope`.
    pub fn new(scope: SubgraphScope) -> Self {
        Self {
            scope,
            state: RwLock::new(CacheState::default()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_in_scope(&self, node: &Node) -> Result<()> {
        if node.is_in_scope(&self.scope) {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!(
                "node '{}' belongs to {}, not {}",
                node.identifier,
                node.scope(),
                self.scope
            )))
        }
    }

    // ------------------------------------------------------------------------
    // Public surface
    // ------------------------------------------------------------------------

    /// The scope this cache belongs to.
    pub fn scope(&self) -> &SubgraphScope {
        &self.scope
    }

    /// A cached node, if present.
    pub fn node(&self, identifier: &NodeIdentifier) -> Option<Arc<Node>> {
        self.read().nodes.get(identifier).cloned()
    }

    pub fn contains_node(&self, identifier: &NodeIdentifier) -> bool {
        self.read().nodes.contains_key(identifier)
    }

    /// Number of cached nodes.
    pub fn len(&self) -> usize {
        self.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().nodes.is_empty()
    }

    /// Prefetch a node.
    pub fn warm_node(&self, node: Arc<Node>) -> Result<()> {
        self.ensure_in_scope(&node)?;
        self.write().remember_node(node);
        Ok(())
    }

    /// Prefetch the complete, ordered child list of `parent`.
    pub fn warm_child_edges(&self, parent: &NodeIdentifier, children: Vec<ChildEdge>) -> Result<()> {
        for child in &children {
            self.ensure_in_scope(&child.node)?;
        }
        self.put_children(parent, children);
        Ok(())
    }

    /// Cached nodes sorted by identifier.
    pub fn materialized_nodes(&self) -> Vec<Arc<Node>> {
        let mut nodes: Vec<_> = self.read().nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        nodes
    }

    /// Every edge learned from child lists or parent lookups, deduplicated
    /// and sorted by parent, position, name.
    pub fn materialized_edges(&self) -> Vec<MaterializedEdge> {
        let state = self.read();
        let mut edges: HashMap<NodeIdentifier, MaterializedEdge> = HashMap::new();

        for (parent, children) in &state.children {
            for child in children.iter() {
                edges
                    .entry(child.node.identifier.clone())
                    .or_insert_with(|| MaterializedEdge {
                        parent: parent.clone(),
                        child: child.node.identifier.clone(),
                        name: child.name.clone(),
                        position: child.position,
                    });
            }
        }
        for (child, parent_edge) in &state.parents {
            if let Some(edge) = parent_edge {
                edges.entry(child.clone()).or_insert_with(|| MaterializedEdge {
                    parent: edge.parent.identifier.clone(),
                    child: child.clone(),
                    name: edge.name.clone(),
                    position: edge.position,
                });
            }
        }

        let mut edges: Vec<_> = edges.into_values().collect();
        edges.sort_by(|a, b| {
            (&a.parent, a.position, &a.name).cmp(&(&b.parent, b.position, &b.name))
        });
        edges
    }

    // ------------------------------------------------------------------------
    // Subgraph-internal accessors
    // ------------------------------------------------------------------------

    pub(crate) fn put_node(&self, node: Arc<Node>) -> Arc<Node> {
        self.write().remember_node(node)
    }

    pub(crate) fn node_by_aggregate(
        &self,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Option<Arc<Node>> {
        let state = self.read();
        state
            .aggregates
            .get(aggregate_identifier)
            .and_then(|id| state.nodes.get(id))
            .cloned()
    }

    /// `Some(None)` means "known root".
    pub(crate) fn parent(&self, child: &NodeIdentifier) -> Option<Option<ParentEdge>> {
        self.read().parents.get(child).cloned()
    }

    pub(crate) fn put_parent(
        &self,
        child: &NodeIdentifier,
        edge: Option<ParentEdge>,
    ) -> Option<ParentEdge> {
        let mut state = self.write();
        let edge = edge.map(|mut e| {
            e.parent = state.remember_node(e.parent);
            e
        });
        state.parents.entry(child.clone()).or_insert(edge).clone()
    }

    pub(crate) fn children(&self, parent: &NodeIdentifier) -> Option<Arc<Vec<ChildEdge>>> {
        self.read().children.get(parent).cloned()
    }

    pub(crate) fn put_children(
        &self,
        parent: &NodeIdentifier,
        children: Vec<ChildEdge>,
    ) -> Arc<Vec<ChildEdge>> {
        let mut state = self.write();
        let children: Vec<ChildEdge> = children
            .into_iter()
            .map(|mut c| {
                c.node = state.remember_node(c.node);
                c
            })
            .collect();
        let children = state
            .children
            .entry(parent.clone())
            .or_insert_with(|| Arc::new(children))
            .clone();
        for child in children.iter() {
            state
                .edge_names
                .entry((parent.clone(), child.name.clone()))
                .or_insert_with(|| Some(child.node.identifier.clone()));
        }
        children
    }

    /// `Some(None)` means "no child with that name".
    pub(crate) fn child_by_edge_name(
        &self,
        parent: &NodeIdentifier,
        name: &NodeName,
    ) -> Option<Option<Arc<Node>>> {
        let state = self.read();
        if let Some(child) = state.edge_names.get(&(parent.clone(), name.clone())) {
            return Some(child.as_ref().and_then(|id| state.nodes.get(id)).cloned());
        }
        // A cached child list is complete.
        state.children.contains_key(parent).then_some(None)
    }

    pub(crate) fn put_child_by_edge_name(
        &self,
        parent: &NodeIdentifier,
        name: &NodeName,
        child: Option<Arc<Node>>,
    ) -> Option<Arc<Node>> {
        let mut state = self.write();
        let child = child.map(|node| state.remember_node(node));
        state
            .edge_names
            .entry((parent.clone(), name.clone()))
            .or_insert_with(|| child.as_ref().map(|node| node.identifier.clone()))
            .clone()
            .and_then(|id| state.nodes.get(&id).cloned())
    }

    pub(crate) fn path(&self, identifier: &NodeIdentifier) -> Option<NodePath> {
        self.read().paths.get(identifier).cloned()
    }

    pub(crate) fn put_path(&self, identifier: &NodeIdentifier, path: NodePath) -> NodePath {
        self.write()
            .paths
            .entry(identifier.clone())
            .or_insert(path)
            .clone()
    }

    pub(crate) fn path_lookup(&self, start: &NodeIdentifier, path: &NodePath) -> Option<Arc<Node>> {
        let state = self.read();
        state
            .path_lookups
            .get(&(start.clone(), path.to_string()))
            .and_then(|id| state.nodes.get(id))
            .cloned()
    }

    pub(crate) fn put_path_lookup(&self, start: &NodeIdentifier, path: &NodePath, node: Arc<Node>) {
        let mut state = self.write();
        let node = state.remember_node(node);
        state
            .path_lookups
            .entry((start.clone(), path.to_string()))
            .or_insert_with(|| node.identifier.clone());
    }

    pub(crate) fn references(
        &self,
        source: &NodeIdentifier,
        property_name: Option<&PropertyName>,
    ) -> Option<Vec<Arc<Node>>> {
        let state = self.read();
        state
            .references
            .get(&(source.clone(), property_name.cloned()))
            .map(|ids| state.resolve(ids))
    }

    pub(crate) fn put_references(
        &self,
        source: &NodeIdentifier,
        property_name: Option<&PropertyName>,
        nodes: Vec<Arc<Node>>,
    ) -> Vec<Arc<Node>> {
        let mut state = self.write();
        let ids: Vec<NodeIdentifier> = nodes
            .into_iter()
            .map(|node| state.remember_node(node).identifier.clone())
            .collect();
        let ids = state
            .references
            .entry((source.clone(), property_name.cloned()))
            .or_insert(ids)
            .clone();
        state.resolve(&ids)
    }

    pub(crate) fn subtree(&self, key: &SubtreeKey) -> Option<Subtree> {
        self.read().subtrees.get(key).cloned()
    }

    pub(crate) fn put_subtree(&self, key: SubtreeKey, subtree: Subtree) -> Subtree {
        self.write().subtrees.entry(key).or_insert(subtree).clone()
    }
}
