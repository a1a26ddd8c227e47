//! In-memory hierarchy edge index.
//!
//! [`HierarchyIndex`] keeps one petgraph `DiGraph` per [`SubgraphScope`].
//! Node weights are node identifiers, edge weights carry the edge name and
//! sibling position. Lookups by identifier, aggregate and edge name go
//! through hash maps; child lists are sorted on read.
//!
//! The index enforces the hierarchy invariants while it is being loaded:
//!
//! - a node identifier exists once, in exactly one scope
//! - an aggregate has at most one variant per scope
//! - every child has exactly one parent and no edge closes a cycle
//! - edge names are unique among the direct children of a parent
//!
//! Once loaded it is wrapped in an `Arc` and only read.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use contentgraph_core::{
    Error, NodeAggregateIdentifier, NodeIdentifier, NodeName, NodeTypeName, PropertyName, Result,
};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::node::{HierarchyEdge, Node, ReferenceEdge};
use crate::store::{ChildEdge, HierarchyStore, ParentEdge, SubgraphScope};

/// Edge weight stored in the scope graph.
#[derive(Clone, Debug, PartialEq, Eq)]
struct EdgeWeight {
    name: NodeName,
    position: i64,
}

/// Hierarchy of a single (content stream, dimension space point).
#[derive(Debug, Default)]
struct ScopeGraph {
    graph: DiGraph<NodeIdentifier, EdgeWeight>,
    indices: HashMap<NodeIdentifier, NodeIndex>,
    by_aggregate: HashMap<NodeAggregateIdentifier, NodeIdentifier>,
    by_edge_name: HashMap<(NodeIndex, NodeName), NodeIndex>,
}

impl ScopeGraph {
    fn parent_of(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Whether `candidate` is `idx` or one of its ancestors.
    fn is_self_or_ancestor(&self, candidate: NodeIndex, idx: NodeIndex) -> bool {
        let mut current = Some(idx);
        let mut steps = 0;
        while let Some(c) = current {
            if c == candidate {
                return true;
            }
            steps += 1;
            if steps > self.graph.node_count() {
                // Cannot happen while connect() guards insertion.
                return true;
            }
            current = self.parent_of(c);
        }
        false
    }
}

/// Scoped, petgraph-backed hierarchy store.
#[derive(Debug, Default)]
pub struct HierarchyIndex {
    nodes: HashMap<NodeIdentifier, Arc<Node>>,
    scopes: HashMap<SubgraphScope, ScopeGraph>,
    references: HashMap<NodeIdentifier, Vec<ReferenceEdge>>,
}

impl HierarchyIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node in its scope.
    ///
    /// Rejects duplicate identifiers and a second variant of the same
    /// aggregate in one scope.
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.identifier) {
            return Err(Error::invalid_argument(format!(
                "node '{}' already exists",
                node.identifier
            )));
        }

        let scope = node.scope();
        let scope_graph = self.scopes.entry(scope.clone()).or_default();

        if let Some(existing) = scope_graph.by_aggregate.get(&node.aggregate_identifier) {
            return Err(Error::invalid_argument(format!(
                "aggregate '{}' already has variant '{}' in {}",
                node.aggregate_identifier, existing, scope
            )));
        }

        let idx = scope_graph.graph.add_node(node.identifier.clone());
        scope_graph.indices.insert(node.identifier.clone(), idx);
        scope_graph
            .by_aggregate
            .insert(node.aggregate_identifier.clone(), node.identifier.clone());
        self.nodes.insert(node.identifier.clone(), Arc::new(node));

        Ok(())
    }

    /// Connect a child to its parent.
    ///
    /// Fails with [`Error::BrokenHierarchy`] for a second parent or a cycle
    /// and with [`Error::InvalidArgument`] for unknown endpoints or a
    /// duplicate sibling name.
    pub fn connect(&mut self, edge: HierarchyEdge) -> Result<()> {
        let scope = edge.scope();
        let scope_graph = self
            .scopes
            .get_mut(&scope)
            .ok_or_else(|| Error::invalid_argument(format!("no nodes in scope {scope}")))?;

        let lookup = |id: &NodeIdentifier| {
            scope_graph.indices.get(id).copied().ok_or_else(|| {
                Error::invalid_argument(format!("node '{id}' is not part of {scope}"))
            })
        };
        let parent_idx = lookup(&edge.parent)?;
        let child_idx = lookup(&edge.child)?;

        if scope_graph.parent_of(child_idx).is_some() {
            return Err(Error::broken_hierarchy(format!(
                "node '{}' already has a parent in {}",
                edge.child, scope
            )));
        }
        if scope_graph.is_self_or_ancestor(child_idx, parent_idx) {
            return Err(Error::broken_hierarchy(format!(
                "connecting '{}' below '{}' would create a cycle",
                edge.child, edge.parent
            )));
        }

        let name_key = (parent_idx, edge.name.clone());
        if scope_graph.by_edge_name.contains_key(&name_key) {
            return Err(Error::invalid_argument(format!(
                "'{}' already has a child named '{}'",
                edge.parent, edge.name
            )));
        }

        scope_graph.graph.add_edge(
            parent_idx,
            child_idx,
            EdgeWeight {
                name: edge.name,
                position: edge.position,
            },
        );
        scope_graph.by_edge_name.insert(name_key, child_idx);

        Ok(())
    }

    /// Register a reference from an existing node to an aggregate.
    pub fn add_reference(&mut self, reference: ReferenceEdge) -> Result<()> {
        if !self.nodes.contains_key(&reference.source) {
            return Err(Error::invalid_argument(format!(
                "reference source '{}' does not exist",
                reference.source
            )));
        }
        self.references
            .entry(reference.source.clone())
            .or_default()
            .push(reference);
        Ok(())
    }

    /// All scopes holding at least one node, sorted.
    pub fn scopes(&self) -> Vec<SubgraphScope> {
        let mut scopes: Vec<_> = self.scopes.keys().cloned().collect();
        scopes.sort();
        scopes
    }

    /// All nodes of a scope, sorted by identifier.
    pub fn nodes_in_scope(&self, scope: &SubgraphScope) -> Vec<Arc<Node>> {
        let Some(scope_graph) = self.scopes.get(scope) else {
            return Vec::new();
        };
        let mut nodes: Vec<_> = scope_graph
            .graph
            .node_weights()
            .filter_map(|id| self.nodes.get(id).cloned())
            .collect();
        nodes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        nodes
    }

    /// All hierarchy edges of a scope, sorted by parent, position, name.
    pub fn edges_in_scope(&self, scope: &SubgraphScope) -> Vec<HierarchyEdge> {
        let Some(scope_graph) = self.scopes.get(scope) else {
            return Vec::new();
        };
        let mut edges: Vec<_> = scope_graph
            .graph
            .edge_references()
            .map(|e| HierarchyEdge {
                content_stream_identifier: scope.content_stream_identifier.clone(),
                dimension_space_point: scope.dimension_space_point.clone(),
                parent: scope_graph.graph[e.source()].clone(),
                child: scope_graph.graph[e.target()].clone(),
                name: e.weight().name.clone(),
                position: e.weight().position,
            })
            .collect();
        edges.sort_by(|a, b| {
            (&a.parent, a.position, &a.name).cmp(&(&b.parent, b.position, &b.name))
        });
        edges
    }

    /// Nodes of a scope without a parent.
    pub fn roots_in_scope(&self, scope: &SubgraphScope) -> Vec<NodeIdentifier> {
        let Some(scope_graph) = self.scopes.get(scope) else {
            return Vec::new();
        };
        let mut roots: Vec<_> = scope_graph
            .graph
            .node_indices()
            .filter(|&idx| scope_graph.parent_of(idx).is_none())
            .map(|idx| scope_graph.graph[idx].clone())
            .collect();
        roots.sort();
        roots
    }

    /// Number of children of a node in its scope.
    pub fn child_count(&self, scope: &SubgraphScope, parent: &NodeIdentifier) -> usize {
        self.scopes
            .get(scope)
            .and_then(|sg| sg.indices.get(parent).map(|&idx| (sg, idx)))
            .map(|(sg, idx)| sg.graph.edges_directed(idx, Direction::Outgoing).count())
            .unwrap_or(0)
    }

    /// Every registered reference, sorted by source, property, position.
    pub fn all_references(&self) -> Vec<ReferenceEdge> {
        let mut refs: Vec<_> = self.references.values().flatten().cloned().collect();
        refs.sort_by(|a, b| {
            (&a.source, &a.property_name, a.position).cmp(&(&b.source, &b.property_name, b.position))
        });
        refs
    }

    /// Look up a node regardless of scope.
    pub fn node(&self, identifier: &NodeIdentifier) -> Option<&Arc<Node>> {
        self.nodes.get(identifier)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.scopes.values().map(|sg| sg.graph.edge_count()).sum()
    }

    fn scoped_node(&self, scope: &SubgraphScope, identifier: &NodeIdentifier) -> Option<Arc<Node>> {
        self.nodes
            .get(identifier)
            .filter(|node| node.is_in_scope(scope))
            .cloned()
    }

    /// The variant of an aggregate in `scope`.
    pub fn resolve_aggregate(
        &self,
        scope: &SubgraphScope,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Option<Arc<Node>> {
        let scope_graph = self.scopes.get(scope)?;
        let identifier = scope_graph.by_aggregate.get(aggregate_identifier)?;
        self.nodes.get(identifier).cloned()
    }

    fn index_of(&self, scope: &SubgraphScope, id: &NodeIdentifier) -> Option<(&ScopeGraph, NodeIndex)> {
        let scope_graph = self.scopes.get(scope)?;
        let idx = scope_graph.indices.get(id).copied()?;
        Some((scope_graph, idx))
    }
}

#[async_trait]
impl HierarchyStore for HierarchyIndex {
    async fn node_by_identifier(
        &self,
        scope: &SubgraphScope,
        identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        Ok(self.scoped_node(scope, identifier))
    }

    async fn node_by_aggregate_identifier(
        &self,
        scope: &SubgraphScope,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        Ok(self.resolve_aggregate(scope, aggregate_identifier))
    }

    async fn child_edges(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
    ) -> Result<Vec<ChildEdge>> {
        let Some((scope_graph, idx)) = self.index_of(scope, parent) else {
            return Ok(Vec::new());
        };

        let mut children = Vec::new();
        for edge in scope_graph.graph.edges_directed(idx, Direction::Outgoing) {
            let child_id = &scope_graph.graph[edge.target()];
            let node = self.nodes.get(child_id).cloned().ok_or_else(|| {
                Error::broken_hierarchy(format!("edge points to missing node '{child_id}'"))
            })?;
            children.push(ChildEdge {
                node,
                name: edge.weight().name.clone(),
                position: edge.weight().position,
            });
        }
        children.sort_by(|a, b| (a.position, &a.name).cmp(&(b.position, &b.name)));

        Ok(children)
    }

    async fn parent_edge(
        &self,
        scope: &SubgraphScope,
        child: &NodeIdentifier,
    ) -> Result<Option<ParentEdge>> {
        let Some((scope_graph, idx)) = self.index_of(scope, child) else {
            return Ok(None);
        };

        let Some(edge) = scope_graph
            .graph
            .edges_directed(idx, Direction::Incoming)
            .next()
        else {
            return Ok(None);
        };

        let parent_id = &scope_graph.graph[edge.source()];
        let parent = self.nodes.get(parent_id).cloned().ok_or_else(|| {
            Error::broken_hierarchy(format!("edge points to missing node '{parent_id}'"))
        })?;

        Ok(Some(ParentEdge {
            parent,
            name: edge.weight().name.clone(),
            position: edge.weight().position,
        }))
    }

    async fn child_by_edge_name(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
        name: &NodeName,
    ) -> Result<Option<Arc<Node>>> {
        let Some((scope_graph, idx)) = self.index_of(scope, parent) else {
            return Ok(None);
        };
        Ok(scope_graph
            .by_edge_name
            .get(&(idx, name.clone()))
            .and_then(|&child_idx| self.nodes.get(&scope_graph.graph[child_idx]).cloned()))
    }

    async fn references(
        &self,
        scope: &SubgraphScope,
        source: &NodeIdentifier,
        property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>> {
        if self.scoped_node(scope, source).is_none() {
            return Ok(Vec::new());
        }
        let Some(references) = self.references.get(source) else {
            return Ok(Vec::new());
        };

        let mut selected: Vec<&ReferenceEdge> = references
            .iter()
            .filter(|r| property_name.is_none_or(|p| &r.property_name == p))
            .collect();
        selected.sort_by(|a, b| (&a.property_name, a.position).cmp(&(&b.property_name, b.position)));

        let mut nodes = Vec::with_capacity(selected.len());
        for reference in selected {
            match self.resolve_aggregate(scope, &reference.target) {
                Some(node) => nodes.push(node),
                None => log::debug!(
                    "reference {}.{} -> {} has no variant in {}",
                    source,
                    reference.property_name,
                    reference.target,
                    scope
                ),
            }
        }

        Ok(nodes)
    }

    async fn nodes_by_type_names(
        &self,
        scope: &SubgraphScope,
        type_names: &[NodeTypeName],
    ) -> Result<Vec<Arc<Node>>> {
        let wanted: HashSet<&NodeTypeName> = type_names.iter().collect();
        Ok(self
            .nodes_in_scope(scope)
            .into_iter()
            .filter(|node| wanted.contains(&node.node_type_name))
            .collect())
    }
}
