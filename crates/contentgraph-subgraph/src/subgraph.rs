//! The content subgraph: the query surface over one fixed scope.
//!
//! A [`ContentSubgraph`] answers structural queries for exactly one
//! (content stream, dimension space point). Every query consults the
//! subgraph's own [`InMemoryCache`] first and falls back to the
//! [`HierarchyStore`]; what the store returns is cached for the rest of the
//! subgraph's life.
//!
//! # Outcomes
//!
//! - a missing node is `Ok(None)` (or an empty list), never an error
//! - invalid input (unknown node types in constraints) is a precondition
//!   violation
//! - a cycle or a runaway ancestor chain is [`Error::BrokenHierarchy`]
//! - store failures are passed through unchanged
//!
//! Traversal and subtree extraction live in [`crate::traversal`] and
//! [`crate::subtree`].

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use contentgraph_core::{
    ConfigProvider, ContentStreamIdentifier, DEFAULT_MAX_HIERARCHY_DEPTH, DimensionSpacePoint,
    Error, NodeAggregateIdentifier, NodeIdentifier, NodeName, NodePath, NodeTypeConstraints,
    NodeTypeName, Pagination, PropertyName, Result,
};
use serde::{Deserialize, Serialize};

use crate::cache::InMemoryCache;
use crate::node::Node;
use crate::node_type::{NodeTypeSchema, ResolvedNodeTypeConstraints};
use crate::store::{ChildEdge, HierarchyStore, ParentEdge, SubgraphScope};

/// Tunables shared by all subgraphs of a content graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubgraphSettings {
    /// Ancestor chains and traversals deeper than this are treated as a
    /// broken hierarchy.
    pub max_hierarchy_depth: usize,
}

impl Default for SubgraphSettings {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

impl SubgraphSettings {
    /// Take the settings from an application config.
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self {
            max_hierarchy_depth: config.max_hierarchy_depth(),
        }
    }

    pub fn with_max_hierarchy_depth(mut self, depth: usize) -> Self {
        self.max_hierarchy_depth = depth;
        self
    }
}

/// Read-only view of one (content stream, dimension space point).
pub struct ContentSubgraph {
    scope: SubgraphScope,
    store: Arc<dyn HierarchyStore>,
    schema: Arc<dyn NodeTypeSchema>,
    settings: SubgraphSettings,
    cache: InMemoryCache,
}

impl ContentSubgraph {
    /// Create a subgraph with an empty cache.
    ///
    /// Usually obtained from [`ContentGraph::subgraph`](crate::ContentGraph::subgraph).
    pub fn new(
        scope: SubgraphScope,
        store: Arc<dyn HierarchyStore>,
        schema: Arc<dyn NodeTypeSchema>,
        settings: SubgraphSettings,
    ) -> Self {
        Self {
            cache: InMemoryCache::new(scope.clone()),
            scope,
            store,
            schema,
            settings,
        }
    }

    // ------------------------------------------------------------------------
    // Coordinates
    // ------------------------------------------------------------------------

    pub fn content_stream_identifier(&self) -> &ContentStreamIdentifier {
        &self.scope.content_stream_identifier
    }

    pub fn dimension_space_point(&self) -> &DimensionSpacePoint {
        &self.scope.dimension_space_point
    }

    pub fn scope(&self) -> &SubgraphScope {
        &self.scope
    }

    pub fn settings(&self) -> &SubgraphSettings {
        &self.settings
    }

    /// The cache owned by this subgraph, for prefetching.
    ///
    /// Entries live only as long as this subgraph.
    pub fn in_memory_cache(&self) -> &InMemoryCache {
        &self.cache
    }

    pub(crate) fn schema(&self) -> &dyn NodeTypeSchema {
        self.schema.as_ref()
    }

    pub(crate) fn resolve_constraints<'a>(
        &'a self,
        constraints: &'a NodeTypeConstraints,
    ) -> Result<ResolvedNodeTypeConstraints<'a>> {
        ResolvedNodeTypeConstraints::resolve(constraints, self.schema())
    }

    // ------------------------------------------------------------------------
    // Single node lookups
    // ------------------------------------------------------------------------

    /// The node with `identifier`, if it exists in this scope.
    pub async fn find_node_by_identifier(
        &self,
        identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        if let Some(node) = self.cache.node(identifier) {
            return Ok(Some(node));
        }

        log::debug!("cache miss for node {identifier} in {}", self.scope);
        Ok(self
            .store
            .node_by_identifier(&self.scope, identifier)
            .await?
            .map(|node| self.cache.put_node(node)))
    }

    /// The variant of an aggregate materialized in this scope.
    pub async fn find_node_by_node_aggregate_identifier(
        &self,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        if let Some(node) = self.cache.node_by_aggregate(aggregate_identifier) {
            return Ok(Some(node));
        }

        log::debug!(
            "cache miss for aggregate {aggregate_identifier} in {}",
            self.scope
        );
        Ok(self
            .store
            .node_by_aggregate_identifier(&self.scope, aggregate_identifier)
            .await?
            .map(|node| self.cache.put_node(node)))
    }

    // ------------------------------------------------------------------------
    // Children
    // ------------------------------------------------------------------------

    /// Full ordered child list of `parent`, cached.
    pub(crate) async fn child_edges(&self, parent: &NodeIdentifier) -> Result<Arc<Vec<ChildEdge>>> {
        if let Some(children) = self.cache.children(parent) {
            return Ok(children);
        }

        log::debug!("cache miss for children of {parent} in {}", self.scope);
        let children = self.store.child_edges(&self.scope, parent).await?;
        Ok(self.cache.put_children(parent, children))
    }

    /// Children of `parent` passing already resolved constraints.
    pub(crate) async fn matching_children(
        &self,
        parent: &NodeIdentifier,
        constraints: &ResolvedNodeTypeConstraints<'_>,
    ) -> Result<Vec<Arc<Node>>> {
        Ok(self
            .child_edges(parent)
            .await?
            .iter()
            .filter(|edge| constraints.matches(&edge.node.node_type_name))
            .map(|edge| Arc::clone(&edge.node))
            .collect())
    }

    /// Children of `parent` in position order, filtered, then paged.
    ///
    /// An unknown parent or a parent without matching children yields an
    /// empty list.
    pub async fn find_child_nodes(
        &self,
        parent: &NodeIdentifier,
        constraints: &NodeTypeConstraints,
        pagination: Pagination,
    ) -> Result<Vec<Arc<Node>>> {
        let resolved = self.resolve_constraints(constraints)?;
        let children = self.matching_children(parent, &resolved).await?;
        Ok(pagination.apply(children).collect())
    }

    /// Number of children `find_child_nodes` returns without paging.
    pub async fn count_child_nodes(
        &self,
        parent: &NodeIdentifier,
        constraints: &NodeTypeConstraints,
    ) -> Result<usize> {
        let resolved = self.resolve_constraints(constraints)?;
        Ok(self
            .child_edges(parent)
            .await?
            .iter()
            .filter(|edge| resolved.matches(&edge.node.node_type_name))
            .count())
    }

    /// The child with the lowest position.
    pub async fn find_first_child_node(&self, parent: &NodeIdentifier) -> Result<Option<Arc<Node>>> {
        Ok(self
            .child_edges(parent)
            .await?
            .first()
            .map(|edge| Arc::clone(&edge.node)))
    }

    /// The child of `parent` whose edge is named `name`.
    pub async fn find_child_node_connected_through_edge_name(
        &self,
        parent: &NodeIdentifier,
        name: &NodeName,
    ) -> Result<Option<Arc<Node>>> {
        if let Some(child) = self.cache.child_by_edge_name(parent, name) {
            return Ok(child);
        }

        log::debug!("cache miss for child {name} of {parent} in {}", self.scope);
        let child = self
            .store
            .child_by_edge_name(&self.scope, parent, name)
            .await?;
        Ok(self.cache.put_child_by_edge_name(parent, name, child))
    }

    /// Like [`find_child_node_connected_through_edge_name`](Self::find_child_node_connected_through_edge_name),
    /// with the parent given by aggregate.
    pub async fn find_child_node_by_node_aggregate_identifier_connected_through_edge_name(
        &self,
        parent_aggregate_identifier: &NodeAggregateIdentifier,
        name: &NodeName,
    ) -> Result<Option<Arc<Node>>> {
        match self
            .find_node_by_node_aggregate_identifier(parent_aggregate_identifier)
            .await?
        {
            Some(parent) => {
                self.find_child_node_connected_through_edge_name(&parent.identifier, name)
                    .await
            }
            None => Ok(None),
        }
    }

    // ------------------------------------------------------------------------
    // Parent & siblings
    // ------------------------------------------------------------------------

    pub(crate) async fn parent_edge(&self, child: &NodeIdentifier) -> Result<Option<ParentEdge>> {
        if let Some(cached) = self.cache.parent(child) {
            return Ok(cached);
        }

        let edge = self.store.parent_edge(&self.scope, child).await?;
        Ok(self.cache.put_parent(child, edge))
    }

    /// The parent of `child`; `None` for roots and unknown nodes.
    pub async fn find_parent_node(&self, child: &NodeIdentifier) -> Result<Option<Arc<Node>>> {
        Ok(self.parent_edge(child).await?.map(|edge| edge.parent))
    }

    /// The next sibling in position order.
    pub async fn find_succeeding_sibling(
        &self,
        sibling: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        self.find_sibling(sibling, SiblingDirection::Succeeding).await
    }

    /// The previous sibling in position order.
    pub async fn find_preceding_sibling(
        &self,
        sibling: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        self.find_sibling(sibling, SiblingDirection::Preceding).await
    }

    async fn find_sibling(
        &self,
        sibling: &NodeIdentifier,
        direction: SiblingDirection,
    ) -> Result<Option<Arc<Node>>> {
        let Some(parent) = self.parent_edge(sibling).await? else {
            return Ok(None);
        };

        let siblings = self.child_edges(&parent.parent.identifier).await?;
        let position = siblings
            .iter()
            .position(|edge| &edge.node.identifier == sibling)
            .ok_or_else(|| {
                Error::broken_hierarchy(format!(
                    "'{sibling}' is not among the children of its parent '{}'",
                    parent.parent.identifier
                ))
            })?;

        let neighbour = match direction {
            SiblingDirection::Succeeding => siblings.get(position + 1),
            SiblingDirection::Preceding => position.checked_sub(1).and_then(|i| siblings.get(i)),
        };
        Ok(neighbour.map(|edge| Arc::clone(&edge.node)))
    }

    // ------------------------------------------------------------------------
    // Paths
    // ------------------------------------------------------------------------

    /// The path from the root of this subgraph down to `identifier`.
    ///
    /// A root node has the path `/`; an unknown node has none. Revisiting a
    /// node or exceeding [`SubgraphSettings::max_hierarchy_depth`] fails
    /// with [`Error::BrokenHierarchy`].
    pub async fn find_node_path(&self, identifier: &NodeIdentifier) -> Result<Option<NodePath>> {
        if let Some(path) = self.cache.path(identifier) {
            return Ok(Some(path));
        }
        if self.find_node_by_identifier(identifier).await?.is_none() {
            return Ok(None);
        }

        let mut segments: Vec<NodeName> = Vec::new();
        let mut visited: HashSet<NodeIdentifier> = HashSet::from([identifier.clone()]);
        let mut current = identifier.clone();

        while let Some(edge) = self.parent_edge(&current).await? {
            segments.push(edge.name);
            if segments.len() > self.settings.max_hierarchy_depth {
                return Err(Error::broken_hierarchy(format!(
                    "ancestor chain of '{identifier}' exceeds {} levels",
                    self.settings.max_hierarchy_depth
                )));
            }
            let parent = edge.parent.identifier.clone();
            if !visited.insert(parent.clone()) {
                return Err(Error::broken_hierarchy(format!(
                    "cycle in ancestor chain of '{identifier}' at '{parent}'"
                )));
            }
            current = parent;
        }

        segments.reverse();
        Ok(Some(
            self.cache
                .put_path(identifier, NodePath::from_segments(segments)),
        ))
    }

    /// Resolve `path` segment by segment, starting at `starting_node`.
    ///
    /// An empty path resolves to the starting node itself.
    pub async fn find_node_by_path(
        &self,
        path: &NodePath,
        starting_node: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        if let Some(node) = self.cache.path_lookup(starting_node, path) {
            return Ok(Some(node));
        }

        let Some(mut current) = self.find_node_by_identifier(starting_node).await? else {
            return Ok(None);
        };

        for segment in path.segments() {
            match self
                .find_child_node_connected_through_edge_name(&current.identifier, segment)
                .await?
            {
                Some(child) => current = child,
                None => return Ok(None),
            }
        }

        self.cache
            .put_path_lookup(starting_node, path, Arc::clone(&current));
        Ok(Some(current))
    }

    // ------------------------------------------------------------------------
    // References & types
    // ------------------------------------------------------------------------

    /// Nodes referenced by `identifier`, through one property or all.
    ///
    /// With a property, order follows the property's declared order. Without
    /// one, properties come in name order, each in declared order.
    pub async fn find_referenced_nodes(
        &self,
        identifier: &NodeIdentifier,
        property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>> {
        if let Some(nodes) = self.cache.references(identifier, property_name) {
            return Ok(nodes);
        }

        log::debug!("cache miss for references of {identifier} in {}", self.scope);
        let nodes = self
            .store
            .references(&self.scope, identifier, property_name)
            .await?;
        Ok(self.cache.put_references(identifier, property_name, nodes))
    }

    /// Every node in this scope whose type is or specializes `node_type_name`.
    ///
    /// Sorted by identifier.
    pub async fn find_nodes_by_type(&self, node_type_name: &NodeTypeName) -> Result<Vec<Arc<Node>>> {
        if !self.schema.has_node_type(node_type_name) {
            return Err(Error::unknown_node_type(node_type_name.to_string()));
        }

        let type_names = self.schema.sub_types_of(node_type_name);
        let mut nodes: Vec<_> = self
            .store
            .nodes_by_type_names(&self.scope, &type_names)
            .await?
            .into_iter()
            .map(|node| self.cache.put_node(node))
            .collect();
        nodes.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(nodes)
    }
}

#[derive(Clone, Copy, Debug)]
enum SiblingDirection {
    Succeeding,
    Preceding,
}

impl fmt::Debug for ContentSubgraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentSubgraph")
            .field("scope", &self.scope)
            .field("settings", &self.settings)
            .field("cached_nodes", &self.cache.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, agg, id, name};

    #[tokio::test]
    async fn test_find_node_by_identifier_populates_cache() {
        let subgraph = fixtures::site_subgraph("live");
        assert!(subgraph.in_memory_cache().is_empty());

        let node = subgraph.find_node_by_identifier(&id("home")).await.unwrap().unwrap();
        assert_eq!(node.aggregate_identifier, agg("agg-home"));
        assert!(subgraph.in_memory_cache().contains_node(&id("home")));

        let again = subgraph.find_node_by_identifier(&id("home")).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&node, &again));
    }

    #[tokio::test]
    async fn test_unknown_node_is_absent() {
        let subgraph = fixtures::site_subgraph("live");
        assert!(subgraph.find_node_by_identifier(&id("nope")).await.unwrap().is_none());
        assert!(subgraph.find_parent_node(&id("nope")).await.unwrap().is_none());
        assert!(subgraph.find_node_path(&id("nope")).await.unwrap().is_none());
        assert!(
            subgraph
                .find_child_nodes(&id("nope"), &NodeTypeConstraints::allow_all(), Pagination::all())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_aggregate_resolves_per_content_stream() {
        let live = fixtures::site_subgraph("live");
        let draft = fixtures::site_subgraph("draft");

        let n1 = live
            .find_node_by_node_aggregate_identifier(&agg("agg-about"))
            .await
            .unwrap()
            .unwrap();
        let n1_draft = draft
            .find_node_by_node_aggregate_identifier(&agg("agg-about"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(n1.identifier, id("about"));
        assert_eq!(n1_draft.identifier, id("about-draft"));
        assert_ne!(n1.properties, n1_draft.properties);

        assert!(live.find_node_by_identifier(&id("about-draft")).await.unwrap().is_none());
        assert!(draft.find_node_by_identifier(&id("about")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_children_first_child_and_edge_name() {
        let subgraph = fixtures::site_subgraph("live");

        let children = subgraph
            .find_child_nodes(&id("home"), &NodeTypeConstraints::allow_all(), Pagination::all())
            .await
            .unwrap();
        let ids: Vec<_> = children.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["about", "blog", "contact"]);

        let first = subgraph.find_first_child_node(&id("home")).await.unwrap().unwrap();
        assert_eq!(first.identifier, id("about"));

        let blog = subgraph
            .find_child_node_connected_through_edge_name(&id("home"), &name("blog"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(blog.identifier, id("blog"));

        let blog_by_agg = subgraph
            .find_child_node_by_node_aggregate_identifier_connected_through_edge_name(
                &agg("agg-home"),
                &name("blog"),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(Arc::ptr_eq(&blog, &blog_by_agg));

        assert!(
            subgraph
                .find_child_node_connected_through_edge_name(&id("home"), &name("missing"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_edge_name_lookup_without_cached_children() {
        let subgraph = fixtures::site_subgraph("live");
        let contact = subgraph
            .find_child_node_connected_through_edge_name(&id("home"), &name("contact"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(contact.identifier, id("contact"));
        assert!(subgraph.in_memory_cache().contains_node(&id("contact")));
    }

    #[tokio::test]
    async fn test_type_constraints_filter_children() {
        let subgraph = fixtures::site_subgraph("live");
        let pages = NodeTypeConstraints::parse("Acme:Page").unwrap();

        let children = subgraph
            .find_child_nodes(&id("blog"), &pages, Pagination::all())
            .await
            .unwrap();
        let ids: Vec<_> = children.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["post-1", "post-2"]);
        assert_eq!(subgraph.count_child_nodes(&id("blog"), &pages).await.unwrap(), 2);

        let none = NodeTypeConstraints::parse("Acme:Shortcut").unwrap();
        assert!(
            subgraph
                .find_child_nodes(&id("blog"), &none, Pagination::all())
                .await
                .unwrap()
                .is_empty()
        );
        assert_eq!(subgraph.count_child_nodes(&id("blog"), &none).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_constraint_type_is_precondition_violation() {
        let subgraph = fixtures::site_subgraph("live");
        let bogus = NodeTypeConstraints::parse("Acme:Bogus").unwrap();
        let err = subgraph
            .find_child_nodes(&id("home"), &bogus, Pagination::all())
            .await
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[tokio::test]
    async fn test_pagination_over_filtered_children() {
        let subgraph = fixtures::site_subgraph("live");
        let all = NodeTypeConstraints::allow_all();

        let page = subgraph
            .find_child_nodes(&id("home"), &all, Pagination::all().with_offset(1).with_limit(1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].identifier, id("blog"));

        let past_end = subgraph
            .find_child_nodes(&id("home"), &all, Pagination::all().with_offset(10))
            .await
            .unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn test_parent_and_siblings() {
        let subgraph = fixtures::site_subgraph("live");

        let parent = subgraph.find_parent_node(&id("blog")).await.unwrap().unwrap();
        assert_eq!(parent.identifier, id("home"));
        assert!(subgraph.find_parent_node(&id("root")).await.unwrap().is_none());

        let next = subgraph.find_succeeding_sibling(&id("about")).await.unwrap().unwrap();
        assert_eq!(next.identifier, id("blog"));
        let prev = subgraph.find_preceding_sibling(&id("blog")).await.unwrap().unwrap();
        assert_eq!(prev.identifier, id("about"));

        assert!(subgraph.find_succeeding_sibling(&id("contact")).await.unwrap().is_none());
        assert!(subgraph.find_preceding_sibling(&id("about")).await.unwrap().is_none());
        assert!(subgraph.find_succeeding_sibling(&id("root")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_node_path_and_back() {
        let subgraph = fixtures::site_subgraph("live");

        let path = subgraph.find_node_path(&id("post-2")).await.unwrap().unwrap();
        assert_eq!(path.to_string(), "/sites/home/blog/second-post");

        let resolved = subgraph
            .find_node_by_path(&path, &id("root"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.identifier, id("post-2"));

        let root_path = subgraph.find_node_path(&id("root")).await.unwrap().unwrap();
        assert!(root_path.is_root());
        let root = subgraph
            .find_node_by_path(&root_path, &id("root"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(root.identifier, id("root"));
    }

    #[tokio::test]
    async fn test_relative_path_and_missing_segment() {
        let subgraph = fixtures::site_subgraph("live");

        let relative = NodePath::parse("blog/first-post").unwrap();
        let post = subgraph
            .find_node_by_path(&relative, &id("home"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(post.identifier, id("post-1"));

        let missing = NodePath::parse("blog/nope").unwrap();
        assert!(subgraph.find_node_by_path(&missing, &id("home")).await.unwrap().is_none());
        assert!(subgraph.find_node_by_path(&relative, &id("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_node_path_depth_fuse() {
        let subgraph = fixtures::site_subgraph_with_settings(
            "live",
            SubgraphSettings::default().with_max_hierarchy_depth(2),
        );
        let err = subgraph.find_node_path(&id("post-2")).await.unwrap_err();
        assert!(err.is_integrity_violation());

        let shallow = subgraph.find_node_path(&id("home")).await.unwrap().unwrap();
        assert_eq!(shallow.to_string(), "/sites/home");
    }

    #[tokio::test]
    async fn test_node_path_detects_cycle() {
        let subgraph = fixtures::cyclic_subgraph();
        let err = subgraph.find_node_path(&id("x")).await.unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[tokio::test]
    async fn test_referenced_nodes() {
        let subgraph = fixtures::site_subgraph("live");

        let all = subgraph.find_referenced_nodes(&id("post-1"), None).await.unwrap();
        let ids: Vec<_> = all.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["about", "post-2", "contact"]);

        let related = PropertyName::new("related").unwrap();
        let some = subgraph
            .find_referenced_nodes(&id("post-1"), Some(&related))
            .await
            .unwrap();
        let ids: Vec<_> = some.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["post-2", "contact"]);

        assert!(subgraph.find_referenced_nodes(&id("home"), None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nodes_by_type_includes_subtypes() {
        let subgraph = fixtures::site_subgraph("live");
        let documents = subgraph
            .find_nodes_by_type(&NodeTypeName::new("Acme:Document").unwrap())
            .await
            .unwrap();
        let ids: Vec<_> = documents.iter().map(|n| n.identifier.as_str()).collect();
        assert_eq!(ids, vec!["about", "blog", "contact", "home", "post-1", "post-2"]);

        let err = subgraph
            .find_nodes_by_type(&NodeTypeName::new("Acme:Bogus").unwrap())
            .await
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[tokio::test]
    async fn test_coordinates_are_fixed() {
        let subgraph = fixtures::site_subgraph("draft");
        assert_eq!(subgraph.content_stream_identifier().as_str(), "draft");
        assert_eq!(subgraph.dimension_space_point().coordinate("language"), Some("en"));
        assert_eq!(subgraph.in_memory_cache().scope(), subgraph.scope());
    }

    #[tokio::test]
    async fn test_warmed_cache_is_used() {
        let subgraph = fixtures::site_subgraph("live");
        let ghost = Arc::new(fixtures::page("ghost", "agg-ghost", "live"));
        subgraph.in_memory_cache().warm_node(Arc::clone(&ghost)).unwrap();

        let found = subgraph.find_node_by_identifier(&id("ghost")).await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&found, &ghost));
    }

    #[tokio::test]
    async fn test_references_and_edge_names_hit_store_once() {
        let store = Arc::new(fixtures::CountingStore::site());
        let subgraph = fixtures::counting_subgraph(Arc::clone(&store), "live");

        for _ in 0..3 {
            let references = subgraph.find_referenced_nodes(&id("post-1"), None).await.unwrap();
            assert_eq!(references.len(), 3);
            let contact = subgraph
                .find_child_node_connected_through_edge_name(&id("home"), &name("contact"))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(contact.identifier, id("contact"));
            assert!(
                subgraph
                    .find_child_node_connected_through_edge_name(&id("home"), &name("missing"))
                    .await
                    .unwrap()
                    .is_none()
            );
        }

        assert_eq!(store.references_calls(), 1);
        assert_eq!(store.child_by_edge_name_calls(), 2);
    }

    #[tokio::test]
    async fn test_edge_name_answered_from_cached_children() {
        let store = Arc::new(fixtures::CountingStore::site());
        let subgraph = fixtures::counting_subgraph(Arc::clone(&store), "live");

        subgraph
            .find_child_nodes(&id("blog"), &NodeTypeConstraints::allow_all(), Pagination::all())
            .await
            .unwrap();
        let teaser = subgraph
            .find_child_node_connected_through_edge_name(&id("blog"), &name("teaser"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(teaser.identifier, id("teaser"));
        assert!(
            subgraph
                .find_child_node_connected_through_edge_name(&id("blog"), &name("missing"))
                .await
                .unwrap()
                .is_none()
        );
        assert_eq!(store.child_by_edge_name_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_passes_through() {
        let subgraph = fixtures::failing_subgraph();
        let err = subgraph.find_node_by_identifier(&id("any")).await.unwrap_err();
        assert!(err.is_collaborator_failure());
        assert!(err.to_string().contains("store offline"));
    }
}
