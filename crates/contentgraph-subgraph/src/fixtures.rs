//! Sample hierarchies for tests.
//!
//! The site hierarchy, in `live` / `language=en`:
//!
//! ```text
//! /                          root      Acme:Root
//! /sites                     sites     Acme:Folder
//! /sites/home                home      Acme:Page
//!   about        (0)         about     Acme:Page
//!   blog         (10)        blog      Acme:Blog
//!     first-post (0)         post-1    Acme:Page
//!     teaser     (15)        teaser    Acme:Text
//!     second-post(20)        post-2    Acme:Page
//!   contact      (20)        contact   Acme:Page
//!     form       (0)         form      Acme:Text
//!     internal   (10)        internal  Acme:Text (hidden)
//! ```
//!
//! `draft` / `language=en` holds `root-draft`, `sites-draft`, `home-draft`
//! and `about-draft`; `live` / `language=de` holds `root-de`, `sites-de`
//! and `home-de`. All variants share the aggregate identifiers of their
//! `live` / `en` counterparts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use contentgraph_core::{
    ContentStreamIdentifier, Error, NodeAggregateIdentifier, NodeIdentifier, NodeName,
    NodeTypeName, PropertyName, Result,
};

use crate::graph::ContentGraph;
use crate::hierarchy::HierarchyIndex;
use crate::node::{HierarchyEdge, Node, ReferenceEdge};
use crate::node_type::{NodeTypeDeclaration, StaticNodeTypeSchema};
use crate::store::{ChildEdge, HierarchyStore, ParentEdge, SubgraphScope};
use crate::subgraph::{ContentSubgraph, SubgraphSettings};

pub fn id(value: &str) -> NodeIdentifier {
    NodeIdentifier::new(value).expect("valid node identifier")
}

pub fn agg(value: &str) -> NodeAggregateIdentifier {
    NodeAggregateIdentifier::new(value).expect("valid aggregate identifier")
}

pub fn name(value: &str) -> NodeName {
    NodeName::new(value).expect("valid node name")
}

pub fn type_name(value: &str) -> NodeTypeName {
    NodeTypeName::new(value).expect("valid node type name")
}

/// `content_stream` in `language=en`.
pub fn scope(content_stream: &str) -> SubgraphScope {
    scope_in(content_stream, "language=en")
}

pub fn scope_in(content_stream: &str, dimension_space_point: &str) -> SubgraphScope {
    SubgraphScope::new(
        ContentStreamIdentifier::new(content_stream).expect("valid content stream"),
        dimension_space_point
            .parse()
            .expect("valid dimension space point"),
    )
}

/// An `Acme:Page` in `content_stream` / `language=en`.
pub fn page(identifier: &str, aggregate: &str, content_stream: &str) -> Node {
    Node::new(
        id(identifier),
        agg(aggregate),
        &scope(content_stream),
        type_name("Acme:Page"),
    )
}

/// Node types of the sample site.
pub fn schema() -> StaticNodeTypeSchema {
    let declare = |name: &str, super_type: Option<&str>| {
        let declaration = NodeTypeDeclaration::new(type_name(name));
        match super_type {
            Some(s) => declaration.with_super_type(type_name(s)),
            None => declaration,
        }
    };

    StaticNodeTypeSchema::from_declarations([
        declare("Acme:Root", None),
        declare("Acme:Folder", None),
        declare("Acme:Document", None),
        declare("Acme:Page", Some("Acme:Document")),
        declare("Acme:Blog", Some("Acme:Document")),
        declare("Acme:Shortcut", Some("Acme:Document")),
        declare("Acme:Content", None),
        declare("Acme:Text", Some("Acme:Content")),
    ])
    .expect("valid fixture schema")
}

struct Loader<'a> {
    index: &'a mut HierarchyIndex,
    scope: SubgraphScope,
}

impl Loader<'_> {
    fn node(&mut self, identifier: &str, aggregate: &str, node_type: &str) -> &mut Self {
        self.add(Node::new(
            id(identifier),
            agg(aggregate),
            &self.scope,
            type_name(node_type),
        ))
    }

    fn add(&mut self, node: Node) -> &mut Self {
        self.index.add_node(node).expect("fixture node");
        self
    }

    fn edge(&mut self, parent: &str, child: &str, edge_name: &str, position: i64) -> &mut Self {
        self.index
            .connect(HierarchyEdge::new(
                &self.scope,
                id(parent),
                id(child),
                name(edge_name),
                position,
            ))
            .expect("fixture edge");
        self
    }
}

/// The sample site as index plus schema.
pub fn site_hierarchy() -> (HierarchyIndex, StaticNodeTypeSchema) {
    let mut index = HierarchyIndex::new();

    let live = scope("live");
    Loader {
        index: &mut index,
        scope: live.clone(),
    }
    .node("root", "agg-root", "Acme:Root")
    .node("sites", "agg-sites", "Acme:Folder")
    .add(
        Node::new(id("home"), agg("agg-home"), &live, type_name("Acme:Page"))
            .with_property("title", "Home"),
    )
    .add(
        Node::new(id("about"), agg("agg-about"), &live, type_name("Acme:Page"))
            .with_property("title", "About us"),
    )
    .node("blog", "agg-blog", "Acme:Blog")
    .node("post-1", "agg-post-1", "Acme:Page")
    .node("teaser", "agg-teaser", "Acme:Text")
    .node("post-2", "agg-post-2", "Acme:Page")
    .node("contact", "agg-contact", "Acme:Page")
    .node("form", "agg-form", "Acme:Text")
    .add(
        Node::new(id("internal"), agg("agg-internal"), &live, type_name("Acme:Text"))
            .with_hidden(true),
    )
    .edge("root", "sites", "sites", 0)
    .edge("sites", "home", "home", 0)
    .edge("home", "contact", "contact", 20)
    .edge("home", "about", "about", 0)
    .edge("home", "blog", "blog", 10)
    .edge("blog", "post-2", "second-post", 20)
    .edge("blog", "post-1", "first-post", 0)
    .edge("blog", "teaser", "teaser", 15)
    .edge("contact", "form", "form", 0)
    .edge("contact", "internal", "internal", 10);

    let draft = scope("draft");
    Loader {
        index: &mut index,
        scope: draft.clone(),
    }
    .node("root-draft", "agg-root", "Acme:Root")
    .node("sites-draft", "agg-sites", "Acme:Folder")
    .node("home-draft", "agg-home", "Acme:Page")
    .add(
        Node::new(id("about-draft"), agg("agg-about"), &draft, type_name("Acme:Page"))
            .with_property("title", "About us (draft)"),
    )
    .edge("root-draft", "sites-draft", "sites", 0)
    .edge("sites-draft", "home-draft", "home", 0)
    .edge("home-draft", "about-draft", "about", 0);

    let german = scope_in("live", "language=de");
    Loader {
        index: &mut index,
        scope: german.clone(),
    }
    .node("root-de", "agg-root", "Acme:Root")
    .node("sites-de", "agg-sites", "Acme:Folder")
    .add(
        Node::new(id("home-de"), agg("agg-home"), &german, type_name("Acme:Page"))
            .with_property("title", "Startseite"),
    )
    .edge("root-de", "sites-de", "sites", 0)
    .edge("sites-de", "home-de", "home", 0);

    let property = |p: &str| PropertyName::new(p).expect("valid property name");
    for reference in [
        ReferenceEdge::new(id("post-1"), property("related"), 1, agg("agg-contact")),
        ReferenceEdge::new(id("post-1"), property("related"), 0, agg("agg-post-2")),
        ReferenceEdge::new(id("post-1"), property("related"), 2, agg("agg-gone")),
        ReferenceEdge::new(id("post-1"), property("author"), 0, agg("agg-about")),
    ] {
        index.add_reference(reference).expect("fixture reference");
    }

    (index, schema())
}

pub fn site_graph() -> ContentGraph {
    let (index, schema) = site_hierarchy();
    ContentGraph::new(Arc::new(index), Arc::new(schema))
}

/// The site subgraph for `content_stream` / `language=en`.
pub fn site_subgraph(content_stream: &str) -> ContentSubgraph {
    site_subgraph_with_settings(content_stream, SubgraphSettings::default())
}

pub fn site_subgraph_with_settings(content_stream: &str, settings: SubgraphSettings) -> ContentSubgraph {
    site_graph()
        .with_settings(settings)
        .subgraph_for_scope(scope(content_stream))
}

// ============================================================================
// Misbehaving stores
// ============================================================================

/// Two nodes, `x` and `y`, each claiming the other as parent.
///
/// Only reachable through a store; [`HierarchyIndex`] refuses to load it.
#[derive(Debug)]
pub struct CyclicStore {
    x: Arc<Node>,
    y: Arc<Node>,
}

impl Default for CyclicStore {
    fn default() -> Self {
        Self {
            x: Arc::new(page("x", "agg-x", "live")),
            y: Arc::new(page("y", "agg-y", "live")),
        }
    }
}

impl CyclicStore {
    fn lookup(&self, identifier: &NodeIdentifier) -> Option<(&Arc<Node>, &Arc<Node>)> {
        match identifier.as_str() {
            "x" => Some((&self.x, &self.y)),
            "y" => Some((&self.y, &self.x)),
            _ => None,
        }
    }
}

#[async_trait]
impl HierarchyStore for CyclicStore {
    async fn node_by_identifier(
        &self,
        _scope: &SubgraphScope,
        identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        Ok(self.lookup(identifier).map(|(node, _)| Arc::clone(node)))
    }

    async fn node_by_aggregate_identifier(
        &self,
        _scope: &SubgraphScope,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        Ok([&self.x, &self.y]
            .into_iter()
            .find(|node| &node.aggregate_identifier == aggregate_identifier)
            .cloned())
    }

    async fn child_edges(
        &self,
        _scope: &SubgraphScope,
        parent: &NodeIdentifier,
    ) -> Result<Vec<ChildEdge>> {
        Ok(self
            .lookup(parent)
            .map(|(_, other)| ChildEdge {
                node: Arc::clone(other),
                name: name(other.identifier.as_str()),
                position: 0,
            })
            .into_iter()
            .collect())
    }

    async fn parent_edge(
        &self,
        _scope: &SubgraphScope,
        child: &NodeIdentifier,
    ) -> Result<Option<ParentEdge>> {
        Ok(self.lookup(child).map(|(node, other)| ParentEdge {
            parent: Arc::clone(other),
            name: name(node.identifier.as_str()),
            position: 0,
        }))
    }

    async fn references(
        &self,
        _scope: &SubgraphScope,
        _source: &NodeIdentifier,
        _property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>> {
        Ok(Vec::new())
    }

    async fn nodes_by_type_names(
        &self,
        _scope: &SubgraphScope,
        _type_names: &[NodeTypeName],
    ) -> Result<Vec<Arc<Node>>> {
        Ok(vec![Arc::clone(&self.x), Arc::clone(&self.y)])
    }
}

/// The site hierarchy behind a store that counts edge name and reference
/// lookups.
#[derive(Debug)]
pub struct CountingStore {
    inner: HierarchyIndex,
    child_by_edge_name: AtomicUsize,
    references: AtomicUsize,
}

impl CountingStore {
    pub fn site() -> Self {
        let (inner, _) = site_hierarchy();
        Self {
            inner,
            child_by_edge_name: AtomicUsize::new(0),
            references: AtomicUsize::new(0),
        }
    }

    pub fn child_by_edge_name_calls(&self) -> usize {
        self.child_by_edge_name.load(Ordering::SeqCst)
    }

    pub fn references_calls(&self) -> usize {
        self.references.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HierarchyStore for CountingStore {
    async fn node_by_identifier(
        &self,
        scope: &SubgraphScope,
        identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        self.inner.node_by_identifier(scope, identifier).await
    }

    async fn node_by_aggregate_identifier(
        &self,
        scope: &SubgraphScope,
        aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        self.inner
            .node_by_aggregate_identifier(scope, aggregate_identifier)
            .await
    }

    async fn child_edges(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
    ) -> Result<Vec<ChildEdge>> {
        self.inner.child_edges(scope, parent).await
    }

    async fn parent_edge(
        &self,
        scope: &SubgraphScope,
        child: &NodeIdentifier,
    ) -> Result<Option<ParentEdge>> {
        self.inner.parent_edge(scope, child).await
    }

    async fn child_by_edge_name(
        &self,
        scope: &SubgraphScope,
        parent: &NodeIdentifier,
        name: &NodeName,
    ) -> Result<Option<Arc<Node>>> {
        self.child_by_edge_name.fetch_add(1, Ordering::SeqCst);
        self.inner.child_by_edge_name(scope, parent, name).await
    }

    async fn references(
        &self,
        scope: &SubgraphScope,
        source: &NodeIdentifier,
        property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>> {
        self.references.fetch_add(1, Ordering::SeqCst);
        self.inner.references(scope, source, property_name).await
    }

    async fn nodes_by_type_names(
        &self,
        scope: &SubgraphScope,
        type_names: &[NodeTypeName],
    ) -> Result<Vec<Arc<Node>>> {
        self.inner.nodes_by_type_names(scope, type_names).await
    }
}

/// A store whose every call fails.
#[derive(Debug, Default)]
pub struct FailingStore;

fn offline<T>() -> Result<T> {
    Err(Error::backend("store offline"))
}

#[async_trait]
impl HierarchyStore for FailingStore {
    async fn node_by_identifier(
        &self,
        _scope: &SubgraphScope,
        _identifier: &NodeIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        offline()
    }

    async fn node_by_aggregate_identifier(
        &self,
        _scope: &SubgraphScope,
        _aggregate_identifier: &NodeAggregateIdentifier,
    ) -> Result<Option<Arc<Node>>> {
        offline()
    }

    async fn child_edges(
        &self,
        _scope: &SubgraphScope,
        _parent: &NodeIdentifier,
    ) -> Result<Vec<ChildEdge>> {
        offline()
    }

    async fn parent_edge(
        &self,
        _scope: &SubgraphScope,
        _child: &NodeIdentifier,
    ) -> Result<Option<ParentEdge>> {
        offline()
    }

    async fn references(
        &self,
        _scope: &SubgraphScope,
        _source: &NodeIdentifier,
        _property_name: Option<&PropertyName>,
    ) -> Result<Vec<Arc<Node>>> {
        offline()
    }

    async fn nodes_by_type_names(
        &self,
        _scope: &SubgraphScope,
        _type_names: &[NodeTypeName],
    ) -> Result<Vec<Arc<Node>>> {
        offline()
    }
}

pub fn cyclic_subgraph() -> ContentSubgraph {
    ContentGraph::new(Arc::new(CyclicStore::default()), Arc::new(schema()))
        .subgraph_for_scope(scope("live"))
}

/// The site subgraph for `content_stream` / `language=en`, read through
/// `store`.
pub fn counting_subgraph(store: Arc<CountingStore>, content_stream: &str) -> ContentSubgraph {
    ContentGraph::new(store, Arc::new(schema())).subgraph_for_scope(scope(content_stream))
}

pub fn failing_subgraph() -> ContentSubgraph {
    ContentGraph::new(Arc::new(FailingStore), Arc::new(schema()))
        .subgraph_for_scope(scope("live"))
}
