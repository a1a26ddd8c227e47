//! Bounded subtree extraction.
//!
//! [`ContentSubgraph::find_subtrees`] builds one [`Subtree`] per entry
//! aggregate that resolves in the subgraph. An entry node is level 0 and
//! children are collected until `max_levels` is reached, so `max_levels = 0`
//! yields single-node subtrees.
//!
//! Children are fetched level by level (breadth-first) and the tree is
//! assembled afterwards. Results are cached per entry, level count,
//! constraints and context.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use contentgraph_core::{
    Error, NodeAggregateIdentifier, NodeIdentifier, NodeTypeConstraints, Result,
};
use serde::{Deserialize, Serialize};

use crate::cache::SubtreeKey;
use crate::node::Node;
use crate::node_type::ResolvedNodeTypeConstraints;
use crate::subgraph::ContentSubgraph;

/// Visibility switches for subtree extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextParameters {
    /// Include nodes flagged as hidden.
    #[serde(default)]
    pub invisible_content_shown: bool,
}

impl ContextParameters {
    pub fn with_invisible_content_shown(mut self, shown: bool) -> Self {
        self.invisible_content_shown = shown;
        self
    }

    /// Whether `node` is visible under these parameters.
    pub fn is_visible(&self, node: &Node) -> bool {
        self.invisible_content_shown || !node.hidden
    }
}

/// A node with its (bounded, filtered) descendants.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Subtree {
    pub node: Arc<Node>,
    /// Distance from the entry node.
    pub level: usize,
    pub children: Vec<Subtree>,
}

impl Subtree {
    /// Number of edges on the longest path down to a leaf.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Subtree::node_count).sum::<usize>()
    }
}

/// The multi-root result of [`ContentSubgraph::find_subtrees`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Subtrees {
    /// One subtree per resolved entry, in entry order.
    pub roots: Vec<Subtree>,
}

impl Subtrees {
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Subtree> {
        self.roots.iter()
    }
}

impl ContentSubgraph {
    /// Build subtrees below the given entry aggregates.
    ///
    /// Entries without a (visible) variant in this subgraph are left out.
    /// Constraints apply to descendants only; the entry itself is always
    /// included.
    pub async fn find_subtrees(
        &self,
        entry_aggregate_identifiers: &[NodeAggregateIdentifier],
        max_levels: usize,
        context: &ContextParameters,
        constraints: &NodeTypeConstraints,
    ) -> Result<Subtrees> {
        let resolved = self.resolve_constraints(constraints)?;
        let mut roots = Vec::with_capacity(entry_aggregate_identifiers.len());

        for aggregate_identifier in entry_aggregate_identifiers {
            let key = SubtreeKey {
                aggregate_identifier: aggregate_identifier.clone(),
                max_levels,
                constraints: constraints.clone(),
                invisible_content_shown: context.invisible_content_shown,
            };
            if let Some(subtree) = self.in_memory_cache().subtree(&key) {
                roots.push(subtree);
                continue;
            }

            let Some(entry) = self
                .find_node_by_node_aggregate_identifier(aggregate_identifier)
                .await?
            else {
                log::debug!(
                    "subtree entry {aggregate_identifier} has no variant in {}",
                    self.scope()
                );
                continue;
            };
            if !context.is_visible(&entry) {
                log::debug!("subtree entry {aggregate_identifier} is hidden");
                continue;
            }

            let subtree = self
                .build_subtree(entry, max_levels, context, &resolved)
                .await?;
            roots.push(self.in_memory_cache().put_subtree(key, subtree));
        }

        Ok(Subtrees { roots })
    }

    async fn build_subtree(
        &self,
        entry: Arc<Node>,
        max_levels: usize,
        context: &ContextParameters,
        constraints: &ResolvedNodeTypeConstraints<'_>,
    ) -> Result<Subtree> {
        let max_depth = self.settings().max_hierarchy_depth;
        let mut seen: HashSet<NodeIdentifier> = HashSet::from([entry.identifier.clone()]);
        let mut children_of: HashMap<NodeIdentifier, Vec<Arc<Node>>> = HashMap::new();
        let mut frontier = vec![Arc::clone(&entry)];

        for level in 0..max_levels {
            if frontier.is_empty() {
                break;
            }

            let mut next = Vec::new();
            for parent in &frontier {
                let children: Vec<Arc<Node>> = self
                    .matching_children(&parent.identifier, constraints)
                    .await?
                    .into_iter()
                    .filter(|child| context.is_visible(child))
                    .collect();

                if !children.is_empty() && level + 1 > max_depth {
                    return Err(Error::broken_hierarchy(format!(
                        "subtree below '{}' is deeper than {max_depth} levels",
                        entry.identifier
                    )));
                }
                for child in &children {
                    if !seen.insert(child.identifier.clone()) {
                        return Err(Error::broken_hierarchy(format!(
                            "'{}' appears twice below '{}'",
                            child.identifier, entry.identifier
                        )));
                    }
                }
                next.extend(children.iter().cloned());
                children_of.insert(parent.identifier.clone(), children);
            }
            frontier = next;
        }

        Ok(assemble(entry, 0, &mut children_of))
    }
}

fn assemble(
    node: Arc<Node>,
    level: usize,
    children_of: &mut HashMap<NodeIdentifier, Vec<Arc<Node>>>,
) -> Subtree {
    let children = children_of
        .remove(&node.identifier)
        .unwrap_or_default()
        .into_iter()
        .map(|child| assemble(child, level + 1, children_of))
        .collect();
    Subtree {
        node,
        level,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, agg, id};
    use crate::{HierarchyTraversalDirection, SubgraphSettings};

    fn ids(subtree: &Subtree) -> Vec<&str> {
        subtree
            .children
            .iter()
            .map(|c| c.node.identifier.as_str())
            .collect()
    }

    #[tokio::test]
    async fn test_zero_levels_yields_single_node() {
        let subgraph = fixtures::site_subgraph("live");
        let subtrees = subgraph
            .find_subtrees(
                &[agg("agg-root")],
                0,
                &ContextParameters::default(),
                &NodeTypeConstraints::allow_all(),
            )
            .await
            .unwrap();

        assert_eq!(subtrees.len(), 1);
        assert_eq!(subtrees.roots[0].node.identifier.as_str(), "root");
        assert!(subtrees.roots[0].children.is_empty());
        assert_eq!(subtrees.roots[0].depth(), 0);
    }

    #[tokio::test]
    async fn test_levels_bound_depth() {
        let subgraph = fixtures::site_subgraph("live");
        let subtrees = subgraph
            .find_subtrees(
                &[agg("agg-home")],
                2,
                &ContextParameters::default(),
                &NodeTypeConstraints::allow_all(),
            )
            .await
            .unwrap();

        let home = &subtrees.roots[0];
        assert_eq!(home.depth(), 2);
        assert_eq!(ids(home), vec!["about", "blog", "contact"]);
        assert_eq!(ids(&home.children[1]), vec!["post-1", "teaser", "post-2"]);
        assert_eq!(home.children[1].children[0].level, 2);
        // hidden "internal" is left out
        assert_eq!(ids(&home.children[2]), vec!["form"]);
        assert_eq!(home.node_count(), 8);
    }

    #[tokio::test]
    async fn test_invisible_content_shown() {
        let subgraph = fixtures::site_subgraph("live");
        let context = ContextParameters::default().with_invisible_content_shown(true);
        let subtrees = subgraph
            .find_subtrees(&[agg("agg-contact")], 5, &context, &NodeTypeConstraints::allow_all())
            .await
            .unwrap();
        assert_eq!(ids(&subtrees.roots[0]), vec!["form", "internal"]);

        let hidden_entry = subgraph
            .find_subtrees(
                &[agg("agg-internal")],
                1,
                &ContextParameters::default(),
                &NodeTypeConstraints::allow_all(),
            )
            .await
            .unwrap();
        assert!(hidden_entry.is_empty());
    }

    #[tokio::test]
    async fn test_constraints_filter_descendants() {
        let subgraph = fixtures::site_subgraph("live");
        let documents = NodeTypeConstraints::parse("Acme:Document").unwrap();
        let subtrees = subgraph
            .find_subtrees(&[agg("agg-home")], 3, &ContextParameters::default(), &documents)
            .await
            .unwrap();

        let home = &subtrees.roots[0];
        assert_eq!(ids(home), vec!["about", "blog", "contact"]);
        assert_eq!(ids(&home.children[1]), vec!["post-1", "post-2"]);
        assert!(home.children[2].children.is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_entries_are_skipped() {
        let subgraph = fixtures::site_subgraph("draft");
        let subtrees = subgraph
            .find_subtrees(
                &[agg("agg-blog"), agg("agg-about"), agg("agg-missing")],
                1,
                &ContextParameters::default(),
                &NodeTypeConstraints::allow_all(),
            )
            .await
            .unwrap();

        assert_eq!(subtrees.len(), 1);
        assert_eq!(subtrees.roots[0].node.identifier.as_str(), "about-draft");
    }

    #[tokio::test]
    async fn test_subtrees_are_cached() {
        let subgraph = fixtures::site_subgraph("live");
        let args = (
            [agg("agg-blog")],
            ContextParameters::default(),
            NodeTypeConstraints::allow_all(),
        );
        let first = subgraph.find_subtrees(&args.0, 1, &args.1, &args.2).await.unwrap();
        let second = subgraph.find_subtrees(&args.0, 1, &args.1, &args.2).await.unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first.roots[0].node, &second.roots[0].node));
    }

    #[tokio::test]
    async fn test_unknown_constraint_type() {
        let subgraph = fixtures::site_subgraph("live");
        let err = subgraph
            .find_subtrees(
                &[agg("agg-home")],
                1,
                &ContextParameters::default(),
                &NodeTypeConstraints::parse("Acme:Bogus").unwrap(),
            )
            .await
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[tokio::test]
    async fn test_cyclic_subtree_is_broken_hierarchy() {
        let subgraph = fixtures::cyclic_subgraph();
        let err = subgraph
            .find_subtrees(
                &[agg("agg-x")],
                5,
                &ContextParameters::default(),
                &NodeTypeConstraints::allow_all(),
            )
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
        assert!(err.to_string().contains("appears twice"));
    }

    #[tokio::test]
    async fn test_depth_fuse_allows_tree_exactly_at_limit() {
        let settings = |depth| SubgraphSettings::default().with_max_hierarchy_depth(depth);
        let all = NodeTypeConstraints::allow_all();
        let context = ContextParameters::default();

        // home has descendants two levels down
        let at_limit = fixtures::site_subgraph_with_settings("live", settings(2));
        let subtrees = at_limit
            .find_subtrees(&[agg("agg-home")], 5, &context, &all)
            .await
            .unwrap();
        assert_eq!(subtrees.roots[0].depth(), 2);

        let home = at_limit.find_node_by_identifier(&id("home")).await.unwrap().unwrap();
        let mut visited = 0;
        at_limit
            .traverse_hierarchy(&home, HierarchyTraversalDirection::Down, &all, |_| visited += 1)
            .await
            .unwrap();
        assert_eq!(visited, 9);

        // post-1 sits four levels below root
        let path = fixtures::site_subgraph_with_settings("live", settings(4))
            .find_node_path(&id("post-1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path.to_string(), "/sites/home/blog/first-post");
        assert!(
            fixtures::site_subgraph_with_settings("live", settings(3))
                .find_node_path(&id("post-1"))
                .await
                .unwrap_err()
                .is_integrity_violation()
        );

        let below_limit = fixtures::site_subgraph_with_settings("live", settings(1));
        let blog = below_limit
            .find_subtrees(&[agg("agg-blog")], 5, &context, &all)
            .await
            .unwrap();
        assert_eq!(blog.roots[0].node_count(), 4);
        let err = below_limit
            .find_subtrees(&[agg("agg-home")], 5, &context, &all)
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[test]
    fn test_subtree_serializes() {
        let node = Arc::new(fixtures::page("p", "agg-p", "live"));
        let subtree = Subtree {
            node: Arc::clone(&node),
            level: 0,
            children: vec![Subtree {
                node,
                level: 1,
                children: Vec::new(),
            }],
        };
        let json = serde_json::to_value(&subtree).unwrap();
        assert_eq!(json["node"]["identifier"], "p");
        assert_eq!(json["children"][0]["level"], 1);
    }
}
