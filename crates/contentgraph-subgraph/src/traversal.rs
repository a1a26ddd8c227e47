//! Depth-first hierarchy walks.
//!
//! [`ContentSubgraph::traverse_hierarchy`] walks toward descendants or
//! toward ancestors and hands every visited node to a visitor:
//!
//! - the start node is always visited first, whatever the constraints say
//! - a neighbour failing the constraints is neither visited nor walked
//!   through, so its own subtree is skipped
//! - children are visited in position order (pre-order)
//! - the visitor cannot stop the walk; it always runs to completion
//!
//! The walk uses an explicit stack, so depth is bounded by
//! [`SubgraphSettings::max_hierarchy_depth`](crate::SubgraphSettings), not
//! by the call stack.

use std::collections::HashSet;
use std::sync::Arc;

use contentgraph_core::{Error, NodeIdentifier, NodeTypeConstraints, Result};
use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::subgraph::ContentSubgraph;

/// Which way a traversal follows hierarchy edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HierarchyTraversalDirection {
    /// Toward the root.
    Up,
    /// Toward the leaves.
    Down,
}

impl ContentSubgraph {
    /// Walk the hierarchy from `start`, calling `visit` once per node.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if `start` belongs to another scope
    /// - [`Error::UnknownNodeType`] for constraints naming unknown types
    /// - [`Error::BrokenHierarchy`] if a node is reached twice or the walk
    ///   gets deeper than the configured maximum
    pub async fn traverse_hierarchy<F>(
        &self,
        start: &Arc<Node>,
        direction: HierarchyTraversalDirection,
        constraints: &NodeTypeConstraints,
        mut visit: F,
    ) -> Result<()>
    where
        F: FnMut(&Arc<Node>),
    {
        if !start.is_in_scope(self.scope()) {
            return Err(Error::invalid_argument(format!(
                "traversal start '{}' belongs to {}, not {}",
                start.identifier,
                start.scope(),
                self.scope()
            )));
        }

        let resolved = self.resolve_constraints(constraints)?;
        let max_depth = self.settings().max_hierarchy_depth;

        let mut visited: HashSet<NodeIdentifier> = HashSet::new();
        let mut stack: Vec<(Arc<Node>, usize)> = vec![(Arc::clone(start), 0)];

        while let Some((node, depth)) = stack.pop() {
            if !visited.insert(node.identifier.clone()) {
                return Err(Error::broken_hierarchy(format!(
                    "'{}' reached twice while walking {direction:?} from '{}'",
                    node.identifier, start.identifier
                )));
            }
            if depth > max_depth {
                return Err(Error::broken_hierarchy(format!(
                    "walk from '{}' exceeds {max_depth} levels",
                    start.identifier
                )));
            }

            log::trace!("visit {} at depth {depth}", node.identifier);
            visit(&node);

            match direction {
                HierarchyTraversalDirection::Down => {
                    let children = self.matching_children(&node.identifier, &resolved).await?;
                    // Reversed so the lowest position is popped first.
                    stack.extend(children.into_iter().rev().map(|child| (child, depth + 1)));
                }
                HierarchyTraversalDirection::Up => {
                    if let Some(parent) = self.find_parent_node(&node.identifier).await?
                        && resolved.matches(&parent.node_type_name)
                    {
                        stack.push((parent, depth + 1));
                    }
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SubgraphSettings;
    use crate::fixtures::{self, id};

    async fn walk(
        subgraph: &ContentSubgraph,
        start: &str,
        direction: HierarchyTraversalDirection,
        constraints: &str,
    ) -> Result<Vec<String>> {
        let start = subgraph
            .find_node_by_identifier(&id(start))
            .await?
            .expect("fixture node");
        let constraints = NodeTypeConstraints::parse(constraints)?;
        let mut seen = Vec::new();
        subgraph
            .traverse_hierarchy(&start, direction, &constraints, |node| {
                seen.push(node.identifier.to_string())
            })
            .await?;
        Ok(seen)
    }

    #[tokio::test]
    async fn test_walk_down_pre_order() {
        let subgraph = fixtures::site_subgraph("live");
        let seen = walk(&subgraph, "home", HierarchyTraversalDirection::Down, "")
            .await
            .unwrap();
        assert_eq!(
            seen,
            vec!["home", "about", "blog", "post-1", "teaser", "post-2", "contact", "form", "internal"]
        );
    }

    #[tokio::test]
    async fn test_walk_down_with_constraints_prunes() {
        let subgraph = fixtures::site_subgraph("live");
        let seen = walk(&subgraph, "home", HierarchyTraversalDirection::Down, "Acme:Document,!Acme:Blog")
            .await
            .unwrap();
        assert_eq!(seen, vec!["home", "about", "contact"]);
    }

    #[tokio::test]
    async fn test_start_node_always_visited() {
        let subgraph = fixtures::site_subgraph("live");
        let seen = walk(&subgraph, "sites", HierarchyTraversalDirection::Down, "Acme:Text")
            .await
            .unwrap();
        assert_eq!(seen, vec!["sites"]);
    }

    #[tokio::test]
    async fn test_walk_up() {
        let subgraph = fixtures::site_subgraph("live");
        let seen = walk(&subgraph, "post-2", HierarchyTraversalDirection::Up, "")
            .await
            .unwrap();
        assert_eq!(seen, vec!["post-2", "blog", "home", "sites", "root"]);

        let documents = walk(&subgraph, "post-2", HierarchyTraversalDirection::Up, "Acme:Document")
            .await
            .unwrap();
        assert_eq!(documents, vec!["post-2", "blog", "home"]);
    }

    #[tokio::test]
    async fn test_depth_fuse() {
        let subgraph = fixtures::site_subgraph_with_settings(
            "live",
            SubgraphSettings::default().with_max_hierarchy_depth(1),
        );
        let err = walk(&subgraph, "home", HierarchyTraversalDirection::Down, "")
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[tokio::test]
    async fn test_cycle_is_detected() {
        let subgraph = fixtures::cyclic_subgraph();
        let err = walk(&subgraph, "x", HierarchyTraversalDirection::Up, "")
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
    }

    #[tokio::test]
    async fn test_cycle_is_detected_down() {
        let subgraph = fixtures::cyclic_subgraph();
        let err = walk(&subgraph, "x", HierarchyTraversalDirection::Down, "")
            .await
            .unwrap_err();
        assert!(err.is_integrity_violation());
        assert!(err.to_string().contains("reached twice"));
    }

    #[tokio::test]
    async fn test_foreign_start_rejected() {
        let live = fixtures::site_subgraph("live");
        let draft = fixtures::site_subgraph("draft");
        let foreign = draft
            .find_node_by_identifier(&id("about-draft"))
            .await
            .unwrap()
            .unwrap();

        let err = live
            .traverse_hierarchy(
                &foreign,
                HierarchyTraversalDirection::Down,
                &NodeTypeConstraints::allow_all(),
                |_| {},
            )
            .await
            .unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn test_direction_serde() {
        let json = serde_json::to_string(&HierarchyTraversalDirection::Up).unwrap();
        assert_eq!(json, "\"up\"");
    }
}
