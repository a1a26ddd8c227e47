//! Handler functions for subgraph query commands.
//!
//! Each handler answers one [`QueryCommand`] against a [`QuerySession`] and
//! returns the JSON value `cgq` prints. Absent nodes come back as `null` or
//! an empty array; only invalid input, a corrupt hierarchy or a failing
//! store is an error.

use std::path::Path;
use std::sync::Arc;

use contentgraph_core::{
    Error, NodeAggregateIdentifier, NodeIdentifier, NodeTypeConstraints, Pagination, PropertyName,
    Result,
};
use contentgraph_subgraph::{
    ContentGraph, ContentSubgraph, ContextParameters, HierarchyIndex, HierarchyTraversalDirection,
    Node, NodeSummary, StaticNodeTypeSchema, SubgraphScope, SubgraphSettings, ValidationReport,
    load_hierarchy, validate_hierarchy,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::cli::{ConstraintArgs, QueryCommand};

// ============================================================================
// Session
// ============================================================================

/// A loaded hierarchy and the subgraph queries run against.
pub struct QuerySession {
    index: Arc<HierarchyIndex>,
    subgraph: ContentSubgraph,
}

impl QuerySession {
    /// Load the hierarchy at `path` and open `scope` on it.
    pub fn open_path(path: &Path, scope: SubgraphScope, settings: SubgraphSettings) -> Result<Self> {
        let (index, schema) = load_hierarchy(path)?;
        Ok(Self::from_parts(index, schema, scope, settings))
    }

    pub fn from_parts(
        index: HierarchyIndex,
        schema: StaticNodeTypeSchema,
        scope: SubgraphScope,
        settings: SubgraphSettings,
    ) -> Self {
        let index = Arc::new(index);
        let graph = ContentGraph::new(index.clone(), Arc::new(schema)).with_settings(settings);
        Self {
            subgraph: graph.subgraph_for_scope(scope),
            index,
        }
    }

    pub fn subgraph(&self) -> &ContentSubgraph {
        &self.subgraph
    }

    pub fn index(&self) -> &HierarchyIndex {
        &self.index
    }
}

// ============================================================================
// Command dispatch
// ============================================================================

/// Answer a query command.
pub async fn handle_query(session: &QuerySession, command: QueryCommand) -> Result<Value> {
    let subgraph = session.subgraph();
    match command {
        QueryCommand::Node { id } => {
            let node = subgraph.find_node_by_identifier(&id.parse()?).await?;
            to_json(node.as_deref().map(NodeSummary::from))
        }
        QueryCommand::Aggregate { aggregate } => {
            let node = subgraph
                .find_node_by_node_aggregate_identifier(&aggregate.parse()?)
                .await?;
            to_json(node.as_deref().map(NodeSummary::from))
        }
        QueryCommand::Children {
            parent,
            constraints,
            limit,
            offset,
            count,
        } => {
            let parent: NodeIdentifier = parent.parse()?;
            let constraints = parse_constraints(&constraints)?;
            let pagination = Pagination::new(limit, offset)?;
            if count {
                let count = subgraph.count_child_nodes(&parent, &constraints).await?;
                return Ok(json!({ "count": count }));
            }
            let children = subgraph
                .find_child_nodes(&parent, &constraints, pagination)
                .await?;
            to_json(summaries(&children))
        }
        QueryCommand::Parent { id } => {
            let parent = subgraph.find_parent_node(&id.parse()?).await?;
            to_json(parent.as_deref().map(NodeSummary::from))
        }
        QueryCommand::Siblings { id } => {
            let id: NodeIdentifier = id.parse()?;
            let preceding = subgraph.find_preceding_sibling(&id).await?;
            let succeeding = subgraph.find_succeeding_sibling(&id).await?;
            Ok(json!({
                "preceding": to_json(preceding.as_deref().map(NodeSummary::from))?,
                "succeeding": to_json(succeeding.as_deref().map(NodeSummary::from))?,
            }))
        }
        QueryCommand::Path { id } => {
            let path = subgraph.find_node_path(&id.parse()?).await?;
            Ok(path.map_or(Value::Null, |p| Value::String(p.to_string())))
        }
        QueryCommand::Resolve { path, from } => {
            let node = subgraph
                .find_node_by_path(&path.parse()?, &from.parse()?)
                .await?;
            to_json(node.as_deref().map(NodeSummary::from))
        }
        QueryCommand::References { id, property } => {
            let property: Option<PropertyName> = property.map(|p| p.parse()).transpose()?;
            let nodes = subgraph
                .find_referenced_nodes(&id.parse()?, property.as_ref())
                .await?;
            to_json(summaries(&nodes))
        }
        QueryCommand::ByType { node_type } => {
            let nodes = subgraph.find_nodes_by_type(&node_type.parse()?).await?;
            to_json(summaries(&nodes))
        }
        QueryCommand::Subtree {
            aggregates,
            levels,
            constraints,
            show_hidden,
        } => {
            let entries = aggregates
                .iter()
                .map(|a| a.parse())
                .collect::<Result<Vec<NodeAggregateIdentifier>>>()?;
            let context = ContextParameters::default().with_invisible_content_shown(show_hidden);
            let subtrees = subgraph
                .find_subtrees(&entries, levels, &context, &parse_constraints(&constraints)?)
                .await?;
            to_json(&subtrees)
        }
        QueryCommand::Walk {
            id,
            up,
            constraints,
        } => {
            let direction = if up {
                HierarchyTraversalDirection::Up
            } else {
                HierarchyTraversalDirection::Down
            };
            let constraints = parse_constraints(&constraints)?;
            let visited = walk(subgraph, &id.parse()?, direction, &constraints).await?;
            to_json(visited)
        }
        QueryCommand::Dump => handle_dump(session).await,
    }
}

/// Check the loaded hierarchy.
pub fn handle_validate(session: &QuerySession) -> ValidationReport {
    validate_hierarchy(session.index())
}

// ============================================================================
// Handlers
// ============================================================================

/// Summaries of the nodes visited walking from `start`, in visit order.
///
/// An unknown start node yields an empty walk.
async fn walk(
    subgraph: &ContentSubgraph,
    start: &NodeIdentifier,
    direction: HierarchyTraversalDirection,
    constraints: &NodeTypeConstraints,
) -> Result<Vec<NodeSummary>> {
    let Some(start) = subgraph.find_node_by_identifier(start).await? else {
        log::debug!("walk start {start} not found in {}", subgraph.scope());
        return Ok(Vec::new());
    };

    let mut visited = Vec::new();
    subgraph
        .traverse_hierarchy(&start, direction, constraints, |node| {
            visited.push(NodeSummary::from(node.as_ref()));
        })
        .await?;
    Ok(visited)
}

/// Walk down from every root of the subgraph, then print what was
/// materialized.
async fn handle_dump(session: &QuerySession) -> Result<Value> {
    let subgraph = session.subgraph();
    let all = NodeTypeConstraints::allow_all();

    for root in session.index().roots_in_scope(subgraph.scope()) {
        if let Some(root) = subgraph.find_node_by_identifier(&root).await? {
            subgraph
                .traverse_hierarchy(&root, HierarchyTraversalDirection::Down, &all, |_| {})
                .await?;
        }
    }
    to_json(subgraph.to_document())
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_constraints(args: &ConstraintArgs) -> Result<NodeTypeConstraints> {
    NodeTypeConstraints::parse(&args.filter)
}

fn summaries(nodes: &[Arc<Node>]) -> Vec<NodeSummary> {
    nodes.iter().map(|node| NodeSummary::from(node.as_ref())).collect()
}

fn to_json<T: Serialize>(value: T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| Error::serialization(e.to_string()))
}

// ============================================================================
// Tests
// ============================================================================
