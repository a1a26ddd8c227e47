//! Hierarchy validation and integrity checking.
//!
//! [`HierarchyIndex`] already refuses cycles, second parents and duplicate
//! sibling names while loading. The checks here cover what it accepts but
//! what usually points at bad data: dangling references, scopes with
//! several roots, disconnected nodes and aggregates whose variants disagree
//! on their node type.

use std::collections::BTreeMap;

use contentgraph_core::{NodeAggregateIdentifier, NodeTypeName};
use serde::{Deserialize, Serialize};

use crate::hierarchy::HierarchyIndex;

// ============================================================================
// Types
// ============================================================================

/// Result of hierarchy validation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    /// Critical issues that should be fixed.
    pub errors: Vec<ValidationIssue>,
    /// Non-critical issues.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if no errors were found; warnings do not count.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Total issue count (errors + warnings).
    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len()
    }

    /// Find an issue by code among errors and warnings.
    pub fn issue(&self, code: &str) -> Option<&ValidationIssue> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .find(|issue| issue.code == code)
    }
}

/// A validation issue found in the hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Issue code, e.g. `ORPHAN_NODES`.
    pub code: String,
    pub message: String,
    /// Affected node or aggregate identifiers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<String>,
}

impl ValidationIssue {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            nodes: Vec::new(),
        }
    }

    pub fn with_nodes(mut self, nodes: Vec<String>) -> Self {
        self.nodes = nodes;
        self
    }
}

// ============================================================================
// Validation functions
// ============================================================================

/// Validate a loaded hierarchy.
pub fn validate_hierarchy(index: &HierarchyIndex) -> ValidationReport {
    let mut report = ValidationReport::new();

    check_aggregate_types(index, &mut report);
    check_dangling_references(index, &mut report);
    check_multiple_roots(index, &mut report);
    check_orphans(index, &mut report);

    report
}

// ============================================================================
// Individual checks
// ============================================================================

fn check_aggregate_types(index: &HierarchyIndex, report: &mut ValidationReport) {
    let mut types: BTreeMap<NodeAggregateIdentifier, Vec<NodeTypeName>> = BTreeMap::new();
    for scope in index.scopes() {
        for node in index.nodes_in_scope(&scope) {
            let seen = types.entry(node.aggregate_identifier.clone()).or_default();
            if !seen.contains(&node.node_type_name) {
                seen.push(node.node_type_name.clone());
            }
        }
    }

    let inconsistent: Vec<String> = types
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .map(|(aggregate, _)| aggregate.to_string())
        .collect();

    if !inconsistent.is_empty() {
        report.add_error(
            ValidationIssue::new(
                "INCONSISTENT_AGGREGATE_TYPE",
                format!(
                    "{} aggregate(s) have variants of different node types",
                    inconsistent.len()
                ),
            )
            .with_nodes(inconsistent),
        );
    }
}

fn check_dangling_references(index: &HierarchyIndex, report: &mut ValidationReport) {
    let dangling: Vec<String> = index
        .all_references()
        .into_iter()
        .filter(|reference| {
            index
                .node(&reference.source)
                .is_some_and(|source| index.resolve_aggregate(&source.scope(), &reference.target).is_none())
        })
        .map(|reference| {
            format!(
                "{}.{}[{}] -> {}",
                reference.source, reference.property_name, reference.position, reference.target
            )
        })
        .collect();

    if !dangling.is_empty() {
        report.add_warning(
            ValidationIssue::new(
                "DANGLING_REFERENCES",
                format!(
                    "{} reference(s) point at aggregates without a variant in the source's scope",
                    dangling.len()
                ),
            )
            .with_nodes(dangling),
        );
    }
}

fn check_multiple_roots(index: &HierarchyIndex, report: &mut ValidationReport) {
    for scope in index.scopes() {
        let roots = index.roots_in_scope(&scope);
        if roots.len() > 1 {
            report.add_warning(
                ValidationIssue::new(
                    "MULTIPLE_ROOTS",
                    format!("{scope} has {} roots", roots.len()),
                )
                .with_nodes(roots.iter().map(ToString::to_string).collect()),
            );
        }
    }
}

/// Nodes with neither parent nor children in a scope holding other nodes.
fn check_orphans(index: &HierarchyIndex, report: &mut ValidationReport) {
    let mut orphans = Vec::new();
    for scope in index.scopes() {
        if index.nodes_in_scope(&scope).len() < 2 {
            continue;
        }
        orphans.extend(
            index
                .roots_in_scope(&scope)
                .into_iter()
                .filter(|root| index.child_count(&scope, root) == 0)
                .map(|root| root.to_string()),
        );
    }

    if !orphans.is_empty() {
        report.add_warning(
            ValidationIssue::new(
                "ORPHAN_NODES",
                format!("{} node(s) have no connections", orphans.len()),
            )
            .with_nodes(orphans),
        );
    }
}
