//! Raw node type constraints.
//!
//! [`NodeTypeConstraints`] is the unresolved form of a type filter as a
//! caller writes it, e.g. `"Acme:Document,!Acme:Shortcut"`. Evaluating it
//! needs the node type schema (subtype semantics), which lives in the
//! subgraph crate.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, NodeTypeName, Result};

/// Allow-list / deny-list filter over node types.
///
/// Every listed name also covers all of its subtypes. When no positive name
/// is given, types not mentioned at all are allowed (wildcard).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeTypeConstraints {
    wildcard_allowed: bool,
    allowed: BTreeSet<NodeTypeName>,
    disallowed: BTreeSet<NodeTypeName>,
}

impl NodeTypeConstraints {
    /// Constraints that let every node type through.
    pub fn allow_all() -> Self {
        Self {
            wildcard_allowed: true,
            allowed: BTreeSet::new(),
            disallowed: BTreeSet::new(),
        }
    }

    /// Build from explicit lists.
    ///
    /// A name may not appear in both lists.
    pub fn new(
        allowed: impl IntoIterator<Item = NodeTypeName>,
        disallowed: impl IntoIterator<Item = NodeTypeName>,
    ) -> Result<Self> {
        let allowed: BTreeSet<_> = allowed.into_iter().collect();
        let disallowed: BTreeSet<_> = disallowed.into_iter().collect();

        if let Some(both) = allowed.intersection(&disallowed).next() {
            return Err(Error::invalid_argument(format!(
                "node type '{both}' is both allowed and disallowed"
            )));
        }

        Ok(Self {
            wildcard_allowed: allowed.is_empty(),
            allowed,
            disallowed,
        })
    }

    /// Parse a comma separated filter; `!` negates a name.
    ///
    /// An empty filter allows everything.
    pub fn parse(filter: &str) -> Result<Self> {
        let mut allowed = Vec::new();
        let mut disallowed = Vec::new();

        for part in filter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.strip_prefix('!') {
                Some(negated) => disallowed.push(NodeTypeName::new(negated.trim())?),
                None => allowed.push(NodeTypeName::new(part)?),
            }
        }

        Self::new(allowed, disallowed)
    }

    /// Whether types matched by no explicit entry are allowed.
    pub fn is_wildcard_allowed(&self) -> bool {
        self.wildcard_allowed
    }

    pub fn allowed(&self) -> &BTreeSet<NodeTypeName> {
        &self.allowed
    }

    pub fn disallowed(&self) -> &BTreeSet<NodeTypeName> {
        &self.disallowed
    }

    /// True when no filtering happens at all.
    pub fn is_unconstrained(&self) -> bool {
        self.wildcard_allowed && self.allowed.is_empty() && self.disallowed.is_empty()
    }
}

impl fmt::Display for NodeTypeConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .allowed
            .iter()
            .map(ToString::to_string)
            .chain(self.disallowed.iter().map(|n| format!("!{n}")))
            .collect();
        f.write_str(&parts.join(","))
    }
}

impl FromStr for NodeTypeConstraints {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> NodeTypeName {
        NodeTypeName::new(s).unwrap()
    }

    #[test]
    fn test_parse_mixed_filter() {
        let c = NodeTypeConstraints::parse("Acme:Document, !Acme:Shortcut").unwrap();
        assert!(!c.is_wildcard_allowed());
        assert!(c.allowed().contains(&name("Acme:Document")));
        assert!(c.disallowed().contains(&name("Acme:Shortcut")));
    }

    #[test]
    fn test_only_negations_keep_wildcard() {
        let c = NodeTypeConstraints::parse("!Acme:Shortcut").unwrap();
        assert!(c.is_wildcard_allowed());
        assert!(!c.is_unconstrained());
    }

    #[test]
    fn test_empty_filter_is_unconstrained() {
        let c = NodeTypeConstraints::parse("  ").unwrap();
        assert!(c.is_unconstrained());
        assert_eq!(c, NodeTypeConstraints::allow_all());
    }

    #[test]
    fn test_conflicting_entries_rejected() {
        let err = NodeTypeConstraints::parse("Acme:Page,!Acme:Page").unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[test]
    fn test_display_round_trip() {
        let c = NodeTypeConstraints::parse("Acme:Page,!Acme:Hidden").unwrap();
        assert_eq!(c.to_string(), "Acme:Page,!Acme:Hidden");
        assert_eq!(c.to_string().parse::<NodeTypeConstraints>().unwrap(), c);
    }
}
