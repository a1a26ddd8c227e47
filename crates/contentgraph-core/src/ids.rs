//! Identifier value types.
//!
//! The content graph separates three kinds of identity:
//!
//! - [`NodeAggregateIdentifier`]: one logical piece of content across every
//!   dimension variant and content stream
//! - [`NodeIdentifier`]: exactly one materialization of an aggregate inside a
//!   single (content stream, dimension space point)
//! - [`ContentStreamIdentifier`]: an isolated line of edits (a workspace)
//!
//! They are distinct types so an aggregate identifier can never be passed
//! where a variant identifier is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

macro_rules! string_value_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Create from a string, rejecting empty or blank values.
            pub fn new(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(Error::invalid_argument(concat!($label, " must not be empty")));
                }
                Ok(Self(value))
            }

            /// Borrow the underlying string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = Error;

            fn try_from(value: String) -> Result<Self> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_value_type!(
    /// Identifies one concrete node variant within one subgraph scope.
    NodeIdentifier,
    "node identifier"
);

string_value_type!(
    /// Identifies a node aggregate across all of its variants.
    NodeAggregateIdentifier,
    "node aggregate identifier"
);

string_value_type!(
    /// Identifies a content stream (workspace line of edits).
    ContentStreamIdentifier,
    "content stream identifier"
);

string_value_type!(
    /// Fully qualified node type name, e.g. `Acme.Site:Document`.
    NodeTypeName,
    "node type name"
);

string_value_type!(
    /// Name of a node property.
    PropertyName,
    "property name"
);

impl NodeIdentifier {
    /// Generate a fresh random identifier.
    pub fn create() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl NodeAggregateIdentifier {
    /// Generate a fresh random aggregate identifier.
    pub fn create() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl ContentStreamIdentifier {
    /// Generate a fresh random content stream identifier.
    pub fn create() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert!(NodeIdentifier::new("").is_err());
        assert!(NodeAggregateIdentifier::new("   ").is_err());
        assert!(ContentStreamIdentifier::new("live").is_ok());
    }

    #[test]
    fn test_parse_and_display() {
        let id: NodeTypeName = "Acme.Site:Page".parse().unwrap();
        assert_eq!(id.to_string(), "Acme.Site:Page");
        assert_eq!(id.as_str(), "Acme.Site:Page");
    }

    #[test]
    fn test_create_is_unique() {
        let a = NodeIdentifier::create();
        let b = NodeIdentifier::create();
        assert_ne!(a, b);
    }

    #[test]
    fn test_serde_transparent_string() {
        let id = NodeAggregateIdentifier::new("agg-1").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"agg-1\"");

        let parsed: NodeAggregateIdentifier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);

        let empty: std::result::Result<NodeIdentifier, _> = serde_json::from_str("\"\"");
        assert!(empty.is_err());
    }
}
