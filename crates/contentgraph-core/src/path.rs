//! Node names and node paths.
//!
//! A [`NodeName`] is the name of the hierarchy edge leading to a node, unique
//! among the direct children of one parent. A [`NodePath`] is a sequence of
//! such names; `"/"` addresses the root node of a subgraph.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The name of a hierarchy edge (one path segment).
///
/// Names are lower-cased on construction and may contain ASCII
/// alphanumerics, `-`, `_` and `.`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a node name, validating the allowed character set.
    pub fn new(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(Error::invalid_argument("node name must not be empty"));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
        {
            return Err(Error::invalid_argument(format!(
                "node name '{value}' contains invalid character '{c}'"
            )));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for NodeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for NodeName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<NodeName> for String {
    fn from(value: NodeName) -> Self {
        value.0
    }
}

/// An ordered sequence of node names.
///
/// Absolute paths start at the root of a subgraph; relative paths start at
/// an arbitrary node. Both resolve segment by segment.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodePath {
    absolute: bool,
    segments: Vec<NodeName>,
}

impl NodePath {
    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            absolute: true,
            segments: Vec::new(),
        }
    }

    /// Build an absolute path from segments.
    pub fn from_segments(segments: Vec<NodeName>) -> Self {
        Self {
            absolute: true,
            segments,
        }
    }

    /// Parse `"/a/b"` (absolute) or `"a/b"` (relative).
    ///
    /// Repeated or trailing slashes are tolerated.
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        let absolute = value.starts_with('/');
        let segments = value
            .split('/')
            .filter(|s| !s.is_empty())
            .map(NodeName::new)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { absolute, segments })
    }

    /// Return a new path with `name` appended.
    pub fn append(&self, name: NodeName) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name);
        Self {
            absolute: self.absolute,
            segments,
        }
    }

    /// The path segments in order.
    pub fn segments(&self) -> &[NodeName] {
        &self.segments
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    /// True for `/` (and for the empty relative path).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            f.write_str("/")?;
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(segment.as_str())?;
        }
        Ok(())
    }
}

impl FromStr for NodePath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for NodePath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<NodePath> for String {
    fn from(value: NodePath) -> Self {
        value.to_string()
    }
}
