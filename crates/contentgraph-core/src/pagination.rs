//! Limit/offset pagination.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Validated limit/offset pair.
///
/// Paging is always applied to the already filtered sequence, so a page
/// is a slice of what an unpaged query returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of items to return.
    pub limit: Option<usize>,
    /// Number of items to skip first.
    pub offset: Option<usize>,
}

impl Pagination {
    /// No paging.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from caller-supplied signed values.
    ///
    /// Negative values are a precondition violation.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self> {
        Ok(Self {
            limit: non_negative("limit", limit)?,
            offset: non_negative("offset", offset)?,
        })
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Skip `offset` items, then take at most `limit`.
    pub fn apply<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        items
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
    }

    pub fn is_unbounded(&self) -> bool {
        self.limit.is_none() && self.offset.is_none()
    }
}

fn non_negative(label: &str, value: Option<i64>) -> Result<Option<usize>> {
    match value {
        None => Ok(None),
        Some(v) if v < 0 => Err(Error::invalid_argument(format!(
            "{label} must not be negative, got {v}"
        ))),
        Some(v) => usize::try_from(v)
            .map(Some)
            .map_err(|_| Error::invalid_argument(format!("{label} {v} is out of range"))),
    }
}
