//! Dimension space points.
//!
//! A [`DimensionSpacePoint`] is a coordinate in the space of content variance
//! dimensions, e.g. `language=en,region=us`. Coordinates are kept sorted by
//! dimension name so equal points always hash and print identically.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An ordered set of `dimension name -> value` coordinates.
///
/// Two points are equal iff all coordinates match. The empty point is valid
/// and addresses dimensionless content.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct DimensionSpacePoint {
    coordinates: BTreeMap<String, String>,
}

impl DimensionSpacePoint {
    /// Build a point from `(dimension, value)` pairs.
    pub fn new<K, V>(coordinates: impl IntoIterator<Item = (K, V)>) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = BTreeMap::new();
        for (dimension, value) in coordinates {
            let dimension = dimension.into();
            let value = value.into();
            if dimension.trim().is_empty() {
                return Err(Error::invalid_argument("dimension name must not be empty"));
            }
            if map.insert(dimension.clone(), value).is_some() {
                return Err(Error::invalid_argument(format!(
                    "dimension '{dimension}' given more than once"
                )));
            }
        }
        Ok(Self { coordinates: map })
    }

    /// The point without any coordinates.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Value of a single dimension, if set.
    pub fn coordinate(&self, dimension: &str) -> Option<&str> {
        self.coordinates.get(dimension).map(String::as_str)
    }

    /// All coordinates in dimension-name order.
    pub fn coordinates(&self) -> &BTreeMap<String, String> {
        &self.coordinates
    }

    /// Whether this point has no coordinates.
    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

impl TryFrom<BTreeMap<String, String>> for DimensionSpacePoint {
    type Error = Error;

    fn try_from(coordinates: BTreeMap<String, String>) -> Result<Self> {
        Self::new(coordinates)
    }
}

impl From<DimensionSpacePoint> for BTreeMap<String, String> {
    fn from(point: DimensionSpacePoint) -> Self {
        point.coordinates
    }
}

impl fmt::Display for DimensionSpacePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (dimension, value) in &self.coordinates {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{dimension}={value}")?;
            first = false;
        }
        Ok(())
    }
}

impl FromStr for DimensionSpacePoint {
    type Err = Error;

    /// Parse `"language=en,region=us"`. An empty string is the empty point.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::empty());
        }

        let mut pairs = Vec::new();
        for part in s.split(',') {
            let (dimension, value) = part.split_once('=').ok_or_else(|| {
                Error::parse(format!("expected 'dimension=value', got '{}'", part.trim()))
            })?;
            pairs.push((dimension.trim().to_string(), value.trim().to_string()));
        }
        Self::new(pairs)
    }
}
