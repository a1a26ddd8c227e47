//! Contentgraph Core: shared identity types, constraints, errors, and traits.
//!
//! This crate provides the foundational value types used across all content
//! graph crates. It has no internal dependencies (dependency level 0).
//!
//! # Modules
//!
//! - [`error`]: Error taxonomy and Result alias
//! - [`ids`]: Node, aggregate, content stream, type and property identifiers
//! - [`dimension`]: Dimension space points
//! - [`path`]: Node names and node paths
//! - [`constraints`]: Raw node type constraints
//! - [`pagination`]: Validated limit/offset
//! - [`traits`]: Configuration abstraction

#![doc = include_str!("../README.md")]

pub mod constraints;
pub mod dimension;
pub mod error;
pub mod ids;
pub mod pagination;
pub mod path;
pub mod traits;

// Re-export key types at crate root for convenience
pub use constraints::NodeTypeConstraints;
pub use dimension::DimensionSpacePoint;
pub use error::{Error, Result};
pub use ids::{
    ContentStreamIdentifier, NodeAggregateIdentifier, NodeIdentifier, NodeTypeName, PropertyName,
};
pub use pagination::Pagination;
pub use path::{NodeName, NodePath};
pub use traits::{ConfigProvider, DEFAULT_MAX_HIERARCHY_DEPTH};
