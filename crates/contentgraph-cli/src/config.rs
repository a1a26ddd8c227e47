//! Configuration for the `cgq` command-line tool.
//!
//! Provides the [`ContentGraphConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `CONTENTGRAPH_CONFIG` environment variable
//! 3. XDG default: `~/.config/contentgraph/config.toml`
//! 4. Built-in defaults

use std::path::PathBuf;

use confyg::{Confygery, env};
use contentgraph_core::traits::ConfigProvider;
use contentgraph_core::{
    ContentStreamIdentifier, DEFAULT_MAX_HIERARCHY_DEPTH, DimensionSpacePoint, Error, Result,
};
use serde::{Deserialize, Serialize};

/// Name of the hierarchy file looked up in the working directory when
/// `store.path` is not set.
pub const DEFAULT_HIERARCHY_FILE: &str = "hierarchy.json";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for `cgq`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentGraphConfig {
    /// Project name, shown in log output.
    pub project_name: String,

    /// Where the hierarchy is loaded from.
    pub store: StoreConfig,

    /// Which subgraph queries run against.
    pub subgraph: SubgraphConfig,
}

/// Hierarchy store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to a JSON hierarchy fixture.
    pub path: Option<String>,
}

/// Default subgraph selection and tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubgraphConfig {
    /// Content stream to read, e.g. `live`.
    pub content_stream: String,

    /// Dimension space point, e.g. `language=en,region=us`. Empty for
    /// dimensionless content.
    pub dimension_space_point: String,

    /// Fuse for ancestor walks and traversals.
    pub max_hierarchy_depth: usize,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for ContentGraphConfig {
    fn default() -> Self {
        Self {
            project_name: "contentgraph".to_string(),
            store: StoreConfig::default(),
            subgraph: SubgraphConfig::default(),
        }
    }
}

impl Default for SubgraphConfig {
    fn default() -> Self {
        Self {
            content_stream: "live".to_string(),
            dimension_space_point: String::new(),
            max_hierarchy_depth: DEFAULT_MAX_HIERARCHY_DEPTH,
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl ContentGraphConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A config path that does not exist is not an error; defaults and the
    /// environment still apply.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path)
            && path.exists()
        {
            builder
                .add_file(&path.to_string_lossy())
                .map_err(|e| Error::config(format!("config file: {e}")))?;
        }

        let mut env_opts = env::Options::with_top_level("CONTENTGRAPH");
        env_opts.add_section("store");
        env_opts.add_section("subgraph");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var("CONTENTGRAPH_CONFIG") {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("contentgraph").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// The configured content stream.
    pub fn content_stream(&self) -> Result<ContentStreamIdentifier> {
        self.subgraph.content_stream.parse()
    }

    /// The configured dimension space point.
    pub fn dimension_space_point(&self) -> Result<DimensionSpacePoint> {
        self.subgraph.dimension_space_point.parse()
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for ContentGraphConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn hierarchy_path(&self) -> Result<PathBuf> {
        match &self.store.path {
            Some(p) => Ok(PathBuf::from(p)),
            None => std::env::current_dir()
                .map(|dir| dir.join(DEFAULT_HIERARCHY_FILE))
                .map_err(|e| Error::config(format!("Could not determine hierarchy path: {e}"))),
        }
    }

    fn max_hierarchy_depth(&self) -> usize {
        self.subgraph.max_hierarchy_depth
    }
}

// ============================================================================
// Tests
// ============================================================================
