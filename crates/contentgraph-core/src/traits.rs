//! Core traits for content graph applications.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where an
//! application keeps its hierarchy data and how deep ancestor walks may go.

use std::path::PathBuf;

use crate::Result;

/// Default fuse for ancestor walks and traversals.
///
/// Real content trees are far shallower; hitting this bound means the
/// hierarchy is corrupt.
pub const DEFAULT_MAX_HIERARCHY_DEPTH: usize = 256;

/// Trait for application configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use contentgraph_core::traits::ConfigProvider;
/// use contentgraph_core::Result;
///
/// #[derive(Clone)]
/// struct SiteConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for SiteConfig {
///     fn project_name(&self) -> &str {
///         "acme-site"
///     }
///
///     fn hierarchy_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.join("hierarchy.json"))
///     }
/// }
///
/// let config = SiteConfig { data_dir: PathBuf::from("/data") };
/// assert_eq!(config.max_hierarchy_depth(), 256);
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used in log output and default paths.
    fn project_name(&self) -> &str;

    /// Location of the hierarchy data the store is loaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn hierarchy_path(&self) -> Result<PathBuf>;

    /// Maximum depth of an ancestor chain or traversal before the
    /// hierarchy is declared broken.
    fn max_hierarchy_depth(&self) -> usize {
        DEFAULT_MAX_HIERARCHY_DEPTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestConfig {
        name: String,
        base: PathBuf,
        depth: Option<usize>,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            &self.name
        }

        fn hierarchy_path(&self) -> Result<PathBuf> {
            Ok(self.base.join("hierarchy.json"))
        }

        fn max_hierarchy_depth(&self) -> usize {
            self.depth.unwrap_or(DEFAULT_MAX_HIERARCHY_DEPTH)
        }
    }

    #[test]
    fn test_config_provider_paths() {
        let config = TestConfig {
            name: "test-site".into(),
            base: PathBuf::from("/data"),
            depth: None,
        };
        assert_eq!(config.project_name(), "test-site");
        assert_eq!(
            config.hierarchy_path().unwrap(),
            PathBuf::from("/data/hierarchy.json")
        );
        assert_eq!(config.max_hierarchy_depth(), DEFAULT_MAX_HIERARCHY_DEPTH);
    }

    #[test]
    fn test_config_provider_depth_override() {
        let config = TestConfig {
            name: "test".into(),
            base: PathBuf::from("/data"),
            depth: Some(8),
        };
        assert_eq!(config.max_hierarchy_depth(), 8);
    }

    #[test]
    fn test_config_provider_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TestConfig>();
    }
}
