//! The `cgq` application.
//!
//! [`ContentGraphCli`] is generic over the [`ConfigProvider`] so embedding
//! applications can reuse the command set with their own configuration.

use std::sync::Arc;

use contentgraph_core::traits::ConfigProvider;
use contentgraph_core::{ContentStreamIdentifier, DimensionSpacePoint, Error, Result};
use contentgraph_subgraph::{SubgraphScope, SubgraphSettings};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::ContentGraphConfig;
use crate::config_handlers;
use crate::query_handlers::{self, QuerySession};

// ============================================================================
// ContentGraphCli
// ============================================================================

/// CLI application parameterized over a config provider.
pub struct ContentGraphCli<C: ConfigProvider> {
    name: String,
    config: Arc<C>,
    version: String,
    content_stream: String,
    dimension: String,
}

impl ContentGraphCli<ContentGraphConfig> {
    /// Create from CLI args, loading config from file/env.
    ///
    /// The `[subgraph]` section supplies the default subgraph selection.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = ContentGraphConfig::load(args.config.as_deref())?;
        let content_stream = config.subgraph.content_stream.clone();
        let dimension = config.subgraph.dimension_space_point.clone();
        Ok(Self::new(name, config)
            .with_content_stream(content_stream)
            .with_dimension(dimension))
    }
}

impl<C: ConfigProvider> ContentGraphCli<C> {
    /// Create a new CLI application reading `live` at the empty dimension
    /// space point unless told otherwise.
    pub fn new(name: impl Into<String>, config: C) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
            content_stream: "live".to_string(),
            dimension: String::new(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Default content stream when `--content-stream` is not given.
    pub fn with_content_stream(mut self, content_stream: impl Into<String>) -> Self {
        self.content_stream = content_stream.into();
        self
    }

    /// Default dimension space point when `--dimension` is not given.
    pub fn with_dimension(mut self, dimension: impl Into<String>) -> Self {
        self.dimension = dimension.into();
        self
    }

    /// Get a reference to the config provider.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // Ignore error if a subscriber is already set (e.g. in tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// The subgraph selected by the flags, falling back to the defaults.
    pub fn scope(&self, content_stream: Option<&str>, dimension: Option<&str>) -> Result<SubgraphScope> {
        let content_stream: ContentStreamIdentifier =
            content_stream.unwrap_or(&self.content_stream).parse()?;
        let dimension: DimensionSpacePoint = dimension.unwrap_or(&self.dimension).parse()?;
        Ok(SubgraphScope::new(content_stream, dimension))
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        match args.command {
            Some(Command::Query(query)) => {
                let session = self.open_session(args.content_stream.as_deref(), args.dimension.as_deref())?;
                let output = query_handlers::handle_query(&session, query).await?;
                print_json(&output)
            }
            Some(Command::Validate) => {
                let session = self.open_session(args.content_stream.as_deref(), args.dimension.as_deref())?;
                self.handle_validate(&session)
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {} (use --help for usage)", self.name, self.version);
                Ok(())
            }
        }
    }

    fn open_session(&self, content_stream: Option<&str>, dimension: Option<&str>) -> Result<QuerySession> {
        let scope = self.scope(content_stream, dimension)?;
        let path = self.config.hierarchy_path()?;
        tracing::debug!(
            project = self.config.project_name(),
            path = %path.display(),
            %scope,
            "opening subgraph"
        );
        QuerySession::open_path(&path, scope, SubgraphSettings::from_config(self.config.as_ref()))
    }

    /// Print the validation report; errors fail the command.
    fn handle_validate(&self, session: &QuerySession) -> Result<()> {
        let report = query_handlers::handle_validate(session);
        print_json(
            &serde_json::to_value(&report).map_err(|e| Error::serialization(e.to_string()))?,
        )?;

        if report.is_valid() {
            Ok(())
        } else {
            Err(Error::operation(format!(
                "Hierarchy validation failed with {} error(s)",
                report.errors.len()
            )))
        }
    }
}

fn print_json(value: &Value) -> Result<()> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| Error::serialization(e.to_string()))?;
    println!("{rendered}");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use contentgraph_subgraph::{fixtures, save_hierarchy};
    use std::path::PathBuf;

    #[derive(Clone)]
    struct TestConfig {
        hierarchy: PathBuf,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            "test-site"
        }

        fn hierarchy_path(&self) -> Result<PathBuf> {
            Ok(self.hierarchy.clone())
        }
    }

    /// Saves the sample site and returns a config pointing at it.
    fn site_config(dir: &tempfile::TempDir) -> TestConfig {
        let (index, schema) = fixtures::site_hierarchy();
        let hierarchy = dir.path().join("hierarchy.json");
        save_hierarchy(&index, &schema, &hierarchy).unwrap();
        TestConfig { hierarchy }
    }

    fn missing_config() -> TestConfig {
        TestConfig {
            hierarchy: PathBuf::from("/nonexistent/hierarchy.json"),
        }
    }

    #[test]
    fn test_cli_new() {
        let cli = ContentGraphCli::new("cgq", missing_config());
        assert_eq!(cli.name, "cgq");
        assert_eq!(cli.config().project_name(), "test-site");
    }

    #[test]
    fn test_cli_with_version() {
        let cli = ContentGraphCli::new("cgq", missing_config()).with_version("1.2.3");
        assert_eq!(cli.version, "1.2.3");
    }

    #[test]
    fn test_scope_defaults_and_overrides() {
        let cli = ContentGraphCli::new("cgq", missing_config()).with_dimension("language=en");

        let scope = cli.scope(None, None).unwrap();
        assert_eq!(scope.content_stream_identifier.as_str(), "live");
        assert_eq!(scope.dimension_space_point.to_string(), "language=en");

        let scope = cli.scope(Some("draft"), Some("")).unwrap();
        assert_eq!(scope.content_stream_identifier.as_str(), "draft");
        assert!(scope.dimension_space_point.to_string().is_empty());
    }

    #[test]
    fn test_scope_rejects_bad_dimension() {
        let cli = ContentGraphCli::new("cgq", missing_config());
        let err = cli.scope(None, Some("language")).unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[tokio::test]
    async fn test_run_query_command() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = ContentGraphCli::new("cgq", site_config(&dir)).with_dimension("language=en");
        let args = CliArgs::parse_from(["cgq", "children", "home"]);
        assert!(cli.run(args).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_query_in_other_dimension() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = ContentGraphCli::new("cgq", site_config(&dir));
        let args = CliArgs::parse_from(["cgq", "path", "home-de", "--dimension", "language=de"]);
        assert!(cli.run(args).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_validate() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = ContentGraphCli::new("cgq", site_config(&dir));
        let args = CliArgs::parse_from(["cgq", "validate"]);
        assert!(cli.run(args).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_missing_hierarchy_is_error() {
        let cli = ContentGraphCli::new("cgq", missing_config());
        let args = CliArgs::parse_from(["cgq", "dump"]);
        assert!(cli.run(args).await.is_err());
    }

    #[tokio::test]
    async fn test_run_unknown_type_is_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let cli = ContentGraphCli::new("cgq", site_config(&dir)).with_dimension("language=en");
        let args = CliArgs::parse_from(["cgq", "by-type", "Acme:Nope"]);
        let err = cli.run(args).await.unwrap_err();
        assert!(err.is_precondition_violation());
    }

    #[tokio::test]
    async fn test_run_no_command() {
        let cli = ContentGraphCli::new("cgq", missing_config()).with_version("0.1.0");
        let args = CliArgs::parse_from(["cgq"]);
        assert!(cli.run(args).await.is_ok());
    }

    #[tokio::test]
    async fn test_run_config_command_dispatch() {
        let cli = ContentGraphCli::new("cgq", missing_config());
        let args = CliArgs::parse_from(["cgq", "config", "path"]);
        assert!(cli.run(args).await.is_ok());
    }

    #[test]
    fn test_init_logging() {
        let cli = ContentGraphCli::new("cgq", missing_config());
        cli.init_logging(false, false);
        cli.init_logging(true, false);
        cli.init_logging(false, true);
    }

    #[test]
    fn test_from_args_with_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
                project_name = "from-file"
                [subgraph]
                content_stream = "draft"
                dimension_space_point = "language=en"
            "#,
        )
        .unwrap();

        let args = CliArgs::parse_from(["cgq", "--config", path.to_str().unwrap()]);
        let cli = ContentGraphCli::from_args("cgq", &args).unwrap();
        assert_eq!(cli.config().project_name(), "from-file");
        let scope = cli.scope(None, None).unwrap();
        assert_eq!(scope.to_string(), fixtures::scope("draft").to_string());
    }
}
