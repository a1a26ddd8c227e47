//! CLI argument parsing and command definitions.
//!
//! Every query runs against one subgraph. `--content-stream` and
//! `--dimension` pick it, falling back to the `[subgraph]` section of the
//! configuration.

use clap::{Args, Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments for `cgq`.
#[derive(Parser, Debug)]
#[command(name = "cgq", author, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "CONTENTGRAPH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Content stream to query, e.g. `live`.
    #[arg(long, global = true)]
    pub content_stream: Option<String>,

    /// Dimension space point to query, e.g. `language=en,region=us`.
    #[arg(long, global = true)]
    pub dimension: Option<String>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Node type filter shared by listing commands.
#[derive(Args, Debug, Clone, Default)]
pub struct ConstraintArgs {
    /// Node type filter, e.g. `Acme:Document,!Acme:Shortcut`. Empty allows
    /// every type.
    #[arg(short = 't', long = "constraints", default_value = "")]
    pub filter: String,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Query(QueryCommand),

    /// Check the loaded hierarchy for integrity problems.
    Validate,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Commands answered by the selected subgraph.
#[derive(Subcommand, Debug)]
pub enum QueryCommand {
    /// Look up a node by identifier.
    Node {
        /// Node identifier.
        id: String,
    },

    /// Look up the variant of an aggregate in the selected subgraph.
    Aggregate {
        /// Node aggregate identifier.
        aggregate: String,
    },

    /// List the children of a node in order.
    Children {
        /// Parent node identifier.
        parent: String,

        #[command(flatten)]
        constraints: ConstraintArgs,

        /// Maximum number of children to return.
        #[arg(long, allow_negative_numbers = true)]
        limit: Option<i64>,

        /// Number of children to skip.
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,

        /// Print only the number of matching children.
        #[arg(long)]
        count: bool,
    },

    /// Show the parent of a node.
    Parent {
        /// Node identifier.
        id: String,
    },

    /// Show the preceding and succeeding siblings of a node.
    Siblings {
        /// Node identifier.
        id: String,
    },

    /// Print the path of a node from its root.
    Path {
        /// Node identifier.
        id: String,
    },

    /// Resolve a path relative to a starting node.
    Resolve {
        /// Node path, e.g. `/sites/home`.
        path: String,

        /// Starting node identifier.
        #[arg(long)]
        from: String,
    },

    /// List the nodes a node references.
    References {
        /// Source node identifier.
        id: String,

        /// Restrict to one reference property.
        #[arg(short, long)]
        property: Option<String>,
    },

    /// List every node of a type or its subtypes.
    ByType {
        /// Node type name.
        node_type: String,
    },

    /// Extract subtrees below entry aggregates.
    Subtree {
        /// Entry aggregate identifiers.
        #[arg(required = true)]
        aggregates: Vec<String>,

        /// Levels below each entry.
        #[arg(short, long, default_value_t = 1)]
        levels: usize,

        #[command(flatten)]
        constraints: ConstraintArgs,

        /// Include hidden nodes.
        #[arg(long)]
        show_hidden: bool,
    },

    /// Walk the hierarchy depth-first from a node.
    Walk {
        /// Starting node identifier.
        id: String,

        /// Walk towards the root instead of the leaves.
        #[arg(long)]
        up: bool,

        #[command(flatten)]
        constraints: ConstraintArgs,
    },

    /// Materialize the whole subgraph and print it.
    Dump,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Print the effective configuration as TOML.
    Show,
}

// ============================================================================
// Tests
// ============================================================================
