//! Contentgraph CLI: run subgraph queries from the command line.
//!
//! # Key Abstractions
//!
//! - [`ContentGraphCli<C>`](app::ContentGraphCli): the application, generic
//!   over the config provider
//! - [`ContentGraphConfig`](config::ContentGraphConfig): `confyg`-backed
//!   configuration
//! - [`QuerySession`](query_handlers::QuerySession): a loaded hierarchy and
//!   the subgraph queries run against

#![doc = include_str!("../README.md")]

pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;
pub mod query_handlers;

pub use app::ContentGraphCli;
pub use cli::{CliArgs, Command, ConfigAction, QueryCommand};
pub use config::ContentGraphConfig;
pub use query_handlers::QuerySession;
