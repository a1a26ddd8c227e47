//! `cgq`: query a content subgraph.
//!
//! ```bash
//! cgq --dimension language=en children home -t Acme:Document
//! CONTENTGRAPH_STORE_PATH=site.json cgq path post-1
//! ```

use clap::Parser;
use contentgraph_cli::{CliArgs, ContentGraphCli};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let result = match ContentGraphCli::from_args("cgq", &args) {
        Ok(cli) => cli.run(args).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("cgq: {e}");
        std::process::exit(if e.is_precondition_violation() { 2 } else { 1 });
    }
}
