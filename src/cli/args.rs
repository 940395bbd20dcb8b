//! CLI argument definitions using clap
//!
//! Commands:
//! - relquery normalize [--query <json|@file>] [--config <path>]
//! - relquery explain --schema <path> --model <name> [--query <json|@file>] [--config <path>]
//!
//! Without `--query` the request is read from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// relquery - JSON:API query normalizer and relation planner
#[derive(Parser, Debug)]
#[command(name = "relquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the canonical form of a raw query
    Normalize {
        /// Raw query as JSON, or @path to a JSON file
        #[arg(long)]
        query: Option<String>,

        /// Path to a query configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Assemble a query against a model graph and print the plan
    Explain {
        /// Path to the model graph file
        #[arg(long)]
        schema: PathBuf,

        /// Model the query runs against
        #[arg(long)]
        model: String,

        /// Raw query as JSON, or @path to a JSON file
        #[arg(long)]
        query: Option<String>,

        /// Path to a query configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_explain() {
        let cli = Cli::try_parse_from([
            "relquery",
            "explain",
            "--schema",
            "models.json",
            "--model",
            "posts",
            "--query",
            "{}",
        ])
        .unwrap();

        match cli.command {
            Command::Explain {
                schema,
                model,
                query,
                config,
            } => {
                assert_eq!(schema, PathBuf::from("models.json"));
                assert_eq!(model, "posts");
                assert_eq!(query.as_deref(), Some("{}"));
                assert!(config.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_explain_requires_model() {
        assert!(Cli::try_parse_from(["relquery", "explain", "--schema", "m.json"]).is_err());
    }
}
