//! Command-line definitions and the one-shot `call` entry point.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use lintel_kernel::{DispatchOutcome, Dispatcher, RawRequest};

use crate::bootstrap;

/// Lintel — request-handling kernel host
#[derive(Parser)]
#[command(name = "lintel")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path (TOML, YAML or JSON)
    #[arg(short = 'c', long, global = true, env = "LINTEL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Serve the HTTP entry point
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "127.0.0.1:8360", env = "LINTEL_BIND")]
        bind: String,
    },

    /// Dispatch one request from the command line and print the response
    Call {
        /// Request path, optionally with a query string (e.g. /user/5?sort=asc)
        path: String,

        /// Handler arguments: --key value, --key=value, or bare --flag
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

/// Run one dispatch through the CLI entry point and print the response body.
///
/// Exit codes: 0 handled, 1 dispatch failure, 2 no action matched.
pub async fn call(path: &str, args: &[String], config: Option<&Path>) -> anyhow::Result<()> {
    let context = bootstrap::build_context(config)?;
    let dispatcher = Dispatcher::new(context.clone());

    let mut request = RawRequest::cli(path);
    if let Some((_, query)) = path.split_once('?') {
        for (key, value) in parse_query(query) {
            request = request.with_query(key, value);
        }
    }
    for (key, value) in parse_handler_args(args) {
        request = request.with_cli_arg(key, value);
    }

    let code = match dispatcher.dispatch(&request).await {
        Ok(DispatchOutcome::Handled { action, response }) => {
            debug!(%action, "request handled");
            println!("{}", response.body_string());
            0
        }
        Ok(DispatchOutcome::NotFound { attempted }) => {
            if attempted.is_empty() {
                eprintln!("no action matches {path}");
            } else {
                eprintln!(
                    "no action handled {path} (attempted: {})",
                    attempted.join(", ")
                );
            }
            2
        }
        Err(report) => {
            eprintln!("dispatch failed: {report:?}");
            1
        }
    };

    if let Err(report) = context.shutdown().await {
        warn!(error = ?report, "shutdown reported failures");
    }
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

/// Naive query-string split; values are passed through verbatim.
fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (key.to_string(), value.to_string())
        })
        .collect()
}

/// GNU-style argument pairs: `--key value`, `--key=value`, `-k value`, and a
/// bare `--flag` becomes `flag=1`. Tokens without a dash prefix are skipped.
fn parse_handler_args(args: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut iter = args.iter().peekable();
    while let Some(arg) = iter.next() {
        let Some(key) = arg.strip_prefix("--").or_else(|| arg.strip_prefix('-')) else {
            continue;
        };
        if key.is_empty() {
            continue;
        }
        if let Some((key, value)) = key.split_once('=') {
            pairs.push((key.to_string(), value.to_string()));
        } else if let Some(value) = iter.peek().filter(|v| !v.starts_with('-')) {
            pairs.push((key.to_string(), value.to_string()));
            iter.next();
        } else {
            pairs.push((key.to_string(), "1".to_string()));
        }
    }
    pairs
}
