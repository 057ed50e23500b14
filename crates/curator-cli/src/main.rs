//! Curator - homogenize and crossmatch catalog uploads from the command line.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use curator_cli::{render_query, run_fixture, search_fixture, CliError, RunOptions};

/// Curator Command-Line Interface
#[derive(Parser, Debug)]
#[command(name = "curator")]
#[command(version, about = "Homogenize and cross-identify astronomical catalog uploads")]
struct Args {
    /// Tracing filter directives, overriding RUST_LOG
    #[arg(long, global = true)]
    log_filter: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a curation pass over a JSON fixture
    Run {
        /// Fixture with the table, rows, rules and reference catalog
        #[arg(long)]
        fixture: PathBuf,

        /// Curation configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Fail on invalid rows instead of skipping them
        #[arg(long)]
        strict: bool,

        /// Resume after this record id
        #[arg(long)]
        start_after: Option<String>,

        /// Stop after this record id (inclusive)
        #[arg(long)]
        end_at: Option<String>,
    },
    /// Parse a search expression
    Query {
        /// Expression such as `name:M33 and pgc:5818`
        expression: String,

        /// Print the postfix token stream instead of the tree
        #[arg(long)]
        postfix: bool,

        /// Evaluate against the reference objects of a fixture
        #[arg(long, conflicts_with = "postfix")]
        fixture: Option<PathBuf>,
    },
}

fn main() {
    let args = Args::parse();

    // Initialize tracing
    let filter = args
        .log_filter
        .as_deref()
        .and_then(|directives| tracing_subscriber::EnvFilter::try_new(directives).ok())
        .or_else(|| tracing_subscriber::EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| "curator=info".into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = run(args.command) {
        tracing::error!(error = %e, "command failed");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Run {
            fixture,
            config,
            strict,
            start_after,
            end_at,
        } => {
            let options = RunOptions {
                config,
                strict,
                start_after,
                end_at,
            };
            let report = run_fixture(&fixture, &options)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Query {
            expression,
            postfix,
            fixture,
        } => {
            let result = match &fixture {
                Some(path) => search_fixture(&expression, path)
                    .and_then(|matches| Ok(serde_json::to_string_pretty(&matches)?)),
                None => render_query(&expression, postfix),
            };
            match result {
                Ok(output) => println!("{}", output),
                Err(CliError::Parse(e)) => {
                    eprint!("{}", e.render(&expression));
                    return Err(CliError::Parse(e));
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(())
}
