//! # errkb CLI
//!
//! Look up a build error in the local knowledge base, suggest a fix, and
//! record the error the first time it is seen.
//!
//! ## Usage
//!
//! ```bash
//! errkb --config ./config/errkb.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `errkb investigate <code> [service] [file] [line]` | Full inquiry; records new errors |
//! | `errkb find <code>` | Print the local record for a code |
//! | `errkb list` | List every recorded code |
//! | `errkb patterns` | List the known fix patterns |
//!
//! ## Examples
//!
//! ```bash
//! # From a pre-commit hook after a failed build
//! errkb investigate CS0161 BillingService src/Invoice.cs 42
//!
//! # Machine-readable output
//! errkb investigate CS0161 --json
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use errkb::config::{self, Config};
use errkb::investigate::Investigator;
use errkb::models::Inquiry;
use errkb::patterns::FixPatternTable;
use errkb::report;
use errkb::search;
use errkb::store::KnowledgeStore;

/// errkb: a local knowledge base for build errors.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "errkb",
    about = "errkb: look up, suggest fixes for, and record build errors",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/errkb.toml")]
    config: PathBuf,

    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Investigate an error code.
    ///
    /// Searches the local knowledge base, the fix-pattern table, and the
    /// external search service, then records the error locally if it has
    /// not been seen before.
    Investigate {
        /// Error code, e.g. `CS0161`.
        code: String,
        /// Service or project that failed to build.
        service: Option<String>,
        /// Source file reported by the compiler.
        file: Option<String>,
        /// Line number reported by the compiler.
        line: Option<String>,
        /// Print the result as JSON instead of a text report.
        #[arg(long)]
        json: bool,
    },

    /// Print the local record for an error code.
    Find {
        /// Error code, e.g. `CS0161`.
        code: String,
    },

    /// List every error code recorded in the knowledge base.
    List,

    /// List the known fix patterns.
    Patterns,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_or_minimal(&cli.config)?;

    match cli.command {
        Commands::Investigate {
            code,
            service,
            file,
            line,
            json,
        } => {
            let inquiry = Inquiry {
                code,
                service,
                file,
                line,
            };
            run_investigate(&cfg, &inquiry, json).await?;
        }
        Commands::Find { code } => {
            let store = KnowledgeStore::from_config(&cfg);
            match store.find(&code)? {
                Some(record) => println!("{}", record),
                None => println!("Error {} not found in local database.", code),
            }
        }
        Commands::List => {
            let store = KnowledgeStore::from_config(&cfg);
            let codes = store.list_codes()?;
            if codes.is_empty() {
                println!("No errors recorded in {}.", store.path().display());
            }
            for code in codes {
                println!("{}", code);
            }
        }
        Commands::Patterns => {
            let patterns = FixPatternTable::load(&cfg)?;
            if patterns.is_empty() {
                println!("No fix patterns configured.");
                return Ok(());
            }
            println!("{:<12} TITLE", "CODE");
            for p in patterns.iter() {
                println!("{:<12} {}", p.code, p.title);
            }
        }
    }

    Ok(())
}

async fn run_investigate(cfg: &Config, inquiry: &Inquiry, json: bool) -> Result<()> {
    let store = KnowledgeStore::from_config(cfg);
    let patterns = FixPatternTable::load(cfg).unwrap_or_else(|e| {
        let detail = format!("{:#}", e);
        warn!(error = %detail, "fix patterns unavailable, continuing without them");
        FixPatternTable::default()
    });
    debug!(patterns = patterns.len(), "fix patterns loaded");
    let search = search::create_search(&cfg.search)?;

    let investigator = Investigator::new(&store, &patterns, search.as_ref(), &cfg.search);
    let result = investigator.investigate(inquiry).await?;

    if json {
        println!("{}", report::render_json(&result)?);
    } else {
        print!(
            "{}",
            report::render_text(inquiry, &result, cfg.search.page_url.as_deref())
        );
    }
    Ok(())
}
