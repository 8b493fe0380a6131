//! Command-line interface for meta-templater.
//!
//! # Available Commands
//!
//! - `render` - Load a definition file against a library snapshot, expand its
//!   dynamic collections and print every resolved collection as YAML or JSON
//!
//! # Usage
//!
//! ```bash
//! # Render every collection of a file
//! meta-templater render movies.yml --library snapshot.yml
//!
//! # Render two collections with a run configuration, in French
//! meta-templater render movies.yml --library snapshot.yml --config run.toml \
//!     --collection "Top Action movies" --collection "Top Drama movies" --language fr
//!
//! # JSON output, debug logging
//! meta-templater -v render movies.yml --library snapshot.yml --format json
//! ```
//!
//! # Output
//!
//! Resolved trees go to stdout as one `title: tree` YAML document per
//! collection, or as a single JSON object with `--format json`. Logs and
//! progress bars go to stderr so the output can be piped.
//!
//! # Logging
//!
//! `RUST_LOG` always wins. Otherwise `--verbose` selects `debug`, `--quiet`
//! selects `error` and the default is `info`.

mod render;

pub use render::{OutputFormat, RenderCommand};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Runtime settings derived from the global flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether progress bars are suppressed
    pub no_progress: bool,
}

impl CliConfig {
    /// Install the stderr tracing subscriber.
    ///
    /// Safe to call more than once; later calls leave the first subscriber
    /// in place.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Template resolution and dynamic collection expansion for media library
/// metadata definitions.
#[derive(Parser, Debug)]
#[command(name = "meta-templater", version, about, long_about = None)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    ///
    /// Equivalent to `RUST_LOG=debug`; ignored when `RUST_LOG` is set.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable progress bars during library scans.
    ///
    /// Progress is also hidden when `META_NO_PROGRESS` is set or stderr is not
    /// a terminal.
    #[arg(long, global = true)]
    no_progress: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve a definition file and print the resolved collections.
    ///
    /// Loads templates, external templates and translations, expands
    /// `dynamic_collections` against the library snapshot, then resolves
    /// every selected collection. Collections that fail to resolve are
    /// logged and left out of the output.
    Render(RenderCommand),
}

impl Cli {
    /// Execute with the configuration built from the parsed flags.
    pub fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(&config)
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        };
        CliConfig {
            log_level: log_level.to_string(),
            no_progress: self.no_progress,
        }
    }

    /// Execute with an injected configuration.
    pub fn execute_with_config(self, config: &CliConfig) -> Result<()> {
        config.init_logging();
        match self.command {
            Commands::Render(cmd) => cmd.execute(config),
        }
    }
}
