//! Test utilities for meta-templater
//!
//! Helpers shared by unit and integration tests: one-time logging setup,
//! YAML literals, variable maps, library snapshot builders and on-disk
//! environments for loader and CLI tests.
//!
//! # Example
//!
//! ```rust,no_run
//! use meta_templater::test_utils::{LibraryBuilder, init_test_logging, vars, yaml};
//!
//! init_test_logging(None);
//! let library = LibraryBuilder::movies().tag("genre", "1", "Action").build();
//! let call = vars(&[("name", yaml("genre")), ("value", yaml("[Action]"))]);
//! assert_eq!(call.len(), 2);
//! ```

pub mod builder;
pub mod fixtures;

pub use builder::{TestEnvironment, TestEnvironmentBuilder};
pub use fixtures::{GENRE_TEMPLATES, LibraryBuilder, MOVIE_SNAPSHOT};

use serde_yaml::{Mapping, Value};
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::templating::VariableMap;

/// Global flag to ensure logging is only initialized once in tests
static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests.
///
/// Only the first call has an effect. Uses `level` when given, otherwise
/// `RUST_LOG`; with neither, tests run without a subscriber.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer() // Important: uses test-compatible writer
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}

/// Parse a YAML literal, panicking on invalid input.
pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).unwrap_or_else(|e| panic!("Invalid YAML in test: {e}\n{text}"))
}

/// Parse a YAML mapping literal, panicking when it is not a mapping.
pub fn mapping(text: &str) -> Mapping {
    match yaml(text) {
        Value::Mapping(map) => map,
        other => panic!("Expected a YAML mapping in test, got {other:?}"),
    }
}

/// Build a variable map from pairs, keeping their order.
pub fn vars(pairs: &[(&str, Value)]) -> VariableMap {
    pairs.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect()
}
