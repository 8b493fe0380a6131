//! Generic TOML parsing with file path context.
//!
//! ```rust,no_run
//! use meta_templater::config::parse_config;
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct Limits {
//!     limit: u32,
//! }
//!
//! # fn example() -> anyhow::Result<()> {
//! let limits: Limits = parse_config(Path::new("limits.toml"))?;
//! println!("limit = {}", limits.limit);
//! # Ok(())
//! # }
//! ```
//!
//! Errors name the file and whether reading or parsing failed:
//!
//! ```text
//! Failed to parse config file: /path/to/run.toml
//! Caused by:
//!     invalid type: string "yes", expected a boolean
//! ```

use anyhow::{Context, Result};
use std::path::Path;

/// Parse a TOML file into any deserializable type.
///
/// # Errors
///
/// Returns an error when the file cannot be read or is not valid TOML for `T`.
pub fn parse_config<T>(path: &Path) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("Failed to parse config file: {}", path.display()))
}
