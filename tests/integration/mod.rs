//! Integration test suite for meta-templater
//!
//! End-to-end tests that drive the public API and the `meta-templater`
//! binary the way a run orchestrator would.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **template_resolution**: Substitution, precedence, conditionals, optional dropping
//! - **dynamic_collections**: Generator universes, duplicates, sync, failure isolation
//! - **definition_files**: Loading files from disk with external templates and translations
//! - **cli**: The `render` command

mod cli;
mod definition_files;
mod dynamic_collections;
mod template_resolution;
