//! Progress indicators for long-running library scans
//!
//! Several dynamic collection kinds walk every item of a library and call an
//! external collaborator once per item. This module wraps `indicatif` so those
//! scans report `Processing: 12/480 Title` style progress on interactive
//! terminals while staying silent in tests, pipes and CI.
//!
//! # Environment Variables
//!
//! - `META_NO_PROGRESS`: Set to any value to disable all progress indicators
//!
//! # Examples
//!
//! ```rust
//! use meta_templater::utils::progress::ProgressBar;
//!
//! let progress = ProgressBar::new(3, true);
//! for title in ["Alien", "Aliens", "Alien 3"] {
//!     progress.set_message(format!("Processing: {title}"));
//!     progress.inc(1);
//! }
//! progress.finish_and_clear();
//! ```

use indicatif::{ProgressBar as IndicatifBar, ProgressStyle as IndicatifStyle};
use std::io::IsTerminal;

/// Checks if progress bars should be disabled.
///
/// Progress is disabled when `META_NO_PROGRESS` is set or stderr is not a
/// terminal.
fn is_progress_disabled() -> bool {
    std::env::var("META_NO_PROGRESS").is_ok() || !std::io::stderr().is_terminal()
}

/// A progress bar with consistent styling.
///
/// A disabled bar is created hidden and silently ignores all updates, so
/// callers never need to branch on whether progress is shown.
#[derive(Clone)]
pub struct ProgressBar {
    inner: IndicatifBar,
}

impl ProgressBar {
    /// Creates a progress bar tracking `len` units of work.
    ///
    /// `enabled` comes from the run configuration; the environment can still
    /// force the bar hidden.
    pub fn new(len: u64, enabled: bool) -> Self {
        let bar = if !enabled || is_progress_disabled() {
            IndicatifBar::hidden()
        } else {
            let bar = IndicatifBar::new(len);
            bar.set_style(default_style());
            bar
        };
        Self {
            inner: bar,
        }
    }

    /// Creates a bar that never draws.
    pub fn hidden() -> Self {
        Self {
            inner: IndicatifBar::hidden(),
        }
    }

    /// Sets the message displayed alongside the bar.
    pub fn set_message(&self, msg: impl Into<String>) {
        self.inner.set_message(msg.into());
    }

    /// Sets the prefix displayed before the bar.
    pub fn set_prefix(&self, prefix: impl Into<String>) {
        self.inner.set_prefix(prefix.into());
    }

    /// Increments the bar by `delta` units.
    pub fn inc(&self, delta: u64) {
        self.inner.inc(delta);
    }

    /// Current position, mostly useful in tests.
    pub fn position(&self) -> u64 {
        self.inner.position()
    }

    /// Removes the bar from the terminal once the scan is done.
    pub fn finish_and_clear(&self) {
        self.inner.finish_and_clear();
    }
}

fn default_style() -> IndicatifStyle {
    IndicatifStyle::default_bar()
        .template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| IndicatifStyle::default_bar())
        .progress_chars("━╸━")
}

/// Wraps an iterator so every yielded item advances a progress bar.
///
/// The message is refreshed with `label(item)` before the item is handed out,
/// mirroring the `Processing: i/n title` lines of a library scan.
pub fn progress_iterator<'a, T, F>(
    items: &'a [T],
    prefix: &str,
    enabled: bool,
    label: F,
) -> impl Iterator<Item = &'a T> + 'a
where
    F: Fn(&T) -> String + 'a,
{
    let bar = ProgressBar::new(items.len() as u64, enabled);
    bar.set_prefix(prefix.to_string());
    let total = items.len();
    items.iter().enumerate().map(move |(i, item)| {
        bar.set_message(format!("{}/{} {}", i + 1, total, label(item)));
        bar.inc(1);
        if i + 1 == total {
            bar.finish_and_clear();
        }
        item
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_ignores_updates() {
        let bar = ProgressBar::hidden();
        bar.set_message("Scanning");
        bar.inc(5);
        assert_eq!(bar.position(), 5);
        bar.finish_and_clear();
    }

    #[test]
    fn test_progress_iterator_yields_every_item() {
        let items = vec!["a", "b", "c"];
        let seen: Vec<&&str> = progress_iterator(&items, "Scanning", false, |s| s.to_string()).collect();
        assert_eq!(seen.len(), 3);
        assert_eq!(*seen[2], "c");
    }
}
