//! Error handling for meta-templater
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** per layer ([`TemplateError`], [`DynamicError`]) wrapped by
//!    the top-level [`MetaError`]
//! 2. **User-friendly messages** through [`ErrorContext`] with actionable suggestions
//!
//! # Error Categories
//!
//! - **Configuration**: malformed or missing structure (template not found, conditionals not
//!   a dictionary, data attribute missing). Fatal to the current invocation or mapping.
//! - **Validation**: a value out of its domain (non-integer year, starting > ending).
//!   Fatal to the current mapping.
//! - **Lookup miss**: an external lookup found nothing. Logged, the sub-item is skipped.
//! - **Duplicate**: collection title or template name collisions. Warned, the later one
//!   is skipped.
//!
//! None of these abort a whole run; the caller decides the exit status.
//!
//! # Examples
//!
//! ```rust,no_run
//! use meta_templater::core::{MetaError, ErrorContext, user_friendly_error};
//!
//! let error = MetaError::CollectionNotFound {
//!     title: "Top Action Movies".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::dynamic::DynamicError;
use crate::templating::TemplateError;

/// The main error type for meta-templater operations
#[derive(Error, Debug, Clone)]
pub enum MetaError {
    /// Configuration error outside templates and dynamic mappings
    #[error("Config Error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// A value was outside its allowed domain
    #[error("Validation Error: {message}")]
    ValidationError {
        /// Description of the invalid value
        message: String,
    },

    /// Template resolution failed
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// Dynamic collection expansion failed
    #[error(transparent)]
    Dynamic(#[from] DynamicError),

    /// A definition file could not be found
    #[error("File Error: File does not exist {path}")]
    FileNotFound {
        /// Path that was looked up
        path: String,
    },

    /// A definition or snapshot file is not valid YAML
    #[error("YAML Error: failed to parse {file}: {reason}")]
    YamlParseError {
        /// File that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// The run configuration is not valid TOML
    #[error("Config Error: failed to parse {file}: {reason}")]
    ConfigParseError {
        /// File that failed to parse
        file: String,
        /// Parser message
        reason: String,
    },

    /// A definition file is missing every section that would make it useful
    #[error("YAML Error: {sections} attribute is required")]
    MissingSection {
        /// Human list of the acceptable sections
        sections: String,
    },

    /// The file was not in the requested file list
    #[error("{name} is not scheduled to run")]
    NotScheduled {
        /// File name that was skipped
        name: String,
    },

    /// A requested collection does not exist in the file
    #[error("Collection '{title}' not found")]
    CollectionNotFound {
        /// Title that was requested
        title: String,
    },

    /// Standard I/O failure
    #[error("IO error: {message}")]
    IoError {
        /// Rendered I/O error
        message: String,
    },

    /// Anything else
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl From<std::io::Error> for MetaError {
    fn from(error: std::io::Error) -> Self {
        Self::IoError {
            message: error.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for MetaError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::YamlParseError {
            file: "<input>".to_string(),
            reason: error.to_string(),
        }
    }
}

/// Error wrapper with user-facing suggestions
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: MetaError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: MetaError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`]
///
/// Recognizes [`MetaError`], [`TemplateError`], [`DynamicError`], I/O errors
/// and TOML/YAML parse errors; anything else is reported with its full cause
/// chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(meta_error) = error.downcast_ref::<MetaError>() {
        return create_error_context(meta_error.clone());
    }

    if let Some(template_error) = error.downcast_ref::<TemplateError>() {
        return create_error_context(MetaError::Template(template_error.clone()));
    }

    if let Some(dynamic_error) = error.downcast_ref::<DynamicError>() {
        return create_error_context(MetaError::Dynamic(dynamic_error.clone()));
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(MetaError::FileNotFound {
                    path: chain_message(&error),
                })
                .with_suggestion("Check that the file exists and the path is correct");
            }
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(MetaError::IoError {
                    message: chain_message(&error),
                })
                .with_suggestion("Check the file permissions");
            }
            _ => {}
        }
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(MetaError::ConfigParseError {
            file: "run configuration".to_string(),
            reason: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of the run configuration. Verify quotes and brackets");
    }

    if let Some(yaml_error) = error.downcast_ref::<serde_yaml::Error>() {
        return ErrorContext::new(MetaError::YamlParseError {
            file: chain_message(&error),
            reason: yaml_error.to_string(),
        })
        .with_suggestion("Check the YAML indentation and that every mapping key ends with ':'");
    }

    ErrorContext::new(MetaError::Other {
        message: chain_message(&error),
    })
}

/// The error message followed by its `Caused by:` chain.
fn chain_message(error: &anyhow::Error) -> String {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }
    message
}

fn create_error_context(error: MetaError) -> ErrorContext {
    match &error {
        MetaError::Template(TemplateError::TemplateNotFound {
            suggestions,
            ..
        }) if !suggestions.is_empty() => {
            let hint = format!("Did you mean: {}", suggestions.join(", "));
            ErrorContext::new(error).with_suggestion(hint)
        }
        MetaError::Template(_) => ErrorContext::new(error)
            .with_suggestion("Check the template definition and the template call for this definition")
            .with_details(
                "Template errors are fatal to the definition being resolved; other definitions still run",
            ),
        MetaError::Dynamic(_) => ErrorContext::new(error)
            .with_suggestion("Check the dynamic_collections entry named in the message")
            .with_details("Only the failing dynamic mapping is skipped"),
        MetaError::MissingSection {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Add a collections, dynamic_collections or metadata section to the file"),
        MetaError::CollectionNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Run without --collection to list every definition in the file"),
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MetaError::CollectionNotFound {
            title: "Top Action Movies".to_string(),
        };
        assert_eq!(error.to_string(), "Collection 'Top Action Movies' not found");

        let error = MetaError::MissingSection {
            sections: "metadata, collections, or dynamic_collections".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "YAML Error: metadata, collections, or dynamic_collections attribute is required"
        );
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(MetaError::Other {
            message: "boom".to_string(),
        })
        .with_suggestion("Try again")
        .with_details("It broke");

        let display = format!("{ctx}");
        assert!(display.contains("boom"));
        assert!(display.contains("Details: It broke"));
        assert!(display.contains("Suggestion: Try again"));
    }

    #[test]
    fn test_user_friendly_error_not_found() {
        use std::io::{Error, ErrorKind};

        let io_error = Error::new(ErrorKind::NotFound, "file not found");
        let ctx = user_friendly_error(anyhow::Error::from(io_error));
        assert!(matches!(ctx.error, MetaError::FileNotFound { .. }));
        assert!(ctx.suggestion.is_some());
    }

    #[test]
    fn test_user_friendly_error_template_suggestions() {
        let error = TemplateError::TemplateNotFound {
            data_type: crate::core::DataKind::Collection,
            name: "genre_tmpl".to_string(),
            suggestions: vec!["genre_template".to_string()],
        };
        let ctx = user_friendly_error(anyhow::Error::from(error));
        assert_eq!(ctx.suggestion.as_deref(), Some("Did you mean: genre_template"));
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let error = anyhow::anyhow!("inner").context("outer");
        let ctx = user_friendly_error(error);
        let MetaError::Other {
            message,
        } = ctx.error
        else {
            panic!("Expected Other error");
        };
        assert!(message.starts_with("outer"));
        assert!(message.contains("1: inner"));
    }
}
