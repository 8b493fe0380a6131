//! Errors raised while expanding one dynamic mapping.
//!
//! Each of these aborts the mapping it was raised for; the generator logs it
//! and moves on to the next mapping.

use thiserror::Error;

use crate::utils::parse::ParseError;

/// Failure to expand a dynamic mapping
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DynamicError {
    /// The mapping is not a dictionary
    #[error("Config Error: {map_name} must be a dictionary")]
    NotADictionary {
        /// Dynamic mapping name
        map_name: String,
    },

    /// No `type` attribute
    #[error("Config Error: {map_name} type attribute not found")]
    MissingType {
        /// Dynamic mapping name
        map_name: String,
    },

    /// Empty `type` attribute
    #[error("Config Error: {map_name} type attribute is blank")]
    BlankType {
        /// Dynamic mapping name
        map_name: String,
    },

    /// `type` is not a generator kind available for this library
    #[error("Config Error: {map_name} type attribute {kind} invalid Options: {options}")]
    InvalidType {
        /// Dynamic mapping name
        map_name: String,
        /// Requested kind
        kind: String,
        /// Kinds available for the library
        options: String,
    },

    /// `network` needs the newer metadata agent
    #[error("Config Error: {map_name} type attribute: network only works with the New TV Agent")]
    NetworkNeedsNewAgent {
        /// Dynamic mapping name
        map_name: String,
    },

    /// A ranked list kind without a ranked list source
    #[error("Config Error: {map_name} type attribute: {kind} requires a ranked list source to be configured")]
    RankedListsUnavailable {
        /// Dynamic mapping name
        map_name: String,
        /// Requested kind
        kind: String,
    },

    /// A metadata kind without a metadata source
    #[error("Config Error: {map_name} type attribute: {kind} requires a metadata source to be configured")]
    MetadataUnavailable {
        /// Dynamic mapping name
        map_name: String,
        /// Requested kind
        kind: String,
    },

    /// The kind needs a `data` attribute
    #[error("Config Error: {map_name} data attribute not found")]
    MissingData {
        /// Dynamic mapping name
        map_name: String,
    },

    /// `addons` given for a show-library decade mapping
    #[error("Config Error: addons cannot be used with show decades")]
    ShowDecadeAddons,

    /// `current_year-N` with a non-integer `N`
    #[error("Config Error: {attribute} attribute modifier invalid '{modifier}'")]
    InvalidYearModifier {
        /// `starting` or `ending`
        attribute: String,
        /// Text after the dash
        modifier: String,
    },

    /// `starting` greater than `ending`
    #[error("Config Error: {map_name} data ending must be greater than starting")]
    InvalidRange {
        /// Dynamic mapping name
        map_name: String,
    },

    /// A named template does not exist
    #[error("Config Error: {map_name} template: {template} not found")]
    TemplateNotFound {
        /// Dynamic mapping name
        map_name: String,
        /// Missing template
        template: String,
    },

    /// A named `other_template` does not exist
    #[error("Config Error: {map_name} other template: {template} not found")]
    OtherTemplateNotFound {
        /// Dynamic mapping name
        map_name: String,
        /// Missing template
        template: String,
    },

    /// None of the named templates references the key
    #[error("Config Error: One {map_name} template: {templates} is required to have the template variable <<value>>")]
    TemplateMissingValue {
        /// Dynamic mapping name
        map_name: String,
        /// Comma-joined template names
        templates: String,
    },

    /// The kind has no default template and none was given
    #[error("Config Error: {map_name} template required for type: {kind}")]
    TemplateRequired {
        /// Dynamic mapping name
        map_name: String,
        /// Generator kind
        kind: String,
    },

    /// An attribute could not be parsed
    #[error("Config Error: {map_name} {source}")]
    Parse {
        /// Dynamic mapping name, or `template_variable` for config-level values
        map_name: String,
        /// Parser failure
        source: ParseError,
    },

    /// A collaborator call failed
    #[error("{context}: {message}")]
    Collaborator {
        /// What was being done
        context: String,
        /// Rendered collaborator error
        message: String,
    },
}

impl DynamicError {
    /// Attach a mapping name to a parse failure.
    pub fn parse(map_name: &str, source: ParseError) -> Self {
        Self::Parse {
            map_name: map_name.to_string(),
            source,
        }
    }

    /// Wrap a collaborator error, keeping its cause chain.
    pub fn collaborator(context: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::Collaborator {
            context: context.into(),
            message: format!("{error:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = DynamicError::InvalidType {
            map_name: "Genres".to_string(),
            kind: "mood".to_string(),
            options: "genre, year".to_string(),
        };
        assert_eq!(err.to_string(), "Config Error: Genres type attribute mood invalid Options: genre, year");

        let err = DynamicError::parse(
            "Numbers",
            ParseError::Blank {
                attribute: "data".to_string(),
            },
        );
        assert_eq!(err.to_string(), "Config Error: Numbers data attribute is blank");
    }

    #[test]
    fn test_collaborator_keeps_chain() {
        let source = anyhow::anyhow!("timeout").context("fetching lists");
        let err = DynamicError::collaborator("Ranked List Error", &source);
        assert_eq!(err.to_string(), "Ranked List Error: fetching lists: timeout");
    }
}
