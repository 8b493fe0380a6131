//! Configuration errors raised while applying a template.
//!
//! Every variant is fatal to the invocation being resolved and names the
//! offending attribute. Messages are prefixed with the definition family
//! (`Collection Error: ...`) so they read well in a mixed run log.

use std::fmt;
use thiserror::Error;

use crate::core::DataKind;

/// Where a `default`/`conditionals` block came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableSource {
    /// The template body itself
    Template,
    /// Variables captured with the template when it was loaded
    External,
    /// Variables supplied by the generator or call site
    Definition,
    /// Variables supplied by the outermost caller
    Config,
}

impl VariableSource {
    /// Whether entries from this source overwrite existing variables.
    pub const fn overwrites(self) -> bool {
        matches!(self, Self::Config)
    }
}

impl fmt::Display for VariableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template => Ok(()),
            Self::External => f.write_str("External "),
            Self::Definition => f.write_str("Definition "),
            Self::Config => f.write_str("Config "),
        }
    }
}

/// Errors raised while resolving one template invocation
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TemplateError {
    /// The file has no templates at all
    #[error("{data_type} Error: No templates found")]
    NoTemplates {
        /// Definition family
        data_type: DataKind,
    },

    /// The `template` attribute at the call site is empty
    #[error("{data_type} Error: template attribute is blank")]
    BlankCall {
        /// Definition family
        data_type: DataKind,
    },

    /// A template call is not a mapping
    #[error("{data_type} Error: template attribute is not a dictionary")]
    CallNotADictionary {
        /// Definition family
        data_type: DataKind,
    },

    /// A template call has no `name`
    #[error("{data_type} Error: template sub-attribute name is required")]
    MissingName {
        /// Definition family
        data_type: DataKind,
    },

    /// A template call has an empty `name`
    #[error("{data_type} Error: template sub-attribute name is blank")]
    BlankName {
        /// Definition family
        data_type: DataKind,
    },

    /// The called template does not exist
    #[error("{data_type} Error: template {name} not found")]
    TemplateNotFound {
        /// Definition family
        data_type: DataKind,
        /// Template name that was called
        name: String,
        /// Similarly named templates
        suggestions: Vec<String>,
    },

    /// The called template's body is not a mapping
    #[error("{data_type} Error: template {name} is not a dictionary")]
    TemplateNotADictionary {
        /// Definition family
        data_type: DataKind,
        /// Template name
        name: String,
    },

    /// A reserved block (`default`, `conditionals`, `optional`, `move_prefix`) is empty
    #[error("{data_type} Error: {origin}template sub-attribute {attribute} is blank")]
    BlankAttribute {
        /// Definition family
        data_type: DataKind,
        /// Offending attribute
        attribute: String,
        /// Which variable source declared it
        origin: VariableSource,
    },

    /// A reserved block that must be a mapping is not one
    #[error("{data_type} Error: {origin}template sub-attribute {attribute} is not a dictionary")]
    NotADictionary {
        /// Definition family
        data_type: DataKind,
        /// Offending attribute
        attribute: String,
        /// Which variable source declared it
        origin: VariableSource,
    },

    /// A conditional entry is not a mapping
    #[error("{data_type} Error: conditional {name} is not a dictionary")]
    ConditionalNotADictionary {
        /// Definition family
        data_type: DataKind,
        /// Conditional variable name
        name: String,
    },

    /// A conditional has no `conditions`
    #[error("{data_type} Error: conditions sub-attribute required for conditional {name}")]
    MissingConditions {
        /// Definition family
        data_type: DataKind,
        /// Conditional variable name
        name: String,
    },

    /// `conditions` is neither a list nor a mapping
    #[error("{data_type} Error: conditions sub-attribute must be a list or dictionary for conditional {name}")]
    InvalidConditions {
        /// Definition family
        data_type: DataKind,
        /// Conditional variable name
        name: String,
    },

    /// A single condition is not a mapping
    #[error("{data_type} Error: each condition must be a dictionary for conditional {name}")]
    ConditionNotADictionary {
        /// Definition family
        data_type: DataKind,
        /// Conditional variable name
        name: String,
    },

    /// A single condition has no `value`
    #[error("{data_type} Error: each condition must have a result value for conditional {name}")]
    MissingConditionValue {
        /// Definition family
        data_type: DataKind,
        /// Conditional variable name
        name: String,
    },
}
