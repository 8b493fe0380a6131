//! Template resolution engine.
//!
//! Definitions reference reusable templates through `template` calls. A call
//! names a template and supplies call-site variables; resolving it produces
//! a flat attribute mapping with every `<<name>>` marker replaced.
//!
//! # Overview
//!
//! ```yaml
//! templates:
//!   genre:
//!     default:
//!       limit: 100
//!     optional:
//!       - label
//!     conditionals:
//!       sort:
//!         default: title.asc
//!         conditions:
//!           - library_type: show
//!             value: year.desc
//!     smart_filter:
//!       all:
//!         genre: <<value>>
//!         label: <<label>>
//!       limit: <<limit>>
//!       sort_by: <<sort>>
//!
//! collections:
//!   Action Movies:
//!     template: {name: genre, value: Action}
//! ```
//!
//! # Supported operators
//!
//! - Placeholders: `<<name>>` markers in keys and values, expanded up to
//!   [`MAX_SUBSTITUTION_PASSES`] times so values may reference other variables
//! - Defaults: `default:` values used when no variable of that name exists
//! - Optional markers: `optional:` names whose unresolved markers drop the
//!   enclosing attribute instead of staying in the output
//! - Conditionals: `conditionals:` variables computed from the first matching
//!   condition (see [`conditionals`])
//! - Prefix moves: `move_prefix:` derives `<kind>_sort` from `<kind>_name`
//!
//! There are no loops, expressions or functions.
//!
//! # Precedence
//!
//! Placeholders resolve against variables first, then translation variables,
//! then defaults. Variables themselves are layered from the call site, the
//! template's external bundle, the definition bundle and the config bundle;
//! config always wins (see [`variables`]).

pub mod applier;
pub mod conditionals;
pub mod error;
pub mod placeholder;
pub mod template;
pub mod variables;

pub use applier::TemplateApplier;
pub use error::{TemplateError, VariableSource};
pub use placeholder::{MAX_SUBSTITUTION_PASSES, Substituted, Substitution};
pub use template::{Template, TemplateSet};
pub use variables::{ResolutionContext, ResolvedVariables, resolve_variables};

use indexmap::IndexMap;
use serde_yaml::Value;

/// Ordered variable bundle; iteration order is declaration order.
pub type VariableMap = IndexMap<String, Value>;
