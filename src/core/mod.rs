//! Core types shared across the crate
//!
//! # Modules
//!
//! ## `error` - Error Handling
//!
//! - [`MetaError`] - Top-level error type wrapping template, generator and file failures
//! - [`ErrorContext`] - User-friendly error wrapper with suggestions and details
//! - [`user_friendly_error`] - Convert any error to user-friendly format
//!
//! ## Data kinds
//!
//! [`DataKind`] names the three definition families (collections, playlists,
//! overlays). It drives the bookkeeping variable names injected into every
//! template invocation (`collection_name`, `playlist_sort`, ...) and the
//! prefix of error messages.
//!
//! ## Library context
//!
//! [`LibraryType`] and [`LibraryInfo`] describe the library a definition file
//! is resolved against. Both feed the `library_type`, `library_typeU` and
//! `library_name` variables and gate which dynamic generator kinds apply.

pub mod error;

pub use error::{ErrorContext, MetaError, user_friendly_error};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The family of definitions a file produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    /// Collections inside a library
    Collection,
    /// Cross-library playlists
    Playlist,
    /// Poster overlays
    Overlay,
}

impl DataKind {
    /// Capitalized label used in messages (`"Collection"`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::Collection => "Collection",
            Self::Playlist => "Playlist",
            Self::Overlay => "Overlay",
        }
    }

    /// Lowercase stem used for bookkeeping variables (`"collection"`).
    pub const fn stem(self) -> &'static str {
        match self {
            Self::Collection => "collection",
            Self::Playlist => "playlist",
            Self::Overlay => "overlay",
        }
    }

    /// Variable holding the definition's own name (`collection_name`).
    pub fn name_variable(self) -> String {
        format!("{}_name", self.stem())
    }

    /// Variable holding the sort title (`collection_sort`).
    pub fn sort_variable(self) -> String {
        format!("{}_sort", self.stem())
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The item type of a media library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LibraryType {
    /// Movie library
    Movie,
    /// Show library
    Show,
    /// Music library
    Artist,
    /// Personal video library
    Video,
}

impl LibraryType {
    /// Capitalized label (`"Movie"`), the `library_typeU` variable.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Movie => "Movie",
            Self::Show => "Show",
            Self::Artist => "Artist",
            Self::Video => "Video",
        }
    }

    /// Lowercase label (`"movie"`), the `library_type` variable.
    pub const fn lower(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
            Self::Artist => "artist",
            Self::Video => "video",
        }
    }

    /// Whether this is a movie library.
    pub const fn is_movie(self) -> bool {
        matches!(self, Self::Movie)
    }

    /// Whether this is a show library.
    pub const fn is_show(self) -> bool {
        matches!(self, Self::Show)
    }

    /// Whether this is a music library.
    pub const fn is_music(self) -> bool {
        matches!(self, Self::Artist)
    }
}

impl fmt::Display for LibraryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Name and type of the library a file is resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryInfo {
    /// Library display name
    pub name: String,
    /// Item type
    pub library_type: LibraryType,
}

impl LibraryInfo {
    /// Describe a library.
    pub fn new(name: impl Into<String>, library_type: LibraryType) -> Self {
        Self {
            name: name.into(),
            library_type,
        }
    }
}
