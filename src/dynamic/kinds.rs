//! Catalog of dynamic generator kinds.

use serde_yaml::{Mapping, Value};
use std::fmt;
use std::str::FromStr;

use crate::core::LibraryType;
use crate::library::PersonRole;

/// A generator kind, the `type` of a dynamic mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorKind {
    /// Genre tags
    Genre,
    /// Music mood tags
    Mood,
    /// Music style tags
    Style,
    /// Country tags
    Country,
    /// Studio tags
    Studio,
    /// Movie edition tags
    Edition,
    /// TV network tags
    Network,
    /// Release year tags
    Year,
    /// Decades; tags for movies, computed from item years for shows
    Decade,
    /// Content rating tags
    ContentRating,
    /// Subtitle language tags
    SubtitleLanguage,
    /// Audio language tags
    AudioLanguage,
    /// Resolution tags
    Resolution,
    /// Franchise collections from metadata lookups
    TmdbCollection,
    /// Original languages from metadata lookups
    OriginalLanguage,
    /// Origin countries from metadata lookups
    OriginCountry,
    /// Most credited actors
    Actor,
    /// Most credited directors
    Director,
    /// Most credited writers
    Writer,
    /// Most credited producers
    Producer,
    /// Integer range
    Number,
    /// Literal key map
    Custom,
    /// A user's ranked lists
    TraktUserLists,
    /// Liked ranked lists
    TraktLikedLists,
    /// Most popular people
    TmdbPopularPeople,
    /// People from ranked people lists
    TraktPeopleList,
}

use GeneratorKind::*;

const ALL_AUTO: [GeneratorKind; 3] = [Genre, Number, Custom];

const MOVIE_SHOW_AUTO: [GeneratorKind; 13] = [
    Actor,
    Year,
    ContentRating,
    OriginalLanguage,
    TmdbPopularPeople,
    TraktUserLists,
    Studio,
    TraktLikedLists,
    TraktPeopleList,
    SubtitleLanguage,
    AudioLanguage,
    Resolution,
    Decade,
];

const ALL_KINDS: [GeneratorKind; 26] = [
    Genre,
    Mood,
    Style,
    Country,
    Studio,
    Edition,
    Network,
    Year,
    Decade,
    ContentRating,
    SubtitleLanguage,
    AudioLanguage,
    Resolution,
    TmdbCollection,
    OriginalLanguage,
    OriginCountry,
    Actor,
    Director,
    Writer,
    Producer,
    Number,
    Custom,
    TraktUserLists,
    TraktLikedLists,
    TmdbPopularPeople,
    TraktPeopleList,
];

impl GeneratorKind {
    /// Name used in definition files.
    pub const fn as_str(self) -> &'static str {
        match self {
            Genre => "genre",
            Mood => "mood",
            Style => "style",
            Country => "country",
            Studio => "studio",
            Edition => "edition",
            Network => "network",
            Year => "year",
            Decade => "decade",
            ContentRating => "content_rating",
            SubtitleLanguage => "subtitle_language",
            AudioLanguage => "audio_language",
            Resolution => "resolution",
            TmdbCollection => "tmdb_collection",
            OriginalLanguage => "original_language",
            OriginCountry => "origin_country",
            Actor => "actor",
            Director => "director",
            Writer => "writer",
            Producer => "producer",
            Number => "number",
            Custom => "custom",
            TraktUserLists => "trakt_user_lists",
            TraktLikedLists => "trakt_liked_lists",
            TmdbPopularPeople => "tmdb_popular_people",
            TraktPeopleList => "trakt_people_list",
        }
    }

    /// Kinds available for a library type, in catalog order.
    pub fn allowed_for(library_type: LibraryType) -> Vec<Self> {
        let specific: &[Self] = match library_type {
            LibraryType::Movie => &[TmdbCollection, Edition, Country, Director, Producer, Writer],
            LibraryType::Show => &[Network, OriginCountry],
            LibraryType::Artist => &[Mood, Style, Country],
            LibraryType::Video => &[Country, ContentRating],
        };
        let mut kinds = specific.to_vec();
        kinds.extend(ALL_AUTO);
        if matches!(library_type, LibraryType::Movie | LibraryType::Show) {
            kinds.extend(MOVIE_SHOW_AUTO);
        }
        kinds
    }

    /// Whether the universe is read from a library tag field.
    pub const fn is_tag(self) -> bool {
        matches!(
            self,
            Genre
                | Mood
                | Style
                | Country
                | Studio
                | Edition
                | Network
                | Year
                | Decade
                | ContentRating
                | SubtitleLanguage
                | AudioLanguage
                | Resolution
        )
    }

    /// Tag field searched for a tag kind.
    ///
    /// Shows keep resolution and stream languages on episodes.
    pub fn search_tag(self, library_type: LibraryType) -> String {
        let field = match self {
            ContentRating => "contentRating",
            SubtitleLanguage => "subtitleLanguage",
            AudioLanguage => "audioLanguage",
            Edition => "editionTitle",
            other => other.as_str(),
        };
        if library_type.is_show() && matches!(self, Resolution | SubtitleLanguage | AudioLanguage) {
            format!("episode.{field}")
        } else {
            field.to_string()
        }
    }

    /// Credit role for the people kinds.
    pub const fn person_role(self) -> Option<PersonRole> {
        match self {
            Actor => Some(PersonRole::Actor),
            Director => Some(PersonRole::Director),
            Writer => Some(PersonRole::Writer),
            Producer => Some(PersonRole::Producer),
            _ => None,
        }
    }

    /// Whether the kind needs a ranked list source.
    pub const fn needs_ranked_lists(self) -> bool {
        matches!(self, TraktUserLists | TraktLikedLists | TmdbPopularPeople | TraktPeopleList)
    }

    /// Whether the kind needs a metadata source.
    pub const fn needs_metadata(self) -> bool {
        matches!(self, TmdbCollection | OriginalLanguage | OriginCountry)
    }

    /// Title format used when the mapping gives none.
    pub const fn default_title_format(self, library_type: LibraryType) -> &'static str {
        match self {
            _ if library_type.is_music() && self.is_tag() => "Most Played <<key_name>> <<library_type>>s",
            Year | Decade => "Best <<library_type>>s of <<key_name>>",
            Resolution | OriginalLanguage | OriginCountry => "<<key_name>> <<library_type>>s",
            _ if self.is_tag() => "Top <<key_name>> <<library_type>>s",
            _ => "<<key_name>>",
        }
    }

    /// Template used when the mapping names none; `None` means a template
    /// is required.
    pub fn default_template(self, library_type: LibraryType) -> Option<Value> {
        if self.is_tag() {
            let template = if library_type.is_music() {
                smart_filter(Some(50), "plays.desc", &format!("artist_{}", self.as_str()))
            } else if self == Decade && library_type.is_show() {
                smart_filter(Some(50), "critic_rating.desc", "year")
            } else if self == Resolution {
                smart_filter(None, "title.asc", "resolution")
            } else if self == Studio {
                smart_filter(Some(50), "critic_rating.desc", "studio.is")
            } else {
                smart_filter(Some(50), "critic_rating.desc", self.as_str())
            };
            return Some(template);
        }
        let template = match self {
            Actor | Director | Writer | Producer => {
                mapping([("plex_search", mapping([("any", mapping([(self.as_str(), value_marker())]))]))])
            }
            OriginalLanguage | OriginCountry => mapping([
                ("plex_all", Value::Bool(true)),
                ("filters", mapping([(self.as_str(), value_marker())])),
            ]),
            TmdbCollection => mapping([
                ("tmdb_collection_details", value_marker()),
                ("minimum_items", Value::from(2)),
            ]),
            TraktUserLists | TraktLikedLists => mapping([("trakt_list_details", value_marker())]),
            TmdbPopularPeople | TraktPeopleList => mapping([
                ("tmdb_person", value_marker()),
                ("plex_search", mapping([("all", mapping([("actor", Value::from("tmdb"))]))])),
            ]),
            _ => return None,
        };
        Some(template)
    }

    /// Comma-joined list of kind names.
    pub fn join(kinds: &[Self]) -> String {
        kinds.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(", ")
    }
}

fn value_marker() -> Value {
    Value::from("<<value>>")
}

fn mapping<const N: usize>(entries: [(&str, Value); N]) -> Value {
    Value::Mapping(entries.into_iter().map(|(k, v)| (Value::from(k), v)).collect::<Mapping>())
}

fn smart_filter(limit: Option<i64>, sort_by: &str, field: &str) -> Value {
    let mut filter = Mapping::new();
    if let Some(limit) = limit {
        filter.insert(Value::from("limit"), Value::from(limit));
    }
    filter.insert(Value::from("sort_by"), Value::from(sort_by));
    filter.insert(Value::from("any"), mapping([(field, value_marker())]));
    mapping([("smart_filter", Value::Mapping(filter))])
}

impl fmt::Display for GeneratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeneratorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        ALL_KINDS.into_iter().find(|kind| kind.as_str() == lower).ok_or(lower)
    }
}
