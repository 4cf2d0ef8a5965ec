use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Genre id to display name, as published by the catalog.
pub type GenreMap = HashMap<i64, String>;

/// A movie as served to clients, with or without its spoiler.
///
/// `title` + `year` is the natural key used for caching and persistence;
/// the title comparison is case-insensitive at the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub poster: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub backdrop: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub overview: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub spoiler: String,
}

impl MovieRecord {
    #[must_use]
    pub fn with_spoiler(mut self, spoiler: String) -> Self {
        self.spoiler = spoiler;
        self
    }
}

/// A row of the `movies` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistedRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    #[serde(flatten)]
    pub movie: MovieRecord,

    #[serde(default = "default_search_count", deserialize_with = "null_as_search_count")]
    pub search_count: i64,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

const fn default_search_count() -> i64 {
    1
}

/// Nullable columns come back as JSON `null`; treat them like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_search_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<i64>::deserialize(deserializer)?.unwrap_or_else(default_search_count))
}

/// Accepts `timestamptz` and plain `timestamp` renderings (the latter read as
/// UTC). Anything else becomes `None` rather than failing the whole row.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    Ok(parse_timestamp(&raw))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Body of an upsert into the `movies` table. The store's merge policy decides
/// what happens to `search_count` when the row already exists.
#[derive(Debug, Serialize)]
pub struct NewMovieRow<'a> {
    #[serde(flatten)]
    pub movie: &'a MovieRecord,
    pub search_count: i64,
}

impl<'a> NewMovieRow<'a> {
    #[must_use]
    pub const fn new(movie: &'a MovieRecord) -> Self {
        Self {
            movie,
            search_count: 1,
        }
    }
}
