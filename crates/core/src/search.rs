//! Search filter vocabulary and the parameter marshaller.
//!
//! A caller hands over a loose mapping of filter keys (usually the query
//! string). [`parse_filters`] turns it into a typed [`MovieSearch`], and
//! [`marshal`] wraps that into the `{"Search": {...}}` document the search
//! procedures read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CoreError, FieldErrors};
use crate::movie::{RATING_MAX, RATING_MIN};

// ---------------------------------------------------------------------------
// Document schema
// ---------------------------------------------------------------------------

/// Top-level key every search document is nested under.
pub const SEARCH_SCHEMA: &str = "Search";

pub const KEY_SEARCH: &str = "search";
pub const KEY_GENRE: &str = "genre";
pub const KEY_DIRECTOR: &str = "director";
pub const KEY_MIN_RATING: &str = "min_rating";
pub const KEY_RELEASE_YEAR: &str = "release_year";
pub const KEY_SORT_BY: &str = "sort_by";
pub const KEY_SORT_ORDER: &str = "sort_order";
pub const KEY_PAGE_INDEX: &str = "page_index";
pub const KEY_PAGE_SIZE: &str = "page_size";

/// Key used by single-row lookups; not accepted as a list filter.
pub const KEY_SID: &str = "sid";

/// Every key accepted by [`parse_filters`].
pub const FILTER_KEYS: &[&str] = &[
    KEY_SEARCH,
    KEY_GENRE,
    KEY_DIRECTOR,
    KEY_MIN_RATING,
    KEY_RELEASE_YEAR,
    KEY_SORT_BY,
    KEY_SORT_ORDER,
    KEY_PAGE_INDEX,
    KEY_PAGE_SIZE,
];

// ---------------------------------------------------------------------------
// Pagination defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_PAGE_INDEX: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;
/// Largest page index the search procedure accepts (its INT range).
pub const MAX_PAGE_INDEX: i64 = i32::MAX as i64;

/// Clamp a requested page size into `1..=max`, falling back to `default`.
pub fn clamp_page_size(size: Option<i64>, default: i64, max: i64) -> i64 {
    size.unwrap_or(default).max(1).min(max)
}

/// Clamp a requested 1-based page index into `1..=MAX_PAGE_INDEX`.
pub fn clamp_page_index(index: Option<i64>) -> i64 {
    index.unwrap_or(DEFAULT_PAGE_INDEX).clamp(1, MAX_PAGE_INDEX)
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    Genre,
    Director,
    ReleaseDate,
    Rating,
    #[default]
    CreatedAt,
    ModifiedAt,
}

impl SortField {
    pub const ALL: [SortField; 7] = [
        SortField::Title,
        SortField::Genre,
        SortField::Director,
        SortField::ReleaseDate,
        SortField::Rating,
        SortField::CreatedAt,
        SortField::ModifiedAt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Genre => "genre",
            SortField::Director => "director",
            SortField::ReleaseDate => "release_date",
            SortField::Rating => "rating",
            SortField::CreatedAt => "created_at",
            SortField::ModifiedAt => "modified_at",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == wanted)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                format!("Must be one of: {}", allowed.join(", "))
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err("Must be 'asc' or 'desc'".to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Typed filter
// ---------------------------------------------------------------------------

/// Typed list filter. Absent optional fields do not constrain the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovieSearch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_year: Option<i32>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub page_index: i64,
    pub page_size: i64,
}

impl Default for MovieSearch {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            director: None,
            min_rating: None,
            release_year: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            page_index: DEFAULT_PAGE_INDEX,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Parse a loose key/value mapping into a [`MovieSearch`].
///
/// Blank values count as absent. Unknown keys and unparseable values are
/// collected and reported together as one validation error. Paging values
/// outside their range are clamped rather than rejected.
pub fn parse_filters<I, K, V>(filters: I) -> Result<MovieSearch, CoreError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut search = MovieSearch::default();
    let mut page_index = None;
    let mut page_size = None;
    let mut errors = FieldErrors::new();

    for (key, value) in filters {
        let key = key.as_ref();
        let value = value.as_ref().trim();

        if value.is_empty() && FILTER_KEYS.contains(&key) {
            continue;
        }

        match key {
            KEY_SEARCH => search.search = Some(value.to_string()),
            KEY_GENRE => search.genre = Some(value.to_string()),
            KEY_DIRECTOR => search.director = Some(value.to_string()),
            KEY_MIN_RATING => match value.parse::<f64>() {
                Ok(r) if r.is_finite() && (RATING_MIN..=RATING_MAX).contains(&r) => {
                    search.min_rating = Some(r)
                }
                _ => errors.push(
                    key,
                    format!("Must be a number between {RATING_MIN} and {RATING_MAX}"),
                ),
            },
            KEY_RELEASE_YEAR => match value.parse::<i32>() {
                Ok(y) if (1..=9999).contains(&y) => search.release_year = Some(y),
                _ => errors.push(key, "Must be a year between 1 and 9999"),
            },
            KEY_SORT_BY => match value.parse::<SortField>() {
                Ok(field) => search.sort_by = field,
                Err(msg) => errors.push(key, msg),
            },
            KEY_SORT_ORDER => match value.parse::<SortOrder>() {
                Ok(order) => search.sort_order = order,
                Err(msg) => errors.push(key, msg),
            },
            KEY_PAGE_INDEX => match value.parse::<i64>() {
                Ok(n) => page_index = Some(n),
                Err(_) => errors.push(key, "Must be an integer"),
            },
            KEY_PAGE_SIZE => match value.parse::<i64>() {
                Ok(n) => page_size = Some(n),
                Err(_) => errors.push(key, "Must be an integer"),
            },
            _ => errors.push(
                key,
                format!("Unknown filter key. Accepted keys: {}", FILTER_KEYS.join(", ")),
            ),
        }
    }

    errors.into_result()?;

    search.page_index = clamp_page_index(page_index);
    search.page_size = clamp_page_size(page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
    Ok(search)
}

// ---------------------------------------------------------------------------
// Marshalling
// ---------------------------------------------------------------------------

fn wrap(inner: Value) -> Value {
    let mut doc = Map::new();
    doc.insert(SEARCH_SCHEMA.to_string(), inner);
    Value::Object(doc)
}

/// Build the `{"Search": {...}}` document for a list search.
pub fn marshal(search: &MovieSearch) -> Result<Value, CoreError> {
    let inner = serde_json::to_value(search)
        .map_err(|e| CoreError::Internal(format!("Failed to encode search filter: {e}")))?;
    Ok(wrap(inner))
}

/// Build the document for a single-row lookup by SID.
pub fn marshal_sid_lookup(sid: &str) -> Value {
    let mut inner = Map::new();
    inner.insert(KEY_SID.to_string(), Value::String(sid.to_string()));
    wrap(Value::Object(inner))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
