//! Search executor: calls the stored search procedures and decodes their
//! JSONB output into typed results.

use marquee_core::error::CoreError;
use marquee_core::page::Page;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sqlx::PgPool;

use crate::error::classify_sqlx_error;
use crate::retry::{with_retry, RetryPolicy};

/// Stored procedures the executor knows how to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchProcedure {
    /// Paged list search; returns `{"items", "total_count", "page_index", "page_size"}`.
    SearchMovies,
    /// Single-row lookup; returns one object or NULL.
    GetMovieBySid,
}

impl SearchProcedure {
    pub fn name(self) -> &'static str {
        match self {
            SearchProcedure::SearchMovies => "sp_search_movies",
            SearchProcedure::GetMovieBySid => "sp_get_movie_by_sid",
        }
    }
}

#[derive(Clone)]
pub struct SearchExecutor {
    pool: PgPool,
    retry: RetryPolicy,
}

impl SearchExecutor {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        Self { pool, retry }
    }

    /// Invoke `procedure` with `document` as its only argument and return
    /// the raw payload. SQL NULL comes back as `None`.
    pub async fn call(
        &self,
        procedure: SearchProcedure,
        document: &Value,
    ) -> Result<Option<Value>, CoreError> {
        let query = format!("SELECT {}($1)", procedure.name());
        let query = query.as_str();
        let pool = &self.pool;

        with_retry(&self.retry, procedure.name(), move || {
            sqlx::query_scalar::<_, Option<Value>>(query)
                .bind(document)
                .fetch_one(pool)
        })
        .await
        .map_err(|e| classify_sqlx_error(&e, &format!("run {}", procedure.name())))
    }

    /// Run a list procedure and decode its output into a [`Page`].
    ///
    /// `page_index` and `page_size` are echoed back when the procedure
    /// returns no payload at all.
    pub async fn fetch_page<T: DeserializeOwned>(
        &self,
        procedure: SearchProcedure,
        document: &Value,
        page_index: i64,
        page_size: i64,
    ) -> Result<Page<T>, CoreError> {
        let payload = self.call(procedure, document).await?;
        decode_page(procedure, payload, page_index, page_size)
    }

    /// Run a single-row procedure. `Ok(None)` means no row matched.
    pub async fn fetch_single<T: DeserializeOwned>(
        &self,
        procedure: SearchProcedure,
        document: &Value,
    ) -> Result<Option<T>, CoreError> {
        let payload = self.call(procedure, document).await?;
        decode_single(procedure, payload)
    }
}

fn malformed(procedure: SearchProcedure, err: serde_json::Error) -> CoreError {
    tracing::error!(procedure = procedure.name(), error = %err, "Malformed search output");
    CoreError::Serialization(format!("{}: {err}", procedure.name()))
}

/// Decode a list payload. A missing or `null` payload is an empty page.
pub fn decode_page<T: DeserializeOwned>(
    procedure: SearchProcedure,
    payload: Option<Value>,
    page_index: i64,
    page_size: i64,
) -> Result<Page<T>, CoreError> {
    match payload {
        None | Some(Value::Null) => Ok(Page::empty(page_index, page_size)),
        Some(value) => serde_json::from_value(value).map_err(|e| malformed(procedure, e)),
    }
}

/// Decode a single-row payload. A missing or `null` payload is "no match".
pub fn decode_single<T: DeserializeOwned>(
    procedure: SearchProcedure,
    payload: Option<Value>,
) -> Result<Option<T>, CoreError> {
    match payload {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| malformed(procedure, e)),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;
    use crate::models::movie::MovieView;
    use crate::models::status::MovieStatus;

    fn movie_json(sid: &str, title: &str) -> Value {
        json!({
            "sid": sid,
            "title": title,
            "genre": "Sci-Fi",
            "director": "Nolan",
            "release_date": "2010-07-16",
            "rating": 8.8,
            "review": null,
            "status": "active",
            "created_at": "2024-03-01T10:00:00.123456+00:00",
            "modified_at": "2024-03-01T10:00:00.123456+00:00"
        })
    }

    #[test]
    fn procedure_names() {
        assert_eq!(SearchProcedure::SearchMovies.name(), "sp_search_movies");
        assert_eq!(SearchProcedure::GetMovieBySid.name(), "sp_get_movie_by_sid");
    }

    #[test]
    fn page_payload_decodes() {
        let payload = json!({
            "items": [movie_json("MOV0000001", "Inception"), movie_json("MOV0000002", "Tenet")],
            "total_count": 12,
            "page_index": 2,
            "page_size": 2
        });
        let page: Page<MovieView> =
            decode_page(SearchProcedure::SearchMovies, Some(payload), 1, 20).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[1].title, "Tenet");
        assert_eq!(page.items[0].status, MovieStatus::Active);
        assert_eq!(page.total_count, 12);
        assert_eq!(page.page_index, 2);
        assert_eq!(page.total_pages(), 6);
    }

    #[test]
    fn null_payload_is_empty_page() {
        let page: Page<MovieView> =
            decode_page(SearchProcedure::SearchMovies, Some(Value::Null), 3, 10).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_count, 0);
        assert_eq!(page.page_index, 3);
        assert_eq!(page.page_size, 10);

        let page: Page<MovieView> =
            decode_page(SearchProcedure::SearchMovies, None, 1, 20).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn missing_page_metadata_is_serialization_error() {
        let payload = json!({ "items": [] });
        let result: Result<Page<MovieView>, _> =
            decode_page(SearchProcedure::SearchMovies, Some(payload), 1, 20);
        assert_matches!(result, Err(CoreError::Serialization(msg)) if msg.starts_with("sp_search_movies"));
    }

    #[test]
    fn wrong_item_shape_is_serialization_error() {
        let payload = json!({
            "items": [{ "sid": 42 }],
            "total_count": 1,
            "page_index": 1,
            "page_size": 20
        });
        let result: Result<Page<MovieView>, _> =
            decode_page(SearchProcedure::SearchMovies, Some(payload), 1, 20);
        assert_matches!(result, Err(CoreError::Serialization(_)));
    }

    #[test]
    fn single_payload_decodes_or_signals_absence() {
        let found: Option<MovieView> = decode_single(
            SearchProcedure::GetMovieBySid,
            Some(movie_json("MOV00000AB", "Heat")),
        )
        .unwrap();
        assert_eq!(found.unwrap().sid, "MOV00000AB");

        let missing: Option<MovieView> =
            decode_single(SearchProcedure::GetMovieBySid, None).unwrap();
        assert!(missing.is_none());

        let null: Option<MovieView> =
            decode_single(SearchProcedure::GetMovieBySid, Some(Value::Null)).unwrap();
        assert!(null.is_none());
    }

    #[test]
    fn array_for_single_lookup_is_serialization_error() {
        let result: Result<Option<MovieView>, _> =
            decode_single(SearchProcedure::GetMovieBySid, Some(json!([1, 2])));
        assert_matches!(result, Err(CoreError::Serialization(msg)) if msg.starts_with("sp_get_movie_by_sid"));
    }
}
