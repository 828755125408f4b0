//! The six movie operations the HTTP layer exposes.
//!
//! Reads go through the search procedures; writes go through a request-scoped
//! [`UnitOfWork`]. Every failure is reported as a [`CoreError`].

use marquee_core::error::{CoreError, FieldErrors};
use marquee_core::movie::{find_duplicate_title, next_modified_at, now_micros};
use marquee_core::page::Page;
use marquee_core::search::{marshal, marshal_sid_lookup, parse_filters};
use sqlx::PgPool;
use validator::Validate;

use crate::models::movie::{CreateMovie, MovieView, NewMovie, UpdateMovie};
use crate::models::status::MovieStatus;
use crate::repositories::{Expect, MovieFilter};
use crate::retry::RetryPolicy;
use crate::search::{SearchExecutor, SearchProcedure};
use crate::unit_of_work::UnitOfWork;

const ENTITY: &str = "Movie";

fn sid_key(sid: &str) -> String {
    format!("SID '{sid}'")
}

#[derive(Clone)]
pub struct MovieService {
    pool: PgPool,
    retry: RetryPolicy,
    search: SearchExecutor,
}

impl MovieService {
    pub fn new(pool: PgPool, retry: RetryPolicy) -> Self {
        let search = SearchExecutor::new(pool.clone(), retry);
        Self {
            pool,
            retry,
            search,
        }
    }

    /// Page of Active movies matching `filters`.
    ///
    /// Unknown keys or unparseable values are a validation error; a filter
    /// that matches nothing yields an empty page.
    pub async fn list<I, K, V>(&self, filters: I) -> Result<Page<MovieView>, CoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let search = parse_filters(filters)?;
        let document = marshal(&search)?;
        self.search
            .fetch_page(
                SearchProcedure::SearchMovies,
                &document,
                search.page_index,
                search.page_size,
            )
            .await
    }

    /// The Active movie with this SID.
    pub async fn get_by_sid(&self, sid: &str) -> Result<MovieView, CoreError> {
        let sid = sid.trim();
        self.search
            .fetch_single(SearchProcedure::GetMovieBySid, &marshal_sid_lookup(sid))
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, sid_key(sid)))
    }

    /// Create every record in `records` or none of them.
    ///
    /// Titles must be unique within the batch and against Active movies. A
    /// concurrent insert of the same title is caught by the store's unique
    /// index at commit and reported as `Conflict` too.
    pub async fn create_movies(
        &self,
        records: Vec<CreateMovie>,
    ) -> Result<Vec<MovieView>, CoreError> {
        if records.is_empty() {
            return Err(CoreError::invalid("movies", "At least one movie is required."));
        }

        let mut errors = FieldErrors::new();
        for (i, record) in records.iter().enumerate() {
            if let Err(e) = record.validate() {
                errors.extend_prefixed(&format!("[{i}]"), e.into());
            }
        }
        errors.into_result()?;

        if let Some(dup) = find_duplicate_title(records.iter().map(|r| r.title.as_str())) {
            return Err(CoreError::Conflict(format!(
                "Title '{}' appears more than once in the batch",
                dup.trim()
            )));
        }

        let mut uow = UnitOfWork::begin(&self.pool, &self.retry).await?;
        let now = now_micros();
        let mut repo = uow.movies();
        for record in records {
            let filter = MovieFilter::active().with_title(&record.title);
            if repo.single_or_default(&filter, Expect::First).await?.is_some() {
                let title = record.title.trim().to_string();
                uow.clear_context();
                return Err(CoreError::Conflict(format!(
                    "A movie titled '{title}' already exists"
                )));
            }
            repo.insert(NewMovie::from_input(record, now));
        }

        let outcome = uow.commit().await?;
        tracing::info!(count = outcome.inserted.len(), "Created movies");
        Ok(outcome.inserted.into_iter().map(MovieView::from).collect())
    }

    /// Merge `patch` into the Active movie with this SID.
    pub async fn update_movie(
        &self,
        sid: &str,
        patch: UpdateMovie,
    ) -> Result<MovieView, CoreError> {
        patch.validate_patch()?;
        let sid = sid.trim();

        let mut uow = UnitOfWork::begin(&self.pool, &self.retry).await?;
        let mut repo = uow.movies();
        let mut movie = repo
            .single_or_default(&MovieFilter::active().with_sid(sid), Expect::Unique)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, sid_key(sid)))?;

        if let Some(title) = &patch.title {
            let clash = MovieFilter::active().with_title(title).excluding(movie.id);
            if repo.single_or_default(&clash, Expect::First).await?.is_some() {
                return Err(CoreError::Conflict(format!(
                    "A movie titled '{}' already exists",
                    title.trim()
                )));
            }
        }

        patch.apply_to(&mut movie);
        movie.modified_at = next_modified_at(movie.modified_at);
        repo.update(movie);

        let outcome = uow.commit_with_transaction().await?;
        let updated = outcome
            .updated
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::Internal("Update wrote no row".to_string()))?;
        tracing::info!(sid = %updated.sid, "Updated movie");
        Ok(updated.into())
    }

    /// Soft-delete the Active movie with this SID.
    pub async fn delete_movie(&self, sid: &str) -> Result<bool, CoreError> {
        let sid = sid.trim();

        let mut uow = UnitOfWork::begin(&self.pool, &self.retry).await?;
        let mut repo = uow.movies();
        let mut movie = repo
            .single_or_default(&MovieFilter::active().with_sid(sid), Expect::Unique)
            .await?
            .ok_or_else(|| CoreError::not_found(ENTITY, sid_key(sid)))?;

        movie.status = MovieStatus::Deleted;
        movie.modified_at = next_modified_at(movie.modified_at);
        repo.update(movie);

        uow.commit_with_transaction().await?;
        tracing::info!(sid, "Deleted movie");
        Ok(true)
    }

    /// Soft-delete every Active movie of `genre` (case-insensitive) in one
    /// commit and return how many were deleted.
    pub async fn delete_movies_by_genre(&self, genre: &str) -> Result<u64, CoreError> {
        let genre = genre.trim();
        if genre.is_empty() {
            return Err(CoreError::invalid("genre", "Genre must not be blank."));
        }

        let mut uow = UnitOfWork::begin(&self.pool, &self.retry).await?;
        let mut repo = uow.movies();
        let movies = repo
            .get_all(&MovieFilter::active().with_genre(genre))
            .await?;
        if movies.is_empty() {
            return Err(CoreError::not_found(ENTITY, format!("genre '{genre}'")));
        }

        for mut movie in movies {
            movie.status = MovieStatus::Deleted;
            movie.modified_at = next_modified_at(movie.modified_at);
            repo.update(movie);
        }

        let outcome = uow.commit_with_transaction().await?;
        let deleted = outcome.updated.len() as u64;
        tracing::info!(genre, deleted, "Deleted movies by genre");
        Ok(deleted)
    }
}
