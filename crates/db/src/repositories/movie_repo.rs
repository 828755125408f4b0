//! Repository for the `movies` table.

use marquee_core::error::CoreError;
use marquee_core::types::DbId;
use sqlx::PgConnection;

use crate::error::classify_sqlx_error;
use crate::models::movie::{Movie, NewMovie};
use crate::models::status::MovieStatus;
use crate::unit_of_work::{PendingChange, UnitOfWork};

/// Column list shared across queries. `rating` is NUMERIC(3,1) in the
/// table and read back as a float.
pub(crate) const COLUMNS: &str = "id, sid, title, genre, director, release_date, \
     rating::DOUBLE PRECISION AS rating, review, status, created_at, modified_at";

/// Nullable-parameter predicate shared by every filtered read.
const WHERE_FILTER: &str = "($1::TEXT IS NULL OR sid = $1)
       AND ($2::TEXT IS NULL OR lower(title) = lower($2))
       AND ($3::TEXT IS NULL OR lower(genre) = lower($3))
       AND ($4::SMALLINT IS NULL OR status = $4)
       AND ($5::BIGINT IS NULL OR id <> $5)";

/// Typed predicate over movies. Unset fields do not constrain the match;
/// title and genre compare case-insensitively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MovieFilter {
    pub sid: Option<String>,
    pub title: Option<String>,
    pub genre: Option<String>,
    pub status: Option<MovieStatus>,
    pub exclude_id: Option<DbId>,
}

impl MovieFilter {
    /// Match Active rows only.
    pub fn active() -> Self {
        Self {
            status: Some(MovieStatus::Active),
            ..Self::default()
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.trim().to_string());
        self
    }

    pub fn with_genre(mut self, genre: &str) -> Self {
        self.genre = Some(genre.trim().to_string());
        self
    }

    pub fn with_status(mut self, status: MovieStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Skip the row with this internal id (e.g. the movie being updated).
    pub fn excluding(mut self, id: DbId) -> Self {
        self.exclude_id = Some(id);
        self
    }
}

/// What [`MovieRepo::single_or_default`] should do when several rows match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expect {
    /// Return the lowest-id match.
    First,
    /// Treat more than one match as a conflict.
    Unique,
}

/// Movie data access bound to one [`UnitOfWork`].
pub struct MovieRepo<'u> {
    uow: &'u mut UnitOfWork,
}

impl<'u> MovieRepo<'u> {
    pub(crate) fn new(uow: &'u mut UnitOfWork) -> Self {
        Self { uow }
    }

    /// All rows matching `filter`, ordered by id. Empty when nothing matches.
    pub async fn get_all(&mut self, filter: &MovieFilter) -> Result<Vec<Movie>, CoreError> {
        let query = format!("SELECT {COLUMNS} FROM movies WHERE {WHERE_FILTER} ORDER BY id");
        bind_filter(sqlx::query_as::<_, Movie>(&query), filter)
            .fetch_all(self.uow.connection())
            .await
            .map_err(|e| classify_sqlx_error(&e, "load movies"))
    }

    /// At most one row matching `filter`.
    ///
    /// With [`Expect::Unique`], a second match is reported as `Conflict`
    /// instead of being silently ignored.
    pub async fn single_or_default(
        &mut self,
        filter: &MovieFilter,
        expect: Expect,
    ) -> Result<Option<Movie>, CoreError> {
        let limit = match expect {
            Expect::First => 1,
            Expect::Unique => 2,
        };
        let query =
            format!("SELECT {COLUMNS} FROM movies WHERE {WHERE_FILTER} ORDER BY id LIMIT {limit}");
        let mut rows = bind_filter(sqlx::query_as::<_, Movie>(&query), filter)
            .fetch_all(self.uow.connection())
            .await
            .map_err(|e| classify_sqlx_error(&e, "load movie"))?;

        if rows.len() > 1 {
            return Err(CoreError::Conflict(
                "More than one movie matches a lookup expected to be unique".to_string(),
            ));
        }
        Ok(rows.pop())
    }

    /// Stage a new movie. Not visible in the store until commit.
    pub fn insert(&mut self, movie: NewMovie) {
        self.uow.stage(PendingChange::Insert(movie));
    }

    /// Stage a modified movie. Not visible in the store until commit.
    pub fn update(&mut self, movie: Movie) {
        self.uow.stage(PendingChange::Update(movie));
    }

    /// Number of changes staged on the owning unit of work.
    pub fn pending_len(&self) -> usize {
        self.uow.pending_len()
    }
}

fn bind_filter<'q>(
    query: sqlx::query::QueryAs<'q, sqlx::Postgres, Movie, sqlx::postgres::PgArguments>,
    filter: &'q MovieFilter,
) -> sqlx::query::QueryAs<'q, sqlx::Postgres, Movie, sqlx::postgres::PgArguments> {
    query
        .bind(filter.sid.as_deref())
        .bind(filter.title.as_deref())
        .bind(filter.genre.as_deref())
        .bind(filter.status)
        .bind(filter.exclude_id)
}

// ---------------------------------------------------------------------------
// Commit-time writes (called by `UnitOfWork` inside its transaction)
// ---------------------------------------------------------------------------

pub(crate) async fn insert_row(conn: &mut PgConnection, movie: &NewMovie) -> Result<Movie, sqlx::Error> {
    let query = format!(
        "INSERT INTO movies
            (sid, title, genre, director, release_date, rating, review, status, created_at, modified_at)
         VALUES ($1, $2, $3, $4, $5, $6::NUMERIC(3,1), $7, $8, $9, $10)
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Movie>(&query)
        .bind(&movie.sid)
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(&movie.director)
        .bind(movie.release_date)
        .bind(movie.rating)
        .bind(&movie.review)
        .bind(movie.status)
        .bind(movie.created_at)
        .bind(movie.modified_at)
        .fetch_one(conn)
        .await
}

/// Write every mutable column of `movie`. `sid` and `created_at` are never
/// part of the SET list.
pub(crate) async fn update_row(conn: &mut PgConnection, movie: &Movie) -> Result<Movie, sqlx::Error> {
    let query = format!(
        "UPDATE movies SET
            title = $2,
            genre = $3,
            director = $4,
            release_date = $5,
            rating = $6::NUMERIC(3,1),
            review = $7,
            status = $8,
            modified_at = $9
         WHERE id = $1
         RETURNING {COLUMNS}"
    );
    sqlx::query_as::<_, Movie>(&query)
        .bind(movie.id)
        .bind(&movie.title)
        .bind(&movie.genre)
        .bind(&movie.director)
        .bind(movie.release_date)
        .bind(movie.rating)
        .bind(&movie.review)
        .bind(movie.status)
        .bind(movie.modified_at)
        .fetch_optional(conn)
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}
