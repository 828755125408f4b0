use marquee_db::services::MovieService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: the pool and service are reference-counted internally.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (used directly by the health check).
    pub pool: marquee_db::DbPool,
    /// Movie operations.
    pub movies: MovieService,
}

impl AppState {
    pub fn new(pool: marquee_db::DbPool, retry: marquee_db::RetryPolicy) -> Self {
        let movies = MovieService::new(pool.clone(), retry);
        Self { pool, movies }
    }
}
