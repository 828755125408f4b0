pub mod health;
pub mod movie;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /movies      movie catalog (see routes::movie)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/movies", movie::router())
}
