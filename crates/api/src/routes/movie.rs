//! Route definitions for the `/movies` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::movie;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /                  -> list            (query string filters)
/// POST   /                  -> create          (JSON array)
/// GET    /{sid}             -> get_by_sid
/// PUT    /{sid}             -> update
/// PATCH  /{sid}             -> update
/// DELETE /{sid}             -> delete
/// DELETE /genre/{genre}     -> delete_by_genre
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movie::list).post(movie::create))
        .route("/genre/{genre}", delete(movie::delete_by_genre))
        .route(
            "/{sid}",
            get(movie::get_by_sid)
                .put(movie::update)
                .patch(movie::update)
                .delete(movie::delete),
        )
}
