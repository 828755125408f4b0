//! Handlers for the `/movies` resource.
//!
//! Each handler maps to exactly one [`MovieService`](marquee_db::services::MovieService)
//! operation; validation and error translation happen below this layer.

use std::collections::HashMap;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use marquee_db::models::movie::{CreateMovie, MovieView, UpdateMovie};

use crate::error::AppResult;
use crate::response::{DataResponse, DeletedCount, PageResponse};
use crate::state::AppState;

/// GET /api/v1/movies
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> AppResult<Json<DataResponse<PageResponse<MovieView>>>> {
    let Query(filters) = query?;
    let page = state.movies.list(&filters).await?;
    Ok(Json(DataResponse { data: page.into() }))
}

/// GET /api/v1/movies/{sid}
pub async fn get_by_sid(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> AppResult<Json<DataResponse<MovieView>>> {
    let movie = state.movies.get_by_sid(&sid).await?;
    Ok(Json(DataResponse { data: movie }))
}

/// POST /api/v1/movies
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Vec<CreateMovie>>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<MovieView>>>)> {
    let Json(records) = body?;
    let created = state.movies.create_movies(records).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// PUT|PATCH /api/v1/movies/{sid}
pub async fn update(
    State(state): State<AppState>,
    Path(sid): Path<String>,
    body: Result<Json<UpdateMovie>, JsonRejection>,
) -> AppResult<Json<DataResponse<MovieView>>> {
    let Json(patch) = body?;
    let movie = state.movies.update_movie(&sid, patch).await?;
    Ok(Json(DataResponse { data: movie }))
}

/// DELETE /api/v1/movies/{sid}
pub async fn delete(
    State(state): State<AppState>,
    Path(sid): Path<String>,
) -> AppResult<Json<DataResponse<bool>>> {
    let deleted = state.movies.delete_movie(&sid).await?;
    Ok(Json(DataResponse { data: deleted }))
}

/// DELETE /api/v1/movies/genre/{genre}
pub async fn delete_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> AppResult<Json<DataResponse<DeletedCount>>> {
    let deleted = state.movies.delete_movies_by_genre(&genre).await?;
    Ok(Json(DataResponse {
        data: DeletedCount { deleted },
    }))
}
