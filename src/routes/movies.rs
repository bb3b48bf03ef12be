use std::sync::Arc;

use axum::extract::State;

use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{MovieListQuery, MoviePage, MovieView, RateRequest, RatingSaved},
    services::catalog,
};

use super::{
    extract::{Json, Path, Query},
    AppState,
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MovieListQuery>,
) -> AppResult<Json<MoviePage>> {
    let page = catalog::list_movies(
        state.store.as_ref(),
        &state.enricher,
        &query,
        state.settings.movies_page_size,
    )
    .await?;
    Ok(Json(page))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> AppResult<Json<MovieView>> {
    let movie = catalog::get_movie(state.store.as_ref(), &state.enricher, id).await?;
    Ok(Json(movie))
}

pub async fn rate(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(request): Json<RateRequest>,
) -> AppResult<Json<RatingSaved>> {
    let rating = catalog::rate_movie(state.store.as_ref(), auth.id, id, request).await?;
    Ok(Json(RatingSaved {
        message: "Rating saved",
        rating,
    }))
}
