use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use serde::Deserialize;

use crate::{
    error::AppResult,
    middleware::AuthUser,
    models::{
        ListEntryRequest, ListKind, Message, NewUser, ProfileUpdate, UserDetail, UserProfile,
        UserSummary,
    },
    services::users::{self, UserIdentifier},
};

use super::{
    extract::{Json, Path, Query},
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(new_user): Json<NewUser>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let user = users::create_user(state.store.as_ref(), new_user).await?;
    Ok((StatusCode::CREATED, Json(UserProfile::private(&user))))
}

pub async fn me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<UserDetail>> {
    let detail = users::get_me(state.store.as_ref(), &state.enricher, auth.id).await?;
    Ok(Json(detail))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<UserSummary>>> {
    let found = users::search_users(state.store.as_ref(), params.q.as_deref()).await?;
    Ok(Json(found))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(identifier): Path<String>,
) -> AppResult<Json<UserDetail>> {
    let detail = users::get_profile(
        state.store.as_ref(),
        &state.enricher,
        auth.id,
        UserIdentifier::parse(&identifier),
    )
    .await?;
    Ok(Json(detail))
}

pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<UserProfile>> {
    let profile = users::update_me(state.store.as_ref(), auth.id, update).await?;
    Ok(Json(profile))
}

pub async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ListEntryRequest>,
) -> AppResult<Json<Message>> {
    users::add_to_list(state.store.as_ref(), ListKind::Watchlist, auth.id, body.movie_id).await?;
    Ok(Json(Message::new("Added to watchlist")))
}

pub async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Message>> {
    users::remove_from_list(state.store.as_ref(), ListKind::Watchlist, auth.id, movie_id).await?;
    Ok(Json(Message::new("Removed from watchlist")))
}

pub async fn add_to_favorites(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ListEntryRequest>,
) -> AppResult<Json<Message>> {
    users::add_to_list(state.store.as_ref(), ListKind::Favorites, auth.id, body.movie_id).await?;
    Ok(Json(Message::new("Added to favorites")))
}

pub async fn remove_from_favorites(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(movie_id): Path<i64>,
) -> AppResult<Json<Message>> {
    users::remove_from_list(state.store.as_ref(), ListKind::Favorites, auth.id, movie_id).await?;
    Ok(Json(Message::new("Removed from favorites")))
}
