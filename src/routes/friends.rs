use std::sync::Arc;

use axum::extract::State;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{FriendRequest, FriendSummary, Message, PendingRequest},
    services::friends,
};

use super::{
    extract::{Json, Path},
    AppState,
};

pub async fn list(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<Vec<FriendSummary>>> {
    let friends = friends::list_friends(state.store.as_ref(), auth.id).await?;
    Ok(Json(friends))
}

pub async fn requests(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<Vec<PendingRequest>>> {
    let pending = friends::pending_requests(state.store.as_ref(), auth.id).await?;
    Ok(Json(pending))
}

pub async fn send_request(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<FriendRequest>,
) -> AppResult<Json<Message>> {
    friends::send_request(state.store.as_ref(), auth.id, body.addressee_id).await?;
    Ok(Json(Message::new("Friend request sent")))
}

pub async fn accept(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Message>> {
    friends::accept_request(state.store.as_ref(), auth.id, id).await?;
    Ok(Json(Message::new("Friend request accepted")))
}

/// Takes the id as a string so a non-numeric id gets a specific 400
pub async fn remove(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(friend_id): Path<String>,
) -> AppResult<Json<Message>> {
    let friend_id: i64 = friend_id
        .parse()
        .map_err(|_| AppError::InvalidInput("Invalid friend ID".to_string()))?;

    friends::remove_friend(state.store.as_ref(), auth.id, friend_id).await?;
    Ok(Json(Message::new("Friend removed")))
}
