use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{FriendSummary, Friendship, FriendshipStatus, PendingRequest},
};

/// Accepted friends of a user
pub async fn list_friends(store: &dyn Store, user_id: i64) -> AppResult<Vec<FriendSummary>> {
    let friend_ids: Vec<i64> = store
        .friendships_of(user_id, FriendshipStatus::Accepted)
        .await?
        .iter()
        .map(|f| f.other_party(user_id))
        .collect();

    store.friend_summaries(&friend_ids).await
}

/// Pending requests addressed to the user, with requester details
pub async fn pending_requests(store: &dyn Store, user_id: i64) -> AppResult<Vec<PendingRequest>> {
    let requests = store.pending_requests_for(user_id).await?;

    let requester_ids: Vec<i64> = requests.iter().map(|f| f.requester_id).collect();
    let requesters = store.friend_summaries(&requester_ids).await?;

    Ok(requests
        .into_iter()
        .map(|friendship| {
            let requester = requesters
                .iter()
                .find(|u| u.id == friendship.requester_id)
                .cloned();
            PendingRequest {
                friendship,
                requester,
            }
        })
        .collect())
}

/// Opens a pending request from `requester_id` to `addressee_id`
pub async fn send_request(
    store: &dyn Store,
    requester_id: i64,
    addressee_id: i64,
) -> AppResult<Friendship> {
    if requester_id == addressee_id {
        return Err(AppError::InvalidInput("Cannot add yourself".to_string()));
    }

    if store.find_user(addressee_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    // Any existing row blocks a new request, including blocked and pending ones
    if store
        .friendship_between(requester_id, addressee_id, None)
        .await?
        .is_some()
    {
        return Err(AppError::InvalidInput(
            "Friendship or request already exists".to_string(),
        ));
    }

    let friendship = store.create_friendship(requester_id, addressee_id).await?;
    tracing::info!(
        friendship_id = friendship.id,
        requester_id,
        addressee_id,
        "Friend request sent"
    );
    Ok(friendship)
}

/// Accepts a request; only its addressee may do so
pub async fn accept_request(store: &dyn Store, user_id: i64, friendship_id: i64) -> AppResult<()> {
    let friendship = store
        .find_friendship(friendship_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Not found".to_string()))?;

    if friendship.addressee_id != user_id {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    store
        .set_friendship_status(friendship.id, FriendshipStatus::Accepted)
        .await?;
    tracing::info!(friendship_id, user_id, "Friend request accepted");
    Ok(())
}

/// Ends an accepted friendship from either side
pub async fn remove_friend(store: &dyn Store, user_id: i64, friend_id: i64) -> AppResult<()> {
    let friendship = store
        .friendship_between(user_id, friend_id, Some(FriendshipStatus::Accepted))
        .await?
        .ok_or_else(|| {
            tracing::debug!(user_id, friend_id, "Friendship to remove not found");
            AppError::NotFound("Friendship not found".to_string())
        })?;

    store.delete_friendship(friendship.id).await?;
    tracing::info!(friendship_id = friendship.id, user_id, friend_id, "Friend removed");
    Ok(())
}
