use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        FriendshipStatus, ListKind, NewUser, ProfileUpdate, RatingView, User, UserDetail,
        UserLists, UserProfile, UserSummary,
    },
    services::{enrichment::enrich_movies, MovieEnricher},
};

const USER_SEARCH_LIMIT: i64 = 10;

/// How a profile lookup identifies its target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIdentifier {
    Id(i64),
    Username(String),
}

impl UserIdentifier {
    /// All-digit identifiers are ids, anything else is a username
    pub fn parse(raw: &str) -> Self {
        if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_digit()) {
            if let Ok(id) = raw.parse() {
                return UserIdentifier::Id(id);
            }
        }
        UserIdentifier::Username(raw.to_string())
    }
}

/// Creates a profile after basic validation
pub async fn create_user(store: &dyn Store, mut new_user: NewUser) -> AppResult<User> {
    new_user.username = new_user.username.trim().to_string();
    new_user.email = new_user.email.trim().to_string();

    if new_user.username.is_empty() {
        return Err(AppError::InvalidInput("Username is required".to_string()));
    }
    if !new_user.email.contains('@') {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }

    let user = store.create_user(new_user).await?;
    tracing::info!(user_id = user.id, username = %user.username, "User profile created");
    Ok(user)
}

/// Loads and enriches a user's watchlist, favorites and ratings
async fn load_lists(
    store: &dyn Store,
    enricher: &Arc<dyn MovieEnricher>,
    user_id: i64,
) -> AppResult<UserLists> {
    let watchlist = store.list_entries(ListKind::Watchlist, user_id).await?;
    let favorites = store.list_entries(ListKind::Favorites, user_id).await?;
    let rated = store.ratings_with_movies(user_id).await?;

    let (ratings, rated_movies): (Vec<_>, Vec<_>) = rated.into_iter().unzip();

    let (watchlist, favorites, rated_movies) = tokio::join!(
        enrich_movies(enricher, watchlist),
        enrich_movies(enricher, favorites),
        enrich_movies(enricher, rated_movies),
    );

    let ratings = ratings
        .into_iter()
        .zip(rated_movies)
        .map(|(rating, movie)| RatingView { rating, movie })
        .collect();

    Ok(UserLists {
        watchlist,
        favorites,
        ratings,
    })
}

/// The caller's own profile with email and all lists
pub async fn get_me(
    store: &dyn Store,
    enricher: &Arc<dyn MovieEnricher>,
    user_id: i64,
) -> AppResult<UserDetail> {
    let user = store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let lists = load_lists(store, enricher, user.id).await?;

    Ok(UserDetail {
        profile: UserProfile::private(&user),
        lists: Some(lists),
        is_friend: None,
    })
}

/// Another user's profile as seen by `viewer_id`
///
/// Lists are only visible to the user themselves and accepted friends.
pub async fn get_profile(
    store: &dyn Store,
    enricher: &Arc<dyn MovieEnricher>,
    viewer_id: i64,
    identifier: UserIdentifier,
) -> AppResult<UserDetail> {
    let target = match identifier {
        UserIdentifier::Id(id) => store.find_user(id).await?,
        UserIdentifier::Username(name) => store.find_user_by_username(&name).await?,
    }
    .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let is_friend = viewer_id == target.id
        || store
            .friendship_between(viewer_id, target.id, Some(FriendshipStatus::Accepted))
            .await?
            .is_some();

    let lists = if is_friend {
        Some(load_lists(store, enricher, target.id).await?)
    } else {
        None
    };

    Ok(UserDetail {
        profile: UserProfile::public(&target),
        lists,
        is_friend: Some(is_friend),
    })
}

pub async fn search_users(store: &dyn Store, query: Option<&str>) -> AppResult<Vec<UserSummary>> {
    match query.map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => store.search_users(q, USER_SEARCH_LIMIT).await,
        None => Ok(Vec::new()),
    }
}

pub async fn update_me(
    store: &dyn Store,
    user_id: i64,
    update: ProfileUpdate,
) -> AppResult<UserProfile> {
    let user = store
        .update_profile(user_id, update)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(UserProfile::private(&user))
}

/// Adds a catalog movie to one of the caller's lists
pub async fn add_to_list(
    store: &dyn Store,
    kind: ListKind,
    user_id: i64,
    movie_id: i64,
) -> AppResult<()> {
    ensure_movie_exists(store, movie_id).await?;
    store.add_to_list(kind, user_id, movie_id).await?;
    tracing::debug!(user_id, movie_id, list = %kind, "Added to list");
    Ok(())
}

pub async fn remove_from_list(
    store: &dyn Store,
    kind: ListKind,
    user_id: i64,
    movie_id: i64,
) -> AppResult<()> {
    ensure_movie_exists(store, movie_id).await?;
    store.remove_from_list(kind, user_id, movie_id).await?;
    tracing::debug!(user_id, movie_id, list = %kind, "Removed from list");
    Ok(())
}

async fn ensure_movie_exists(store: &dyn Store, movie_id: i64) -> AppResult<()> {
    match store.find_movie(movie_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("Movie not found".to_string())),
    }
}
