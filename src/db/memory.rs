use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        movie::matches_search, FriendSummary, Friendship, FriendshipStatus, ListKind, Movie,
        NewMovie, NewUser, ProfileUpdate, Rating, User, UserSummary,
    },
};

/// In-memory store
///
/// Mirrors the PostgreSQL semantics closely enough for service and route tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    users: BTreeMap<i64, User>,
    movies: BTreeMap<i64, Movie>,
    ratings: BTreeMap<i64, Rating>,
    friendships: BTreeMap<i64, Friendship>,
    lists: HashMap<(ListKind, i64), Vec<i64>>,
}

impl MemoryInner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a catalog movie
    pub async fn insert_movie(&self, movie: NewMovie) -> Movie {
        let mut inner = self.inner.write().await;
        let id = inner.allocate_id();
        let movie = movie.into_movie(id);
        inner.movies.insert(id, movie.clone());
        movie
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .users
            .values()
            .any(|u| u.username == user.username || u.email == user.email);
        if taken {
            return Err(AppError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let id = inner.allocate_id();
        let now = Utc::now();
        let user = User {
            id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            profile_picture: None,
            imdb_profile_url: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn search_users(&self, query: &str, limit: i64) -> AppResult<Vec<UserSummary>> {
        let needle = query.to_lowercase();
        let inner = self.inner.read().await;

        let mut found: Vec<UserSummary> = inner
            .users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(|u| UserSummary {
                id: u.id,
                username: u.username.clone(),
            })
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit.max(0) as usize);
        Ok(found)
    }

    async fn friend_summaries(&self, ids: &[i64]) -> AppResult<Vec<FriendSummary>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter(|u| ids.contains(&u.id))
            .map(FriendSummary::from)
            .collect())
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<Option<User>> {
        let update = update.normalized();
        let mut inner = self.inner.write().await;

        Ok(inner.users.get_mut(&id).map(|user| {
            update.apply_to(user);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn list_movies(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Movie>, i64)> {
        let inner = self.inner.read().await;

        let mut matching: Vec<&Movie> = inner
            .movies
            .values()
            .filter(|m| search.map(|s| matches_search(m, s)).unwrap_or(true))
            .collect();
        // Newest first, undated last
        matching.sort_by(|a, b| match (a.year, b.year) {
            (Some(x), Some(y)) => y.cmp(&x).then(a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });

        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        Ok(self.inner.read().await.movies.get(&id).cloned())
    }

    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner
            .movies
            .values()
            .filter(|m| titles.contains(&m.title))
            .cloned()
            .collect())
    }

    async fn set_poster_url(&self, movie_id: i64, poster_url: &str) -> AppResult<()> {
        if let Some(movie) = self.inner.write().await.movies.get_mut(&movie_id) {
            movie.poster_url = Some(poster_url.to_string());
        }
        Ok(())
    }

    async fn insert_movies(&self, movies: &[NewMovie]) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        let mut inserted = 0;

        for movie in movies {
            let duplicate = movie.tmdb_id.is_some()
                && inner.movies.values().any(|m| m.tmdb_id == movie.tmdb_id);
            if duplicate {
                continue;
            }

            let id = inner.allocate_id();
            inner.movies.insert(id, movie.clone().into_movie(id));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn set_tmdb_id(&self, movie_id: i64, tmdb_id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;

        let taken = inner
            .movies
            .values()
            .any(|m| m.id != movie_id && m.tmdb_id == Some(tmdb_id));
        if taken {
            return Err(AppError::Conflict("TMDB id already exists".to_string()));
        }

        if let Some(movie) = inner.movies.get_mut(&movie_id) {
            movie.tmdb_id = Some(tmdb_id);
        }
        Ok(())
    }

    async fn add_to_list(&self, kind: ListKind, user_id: i64, movie_id: i64) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        let entries = inner.lists.entry((kind, user_id)).or_default();
        if !entries.contains(&movie_id) {
            entries.push(movie_id);
        }
        Ok(())
    }

    async fn remove_from_list(
        &self,
        kind: ListKind,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(entries) = inner.lists.get_mut(&(kind, user_id)) {
            entries.retain(|id| *id != movie_id);
        }
        Ok(())
    }

    async fn list_entries(&self, kind: ListKind, user_id: i64) -> AppResult<Vec<Movie>> {
        let inner = self.inner.read().await;
        Ok(inner
            .lists
            .get(&(kind, user_id))
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| inner.movies.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_rating(&self, user_id: i64, movie_id: i64, score: i32) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();

        if let Some(existing) = inner
            .ratings
            .values_mut()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id)
        {
            existing.score = score;
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let id = inner.allocate_id();
        let rating = Rating {
            id,
            user_id,
            movie_id,
            score,
            created_at: now,
            updated_at: now,
        };
        inner.ratings.insert(id, rating.clone());
        Ok(rating)
    }

    async fn ratings_with_movies(&self, user_id: i64) -> AppResult<Vec<(Rating, Movie)>> {
        let inner = self.inner.read().await;
        let mut rated: Vec<(Rating, Movie)> = inner
            .ratings
            .values()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                inner
                    .movies
                    .get(&r.movie_id)
                    .map(|m| (r.clone(), m.clone()))
            })
            .collect();
        rated.sort_by(|(a, _), (b, _)| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
        Ok(rated)
    }

    async fn create_friendship(
        &self,
        requester_id: i64,
        addressee_id: i64,
    ) -> AppResult<Friendship> {
        let mut inner = self.inner.write().await;
        let id = inner.allocate_id();
        let now = Utc::now();
        let friendship = Friendship {
            id,
            requester_id,
            addressee_id,
            status: FriendshipStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        inner.friendships.insert(id, friendship.clone());
        Ok(friendship)
    }

    async fn find_friendship(&self, id: i64) -> AppResult<Option<Friendship>> {
        Ok(self.inner.read().await.friendships.get(&id).cloned())
    }

    async fn friendship_between(
        &self,
        a: i64,
        b: i64,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Option<Friendship>> {
        let inner = self.inner.read().await;
        Ok(inner
            .friendships
            .values()
            .find(|f| f.connects(a, b) && status.map(|s| f.status == s).unwrap_or(true))
            .cloned())
    }

    async fn set_friendship_status(&self, id: i64, status: FriendshipStatus) -> AppResult<()> {
        if let Some(friendship) = self.inner.write().await.friendships.get_mut(&id) {
            friendship.status = status;
            friendship.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn delete_friendship(&self, id: i64) -> AppResult<()> {
        self.inner.write().await.friendships.remove(&id);
        Ok(())
    }

    async fn friendships_of(
        &self,
        user_id: i64,
        status: FriendshipStatus,
    ) -> AppResult<Vec<Friendship>> {
        let inner = self.inner.read().await;
        Ok(inner
            .friendships
            .values()
            .filter(|f| {
                f.status == status && (f.requester_id == user_id || f.addressee_id == user_id)
            })
            .cloned()
            .collect())
    }

    async fn pending_requests_for(&self, addressee_id: i64) -> AppResult<Vec<Friendship>> {
        let inner = self.inner.read().await;
        Ok(inner
            .friendships
            .values()
            .filter(|f| f.addressee_id == addressee_id && f.status == FriendshipStatus::Pending)
            .cloned()
            .collect())
    }
}
