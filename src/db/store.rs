use crate::{
    error::AppResult,
    models::{
        FriendSummary, Friendship, FriendshipStatus, ListKind, Movie, NewMovie, NewUser,
        ProfileUpdate, Rating, User, UserSummary,
    },
};

/// Persistence boundary for users, movies, ratings, lists and friendships
///
/// Route handlers and services only talk to this trait. `PgStore` backs
/// production; `MemoryStore` backs tests.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Inserts a user, failing with `Conflict` on a taken username or email
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user(&self, id: i64) -> AppResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Case-insensitive substring search over usernames
    async fn search_users(&self, query: &str, limit: i64) -> AppResult<Vec<UserSummary>>;

    async fn friend_summaries(&self, ids: &[i64]) -> AppResult<Vec<FriendSummary>>;

    /// Applies the non-empty fields of `update`, returning the stored user
    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<Option<User>>;

    // Movies

    /// One page of the catalog ordered by year (newest first) plus the total match count
    async fn list_movies(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Movie>, i64)>;

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>>;

    /// Exact title matches, in catalog order
    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>>;

    /// Bulk catalog insert, skipping rows whose TMDB id is already stored
    ///
    /// Returns how many rows were actually inserted.
    async fn insert_movies(&self, movies: &[NewMovie]) -> AppResult<u64>;

    async fn set_poster_url(&self, movie_id: i64, poster_url: &str) -> AppResult<()>;

    async fn set_tmdb_id(&self, movie_id: i64, tmdb_id: i64) -> AppResult<()>;

    // Watchlist / favorites

    /// Adds a movie to a user list, a no-op when already present
    async fn add_to_list(&self, kind: ListKind, user_id: i64, movie_id: i64) -> AppResult<()>;

    async fn remove_from_list(&self, kind: ListKind, user_id: i64, movie_id: i64)
        -> AppResult<()>;

    async fn list_entries(&self, kind: ListKind, user_id: i64) -> AppResult<Vec<Movie>>;

    // Ratings

    /// Inserts or overwrites the user's score for a movie
    async fn upsert_rating(&self, user_id: i64, movie_id: i64, score: i32) -> AppResult<Rating>;

    async fn ratings_with_movies(&self, user_id: i64) -> AppResult<Vec<(Rating, Movie)>>;

    // Friendships

    async fn create_friendship(&self, requester_id: i64, addressee_id: i64)
        -> AppResult<Friendship>;

    async fn find_friendship(&self, id: i64) -> AppResult<Option<Friendship>>;

    /// Row linking two users in either direction, optionally restricted to a status
    async fn friendship_between(
        &self,
        a: i64,
        b: i64,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Option<Friendship>>;

    async fn set_friendship_status(&self, id: i64, status: FriendshipStatus) -> AppResult<()>;

    async fn delete_friendship(&self, id: i64) -> AppResult<()>;

    /// Friendships with the given status where the user is on either side
    async fn friendships_of(
        &self,
        user_id: i64,
        status: FriendshipStatus,
    ) -> AppResult<Vec<Friendship>>;

    /// Pending friendships addressed to the user
    async fn pending_requests_for(&self, addressee_id: i64) -> AppResult<Vec<Friendship>>;
}
