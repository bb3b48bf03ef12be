use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        FriendSummary, Friendship, FriendshipRow, FriendshipStatus, ListKind, Movie, NewMovie,
        NewUser, ProfileUpdate, Rating, User, UserSummary,
    },
};

const MOVIE_COLUMNS: &str =
    "id, tmdb_id, title, year, genres, actors, director, poster_url, imdb_url, description";

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, profile_picture, \
                            imdb_profile_url, created_at, updated_at";

const FRIENDSHIP_COLUMNS: &str = "id, requester_id, addressee_id, status, created_at, updated_at";

/// Creates a PostgreSQL connection pool
///
/// Establishes a pool of database connections for efficient reuse.
/// The pool automatically manages connection lifecycle and limits.
pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Escapes LIKE wildcards so user input is matched literally
fn like_pattern(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len() + 2);
    escaped.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn map_unique_violation(err: sqlx::Error, what: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("{} already exists", what))
        }
        _ => AppError::Database(err),
    }
}

fn into_friendship(row: FriendshipRow) -> AppResult<Friendship> {
    Friendship::try_from(row).map_err(AppError::Internal)
}

/// Rating joined with its movie
#[derive(sqlx::FromRow)]
struct RatedMovieRow {
    id: i64,
    user_id: i64,
    movie_id: i64,
    score: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    m_tmdb_id: Option<i64>,
    m_title: String,
    m_year: Option<i32>,
    m_genres: Option<String>,
    m_actors: Option<String>,
    m_director: Option<String>,
    m_poster_url: Option<String>,
    m_imdb_url: Option<String>,
    m_description: Option<String>,
}

impl RatedMovieRow {
    fn split(self) -> (Rating, Movie) {
        let movie = Movie {
            id: self.movie_id,
            tmdb_id: self.m_tmdb_id,
            title: self.m_title,
            year: self.m_year,
            genres: self.m_genres,
            actors: self.m_actors,
            director: self.m_director,
            poster_url: self.m_poster_url,
            imdb_url: self.m_imdb_url,
            description: self.m_description,
        };
        let rating = Rating {
            id: self.id,
            user_id: self.user_id,
            movie_id: self.movie_id,
            score: self.score,
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        (rating, movie)
    }
}

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (username, email, first_name, last_name) \
             VALUES ($1, $2, $3, $4) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&sql)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Username or email"))
    }

    async fn find_user(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn search_users(&self, query: &str, limit: i64) -> AppResult<Vec<UserSummary>> {
        Ok(sqlx::query_as::<_, UserSummary>(
            "SELECT id, username FROM users WHERE username ILIKE $1 ORDER BY username LIMIT $2",
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn friend_summaries(&self, ids: &[i64]) -> AppResult<Vec<FriendSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Ok(sqlx::query_as::<_, FriendSummary>(
            "SELECT id, username, profile_picture FROM users WHERE id = ANY($1) ORDER BY id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_profile(&self, id: i64, update: ProfileUpdate) -> AppResult<Option<User>> {
        let update = update.normalized();
        let sql = format!(
            "UPDATE users SET \
                first_name = COALESCE($2, first_name), \
                last_name = COALESCE($3, last_name), \
                profile_picture = COALESCE($4, profile_picture), \
                imdb_profile_url = COALESCE($5, imdb_profile_url), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .bind(&update.profile_picture)
            .bind(&update.imdb_profile_url)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_movies(
        &self,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> AppResult<(Vec<Movie>, i64)> {
        let filter = "($1::TEXT IS NULL OR title ILIKE $1 OR actors ILIKE $1 OR director ILIKE $1)";
        let pattern = search.map(like_pattern);

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM movies WHERE {}", filter))
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM movies WHERE {} ORDER BY year DESC NULLS LAST, id LIMIT $2 OFFSET $3",
            MOVIE_COLUMNS, filter
        );
        let movies = sqlx::query_as::<_, Movie>(&sql)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((movies, total))
    }

    async fn find_movie(&self, id: i64) -> AppResult<Option<Movie>> {
        let sql = format!("SELECT {} FROM movies WHERE id = $1", MOVIE_COLUMNS);
        Ok(sqlx::query_as::<_, Movie>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn movies_by_titles(&self, titles: &[String]) -> AppResult<Vec<Movie>> {
        if titles.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT {} FROM movies WHERE title = ANY($1) ORDER BY id",
            MOVIE_COLUMNS
        );
        Ok(sqlx::query_as::<_, Movie>(&sql)
            .bind(titles)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_movies(&self, movies: &[NewMovie]) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for movie in movies {
            let result = sqlx::query(
                "INSERT INTO movies \
                 (tmdb_id, title, year, genres, actors, director, poster_url, imdb_url, description) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
                 ON CONFLICT (tmdb_id) DO NOTHING",
            )
            .bind(movie.tmdb_id)
            .bind(&movie.title)
            .bind(movie.year)
            .bind(&movie.genres)
            .bind(&movie.actors)
            .bind(&movie.director)
            .bind(&movie.poster_url)
            .bind(&movie.imdb_url)
            .bind(&movie.description)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn set_poster_url(&self, movie_id: i64, poster_url: &str) -> AppResult<()> {
        sqlx::query("UPDATE movies SET poster_url = $2 WHERE id = $1")
            .bind(movie_id)
            .bind(poster_url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_tmdb_id(&self, movie_id: i64, tmdb_id: i64) -> AppResult<()> {
        sqlx::query("UPDATE movies SET tmdb_id = $2 WHERE id = $1")
            .bind(movie_id)
            .bind(tmdb_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "TMDB id"))?;
        Ok(())
    }

    async fn add_to_list(&self, kind: ListKind, user_id: i64, movie_id: i64) -> AppResult<()> {
        let sql = format!(
            "INSERT INTO {} (user_id, movie_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn remove_from_list(
        &self,
        kind: ListKind,
        user_id: i64,
        movie_id: i64,
    ) -> AppResult<()> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = $1 AND movie_id = $2",
            kind.table()
        );
        sqlx::query(&sql)
            .bind(user_id)
            .bind(movie_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_entries(&self, kind: ListKind, user_id: i64) -> AppResult<Vec<Movie>> {
        let sql = format!(
            "SELECT m.id, m.tmdb_id, m.title, m.year, m.genres, m.actors, m.director, \
                    m.poster_url, m.imdb_url, m.description \
             FROM movies m JOIN {} l ON l.movie_id = m.id \
             WHERE l.user_id = $1 ORDER BY l.created_at, m.id",
            kind.table()
        );
        Ok(sqlx::query_as::<_, Movie>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn upsert_rating(&self, user_id: i64, movie_id: i64, score: i32) -> AppResult<Rating> {
        Ok(sqlx::query_as::<_, Rating>(
            "INSERT INTO ratings (user_id, movie_id, score) VALUES ($1, $2, $3) \
             ON CONFLICT (user_id, movie_id) \
             DO UPDATE SET score = EXCLUDED.score, updated_at = now() \
             RETURNING id, user_id, movie_id, score, created_at, updated_at",
        )
        .bind(user_id)
        .bind(movie_id)
        .bind(score)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn ratings_with_movies(&self, user_id: i64) -> AppResult<Vec<(Rating, Movie)>> {
        let rows = sqlx::query_as::<_, RatedMovieRow>(
            "SELECT r.id, r.user_id, r.movie_id, r.score, r.created_at, r.updated_at, \
                    m.tmdb_id AS m_tmdb_id, m.title AS m_title, m.year AS m_year, \
                    m.genres AS m_genres, m.actors AS m_actors, m.director AS m_director, \
                    m.poster_url AS m_poster_url, m.imdb_url AS m_imdb_url, \
                    m.description AS m_description \
             FROM ratings r JOIN movies m ON m.id = r.movie_id \
             WHERE r.user_id = $1 ORDER BY r.updated_at DESC, r.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(RatedMovieRow::split).collect())
    }

    async fn create_friendship(
        &self,
        requester_id: i64,
        addressee_id: i64,
    ) -> AppResult<Friendship> {
        let sql = format!(
            "INSERT INTO friendships (requester_id, addressee_id, status) \
             VALUES ($1, $2, $3) RETURNING {}",
            FRIENDSHIP_COLUMNS
        );
        let row = sqlx::query_as::<_, FriendshipRow>(&sql)
            .bind(requester_id)
            .bind(addressee_id)
            .bind(FriendshipStatus::Pending.as_str())
            .fetch_one(&self.pool)
            .await?;

        into_friendship(row)
    }

    async fn find_friendship(&self, id: i64) -> AppResult<Option<Friendship>> {
        let sql = format!("SELECT {} FROM friendships WHERE id = $1", FRIENDSHIP_COLUMNS);
        sqlx::query_as::<_, FriendshipRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(into_friendship)
            .transpose()
    }

    async fn friendship_between(
        &self,
        a: i64,
        b: i64,
        status: Option<FriendshipStatus>,
    ) -> AppResult<Option<Friendship>> {
        let sql = format!(
            "SELECT {} FROM friendships \
             WHERE ((requester_id = $1 AND addressee_id = $2) \
                 OR (requester_id = $2 AND addressee_id = $1)) \
               AND ($3::TEXT IS NULL OR status = $3) \
             ORDER BY id LIMIT 1",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, FriendshipRow>(&sql)
            .bind(a)
            .bind(b)
            .bind(status.map(|s| s.as_str()))
            .fetch_optional(&self.pool)
            .await?
            .map(into_friendship)
            .transpose()
    }

    async fn set_friendship_status(&self, id: i64, status: FriendshipStatus) -> AppResult<()> {
        sqlx::query("UPDATE friendships SET status = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_friendship(&self, id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM friendships WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn friendships_of(
        &self,
        user_id: i64,
        status: FriendshipStatus,
    ) -> AppResult<Vec<Friendship>> {
        let sql = format!(
            "SELECT {} FROM friendships \
             WHERE status = $2 AND (requester_id = $1 OR addressee_id = $1) ORDER BY id",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, FriendshipRow>(&sql)
            .bind(user_id)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(into_friendship)
            .collect()
    }

    async fn pending_requests_for(&self, addressee_id: i64) -> AppResult<Vec<Friendship>> {
        let sql = format!(
            "SELECT {} FROM friendships WHERE addressee_id = $1 AND status = $2 ORDER BY id",
            FRIENDSHIP_COLUMNS
        );
        sqlx::query_as::<_, FriendshipRow>(&sql)
            .bind(addressee_id)
            .bind(FriendshipStatus::Pending.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(into_friendship)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_query() {
        assert_eq!(like_pattern("heat"), "%heat%");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\"), "%c:\\\\%");
    }
}
