//! TMDB API client
//!
//! Used for poster and rating lookups. Search results and movie details are
//! cached in Redis when a cache is configured.
use reqwest::{Client as HttpClient, StatusCode};

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{TmdbMovie, TmdbSearchResponse},
};

const DETAILS_CACHE_TTL: u64 = 3600; // 1 hour
const SEARCH_CACHE_TTL: u64 = 86400; // 1 day

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: Option<String>,
    api_url: String,
    image_base_url: String,
    cache: Option<Cache>,
}

impl TmdbClient {
    pub fn new(
        api_key: Option<String>,
        api_url: impl Into<String>,
        image_base_url: impl Into<String>,
        cache: Option<Cache>,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            image_base_url: image_base_url.into().trim_end_matches('/').to_string(),
            cache,
        }
    }

    /// A client without credentials; every lookup is skipped
    pub fn disabled() -> Self {
        Self::new(None, "", "", None)
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> AppResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| AppError::ExternalApi("TMDB API key is not configured".to_string()))
    }

    /// Absolute poster URL for a TMDB `poster_path`
    pub fn poster_url(&self, poster_path: &str) -> String {
        if poster_path.starts_with('/') {
            format!("{}{}", self.image_base_url, poster_path)
        } else {
            format!("{}/{}", self.image_base_url, poster_path)
        }
    }

    /// Searches movies by title, optionally restricted to a release year
    pub async fn search(&self, query: &str, year: Option<i32>) -> AppResult<Vec<TmdbMovie>> {
        let key = CacheKey::TmdbSearch {
            query: query.to_string(),
            year,
        };
        let response: TmdbSearchResponse = cached!(
            self.cache.as_ref(),
            key,
            SEARCH_CACHE_TTL,
            self.fetch_search(query, year)
        );
        Ok(response.results)
    }

    /// Fetches movie details, `None` when TMDB does not know the id
    pub async fn movie(&self, tmdb_id: i64) -> AppResult<Option<TmdbMovie>> {
        let details: Option<TmdbMovie> = cached!(
            self.cache.as_ref(),
            CacheKey::TmdbMovie(tmdb_id),
            DETAILS_CACHE_TTL,
            self.fetch_movie(tmdb_id)
        );
        Ok(details)
    }

    async fn fetch_search(&self, query: &str, year: Option<i32>) -> AppResult<TmdbSearchResponse> {
        let url = format!("{}/search/movie", self.api_url);

        let mut params: Vec<(&str, String)> = vec![
            ("api_key", self.api_key()?.to_string()),
            ("query", query.to_string()),
            ("include_adult", "false".to_string()),
        ];
        if let Some(year) = year {
            params.push(("year", year.to_string()));
        }

        tracing::debug!(query = %query, year = ?year, "Searching TMDB");

        let response = self.http_client.get(&url).query(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB search returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }

    async fn fetch_movie(&self, tmdb_id: i64) -> AppResult<Option<TmdbMovie>> {
        let url = format!("{}/movie/{}", self.api_url, tmdb_id);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key()?)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!(tmdb_id, "TMDB id not found");
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB details returned status {}: {}",
                status, body
            )));
        }

        Ok(Some(response.json().await?))
    }
}

/// First result that actually carries a poster
pub fn first_with_poster(results: &[TmdbMovie]) -> Option<&str> {
    results
        .iter()
        .find_map(|m| m.poster_path.as_deref().filter(|p| !p.is_empty()))
}

/// Formats a TMDB vote average the way clients display it ("7.5")
pub fn format_rating(vote_average: f64) -> String {
    format!("{:.1}", vote_average)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: i64, poster: Option<&str>) -> TmdbMovie {
        TmdbMovie {
            id,
            title: Some(format!("Movie {}", id)),
            poster_path: poster.map(str::to_string),
            vote_average: Some(7.0),
        }
    }

    #[test]
    fn test_first_with_poster_skips_missing_posters() {
        let results = vec![result(1, None), result(2, Some("")), result(3, Some("/p3.jpg"))];
        assert_eq!(first_with_poster(&results), Some("/p3.jpg"));
        assert_eq!(first_with_poster(&results[..2]), None);
    }

    #[test]
    fn test_poster_url_joins_paths() {
        let client = TmdbClient::new(
            Some("k".to_string()),
            "https://api.themoviedb.org/3",
            "https://image.tmdb.org/t/p/w500/",
            None,
        );
        assert_eq!(
            client.poster_url("/abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
        assert_eq!(
            client.poster_url("abc.jpg"),
            "https://image.tmdb.org/t/p/w500/abc.jpg"
        );
    }

    #[test]
    fn test_format_rating_one_decimal() {
        assert_eq!(format_rating(7.456), "7.5");
        assert_eq!(format_rating(8.0), "8.0");
        assert_eq!(format_rating(0.0), "0.0");
    }

    #[test]
    fn test_search_response_parses_partial_results() {
        let body = r#"{"page": 1, "results": [{"id": 949, "title": "Heat", "vote_average": 7.9, "poster_path": null}]}"#;
        let parsed: TmdbSearchResponse = serde_json::from_str(body).unwrap();

        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].id, 949);
        assert_eq!(parsed.results[0].poster_path, None);
    }

    #[tokio::test]
    async fn test_disabled_client_refuses_lookups() {
        let client = TmdbClient::disabled();
        assert!(!client.is_enabled());

        let err = client.search("Heat", Some(1995)).await.unwrap_err();
        assert!(matches!(err, AppError::ExternalApi(_)));
    }
}
