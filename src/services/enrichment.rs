//! Movie enrichment: poster fallback chain and dynamic external rating
//!
//! Every movie shown to a client passes through a [`MovieEnricher`]. Posters
//! that are missing or unusable are looked up through an ordered chain of
//! [`PosterSource`]s and persisted once found. The external rating is looked
//! up on every request and never stored, but a discovered TMDB id is.
use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{Movie, MovieView},
    services::tmdb::{first_with_poster, format_rating, TmdbClient},
};

/// One step of the poster fallback chain
#[async_trait::async_trait]
pub trait PosterSource: Send + Sync {
    /// Looks up a poster URL for a cleaned title
    async fn find_poster(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Poster lookup via TMDB search
///
/// Searches with the release year first; when that finds nothing at all the
/// year is dropped, since catalog years are occasionally off by one.
pub struct TmdbPosterSource {
    client: Arc<TmdbClient>,
}

impl TmdbPosterSource {
    pub fn new(client: Arc<TmdbClient>) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl PosterSource for TmdbPosterSource {
    async fn find_poster(&self, title: &str, year: Option<i32>) -> AppResult<Option<String>> {
        let mut results = self.client.search(title, year).await?;

        if results.is_empty() && year.is_some() {
            tracing::debug!(title = %title, year = ?year, "No TMDB results with year, retrying without");
            results = self.client.search(title, None).await?;
        }

        Ok(first_with_poster(&results).map(|path| self.client.poster_url(path)))
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// Attaches posters and external ratings to catalog movies
#[async_trait::async_trait]
pub trait MovieEnricher: Send + Sync {
    async fn enrich(&self, movie: Movie) -> MovieView;
}

/// Enricher backed by TMDB lookups that persists discoveries to the store
pub struct TmdbEnricher {
    store: Arc<dyn Store>,
    client: Arc<TmdbClient>,
    poster_chain: Vec<Box<dyn PosterSource>>,
}

impl TmdbEnricher {
    /// Builds the enricher with the default poster chain
    pub fn new(store: Arc<dyn Store>, client: Arc<TmdbClient>) -> Self {
        let mut poster_chain: Vec<Box<dyn PosterSource>> = Vec::new();
        if client.is_enabled() {
            poster_chain.push(Box::new(TmdbPosterSource::new(client.clone())));
        }
        Self::with_poster_chain(store, client, poster_chain)
    }

    pub fn with_poster_chain(
        store: Arc<dyn Store>,
        client: Arc<TmdbClient>,
        poster_chain: Vec<Box<dyn PosterSource>>,
    ) -> Self {
        Self {
            store,
            client,
            poster_chain,
        }
    }

    /// Fills in `poster_url` when the stored one is unusable
    async fn ensure_poster(&self, movie: &mut Movie) {
        if movie.has_usable_poster() {
            return;
        }

        tracing::debug!(movie_id = movie.id, title = %movie.title, "Fetching poster");

        for source in &self.poster_chain {
            match source.find_poster(movie.search_title(), movie.year).await {
                Ok(Some(poster_url)) => {
                    tracing::info!(
                        movie_id = movie.id,
                        source = source.name(),
                        poster_url = %poster_url,
                        "Found poster"
                    );
                    if let Err(e) = self.store.set_poster_url(movie.id, &poster_url).await {
                        tracing::warn!(movie_id = movie.id, error = %e, "Failed to persist poster");
                    }
                    movie.poster_url = Some(poster_url);
                    return;
                }
                Ok(None) => {
                    tracing::debug!(movie_id = movie.id, source = source.name(), "No poster from source");
                }
                Err(e) => {
                    tracing::warn!(
                        movie_id = movie.id,
                        source = source.name(),
                        error = %e,
                        "Poster lookup failed"
                    );
                }
            }
        }

        tracing::debug!(movie_id = movie.id, title = %movie.title, "Could not find poster");
    }

    /// Looks up the current vote average, learning the TMDB id on the way
    async fn lookup_rating(&self, movie: &mut Movie) -> AppResult<Option<f64>> {
        let mut rating = None;

        if let Some(tmdb_id) = movie.tmdb_id {
            match self.client.movie(tmdb_id).await {
                Ok(Some(details)) => rating = details.vote_average,
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(movie_id = movie.id, tmdb_id, error = %e, "TMDB details lookup failed");
                }
            }
        }

        // A zero average means "no votes"; search may find a better match
        if rating.map_or(true, |r| r == 0.0) {
            let results = self.client.search(movie.search_title(), movie.year).await?;

            if let Some(best) = results.first() {
                rating = best.vote_average;

                if movie.tmdb_id != Some(best.id) {
                    match self.store.set_tmdb_id(movie.id, best.id).await {
                        Ok(()) => movie.tmdb_id = Some(best.id),
                        Err(e) => tracing::warn!(
                            movie_id = movie.id,
                            tmdb_id = best.id,
                            error = %e,
                            "Failed to persist TMDB id"
                        ),
                    }
                }
            }
        }

        Ok(rating)
    }

    async fn rating(&self, movie: &mut Movie) -> Option<String> {
        if !self.client.is_enabled() {
            tracing::debug!(movie_id = movie.id, "TMDB API key missing, skipping rating");
            return None;
        }

        match self.lookup_rating(movie).await {
            Ok(rating) => rating.map(format_rating),
            Err(e) => {
                tracing::warn!(movie_id = movie.id, title = %movie.title, error = %e, "Error fetching TMDB rating");
                None
            }
        }
    }
}

#[async_trait::async_trait]
impl MovieEnricher for TmdbEnricher {
    async fn enrich(&self, mut movie: Movie) -> MovieView {
        self.ensure_poster(&mut movie).await;
        let tmdb_rating = self.rating(&mut movie).await;

        MovieView { movie, tmdb_rating }
    }
}

/// Enriches movies concurrently, preserving input order
///
/// A task that panics yields the movie unenriched rather than dropping it.
pub async fn enrich_movies(enricher: &Arc<dyn MovieEnricher>, movies: Vec<Movie>) -> Vec<MovieView> {
    let mut tasks = Vec::with_capacity(movies.len());

    for movie in movies {
        let enricher = enricher.clone();
        let fallback = movie.clone();
        let task = tokio::spawn(async move { enricher.enrich(movie).await });
        tasks.push((task, fallback));
    }

    let mut views = Vec::with_capacity(tasks.len());
    for (task, fallback) in tasks {
        match task.await {
            Ok(view) => views.push(view),
            Err(e) => {
                tracing::error!(movie_id = fallback.id, error = %e, "Enrichment task failed");
                views.push(MovieView {
                    movie: fallback,
                    tmdb_rating: None,
                });
            }
        }
    }

    views
}
