use std::sync::Arc;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{MovieListQuery, MoviePage, MovieView, RateRequest, Rating},
    services::{enrichment::enrich_movies, MovieEnricher},
};

/// One enriched page of the catalog
pub async fn list_movies(
    store: &dyn Store,
    enricher: &Arc<dyn MovieEnricher>,
    query: &MovieListQuery,
    page_size: u32,
) -> AppResult<MoviePage> {
    let page = query.page();
    let limit = i64::from(page_size.max(1));
    let offset = i64::from(page - 1) * limit;

    let (movies, total) = store.list_movies(query.search(), limit, offset).await?;
    let views = enrich_movies(enricher, movies).await;

    Ok(MoviePage::new(
        views,
        total.max(0) as u64,
        page,
        page_size,
    ))
}

pub async fn get_movie(
    store: &dyn Store,
    enricher: &Arc<dyn MovieEnricher>,
    movie_id: i64,
) -> AppResult<MovieView> {
    let movie = store
        .find_movie(movie_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Movie not found".to_string()))?;

    Ok(enricher.enrich(movie).await)
}

/// Stores the caller's score for a movie, replacing any previous one
pub async fn rate_movie(
    store: &dyn Store,
    user_id: i64,
    movie_id: i64,
    request: RateRequest,
) -> AppResult<Rating> {
    let score = request.validated_score()?;

    if store.find_movie(movie_id).await?.is_none() {
        return Err(AppError::NotFound("Movie not found".to_string()));
    }

    let rating = store.upsert_rating(user_id, movie_id, score).await?;
    tracing::info!(user_id, movie_id, score, "Rating saved");
    Ok(rating)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::NewMovie;
    use crate::services::{TmdbClient, TmdbEnricher};

    fn offline_enricher(store: &MemoryStore) -> Arc<dyn MovieEnricher> {
        Arc::new(TmdbEnricher::new(
            Arc::new(store.clone()),
            Arc::new(TmdbClient::disabled()),
        ))
    }

    #[tokio::test]
    async fn test_second_page() {
        let store = MemoryStore::new();
        for year in 2000..2005 {
            store
                .insert_movie(NewMovie::titled(format!("Movie {}", year), Some(year)))
                .await;
        }
        let enricher = offline_enricher(&store);

        let query = MovieListQuery {
            page: Some("2".to_string()),
            search: None,
        };
        let page = list_movies(&store, &enricher, &query, 2).await.unwrap();

        assert_eq!(page.current_page, 2);
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        let titles: Vec<_> = page.movies.iter().map(|m| m.movie.title.as_str()).collect();
        assert_eq!(titles, vec!["Movie 2002", "Movie 2001"]);
    }

    #[tokio::test]
    async fn test_rate_rejects_out_of_range_before_lookup() {
        let store = MemoryStore::new();

        let err = rate_movie(&store, 1, 999, RateRequest { score: 9 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = rate_movie(&store, 1, 999, RateRequest { score: 3 })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_movie_detail() {
        let store = MemoryStore::new();
        let enricher = offline_enricher(&store);

        assert!(matches!(
            get_movie(&store, &enricher, 12).await,
            Err(AppError::NotFound(_))
        ));
    }
}
