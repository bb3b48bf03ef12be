use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::{
    db::Store,
    error::AppResult,
    models::{ListKind, ModelRecommendation, MovieView, RecommendedMovie, RecommenderModel},
    services::{enrichment::enrich_movies, MovieEnricher, ModelService},
};

/// Generates recommendations for a user from one model
///
/// The user's favorites are sent to the model service, the returned titles
/// are hydrated against the local catalog and enriched, then ranked by the
/// score the model assigned. Titles the catalog does not know are dropped.
pub async fn recommend_for_user(
    store: &dyn Store,
    models: &dyn ModelService,
    enricher: &Arc<dyn MovieEnricher>,
    user_id: i64,
    model: RecommenderModel,
    top_n: usize,
) -> AppResult<Vec<RecommendedMovie>> {
    let favorites = store.list_entries(ListKind::Favorites, user_id).await?;
    if favorites.is_empty() {
        tracing::debug!(user_id, model = %model, "No favorites, skipping recommendations");
        return Ok(Vec::new());
    }

    let liked_titles: Vec<String> = favorites.into_iter().map(|m| m.title).collect();

    let recommendations = models.recommend(model, &liked_titles, top_n).await?;
    if recommendations.is_empty() {
        return Ok(Vec::new());
    }

    let requested: Vec<String> = recommendations.iter().map(|r| r.title.clone()).collect();
    let movies = store.movies_by_titles(&requested).await?;

    let missing = missing_titles(&requested, movies.iter().map(|m| m.title.as_str()));
    if !missing.is_empty() {
        tracing::warn!(model = %model, missing = ?missing, "Recommended movies not found in catalog");
    }

    let scores = score_map(model, &recommendations);
    let views = enrich_movies(enricher, movies).await;
    let ranked = rank(views, &scores);

    tracing::info!(
        user_id,
        model = %model,
        requested = requested.len(),
        returned = ranked.len(),
        "Recommendations assembled"
    );

    Ok(ranked)
}

/// Title -> score lookup; a repeated title keeps its last score
fn score_map(model: RecommenderModel, recommendations: &[ModelRecommendation]) -> HashMap<String, f64> {
    recommendations
        .iter()
        .map(|r| (r.title.clone(), model.score_of(r)))
        .collect()
}

/// Requested titles with no catalog row, in request order
fn missing_titles<'a>(requested: &[String], found: impl Iterator<Item = &'a str>) -> Vec<String> {
    let found: HashSet<&str> = found.collect();
    requested
        .iter()
        .filter(|t| !found.contains(t.as_str()))
        .cloned()
        .collect()
}

/// Attaches scores and sorts descending; ties keep catalog order
fn rank(views: Vec<MovieView>, scores: &HashMap<String, f64>) -> Vec<RecommendedMovie> {
    let mut ranked: Vec<RecommendedMovie> = views
        .into_iter()
        .map(|movie| {
            let score = scores.get(&movie.movie.title).copied().unwrap_or(0.0);
            RecommendedMovie { movie, score }
        })
        .collect();

    ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::error::AppError;
    use crate::models::{NewMovie, NewUser};
    use crate::services::model_client::MockModelService;
    use crate::services::{TmdbClient, TmdbEnricher};

    fn rec(title: &str, score: Option<f64>, similarity: Option<f64>) -> ModelRecommendation {
        ModelRecommendation {
            title: title.to_string(),
            score,
            similarity,
        }
    }

    async fn setup() -> (MemoryStore, Arc<dyn MovieEnricher>, i64) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "ana".to_string(),
                email: "ana@example.com".to_string(),
                first_name: None,
                last_name: None,
            })
            .await
            .unwrap();

        let enricher: Arc<dyn MovieEnricher> = Arc::new(TmdbEnricher::new(
            Arc::new(store.clone()),
            Arc::new(TmdbClient::disabled()),
        ));

        (store, enricher, user.id)
    }

    #[test]
    fn test_score_map_last_occurrence_wins() {
        let recs = vec![rec("Heat", Some(1.0), None), rec("Heat", Some(3.0), None)];
        let scores = score_map(RecommenderModel::AssociationRules, &recs);
        assert_eq!(scores["Heat"], 3.0);
    }

    #[test]
    fn test_missing_titles_in_request_order() {
        let requested = vec!["Heat".to_string(), "Ronin".to_string(), "Thief".to_string()];
        let missing = missing_titles(&requested, ["Ronin"].into_iter());
        assert_eq!(missing, vec!["Heat".to_string(), "Thief".to_string()]);
    }

    #[tokio::test]
    async fn test_no_favorites_skips_model_call() {
        let (store, enricher, user_id) = setup().await;

        let mut models = MockModelService::new();
        models.expect_recommend().never();

        let result = recommend_for_user(
            &store,
            &models,
            &enricher,
            user_id,
            RecommenderModel::AssociationRules,
            10,
        )
        .await
        .unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_hydrates_and_ranks_by_model_score() {
        let (store, enricher, user_id) = setup().await;

        let liked = store.insert_movie(NewMovie::titled("Heat", Some(1995))).await;
        store.add_to_list(ListKind::Favorites, user_id, liked.id).await.unwrap();
        store.insert_movie(NewMovie::titled("Ronin", Some(1998))).await;
        store.insert_movie(NewMovie::titled("Thief", Some(1981))).await;
        store.insert_movie(NewMovie::titled("Collateral", Some(2004))).await;

        let mut models = MockModelService::new();
        models
            .expect_recommend()
            .withf(|model, titles, top_n| {
                *model == RecommenderModel::ContentBased
                    && titles.len() == 1
                    && titles[0] == "Heat"
                    && *top_n == 10
            })
            .times(1)
            .returning(|_, _, _| {
                Ok(vec![
                    rec("Thief", None, Some(0.42)),
                    rec("Collateral", None, Some(0.91)),
                    rec("Not In Catalog", None, Some(0.99)),
                    rec("Ronin", None, Some(0.67)),
                ])
            });

        let result = recommend_for_user(
            &store,
            &models,
            &enricher,
            user_id,
            RecommenderModel::ContentBased,
            10,
        )
        .await
        .unwrap();

        let titles: Vec<_> = result.iter().map(|r| r.movie.movie.title.as_str()).collect();
        assert_eq!(titles, vec!["Collateral", "Ronin", "Thief"]);
        assert_eq!(result[0].score, 0.91);
    }

    #[tokio::test]
    async fn test_missing_score_sorts_last() {
        let (store, enricher, user_id) = setup().await;

        let liked = store.insert_movie(NewMovie::titled("Heat", Some(1995))).await;
        store.add_to_list(ListKind::Favorites, user_id, liked.id).await.unwrap();
        store.insert_movie(NewMovie::titled("Ronin", Some(1998))).await;
        store.insert_movie(NewMovie::titled("Thief", Some(1981))).await;

        let mut models = MockModelService::new();
        models.expect_recommend().returning(|_, _, _| {
            Ok(vec![rec("Ronin", None, None), rec("Thief", Some(1.5), None)])
        });

        let result = recommend_for_user(
            &store,
            &models,
            &enricher,
            user_id,
            RecommenderModel::AssociationRules,
            10,
        )
        .await
        .unwrap();

        assert_eq!(result[0].movie.movie.title, "Thief");
        assert_eq!(result[1].score, 0.0);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let (store, enricher, user_id) = setup().await;

        let liked = store.insert_movie(NewMovie::titled("Heat", Some(1995))).await;
        store.add_to_list(ListKind::Favorites, user_id, liked.id).await.unwrap();

        let mut models = MockModelService::new();
        models
            .expect_recommend()
            .returning(|_, _, _| Err(AppError::ExternalApi("model not loaded".to_string())));

        let result = recommend_for_user(
            &store,
            &models,
            &enricher,
            user_id,
            RecommenderModel::ItemCf,
            10,
        )
        .await;

        assert!(matches!(result, Err(AppError::ExternalApi(_))));
    }
}
