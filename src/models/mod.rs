use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod friendship;
pub mod movie;
pub mod rating;
pub mod user;

pub use friendship::{FriendRequest, Friendship, FriendshipRow, FriendshipStatus, PendingRequest};
pub use movie::{clean_title, Movie, MovieListQuery, MoviePage, MovieView, NewMovie};
pub use rating::{RateRequest, Rating, RatingSaved, RatingView};
pub use user::{
    FriendSummary, NewUser, ProfileUpdate, User, UserDetail, UserLists, UserProfile, UserSummary,
};

/// Per-user movie collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Watchlist,
    Favorites,
}

impl ListKind {
    /// Join table backing the list
    pub fn table(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "user_watchlist",
            ListKind::Favorites => "user_favorites",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ListKind::Watchlist => "watchlist",
            ListKind::Favorites => "favorites",
        }
    }
}

impl Display for ListKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Body of list membership requests
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntryRequest {
    pub movie_id: i64,
}

/// Plain `{ "message": ... }` acknowledgement
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

impl Message {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

// ============================================================================
// Recommendation Model Service Types
// ============================================================================

/// The three recommendation models exposed by the model service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommenderModel {
    /// Association rules over co-liked movies
    AssociationRules,
    /// Content-based similarity on metadata
    ContentBased,
    /// Item-based collaborative filtering
    ItemCf,
}

impl RecommenderModel {
    /// Resolves the public route segment (`model1`..`model3`)
    pub fn from_route(segment: &str) -> Option<Self> {
        match segment {
            "model1" => Some(RecommenderModel::AssociationRules),
            "model2" => Some(RecommenderModel::ContentBased),
            "model3" => Some(RecommenderModel::ItemCf),
            _ => None,
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            RecommenderModel::AssociationRules => "model1",
            RecommenderModel::ContentBased => "model2",
            RecommenderModel::ItemCf => "model3",
        }
    }

    /// Path on the model service
    pub fn endpoint(&self) -> &'static str {
        match self {
            RecommenderModel::AssociationRules => "/recommend",
            RecommenderModel::ContentBased => "/recommend/content",
            RecommenderModel::ItemCf => "/recommend/itemcf",
        }
    }

    /// Extracts the ranking score from a model entry
    ///
    /// Each model reports its ranking under a different field. Missing or
    /// zero values fall through the same way for every model.
    pub fn score_of(&self, entry: &ModelRecommendation) -> f64 {
        let nonzero = |v: Option<f64>| v.filter(|s| *s != 0.0 && !s.is_nan());
        let score = match self {
            RecommenderModel::AssociationRules => nonzero(entry.score),
            RecommenderModel::ContentBased => nonzero(entry.similarity),
            RecommenderModel::ItemCf => nonzero(entry.similarity).or(nonzero(entry.score)),
        };
        score.unwrap_or(0.0)
    }
}

impl Display for RecommenderModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.route())
    }
}

/// Request body sent to the model service
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ModelRequest {
    pub liked_movies: Vec<String>,
    pub top_n: usize,
}

/// Response envelope returned by every model endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ModelResponse {
    pub success: bool,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<ModelRecommendation>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub warning: Option<String>,
}

/// One recommended title; extra model-specific columns are ignored
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelRecommendation {
    pub title: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub similarity: Option<f64>,
}

/// Hydrated recommendation returned to the client
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedMovie {
    #[serde(flatten)]
    pub movie: MovieView,
    pub score: f64,
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Response from GET /search/movie
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// A single movie as returned by TMDB search and details
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TmdbMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_routes() {
        assert_eq!(
            RecommenderModel::from_route("model1"),
            Some(RecommenderModel::AssociationRules)
        );
        assert_eq!(
            RecommenderModel::from_route("model3").unwrap().endpoint(),
            "/recommend/itemcf"
        );
        assert_eq!(RecommenderModel::from_route("model4"), None);
        assert_eq!(RecommenderModel::ContentBased.to_string(), "model2");
    }

    #[test]
    fn test_score_field_per_model() {
        let entry = ModelRecommendation {
            title: "Heat".to_string(),
            score: Some(2.5),
            similarity: Some(0.8),
        };

        assert_eq!(RecommenderModel::AssociationRules.score_of(&entry), 2.5);
        assert_eq!(RecommenderModel::ContentBased.score_of(&entry), 0.8);
        assert_eq!(RecommenderModel::ItemCf.score_of(&entry), 0.8);
    }

    #[test]
    fn test_item_cf_falls_back_to_score() {
        let entry = ModelRecommendation {
            title: "Heat".to_string(),
            score: Some(0.4),
            similarity: None,
        };

        assert_eq!(RecommenderModel::ItemCf.score_of(&entry), 0.4);
        assert_eq!(RecommenderModel::ContentBased.score_of(&entry), 0.0);
    }

    #[test]
    fn test_model_response_tolerates_extra_columns() {
        let body = r#"{
            "success": true,
            "model": "association_rules",
            "recommendations": [
                {"movieId": 12, "title": "Heat", "score": 3.1, "confidence": 0.7, "lift": 4.4}
            ]
        }"#;

        let response: ModelResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        assert_eq!(response.recommendations.len(), 1);
        assert_eq!(response.recommendations[0].score, Some(3.1));
    }

    #[test]
    fn test_model_error_response() {
        let body = r#"{"success": false, "error": "Content-Based model not loaded"}"#;
        let response: ModelResponse = serde_json::from_str(body).unwrap();

        assert!(!response.success);
        assert!(response.recommendations.is_empty());
        assert_eq!(
            response.error.as_deref(),
            Some("Content-Based model not loaded")
        );
    }
}
