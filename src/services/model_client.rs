//! Client for the external recommendation model service
//!
//! The model service exposes one POST endpoint per model. Each takes the
//! titles a user liked and answers with ranked titles:
//!
//! ```text
//! POST /recommend            -> association rules   (ranked by `score`)
//! POST /recommend/content    -> content based       (ranked by `similarity`)
//! POST /recommend/itemcf     -> item-based CF       (ranked by `similarity`)
//! ```
use reqwest::Client as HttpClient;

use crate::{
    error::{AppError, AppResult},
    models::{ModelRecommendation, ModelRequest, ModelResponse, RecommenderModel},
};

/// Source of raw model recommendations
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    /// Asks `model` for up to `top_n` titles similar to `liked_titles`
    async fn recommend(
        &self,
        model: RecommenderModel,
        liked_titles: &[String],
        top_n: usize,
    ) -> AppResult<Vec<ModelRecommendation>>;
}

/// HTTP implementation talking to the model service
#[derive(Clone)]
pub struct HttpModelService {
    http_client: HttpClient,
    base_url: String,
}

impl HttpModelService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, model: RecommenderModel) -> String {
        format!("{}{}", self.base_url, model.endpoint())
    }
}

/// Turns a decoded model response into its recommendations
fn unpack_response(
    model: RecommenderModel,
    response: ModelResponse,
) -> AppResult<Vec<ModelRecommendation>> {
    if !response.success {
        let message = response
            .error
            .unwrap_or_else(|| "Unknown error from model service".to_string());
        tracing::error!(model = %model, error = %message, "Model service returned error");
        return Err(AppError::ExternalApi(message));
    }

    if let Some(warning) = &response.warning {
        tracing::warn!(model = %model, warning = %warning, "Model service warning");
    }

    Ok(response.recommendations)
}

#[async_trait::async_trait]
impl ModelService for HttpModelService {
    async fn recommend(
        &self,
        model: RecommenderModel,
        liked_titles: &[String],
        top_n: usize,
    ) -> AppResult<Vec<ModelRecommendation>> {
        let url = self.url_for(model);
        let body = ModelRequest {
            liked_movies: liked_titles.to_vec(),
            top_n,
        };

        tracing::debug!(model = %model, liked = liked_titles.len(), top_n, "Calling model service");

        let response = self.http_client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(
                model = %model,
                status = %status,
                body = %body,
                "Model service request failed"
            );
            return Err(AppError::ExternalApi(format!(
                "Model service returned status {}: {}",
                status, body
            )));
        }

        let decoded: ModelResponse = response.json().await?;
        let recommendations = unpack_response(model, decoded)?;

        tracing::info!(
            model = %model,
            count = recommendations.len(),
            "Received model recommendations"
        );

        Ok(recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> ModelResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_url_joins_base_and_endpoint() {
        let client = HttpModelService::new("http://localhost:9001/");
        assert_eq!(
            client.url_for(RecommenderModel::AssociationRules),
            "http://localhost:9001/recommend"
        );
        assert_eq!(
            client.url_for(RecommenderModel::ContentBased),
            "http://localhost:9001/recommend/content"
        );
    }

    #[test]
    fn test_unpack_success() {
        let recs = unpack_response(
            RecommenderModel::ContentBased,
            response(r#"{"success": true, "recommendations": [{"title": "Heat", "similarity": 0.9}]}"#),
        )
        .unwrap();

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].similarity, Some(0.9));
    }

    #[test]
    fn test_unpack_failure_uses_service_message() {
        let err = unpack_response(
            RecommenderModel::ItemCf,
            response(r#"{"success": false, "error": "Item-Based CF model not loaded"}"#),
        )
        .unwrap_err();

        assert!(matches!(err, AppError::ExternalApi(ref m) if m == "Item-Based CF model not loaded"));
    }

    #[test]
    fn test_unpack_failure_without_message() {
        let err = unpack_response(
            RecommenderModel::AssociationRules,
            response(r#"{"success": false}"#),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Unknown error from model service"));
    }

    #[test]
    fn test_request_body_shape() {
        let body = ModelRequest {
            liked_movies: vec!["Heat".to_string()],
            top_n: 10,
        };
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["liked_movies"][0], "Heat");
        assert_eq!(json["top_n"], 10);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_an_error() {
        let client = HttpModelService::new("http://127.0.0.1:1");
        let result = client
            .recommend(RecommenderModel::AssociationRules, &["Heat".to_string()], 10)
            .await;

        assert!(matches!(result, Err(AppError::HttpClient(_))));
    }
}
