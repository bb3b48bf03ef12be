use std::sync::Arc;

use axum::extract::State;

use crate::{
    error::{AppError, AppResult},
    middleware::AuthUser,
    models::{RecommendedMovie, RecommenderModel},
    services::recommendations,
};

use super::{
    extract::{Json, Path},
    AppState,
};

/// Handler for `/api/recommendations/{model}`
///
/// Pipeline failures are logged and answered with an empty list so the
/// client can render its fallback.
pub async fn recommend(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(model): Path<String>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let model = RecommenderModel::from_route(&model)
        .ok_or_else(|| AppError::NotFound(format!("Unknown model: {}", model)))?;

    let result = recommendations::recommend_for_user(
        state.store.as_ref(),
        state.models.as_ref(),
        &state.enricher,
        auth.id,
        model,
        state.settings.recommendation_top_n,
    )
    .await;

    match result {
        Ok(movies) => Ok(Json(movies)),
        Err(e) => {
            tracing::error!(user_id = auth.id, model = %model, error = %e, "Recommendation pipeline failed");
            Ok(Json(Vec::new()))
        }
    }
}
