use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::MovieView;
use crate::error::{AppError, AppResult};

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

/// A user's 1-5 score for a movie, unique per (user, movie)
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub id: i64,
    pub user_id: i64,
    pub movie_id: i64,
    pub score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateRequest {
    pub score: i64,
}

impl RateRequest {
    pub fn validated_score(&self) -> AppResult<i32> {
        if self.score < i64::from(MIN_SCORE) || self.score > i64::from(MAX_SCORE) {
            return Err(AppError::InvalidInput("Score must be 1-5".to_string()));
        }
        Ok(self.score as i32)
    }
}

/// Rating with its movie embedded, as shown on profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingView {
    #[serde(flatten)]
    pub rating: Rating,
    #[serde(rename = "Movie")]
    pub movie: MovieView,
}

#[derive(Debug, Serialize)]
pub struct RatingSaved {
    pub message: &'static str,
    pub rating: Rating,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_bounds() {
        assert!(RateRequest { score: 1 }.validated_score().is_ok());
        assert_eq!(RateRequest { score: 5 }.validated_score().unwrap(), 5);

        let err = RateRequest { score: 0 }.validated_score().unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert!(RateRequest { score: 6 }.validated_score().is_err());
        assert!(RateRequest { score: -3 }.validated_score().is_err());
    }
}
