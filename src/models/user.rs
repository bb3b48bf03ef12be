use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{MovieView, RatingView};

/// A registered user as stored in the database
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub imdb_profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a user profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Partial profile update, only non-empty values overwrite
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub imdb_profile_url: Option<String>,
}

impl ProfileUpdate {
    /// Drops empty strings so they never clear an existing value
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            first_name: keep(self.first_name),
            last_name: keep(self.last_name),
            profile_picture: keep(self.profile_picture),
            imdb_profile_url: keep(self.imdb_profile_url),
        }
    }

    pub fn apply_to(&self, user: &mut User) {
        if let Some(v) = &self.first_name {
            user.first_name = Some(v.clone());
        }
        if let Some(v) = &self.last_name {
            user.last_name = Some(v.clone());
        }
        if let Some(v) = &self.profile_picture {
            user.profile_picture = Some(v.clone());
        }
        if let Some(v) = &self.imdb_profile_url {
            user.imdb_profile_url = Some(v.clone());
        }
    }
}

/// Minimal user projection used by search results
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: i64,
    pub username: String,
}

/// User projection used in friend lists and friend requests
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct FriendSummary {
    pub id: i64,
    pub username: String,
    pub profile_picture: Option<String>,
}

impl From<&User> for FriendSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            profile_picture: user.profile_picture.clone(),
        }
    }
}

/// Profile as returned to the client. Email is only set for the owner.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_picture: Option<String>,
    pub imdb_profile_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn private(user: &User) -> Self {
        Self {
            email: Some(user.email.clone()),
            ..Self::public(user)
        }
    }

    pub fn public(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: None,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_picture: user.profile_picture.clone(),
            imdb_profile_url: user.imdb_profile_url.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Movie lists attached to a profile
#[derive(Debug, Clone, Default, Serialize)]
pub struct UserLists {
    #[serde(rename = "Watchlist")]
    pub watchlist: Vec<MovieView>,
    #[serde(rename = "Favorites")]
    pub favorites: Vec<MovieView>,
    #[serde(rename = "Ratings")]
    pub ratings: Vec<RatingView>,
}

/// Profile together with its lists, used by `/users/me` and friend profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetail {
    #[serde(flatten)]
    pub profile: UserProfile,
    #[serde(flatten)]
    pub lists: Option<UserLists>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_friend: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            username: "ana".to_string(),
            email: "ana@example.com".to_string(),
            first_name: Some("Ana".to_string()),
            last_name: None,
            profile_picture: None,
            imdb_profile_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_profile_update_ignores_empty_values() {
        let mut user = sample_user();
        let update = ProfileUpdate {
            first_name: Some(String::new()),
            last_name: Some("Lopez".to_string()),
            ..Default::default()
        }
        .normalized();

        update.apply_to(&mut user);

        assert_eq!(user.first_name.as_deref(), Some("Ana"));
        assert_eq!(user.last_name.as_deref(), Some("Lopez"));
    }

    #[test]
    fn test_public_profile_hides_email() {
        let user = sample_user();

        let public = serde_json::to_value(UserProfile::public(&user)).unwrap();
        assert!(public.get("email").is_none());
        assert_eq!(public["firstName"], "Ana");

        let private = serde_json::to_value(UserProfile::private(&user)).unwrap();
        assert_eq!(private["email"], "ana@example.com");
    }

    #[test]
    fn test_detail_without_lists_omits_collections() {
        let user = sample_user();
        let detail = UserDetail {
            profile: UserProfile::public(&user),
            lists: None,
            is_friend: Some(false),
        };

        let json = serde_json::to_value(detail).unwrap();
        assert!(json.get("Watchlist").is_none());
        assert_eq!(json["isFriend"], false);
    }
}
