use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::FriendSummary;

/// Lifecycle of a friendship row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

impl Display for FriendshipStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            "blocked" => Ok(FriendshipStatus::Blocked),
            other => Err(format!("unknown friendship status '{}'", other)),
        }
    }
}

/// Directed request/accept relation between two users
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: i64,
    pub requester_id: i64,
    pub addressee_id: i64,
    pub status: FriendshipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// Whether this row links `a` and `b`, in either direction
    pub fn connects(&self, a: i64, b: i64) -> bool {
        (self.requester_id == a && self.addressee_id == b)
            || (self.requester_id == b && self.addressee_id == a)
    }

    /// The id on the other side of the relation from `user_id`
    pub fn other_party(&self, user_id: i64) -> i64 {
        if self.requester_id == user_id {
            self.addressee_id
        } else {
            self.requester_id
        }
    }
}

/// Raw row as read from the `friendships` table
#[derive(Debug, sqlx::FromRow)]
pub struct FriendshipRow {
    pub id: i64,
    pub requester_id: i64,
    pub addressee_id: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = String;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            requester_id: row.requester_id,
            addressee_id: row.addressee_id,
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub addressee_id: i64,
}

/// Pending request with the requester embedded
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    #[serde(flatten)]
    pub friendship: Friendship,
    #[serde(rename = "Requester")]
    pub requester: Option<FriendSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn friendship(requester_id: i64, addressee_id: i64) -> Friendship {
        Friendship {
            id: 1,
            requester_id,
            addressee_id,
            status: FriendshipStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_connects_is_symmetric() {
        let f = friendship(1, 2);
        assert!(f.connects(1, 2));
        assert!(f.connects(2, 1));
        assert!(!f.connects(1, 3));
    }

    #[test]
    fn test_other_party() {
        let f = friendship(1, 2);
        assert_eq!(f.other_party(1), 2);
        assert_eq!(f.other_party(2), 1);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            FriendshipStatus::Pending,
            FriendshipStatus::Accepted,
            FriendshipStatus::Blocked,
        ] {
            assert_eq!(status.as_str().parse::<FriendshipStatus>().unwrap(), status);
        }
        assert!("ignored".parse::<FriendshipStatus>().is_err());
    }

    #[test]
    fn test_row_with_bad_status_is_rejected() {
        let row = FriendshipRow {
            id: 3,
            requester_id: 1,
            addressee_id: 2,
            status: "weird".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(Friendship::try_from(row).is_err());
    }
}
