use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Proposal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub author_id: String,
    pub votes_for: i32,
    pub votes_against: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn total_votes(&self) -> i32 {
        self.votes_for + self.votes_against
    }
}
