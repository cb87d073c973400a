use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Badge tier earned through voting activity. Purely recognition: it never
/// changes the weight of a vote.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "contribution_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ContributionLevel {
    #[default]
    PetitNicolas,
    GrosMoyenNicolas,
    GrosNicolas,
    NicolasSupreme,
}

impl ContributionLevel {
    /// Lowest reputation score that earns this tier.
    pub fn threshold(self) -> i64 {
        match self {
            ContributionLevel::PetitNicolas => 0,
            ContributionLevel::GrosMoyenNicolas => 100,
            ContributionLevel::GrosNicolas => 500,
            ContributionLevel::NicolasSupreme => 1000,
        }
    }

    pub fn next(self) -> Option<ContributionLevel> {
        match self {
            ContributionLevel::PetitNicolas => Some(ContributionLevel::GrosMoyenNicolas),
            ContributionLevel::GrosMoyenNicolas => Some(ContributionLevel::GrosNicolas),
            ContributionLevel::GrosNicolas => Some(ContributionLevel::NicolasSupreme),
            ContributionLevel::NicolasSupreme => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub reputation_score: i32,
    pub contribution_level: ContributionLevel,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Reputation / badge progress for the current user
#[derive(Debug, Serialize)]
pub struct ContributionResponse {
    pub user_id: String,
    pub reputation_score: i32,
    pub contribution_level: ContributionLevel,
    pub next_level: Option<ContributionLevel>,
    pub points_to_next_level: Option<i32>,
}
