use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vote_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VoteType {
    For,
    Against,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Vote {
    pub id: Uuid,
    pub user_id: String,
    pub proposal_id: Uuid,
    pub vote_type: VoteType,
    pub weight: i32, // always 1: one Nicolas, one voice
    pub comment: Option<String>,
    pub voted_at: DateTime<Utc>,
}

/// What a user wants to record on a proposal.
#[derive(Debug, Clone)]
pub struct VoteIntent {
    pub proposal_id: Uuid,
    pub vote_type: VoteType,
    pub comment: Option<String>,
}

// Cast vote request
#[derive(Debug, Validate, Deserialize)]
pub struct CastVoteRequest {
    pub vote_type: VoteType,
    #[validate(length(max = 1000))]
    pub comment: Option<String>,
}

impl CastVoteRequest {
    pub fn into_intent(self, proposal_id: Uuid) -> VoteIntent {
        VoteIntent {
            proposal_id,
            vote_type: self.vote_type,
            comment: self.comment,
        }
    }
}

// Vote response
#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub vote: Vote,
    pub votes_for: i32,
    pub votes_against: i32,
}
