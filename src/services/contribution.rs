use chrono::Utc;

use crate::models::{ContributionLevel, User, VoteType};

/// Every vote counts once, whatever the voter's badge.
pub const VOTE_WEIGHT: i32 = 1;

const BASE_VOTE_POINTS: i32 = 1;
const FOR_VOTE_BONUS: i32 = 1;

/// Maps a reputation score to its badge tier. Negative scores clamp to the
/// lowest tier.
pub fn level_for(score: i64) -> ContributionLevel {
    if score >= ContributionLevel::NicolasSupreme.threshold() {
        ContributionLevel::NicolasSupreme
    } else if score >= ContributionLevel::GrosNicolas.threshold() {
        ContributionLevel::GrosNicolas
    } else if score >= ContributionLevel::GrosMoyenNicolas.threshold() {
        ContributionLevel::GrosMoyenNicolas
    } else {
        ContributionLevel::PetitNicolas
    }
}

/// Points still missing before the next tier, `None` at the top tier.
pub fn points_to_next_level(score: i64) -> Option<i64> {
    level_for(score)
        .next()
        .map(|next| next.threshold() - score.max(0))
}

/// Reputation earned by casting (or re-casting) a vote.
pub fn cast_reward(vote_type: VoteType) -> i32 {
    match vote_type {
        VoteType::For => BASE_VOTE_POINTS + FOR_VOTE_BONUS,
        VoteType::Against => BASE_VOTE_POINTS,
    }
}

/// Reputation taken back when a vote is withdrawn.
pub fn removal_penalty(vote_type: VoteType) -> i32 {
    cast_reward(vote_type)
}

/// Returns the user with `delta` applied to its reputation. The score never
/// drops below zero and the level always matches the new score.
pub fn apply_reputation_delta(mut user: User, delta: i32) -> User {
    let score = user.reputation_score.saturating_add(delta).max(0);
    let level = level_for(i64::from(score));

    if score != user.reputation_score || level != user.contribution_level {
        user.reputation_score = score;
        user.contribution_level = level;
        user.updated_at = Utc::now();
    }

    user
}
