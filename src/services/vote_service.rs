use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{Vote, VoteIntent};
use crate::services::contribution::{
    VOTE_WEIGHT, apply_reputation_delta, cast_reward, removal_penalty,
};
use crate::services::vote_store::{StoreError, VoteStore, VoteTransaction};

#[derive(Error, Debug)]
pub enum VotingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type VotingResult<T> = std::result::Result<T, VotingError>;

/// Sole writer of votes. Every mutation runs in a single transaction that also
/// refreshes the proposal tally and the voter's reputation and badge.
pub struct VotingService {
    store: Arc<dyn VoteStore>,
}

impl VotingService {
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Records `intent` for the user, replacing any earlier vote on the same
    /// proposal.
    #[tracing::instrument(
        skip(self, intent),
        fields(proposal_id = %intent.proposal_id, vote_type = ?intent.vote_type)
    )]
    pub async fn cast_vote(&self, intent: VoteIntent, user_id: &str) -> VotingResult<Vote> {
        ensure_user_id(user_id)?;

        let mut tx = self.store.begin().await?;
        match cast_in_tx(&mut *tx, &intent, user_id).await {
            Ok(vote) => {
                tx.commit().await?;
                info!(vote_id = %vote.id, "Vote recorded");
                Ok(vote)
            }
            Err(err) => {
                rollback(tx, &err).await;
                Err(err)
            }
        }
    }

    /// Withdraws the user's vote on a proposal. Missing votes are not an error.
    #[tracing::instrument(skip(self))]
    pub async fn remove_vote(&self, user_id: &str, proposal_id: Uuid) -> VotingResult<()> {
        ensure_user_id(user_id)?;

        let mut tx = self.store.begin().await?;
        match remove_in_tx(&mut *tx, user_id, proposal_id).await {
            Ok(removed) => {
                tx.commit().await?;
                if removed {
                    info!("Vote removed");
                }
                Ok(())
            }
            Err(err) => {
                rollback(tx, &err).await;
                Err(err)
            }
        }
    }

    pub async fn get_user_vote_for_proposal(
        &self,
        user_id: &str,
        proposal_id: Uuid,
    ) -> VotingResult<Option<Vote>> {
        Ok(self.store.find_vote(user_id, proposal_id).await?)
    }

    pub async fn get_votes_for_proposal(&self, proposal_id: Uuid) -> VotingResult<Vec<Vote>> {
        Ok(self.store.list_votes_by_proposal(proposal_id).await?)
    }

    pub async fn get_user_votes(&self, user_id: &str) -> VotingResult<Vec<Vote>> {
        Ok(self.store.list_votes_by_user(user_id).await?)
    }
}

fn ensure_user_id(user_id: &str) -> VotingResult<()> {
    if user_id.trim().is_empty() {
        return Err(VotingError::InvalidArgument(
            "user id must not be empty".to_string(),
        ));
    }
    Ok(())
}

async fn rollback(tx: Box<dyn VoteTransaction>, cause: &VotingError) {
    debug!(error = %cause, "Rolling back vote transaction");
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "Failed to roll back vote transaction");
    }
}

async fn cast_in_tx(
    tx: &mut dyn VoteTransaction,
    intent: &VoteIntent,
    user_id: &str,
) -> VotingResult<Vote> {
    let user = tx
        .get_user(user_id)
        .await?
        .ok_or_else(|| VotingError::UserNotFound(user_id.to_string()))?;

    let now = Utc::now();
    let vote = match tx.get_vote(user_id, intent.proposal_id).await? {
        Some(mut existing) => {
            debug!(vote_id = %existing.id, "Updating existing vote");
            existing.vote_type = intent.vote_type;
            existing.comment = intent.comment.clone();
            existing.voted_at = now;
            existing.weight = VOTE_WEIGHT;
            tx.update_vote(&existing).await?
        }
        None => {
            let vote = Vote {
                id: Uuid::new_v4(),
                user_id: user_id.to_string(),
                proposal_id: intent.proposal_id,
                vote_type: intent.vote_type,
                weight: VOTE_WEIGHT,
                comment: intent.comment.clone(),
                voted_at: now,
            };
            debug!(vote_id = %vote.id, "Inserting new vote");
            tx.insert_vote(&vote).await?
        }
    };

    let previous_level = user.contribution_level;
    let previous_score = user.reputation_score;
    let user = apply_reputation_delta(user, cast_reward(intent.vote_type));
    if user.reputation_score != previous_score || user.contribution_level != previous_level {
        tx.update_user(&user).await?;
    }
    if user.contribution_level != previous_level {
        info!(level = ?user.contribution_level, "Contribution level changed");
    }

    // The recount must see the vote written above.
    tx.flush().await?;
    tx.recompute_vote_counts(intent.proposal_id).await?;
    tx.flush().await?;

    Ok(vote)
}

async fn remove_in_tx(
    tx: &mut dyn VoteTransaction,
    user_id: &str,
    proposal_id: Uuid,
) -> VotingResult<bool> {
    // User first, same lock order as a cast.
    let user = tx.get_user(user_id).await?;

    let Some(vote) = tx.get_vote(user_id, proposal_id).await? else {
        debug!("No vote to remove");
        return Ok(false);
    };
    let user = user.ok_or_else(|| VotingError::UserNotFound(user_id.to_string()))?;

    tx.delete_vote(vote.id).await?;

    let previous_level = user.contribution_level;
    let previous_score = user.reputation_score;
    let user = apply_reputation_delta(user, -removal_penalty(vote.vote_type));
    if user.reputation_score != previous_score || user.contribution_level != previous_level {
        tx.update_user(&user).await?;
    }

    tx.flush().await?;
    tx.recompute_vote_counts(proposal_id).await?;
    tx.flush().await?;

    Ok(true)
}
