use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{User, Vote};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable storage for users, proposals and votes.
///
/// Writes only happen through a [`VoteTransaction`] obtained from [`VoteStore::begin`].
/// The read helpers run outside any transaction and only see committed state.
#[async_trait]
pub trait VoteStore: Send + Sync {
    async fn begin(&self) -> StoreResult<Box<dyn VoteTransaction>>;

    async fn find_vote(&self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>>;

    async fn list_votes_by_proposal(&self, proposal_id: Uuid) -> StoreResult<Vec<Vote>>;

    async fn list_votes_by_user(&self, user_id: &str) -> StoreResult<Vec<Vote>>;
}

/// One unit of work spanning the user, proposal and vote stores.
///
/// Writes may be buffered until [`flush`](VoteTransaction::flush); reads issued
/// after a flush observe every write made earlier in the same transaction.
/// Dropping a transaction without committing discards it.
#[async_trait]
pub trait VoteTransaction: Send {
    async fn get_user(&mut self, user_id: &str) -> StoreResult<Option<User>>;

    async fn update_user(&mut self, user: &User) -> StoreResult<User>;

    async fn get_vote(&mut self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>>;

    async fn insert_vote(&mut self, vote: &Vote) -> StoreResult<Vote>;

    async fn update_vote(&mut self, vote: &Vote) -> StoreResult<Vote>;

    async fn delete_vote(&mut self, vote_id: Uuid) -> StoreResult<()>;

    /// Recounts `votes_for` / `votes_against` from the vote rows and persists them.
    async fn recompute_vote_counts(&mut self, proposal_id: Uuid) -> StoreResult<()>;

    async fn flush(&mut self) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
