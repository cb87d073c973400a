use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::models::{User, Vote};
use crate::services::vote_store::{StoreResult, VoteStore, VoteTransaction};

const VOTE_COLUMNS: &str = "id, user_id, proposal_id, vote_type, weight, comment, voted_at";

#[derive(Clone)]
pub struct PgVoteStore {
    db: PgPool,
}

impl PgVoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VoteStore for PgVoteStore {
    async fn begin(&self) -> StoreResult<Box<dyn VoteTransaction>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgVoteTransaction { tx }))
    }

    async fn find_vote(&self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE user_id = $1 AND proposal_id = $2"
        ))
        .bind(user_id)
        .bind(proposal_id)
        .fetch_optional(&self.db)
        .await?;

        Ok(vote)
    }

    async fn list_votes_by_proposal(&self, proposal_id: Uuid) -> StoreResult<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE proposal_id = $1 ORDER BY voted_at, id"
        ))
        .bind(proposal_id)
        .fetch_all(&self.db)
        .await?;

        Ok(votes)
    }

    async fn list_votes_by_user(&self, user_id: &str) -> StoreResult<Vec<Vote>> {
        let votes = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE user_id = $1 ORDER BY voted_at DESC, id"
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        Ok(votes)
    }
}

pub struct PgVoteTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl VoteTransaction for PgVoteTransaction {
    async fn get_user(&mut self, user_id: &str) -> StoreResult<Option<User>> {
        // The score is rewritten as an absolute value, so concurrent votes by
        // the same user must queue here until the earlier one commits.
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;

        Ok(user)
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET reputation_score = $1,
                contribution_level = $2,
                updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(user.reputation_score)
        .bind(user.contribution_level)
        .bind(user.updated_at)
        .bind(&user.id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(user)
    }

    async fn get_vote(&mut self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>> {
        // Row lock so a concurrent re-vote on the same pair waits for us.
        let vote = sqlx::query_as::<_, Vote>(&format!(
            "SELECT {VOTE_COLUMNS} FROM votes WHERE user_id = $1 AND proposal_id = $2 FOR UPDATE"
        ))
        .bind(user_id)
        .bind(proposal_id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(vote)
    }

    async fn insert_vote(&mut self, vote: &Vote) -> StoreResult<Vote> {
        // Two first-time votes racing on the same pair both take the insert
        // branch; the unique key turns the loser into an update of the winner.
        let vote = sqlx::query_as::<_, Vote>(&format!(
            r#"
            INSERT INTO votes ({VOTE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, proposal_id)
            DO UPDATE SET vote_type = EXCLUDED.vote_type,
                          comment = EXCLUDED.comment,
                          voted_at = EXCLUDED.voted_at
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(vote.id)
        .bind(&vote.user_id)
        .bind(vote.proposal_id)
        .bind(vote.vote_type)
        .bind(vote.weight)
        .bind(&vote.comment)
        .bind(vote.voted_at)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(vote)
    }

    async fn update_vote(&mut self, vote: &Vote) -> StoreResult<Vote> {
        let vote = sqlx::query_as::<_, Vote>(&format!(
            r#"
            UPDATE votes
            SET vote_type = $1, weight = $2, comment = $3, voted_at = $4
            WHERE id = $5
            RETURNING {VOTE_COLUMNS}
            "#
        ))
        .bind(vote.vote_type)
        .bind(vote.weight)
        .bind(&vote.comment)
        .bind(vote.voted_at)
        .bind(vote.id)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(vote)
    }

    async fn delete_vote(&mut self, vote_id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM votes WHERE id = $1")
            .bind(vote_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn recompute_vote_counts(&mut self, proposal_id: Uuid) -> StoreResult<()> {
        // Take the row lock first: the counting statement below then starts
        // after any concurrent voter on this proposal has committed, and its
        // snapshot includes that voter's row. NO KEY UPDATE does not conflict
        // with the KEY SHARE lock other voters' vote inserts hold on this row.
        sqlx::query("SELECT id FROM proposals WHERE id = $1 FOR NO KEY UPDATE")
            .bind(proposal_id)
            .execute(&mut *self.tx)
            .await?;

        sqlx::query(
            r#"
            UPDATE proposals
            SET votes_for = (
                    SELECT COUNT(*)::int FROM votes
                    WHERE proposal_id = $1 AND vote_type = 'for'
                ),
                votes_against = (
                    SELECT COUNT(*)::int FROM votes
                    WHERE proposal_id = $1 AND vote_type = 'against'
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(proposal_id)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn flush(&mut self) -> StoreResult<()> {
        // Statements run eagerly inside the transaction, nothing is buffered.
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
