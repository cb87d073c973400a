use sqlx::PgPool;
use uuid::Uuid;

use crate::{error::Result, models::Proposal};

pub async fn get_proposal_by_id(db: &PgPool, proposal_id: Uuid) -> Result<Option<Proposal>> {
    let proposal = sqlx::query_as::<_, Proposal>("SELECT * FROM proposals WHERE id = $1")
        .bind(proposal_id)
        .fetch_optional(db)
        .await?;

    Ok(proposal)
}
