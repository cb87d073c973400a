use sqlx::PgPool;

use crate::{
    error::Result,
    models::{ContributionResponse, User},
    services::contribution::points_to_next_level,
};

pub async fn get_user_by_id(db: &PgPool, user_id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    Ok(user)
}

pub fn contribution_of(user: &User) -> ContributionResponse {
    let score = i64::from(user.reputation_score);
    ContributionResponse {
        user_id: user.id.clone(),
        reputation_score: user.reputation_score,
        contribution_level: user.contribution_level,
        next_level: user.contribution_level.next(),
        points_to_next_level: points_to_next_level(score)
            .map(|points| i32::try_from(points).unwrap_or(i32::MAX)),
    }
}
