use axum::{extract::State, response::Json};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{ContributionResponse, Vote},
    services::user_service,
};

pub async fn get_my_votes(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<Vote>>> {
    let votes = state.voting.get_user_votes(&auth_user.user_id).await?;

    Ok(Json(votes))
}

pub async fn get_my_contribution(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<ContributionResponse>> {
    let user = user_service::get_user_by_id(&state.db, &auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::Authentication("Unknown user".to_string()))?;

    Ok(Json(user_service::contribution_of(&user)))
}
