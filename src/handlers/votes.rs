use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, Result},
    models::{CastVoteRequest, Proposal, Vote, VoteResponse},
    services::proposal_service,
};

async fn require_proposal(state: &AppState, proposal_id: Uuid) -> Result<Proposal> {
    proposal_service::get_proposal_by_id(&state.db, proposal_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Proposal not found".to_string()))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(proposal_id): Path<Uuid>,
    Json(payload): Json<CastVoteRequest>,
) -> Result<(StatusCode, Json<VoteResponse>)> {
    payload.validate()?;

    require_proposal(&state, proposal_id).await?;

    let previous = state
        .voting
        .get_user_vote_for_proposal(&auth_user.user_id, proposal_id)
        .await?;

    let vote = state
        .voting
        .cast_vote(payload.into_intent(proposal_id), &auth_user.user_id)
        .await?;

    // 201 only when a new vote row was created; a re-vote updates in place
    let status = match previous {
        Some(previous) if previous.id == vote.id => StatusCode::OK,
        _ => StatusCode::CREATED,
    };

    // Fresh read for the committed tally
    let proposal = require_proposal(&state, proposal_id).await?;

    Ok((
        status,
        Json(VoteResponse {
            vote,
            votes_for: proposal.votes_for,
            votes_against: proposal.votes_against,
        }),
    ))
}

pub async fn remove_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(proposal_id): Path<Uuid>,
) -> Result<StatusCode> {
    state
        .voting
        .remove_vote(&auth_user.user_id, proposal_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_my_vote(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(proposal_id): Path<Uuid>,
) -> Result<Json<Option<Vote>>> {
    let vote = state
        .voting
        .get_user_vote_for_proposal(&auth_user.user_id, proposal_id)
        .await?;

    Ok(Json(vote))
}

pub async fn get_proposal_votes(
    State(state): State<AppState>,
    Path(proposal_id): Path<Uuid>,
) -> Result<Json<Vec<Vote>>> {
    require_proposal(&state, proposal_id).await?;

    let votes = state.voting.get_votes_for_proposal(proposal_id).await?;

    Ok(Json(votes))
}
