pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use serde_json::{Value, json};
use sqlx::PgPool;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    config::Config,
    services::{pg_store::PgVoteStore, vote_service::VotingService},
};

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub voting: Arc<VotingService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config) -> Self {
        let voting = VotingService::new(Arc::new(PgVoteStore::new(db.clone())));
        Self {
            db,
            voting: Arc::new(voting),
            config: Arc::new(config),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    let vote_routes = Router::new()
        .route(
            "/api/proposals/{proposal_id}/vote",
            get(handlers::votes::get_my_vote)
                .post(handlers::votes::cast_vote)
                .delete(handlers::votes::remove_vote),
        )
        .route(
            "/api/proposals/{proposal_id}/votes",
            get(handlers::votes::get_proposal_votes),
        )
        .route("/api/users/me/votes", get(handlers::users::get_my_votes))
        .route(
            "/api/users/me/contribution",
            get(handlers::users::get_my_contribution),
        );

    Router::new()
        .route("/health", get(health))
        .merge(vote_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
