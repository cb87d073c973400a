pub mod contribution;
#[cfg(test)]
pub mod memory_store;
pub mod pg_store;
pub mod proposal_service;
pub mod user_service;
pub mod vote_service;
pub mod vote_store;
