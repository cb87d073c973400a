//! In-process [`VoteStore`] backing the service tests.
//!
//! A transaction holds the store lock from `begin` until it ends, so units of
//! work are serialized. Entity writes are queued and only land in the
//! transaction's working copy on `flush`, the way an ORM change tracker
//! behaves; `recompute_vote_counts` reads that working copy directly.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::models::{Proposal, User, Vote, VoteType};
use crate::services::contribution::level_for;
use crate::services::vote_store::{StoreError, StoreResult, VoteStore, VoteTransaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    UpdateUser,
    RecomputeVoteCounts,
    Commit,
}

#[derive(Debug, Clone, Default)]
struct State {
    users: HashMap<String, User>,
    proposals: HashMap<Uuid, Proposal>,
    votes: HashMap<Uuid, Vote>,
}

#[derive(Debug)]
enum PendingWrite {
    User(User),
    InsertVote(Vote),
    UpdateVote(Vote),
    DeleteVote(Uuid),
}

#[derive(Clone, Default)]
pub struct MemoryVoteStore {
    state: Arc<Mutex<State>>,
    faults: Arc<StdMutex<HashSet<Fault>>>,
    transactions: Arc<AtomicUsize>,
}

impl MemoryVoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed_user(&self, user_id: &str, reputation_score: i32) {
        let now = Utc::now();
        let user = User {
            id: user_id.to_string(),
            username: format!("nicolas-{user_id}"),
            reputation_score,
            contribution_level: level_for(i64::from(reputation_score)),
            created_at: now,
            updated_at: now,
        };
        self.state.lock().await.users.insert(user.id.clone(), user);
    }

    pub async fn seed_proposal(&self) -> Uuid {
        let now = Utc::now();
        let proposal = Proposal {
            id: Uuid::new_v4(),
            title: "Baisser la TVA sur les produits de premiere necessite".to_string(),
            description: "Nicolas paie deja assez.".to_string(),
            author_id: "author".to_string(),
            votes_for: 0,
            votes_against: 0,
            created_at: now,
            updated_at: now,
        };
        let id = proposal.id;
        self.state.lock().await.proposals.insert(id, proposal);
        id
    }

    /// Inserts a vote row directly, bypassing reputation and tally bookkeeping.
    pub async fn seed_vote(&self, user_id: &str, proposal_id: Uuid, vote_type: VoteType) -> Vote {
        let vote = Vote {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            proposal_id,
            vote_type,
            weight: 1,
            comment: None,
            voted_at: Utc::now(),
        };
        let mut state = self.state.lock().await;
        state.votes.insert(vote.id, vote.clone());
        recount(&mut state, proposal_id);
        vote
    }

    pub async fn user(&self, user_id: &str) -> Option<User> {
        self.state.lock().await.users.get(user_id).cloned()
    }

    pub async fn proposal(&self, proposal_id: Uuid) -> Option<Proposal> {
        self.state.lock().await.proposals.get(&proposal_id).cloned()
    }

    pub async fn vote_rows(&self) -> usize {
        self.state.lock().await.votes.len()
    }

    pub fn inject_fault(&self, fault: Fault) {
        self.faults.lock().unwrap().insert(fault);
    }

    pub fn clear_faults(&self) {
        self.faults.lock().unwrap().clear();
    }

    pub fn transactions_started(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }
}

fn recount(state: &mut State, proposal_id: Uuid) {
    let (mut votes_for, mut votes_against) = (0, 0);
    for vote in state.votes.values().filter(|v| v.proposal_id == proposal_id) {
        match vote.vote_type {
            VoteType::For => votes_for += 1,
            VoteType::Against => votes_against += 1,
        }
    }

    if let Some(proposal) = state.proposals.get_mut(&proposal_id) {
        proposal.votes_for = votes_for;
        proposal.votes_against = votes_against;
        proposal.updated_at = Utc::now();
    }
}

fn find_vote_in(state: &State, user_id: &str, proposal_id: Uuid) -> Option<Vote> {
    state
        .votes
        .values()
        .find(|v| v.user_id == user_id && v.proposal_id == proposal_id)
        .cloned()
}

#[async_trait]
impl VoteStore for MemoryVoteStore {
    async fn begin(&self) -> StoreResult<Box<dyn VoteTransaction>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        self.transactions.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MemoryVoteTransaction {
            guard,
            working,
            pending: Vec::new(),
            faults: self.faults.clone(),
        }))
    }

    async fn find_vote(&self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>> {
        Ok(find_vote_in(&*self.state.lock().await, user_id, proposal_id))
    }

    async fn list_votes_by_proposal(&self, proposal_id: Uuid) -> StoreResult<Vec<Vote>> {
        let state = self.state.lock().await;
        let mut votes: Vec<Vote> = state
            .votes
            .values()
            .filter(|v| v.proposal_id == proposal_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| (v.voted_at, v.id));
        Ok(votes)
    }

    async fn list_votes_by_user(&self, user_id: &str) -> StoreResult<Vec<Vote>> {
        let state = self.state.lock().await;
        let mut votes: Vec<Vote> = state
            .votes
            .values()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect();
        votes.sort_by_key(|v| (std::cmp::Reverse(v.voted_at), v.id));
        Ok(votes)
    }
}

pub struct MemoryVoteTransaction {
    guard: OwnedMutexGuard<State>,
    working: State,
    pending: Vec<PendingWrite>,
    faults: Arc<StdMutex<HashSet<Fault>>>,
}

impl MemoryVoteTransaction {
    fn check(&self, fault: Fault) -> StoreResult<()> {
        if self.faults.lock().unwrap().contains(&fault) {
            return Err(StoreError::Unavailable(format!("injected fault: {fault:?}")));
        }
        Ok(())
    }

    fn apply_pending(&mut self) -> StoreResult<()> {
        for write in std::mem::take(&mut self.pending) {
            match write {
                PendingWrite::User(user) => {
                    self.working.users.insert(user.id.clone(), user);
                }
                PendingWrite::InsertVote(vote) => {
                    if find_vote_in(&self.working, &vote.user_id, vote.proposal_id).is_some() {
                        return Err(StoreError::Unavailable(format!(
                            "duplicate vote for ({}, {})",
                            vote.user_id, vote.proposal_id
                        )));
                    }
                    self.working.votes.insert(vote.id, vote);
                }
                PendingWrite::UpdateVote(vote) => {
                    self.working.votes.insert(vote.id, vote);
                }
                PendingWrite::DeleteVote(vote_id) => {
                    self.working.votes.remove(&vote_id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VoteTransaction for MemoryVoteTransaction {
    async fn get_user(&mut self, user_id: &str) -> StoreResult<Option<User>> {
        Ok(self.working.users.get(user_id).cloned())
    }

    async fn update_user(&mut self, user: &User) -> StoreResult<User> {
        self.check(Fault::UpdateUser)?;
        self.pending.push(PendingWrite::User(user.clone()));
        Ok(user.clone())
    }

    async fn get_vote(&mut self, user_id: &str, proposal_id: Uuid) -> StoreResult<Option<Vote>> {
        Ok(find_vote_in(&self.working, user_id, proposal_id))
    }

    async fn insert_vote(&mut self, vote: &Vote) -> StoreResult<Vote> {
        self.pending.push(PendingWrite::InsertVote(vote.clone()));
        Ok(vote.clone())
    }

    async fn update_vote(&mut self, vote: &Vote) -> StoreResult<Vote> {
        self.pending.push(PendingWrite::UpdateVote(vote.clone()));
        Ok(vote.clone())
    }

    async fn delete_vote(&mut self, vote_id: Uuid) -> StoreResult<()> {
        self.pending.push(PendingWrite::DeleteVote(vote_id));
        Ok(())
    }

    async fn recompute_vote_counts(&mut self, proposal_id: Uuid) -> StoreResult<()> {
        self.check(Fault::RecomputeVoteCounts)?;
        recount(&mut self.working, proposal_id);
        Ok(())
    }

    async fn flush(&mut self) -> StoreResult<()> {
        self.apply_pending()
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let mut this = self;
        this.check(Fault::Commit)?;
        this.apply_pending()?;
        let MemoryVoteTransaction {
            mut guard, working, ..
        } = *this;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        Ok(())
    }
}
