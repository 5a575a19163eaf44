use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;
use shared::models::*;
use shared::Timestamp;

/// Largest number of ledger rows removed in one reset batch.
pub const RESET_CHUNK_SIZE: usize = 400;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Team not found")]
    TeamNotFound,
    #[error("Fingerprint already has a vote")]
    DuplicateFingerprint,
    #[error("Store lock poisoned")]
    LockFailed,
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResetSummary {
    pub votes_deleted: u64,
    pub teams_reset: u64,
}

/// Persistence for teams, the vote ledger, and the competition record.
///
/// `record_vote` must be all-or-nothing: the ledger entry and the counter
/// increment either both land or neither does, and two calls with the same
/// fingerprint can never both succeed.
#[rocket::async_trait]
pub trait Store: Send + Sync {
    async fn competition(&self) -> Result<CompetitionState, StoreError>;

    async fn update_competition(&self, update: CompetitionUpdate) -> Result<CompetitionState, StoreError>;

    async fn has_voted(&self, fingerprint: &str) -> Result<bool, StoreError>;

    async fn record_vote(&self, team_id: Uuid, fingerprint: &str) -> Result<VoteRecord, StoreError>;

    /// Clears the ledger in batches of at most `chunk_size`, keeping every
    /// counter equal to its team's remaining ledger entries after each batch.
    async fn reset_votes(&self, chunk_size: usize) -> Result<ResetSummary, StoreError>;

    async fn ledger_size(&self) -> Result<u64, StoreError>;

    async fn create_team(&self, team: NewTeam) -> Result<Team, StoreError>;

    async fn team_exists(&self, team_id: Uuid) -> Result<bool, StoreError>;

    /// All teams, most votes first.
    async fn list_teams(&self) -> Result<Vec<Team>, StoreError>;

    /// Sets the pushed stage and live URL. Returns false when the team was
    /// already pushed; a pushed flag is never cleared.
    async fn mark_pushed(&self, team_id: Uuid, live_url: &str) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    teams: HashMap<Uuid, Team>,
    ledger: HashMap<String, VoteRecord>,
    competition: Option<CompetitionState>,
}

/// Process-local store. One lock guards teams, ledger and competition, so
/// each operation is a single critical section.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::LockFailed)
    }
}

#[rocket::async_trait]
impl Store for MemoryStore {
    async fn competition(&self) -> Result<CompetitionState, StoreError> {
        Ok(self.lock()?.competition.unwrap_or_default())
    }

    async fn update_competition(&self, update: CompetitionUpdate) -> Result<CompetitionState, StoreError> {
        let mut state = self.lock()?;
        let competition = state.competition.get_or_insert_with(CompetitionState::default);
        update.apply(competition);
        Ok(*competition)
    }

    async fn has_voted(&self, fingerprint: &str) -> Result<bool, StoreError> {
        Ok(self.lock()?.ledger.contains_key(fingerprint))
    }

    async fn record_vote(&self, team_id: Uuid, fingerprint: &str) -> Result<VoteRecord, StoreError> {
        let mut state = self.lock()?;
        if !state.teams.contains_key(&team_id) {
            return Err(StoreError::TeamNotFound);
        }
        if state.ledger.contains_key(fingerprint) {
            return Err(StoreError::DuplicateFingerprint);
        }

        let now = Timestamp::now();
        let record = VoteRecord {
            id: Uuid::new_v4(),
            team_id,
            fingerprint: fingerprint.to_string(),
            created_at: now,
        };
        state.ledger.insert(fingerprint.to_string(), record.clone());
        if let Some(team) = state.teams.get_mut(&team_id) {
            team.votes += 1;
            team.last_updated = now;
        }
        Ok(record)
    }

    async fn reset_votes(&self, chunk_size: usize) -> Result<ResetSummary, StoreError> {
        let chunk_size = chunk_size.max(1);
        let mut summary = ResetSummary::default();

        loop {
            let mut state = self.lock()?;
            let batch: Vec<String> = state.ledger.keys().take(chunk_size).cloned().collect();
            if batch.is_empty() {
                break;
            }
            let now = Timestamp::now();
            for fingerprint in batch {
                if let Some(record) = state.ledger.remove(&fingerprint) {
                    if let Some(team) = state.teams.get_mut(&record.team_id) {
                        team.votes = (team.votes - 1).max(0);
                        team.last_updated = now;
                    }
                    summary.votes_deleted += 1;
                }
            }
        }

        let mut state = self.lock()?;
        let MemoryState { teams, ledger, .. } = &mut *state;
        let now = Timestamp::now();
        let voted: HashSet<Uuid> = ledger.values().map(|r| r.team_id).collect();
        for team in teams.values_mut() {
            if team.votes != 0 && !voted.contains(&team.id) {
                team.votes = 0;
                team.last_updated = now;
            }
        }
        summary.teams_reset = teams.len() as u64;
        Ok(summary)
    }

    async fn ledger_size(&self) -> Result<u64, StoreError> {
        Ok(self.lock()?.ledger.len() as u64)
    }

    async fn create_team(&self, team: NewTeam) -> Result<Team, StoreError> {
        let now = Timestamp::now();
        let team = Team {
            id: Uuid::new_v4(),
            name: team.name,
            department: team.department,
            faculty: team.faculty,
            github_username: team.github_username,
            members: team.members,
            repo_name: team.repo_name,
            repo_url: team.repo_url,
            votes: 0,
            last_updated: now,
            created_at: now,
            git_stages: GitStages::default(),
        };
        self.lock()?.teams.insert(team.id, team.clone());
        Ok(team)
    }

    async fn team_exists(&self, team_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.lock()?.teams.contains_key(&team_id))
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let mut teams: Vec<Team> = self.lock()?.teams.values().cloned().collect();
        shared::sort_standings(&mut teams);
        Ok(teams)
    }

    async fn mark_pushed(&self, team_id: Uuid, live_url: &str) -> Result<bool, StoreError> {
        let mut state = self.lock()?;
        let team = state.teams.get_mut(&team_id).ok_or(StoreError::TeamNotFound)?;
        if team.git_stages.pushed {
            return Ok(false);
        }
        team.git_stages.pushed = true;
        team.repo_url = live_url.to_string();
        team.last_updated = Timestamp::now();
        Ok(true)
    }
}
