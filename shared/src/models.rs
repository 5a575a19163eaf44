use serde::{Serialize, Deserialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use crate::timestamp::Timestamp;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "backend", derive(sqlx::Type))]
#[cfg_attr(feature = "backend", sqlx(type_name = "competition_phase", rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Setup,
    Running,
    Paused,
    Ended,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Ended => "ended",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Phase::Setup),
            "running" => Ok(Phase::Running),
            "paused" => Ok(Phase::Paused),
            "ended" => Ok(Phase::Ended),
            other => Err(format!("Unknown phase: {}", other)),
        }
    }
}

/// Why the competition is not accepting votes right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VotingClosed {
    NotActive,
    PeriodEnded,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitionState {
    pub status: Phase,
    pub end_time: Option<Timestamp>,
}

impl CompetitionState {
    pub fn voting_window(&self, now: Timestamp) -> Result<(), VotingClosed> {
        if self.status != Phase::Running {
            return Err(VotingClosed::NotActive);
        }
        match self.end_time {
            Some(end) if end <= now => Err(VotingClosed::PeriodEnded),
            _ => Ok(()),
        }
    }

    pub fn time_remaining(&self, now: Timestamp) -> Option<i64> {
        self.end_time.map(|end| end.millis_after(now))
    }
}

/// Partial write to the competition record; `None` fields keep their stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompetitionUpdate {
    pub status: Phase,
    pub end_time: Option<Timestamp>,
}

impl CompetitionUpdate {
    pub fn status(status: Phase) -> Self {
        Self { status, end_time: None }
    }

    pub fn apply(&self, current: &mut CompetitionState) {
        current.status = self.status;
        if let Some(end) = self.end_time {
            current.end_time = Some(end);
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GitStages {
    pub staged: bool,
    pub committed: bool,
    pub pushed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub name: String,
    pub email: String,
    pub is_leader: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub department: String,
    pub faculty: String,
    pub github_username: String,
    pub members: Vec<Member>,
    pub repo_name: String,
    pub repo_url: String,
    pub votes: i64,
    pub last_updated: Timestamp,
    pub created_at: Timestamp,
    pub git_stages: GitStages,
}

/// A validated registration ready to be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTeam {
    pub name: String,
    pub department: String,
    pub faculty: String,
    pub github_username: String,
    pub members: Vec<Member>,
    pub repo_name: String,
    pub repo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRecord {
    pub id: Uuid,
    pub team_id: Uuid,
    pub fingerprint: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeamRequest {
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub faculty: Option<String>,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub members: Option<Vec<Option<MemberInput>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTeamResponse {
    pub id: Uuid,
    pub repo_name: String,
    pub repo_url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    pub team_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRequest {
    #[serde(default)]
    pub duration_minutes: Option<f64>,
    #[serde(default)]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResponse {
    pub status: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetResponse {
    pub message: String,
    pub votes_deleted: u64,
    pub teams_reset: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub id: Uuid,
    pub name: String,
    pub votes: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub team_count: usize,
    pub meme_count: usize,
    pub vote_count: i64,
    pub leaderboard: Vec<LeaderboardEntry>,
    pub status: Phase,
    pub end_time: Option<Timestamp>,
    pub time_remaining: Option<i64>,
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { ok: true, data: Some(data), error: None }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: impl Into<String>) -> Self {
        Self { ok: false, data: None, error: Some(error.into()) }
    }
}

impl Team {
    pub fn is_pushed(&self) -> bool {
        self.git_stages.pushed
    }
}
