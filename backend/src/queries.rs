use sqlx::{FromRow, PgPool};
use sqlx::types::Json;
use time::OffsetDateTime;
use tracing::debug;
use uuid::Uuid;
use shared::models::*;
use crate::store::{ResetSummary, Store, StoreError};

const TEAM_COLUMNS: &str = "id, name, department, faculty, github_username, members, repo_name, repo_url, \
     votes, last_updated, created_at, staged, committed, pushed";

#[derive(FromRow)]
struct TeamRow {
    id: Uuid,
    name: String,
    department: String,
    faculty: String,
    github_username: String,
    members: Json<Vec<Member>>,
    repo_name: String,
    repo_url: String,
    votes: i64,
    last_updated: OffsetDateTime,
    created_at: OffsetDateTime,
    staged: bool,
    committed: bool,
    pushed: bool,
}

impl From<TeamRow> for Team {
    fn from(row: TeamRow) -> Self {
        Team {
            id: row.id,
            name: row.name,
            department: row.department,
            faculty: row.faculty,
            github_username: row.github_username,
            members: row.members.0,
            repo_name: row.repo_name,
            repo_url: row.repo_url,
            votes: row.votes,
            last_updated: row.last_updated.into(),
            created_at: row.created_at.into(),
            git_stages: GitStages {
                staged: row.staged,
                committed: row.committed,
                pushed: row.pushed,
            },
        }
    }
}

#[derive(FromRow)]
struct CompetitionRow {
    status: Phase,
    end_time: Option<OffsetDateTime>,
}

impl From<CompetitionRow> for CompetitionState {
    fn from(row: CompetitionRow) -> Self {
        CompetitionState {
            status: row.status,
            end_time: row.end_time.map(Into::into),
        }
    }
}

fn classify_vote_error(e: sqlx::Error) -> StoreError {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => StoreError::DuplicateFingerprint,
        Some(db) if db.is_foreign_key_violation() => StoreError::TeamNotFound,
        _ => StoreError::from(e),
    }
}

/// PostgreSQL-backed store. Ledger uniqueness rests on the
/// `votes_fingerprint_key` constraint.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[rocket::async_trait]
impl Store for PgStore {
    async fn competition(&self) -> Result<CompetitionState, StoreError> {
        let row = sqlx::query_as::<_, CompetitionRow>(
            "SELECT status, end_time FROM competition WHERE id = 1"
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into).unwrap_or_default())
    }

    async fn update_competition(&self, update: CompetitionUpdate) -> Result<CompetitionState, StoreError> {
        let row = sqlx::query_as::<_, CompetitionRow>(
            "INSERT INTO competition (id, status, end_time) VALUES (1, $1, $2)
             ON CONFLICT (id) DO UPDATE
             SET status = EXCLUDED.status,
                 end_time = COALESCE(EXCLUDED.end_time, competition.end_time),
                 updated_at = NOW()
             RETURNING status, end_time"
        )
        .bind(update.status)
        .bind(update.end_time.map(OffsetDateTime::from))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn has_voted(&self, fingerprint: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM votes WHERE fingerprint = $1)"
        )
        .bind(fingerprint)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn record_vote(&self, team_id: Uuid, fingerprint: &str) -> Result<VoteRecord, StoreError> {
        let mut tx = self.pool.begin().await?;

        let team_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM teams WHERE id = $1)"
        )
        .bind(team_id)
        .fetch_one(&mut *tx)
        .await?;

        if !team_exists {
            return Err(StoreError::TeamNotFound);
        }

        let (id, created_at) = sqlx::query_as::<_, (Uuid, OffsetDateTime)>(
            "INSERT INTO votes (team_id, fingerprint) VALUES ($1, $2)
             RETURNING id, created_at"
        )
        .bind(team_id)
        .bind(fingerprint)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify_vote_error)?;

        sqlx::query(
            "UPDATE teams SET votes = votes + 1, last_updated = NOW() WHERE id = $1"
        )
        .bind(team_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(classify_vote_error)?;

        Ok(VoteRecord {
            id,
            team_id,
            fingerprint: fingerprint.to_string(),
            created_at: created_at.into(),
        })
    }

    async fn reset_votes(&self, chunk_size: usize) -> Result<ResetSummary, StoreError> {
        let chunk_size = chunk_size.max(1) as i64;
        let mut summary = ResetSummary::default();

        loop {
            let deleted = sqlx::query_scalar::<_, i64>(
                r#"
                WITH doomed AS (
                    SELECT id FROM votes ORDER BY created_at, id LIMIT $1
                ), deleted AS (
                    DELETE FROM votes v USING doomed WHERE v.id = doomed.id
                    RETURNING v.team_id
                ), per_team AS (
                    SELECT team_id, COUNT(*) AS n FROM deleted GROUP BY team_id
                ), adjusted AS (
                    UPDATE teams t
                    SET votes = GREATEST(t.votes - per_team.n, 0), last_updated = NOW()
                    FROM per_team WHERE t.id = per_team.team_id
                    RETURNING t.id
                )
                SELECT COUNT(*) FROM deleted
                "#
            )
            .bind(chunk_size)
            .fetch_one(&self.pool)
            .await?;

            if deleted == 0 {
                break;
            }
            summary.votes_deleted += deleted as u64;
            debug!(deleted, total = summary.votes_deleted, "Deleted ledger chunk");
        }

        // Inserts wait on the SHARE lock, so no in-flight vote can be
        // half-visible while stray counters are cleared.
        let mut tx = self.pool.begin().await?;
        sqlx::query("LOCK TABLE votes IN SHARE MODE")
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE teams SET votes = 0, last_updated = NOW()
             WHERE votes <> 0
               AND NOT EXISTS (SELECT 1 FROM votes WHERE votes.team_id = teams.id)"
        )
        .execute(&mut *tx)
        .await?;
        let teams = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teams")
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        summary.teams_reset = teams as u64;
        Ok(summary)
    }

    async fn ledger_size(&self) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM votes")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn create_team(&self, team: NewTeam) -> Result<Team, StoreError> {
        let row = sqlx::query_as::<_, TeamRow>(&format!(
            "INSERT INTO teams (name, department, faculty, github_username, members, repo_name, repo_url)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TEAM_COLUMNS}"
        ))
        .bind(&team.name)
        .bind(&team.department)
        .bind(&team.faculty)
        .bind(&team.github_username)
        .bind(Json(&team.members))
        .bind(&team.repo_name)
        .bind(&team.repo_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn team_exists(&self, team_id: Uuid) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM teams WHERE id = $1)"
        )
        .bind(team_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn list_teams(&self) -> Result<Vec<Team>, StoreError> {
        let rows = sqlx::query_as::<_, TeamRow>(&format!(
            "SELECT {TEAM_COLUMNS} FROM teams ORDER BY votes DESC, created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_pushed(&self, team_id: Uuid, live_url: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE teams SET pushed = TRUE, repo_url = $2, last_updated = NOW()
             WHERE id = $1 AND NOT pushed"
        )
        .bind(team_id)
        .bind(live_url)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        if self.team_exists(team_id).await? {
            Ok(false)
        } else {
            Err(StoreError::TeamNotFound)
        }
    }
}
