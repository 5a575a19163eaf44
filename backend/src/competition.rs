use std::sync::Arc;
use time::Duration;
use tracing::info;
use shared::{CompetitionState, CompetitionUpdate, Phase, Timestamp};
use crate::error::ApiError;
use crate::store::Store;

/// Lifecycle of the single competition record. Every transition is a merge
/// upsert; an elapsed end time never changes the stored phase.
#[derive(Clone)]
pub struct Competition {
    store: Arc<dyn Store>,
}

impl Competition {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get(&self) -> Result<CompetitionState, ApiError> {
        Ok(self.store.competition().await?)
    }

    pub async fn start(&self, duration_minutes: f64, now: Timestamp) -> Result<CompetitionState, ApiError> {
        let end_time = now
            .checked_add(Duration::seconds_f64(duration_minutes * 60.0))
            .ok_or_else(|| ApiError::Validation("durationMinutes out of range".into()))?;

        let state = self.store
            .update_competition(CompetitionUpdate { status: Phase::Running, end_time: Some(end_time) })
            .await?;
        info!(end_time = %end_time, "Competition started");
        Ok(state)
    }

    pub async fn pause(&self) -> Result<CompetitionState, ApiError> {
        let state = self.store.update_competition(CompetitionUpdate::status(Phase::Paused)).await?;
        info!("Competition paused");
        Ok(state)
    }

    pub async fn end(&self) -> Result<CompetitionState, ApiError> {
        let state = self.store.update_competition(CompetitionUpdate::status(Phase::Ended)).await?;
        info!("Competition ended");
        Ok(state)
    }

    pub async fn ensure_voting_open(&self, now: Timestamp) -> Result<(), ApiError> {
        self.get().await?.voting_window(now).map_err(ApiError::from)
    }
}
