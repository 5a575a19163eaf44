use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;
use shared::{validate_team_id, MessageResponse, Timestamp, UserInfo};
use crate::competition::Competition;
use crate::error::ApiError;
use crate::fingerprint::{short, Fingerprinter};
use crate::store::Store;

pub const VOTE_RECORDED: &str = "Vote recorded";

#[derive(Clone)]
pub struct VoteProcessor {
    store: Arc<dyn Store>,
    competition: Competition,
    fingerprinter: Option<Arc<Fingerprinter>>,
}

impl VoteProcessor {
    pub fn new(store: Arc<dyn Store>, fingerprinter: Option<Fingerprinter>) -> Self {
        Self {
            competition: Competition::new(store.clone()),
            store,
            fingerprinter: fingerprinter.map(Arc::new),
        }
    }

    fn fingerprinter(&self) -> Result<&Fingerprinter, ApiError> {
        match &self.fingerprinter {
            Some(fp) => Ok(fp),
            None => {
                error!("HASH_SALT secret is not set; refusing to record votes");
                Err(ApiError::Configuration("HASH_SALT missing".into()))
            }
        }
    }

    /// Checks run in a fixed order: team id, phase, end time, fingerprint,
    /// ledger. The ledger insert and counter increment then commit together.
    #[instrument(skip(self, user_info, now))]
    pub async fn cast_vote(
        &self,
        team_id: Option<&str>,
        user_info: &UserInfo,
        now: Timestamp,
    ) -> Result<MessageResponse, ApiError> {
        let team_id = validate_team_id(team_id)?;
        self.competition.ensure_voting_open(now).await?;

        let fingerprint = self.fingerprinter()?.fingerprint(user_info);

        if self.store.has_voted(&fingerprint).await? {
            debug!(voter = short(&fingerprint), "Duplicate vote rejected");
            return Err(ApiError::AlreadyVoted);
        }

        let team_id = Uuid::parse_str(team_id).map_err(|_| ApiError::TeamNotFound)?;
        let record = self.store.record_vote(team_id, &fingerprint).await?;

        info!(team = %record.team_id, voter = short(&fingerprint), "Vote recorded");
        Ok(MessageResponse { message: VOTE_RECORDED.into() })
    }
}
