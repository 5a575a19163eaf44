use std::str::FromStr;
use std::sync::Arc;
use ring::constant_time::verify_slices_are_equal;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use tracing::{info, warn};
use shared::{validate_duration_minutes, AdminRequest, Phase, PhaseResponse, ResetResponse, Timestamp};
use crate::competition::Competition;
use crate::error::ApiError;
use crate::store::{Store, RESET_CHUNK_SIZE};

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Secret presented by the caller in the `x-admin-secret` header, if any.
pub struct AdminSecret(pub Option<String>);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminSecret {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(AdminSecret(req.headers().get_one(ADMIN_SECRET_HEADER).map(str::to_string)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Start,
    Pause,
    End,
    ResetVotes,
}

impl FromStr for AdminAction {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(AdminAction::Start),
            "pause" => Ok(AdminAction::Pause),
            "end" => Ok(AdminAction::End),
            "resetVotes" => Ok(AdminAction::ResetVotes),
            _ => Err(ApiError::Validation("Unknown action".into())),
        }
    }
}

/// Admin reply: either a phase change or a reset summary.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum AdminOutcome {
    Phase(PhaseResponse),
    Reset(ResetResponse),
}

#[derive(Clone)]
pub struct AdminService {
    secret: Option<Arc<str>>,
    store: Arc<dyn Store>,
    competition: Competition,
    reset_chunk_size: usize,
}

impl AdminService {
    pub fn new(store: Arc<dyn Store>, secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()).map(Arc::from),
            competition: Competition::new(store.clone()),
            store,
            reset_chunk_size: RESET_CHUNK_SIZE,
        }
    }

    pub fn with_reset_chunk_size(mut self, size: usize) -> Self {
        self.reset_chunk_size = size.max(1);
        self
    }

    pub fn authorize(&self, provided: Option<&str>) -> Result<(), ApiError> {
        let Some(expected) = &self.secret else {
            warn!("Admin call rejected: ADMIN_SECRET is not configured");
            return Err(ApiError::Unauthorized);
        };
        match provided {
            Some(given) if verify_slices_are_equal(given.as_bytes(), expected.as_bytes()).is_ok() => Ok(()),
            _ => {
                warn!("Admin call rejected: bad secret");
                Err(ApiError::Unauthorized)
            }
        }
    }

    /// Authorizes first, so an unknown action with a bad secret is still 401.
    pub async fn dispatch(
        &self,
        action: &str,
        header_secret: Option<&str>,
        request: &AdminRequest,
        now: Timestamp,
    ) -> Result<AdminOutcome, ApiError> {
        let provided = header_secret
            .filter(|s| !s.is_empty())
            .or(request.secret.as_deref());
        self.authorize(provided)?;

        match action.parse::<AdminAction>()? {
            AdminAction::Start => {
                let minutes = validate_duration_minutes(request.duration_minutes)?;
                self.start(minutes, now).await.map(AdminOutcome::Phase)
            }
            AdminAction::Pause => self.pause().await.map(AdminOutcome::Phase),
            AdminAction::End => self.end().await.map(AdminOutcome::Phase),
            AdminAction::ResetVotes => self.reset_votes().await.map(AdminOutcome::Reset),
        }
    }

    pub async fn start(&self, duration_minutes: f64, now: Timestamp) -> Result<PhaseResponse, ApiError> {
        let state = self.competition.start(duration_minutes, now).await?;
        Ok(PhaseResponse { status: Phase::Running, end_time: state.end_time })
    }

    pub async fn pause(&self) -> Result<PhaseResponse, ApiError> {
        self.competition.pause().await?;
        Ok(PhaseResponse { status: Phase::Paused, end_time: None })
    }

    pub async fn end(&self) -> Result<PhaseResponse, ApiError> {
        self.competition.end().await?;
        Ok(PhaseResponse { status: Phase::Ended, end_time: None })
    }

    pub async fn reset_votes(&self) -> Result<ResetResponse, ApiError> {
        let summary = self.store.reset_votes(self.reset_chunk_size).await?;
        info!(
            votes_deleted = summary.votes_deleted,
            teams_reset = summary.teams_reset,
            "Votes reset"
        );
        Ok(ResetResponse {
            message: "Votes reset".into(),
            votes_deleted: summary.votes_deleted,
            teams_reset: summary.teams_reset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn service(secret: Option<&str>) -> AdminService {
        AdminService::new(Arc::new(MemoryStore::new()), secret.map(str::to_string))
    }

    #[test]
    fn test_authorize() {
        let admin = service(Some("hunter2"));
        assert!(admin.authorize(Some("hunter2")).is_ok());
        assert!(matches!(admin.authorize(Some("hunter3")), Err(ApiError::Unauthorized)));
        assert!(matches!(admin.authorize(Some("")), Err(ApiError::Unauthorized)));
        assert!(matches!(admin.authorize(None), Err(ApiError::Unauthorized)));
    }

    #[test]
    fn test_missing_server_secret_rejects_everything() {
        for admin in [service(None), service(Some(""))] {
            assert!(matches!(admin.authorize(Some("")), Err(ApiError::Unauthorized)));
            assert!(matches!(admin.authorize(None), Err(ApiError::Unauthorized)));
        }
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("start".parse::<AdminAction>().unwrap(), AdminAction::Start);
        assert_eq!("resetVotes".parse::<AdminAction>().unwrap(), AdminAction::ResetVotes);
        assert!("reset".parse::<AdminAction>().is_err());
    }

    #[tokio::test]
    async fn test_dispatch_checks_secret_before_action() {
        let admin = service(Some("s3cret"));
        let now = Timestamp::now();
        let request = AdminRequest::default();

        let err = admin.dispatch("explode", Some("wrong"), &request, now).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let err = admin.dispatch("explode", Some("s3cret"), &request, now).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref m) if m == "Unknown action"));
    }

    #[tokio::test]
    async fn test_body_secret_accepted() {
        let admin = service(Some("s3cret"));
        let request = AdminRequest { duration_minutes: Some(5.0), secret: Some("s3cret".into()) };
        let outcome = admin.dispatch("start", None, &request, Timestamp::now()).await.unwrap();
        assert!(matches!(outcome, AdminOutcome::Phase(PhaseResponse { status: Phase::Running, end_time: Some(_) })));
    }

    #[tokio::test]
    async fn test_empty_header_falls_back_to_body_secret() {
        let admin = service(Some("s3cret"));
        let request = AdminRequest { duration_minutes: None, secret: Some("s3cret".into()) };
        let outcome = admin.dispatch("pause", Some(""), &request, Timestamp::now()).await.unwrap();
        assert!(matches!(outcome, AdminOutcome::Phase(PhaseResponse { status: Phase::Paused, .. })));

        let err = admin.dispatch("pause", Some("wrong"), &request, Timestamp::now()).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
    }

    #[tokio::test]
    async fn test_start_defaults_to_an_hour() {
        let admin = service(Some("s3cret"));
        let now = Timestamp::from_millis(1_000_000).unwrap();
        let outcome = admin.dispatch("start", Some("s3cret"), &AdminRequest::default(), now).await.unwrap();
        let AdminOutcome::Phase(phase) = outcome else { panic!("expected phase outcome") };
        assert_eq!(phase.end_time, Timestamp::from_millis(1_000_000 + 60 * 60 * 1000).ok());
    }

    #[tokio::test]
    async fn test_invalid_duration_changes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let admin = AdminService::new(store.clone(), Some("s3cret".into()));
        let request = AdminRequest { duration_minutes: Some(-3.0), secret: None };
        let err = admin.dispatch("start", Some("s3cret"), &request, Timestamp::now()).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
        assert_eq!(store.competition().await.unwrap().status, Phase::Setup);
    }
}
