use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use thiserror::Error;
use tracing::error;
use shared::{ApiResponse, ErrorCode, ValidationError, VotingClosed};
use crate::store::StoreError;

pub const GENERIC_FAILURE: &str = "Request failed";

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Voting is not active.")]
    VotingNotActive,
    #[error("Voting period has ended.")]
    VotingEnded,
    #[error("You have already voted.")]
    AlreadyVoted,
    #[error("{0}")]
    RateLimited(String),
    #[error("Team not found")]
    TeamNotFound,
    #[error("Server not configured: {0}")]
    Configuration(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::InvalidInput,
            ApiError::Unauthorized => ErrorCode::Unauthorized,
            ApiError::VotingNotActive | ApiError::VotingEnded => ErrorCode::VotingClosed,
            ApiError::AlreadyVoted => ErrorCode::Conflict,
            ApiError::RateLimited(_) => ErrorCode::RateLimited,
            ApiError::TeamNotFound => ErrorCode::NotFound,
            ApiError::Configuration(_) => ErrorCode::Configuration,
            ApiError::Internal(_) => ErrorCode::SystemError,
        }
    }

    pub fn status(&self) -> Status {
        Status::from_code(self.code().http_status()).unwrap_or(Status::InternalServerError)
    }

    /// Message placed in the response envelope.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Configuration(_) => "Server not configured.".into(),
            ApiError::Internal(_) => GENERIC_FAILURE.into(),
            other => other.to_string(),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<VotingClosed> for ApiError {
    fn from(reason: VotingClosed) -> Self {
        match reason {
            VotingClosed::NotActive => ApiError::VotingNotActive,
            VotingClosed::PeriodEnded => ApiError::VotingEnded,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::TeamNotFound => ApiError::TeamNotFound,
            StoreError::DuplicateFingerprint => ApiError::AlreadyVoted,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for ApiError {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        if !self.code().is_client_facing() {
            error!(path = %req.uri().path(), "{}", self);
        }

        let status = self.status();
        let body = Json(ApiResponse::failure(self.public_message()));

        rocket::Response::build_from(body.respond_to(req)?)
            .status(status)
            .ok()
    }
}
