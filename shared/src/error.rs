use serde::{Serialize, Deserialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum ErrorCode {
    #[error("Invalid input provided")]
    InvalidInput,
    #[error("Operation not authorized")]
    Unauthorized,
    #[error("Voting is not permitted right now")]
    VotingClosed,
    #[error("Resource conflict")]
    Conflict,
    #[error("Rate limit exceeded")]
    RateLimited,
    #[error("Resource not found")]
    NotFound,
    #[error("Server is not configured")]
    Configuration,
    #[error("Internal system error")]
    SystemError,
}

impl ErrorCode {
    pub const fn http_status(self) -> u16 {
        match self {
            ErrorCode::InvalidInput => 400,
            ErrorCode::Unauthorized => 401,
            ErrorCode::VotingClosed => 403,
            ErrorCode::NotFound => 404,
            ErrorCode::Conflict | ErrorCode::RateLimited => 429,
            ErrorCode::Configuration | ErrorCode::SystemError => 500,
        }
    }

    /// Soft rejections carry a message meant for the voter; everything
    /// else is reported generically.
    pub const fn is_client_facing(self) -> bool {
        !matches!(self, ErrorCode::Configuration | ErrorCode::SystemError)
    }
}
