use serde::{Serialize, Deserialize};

pub const UNKNOWN_IP: &str = "0.0.0.0";

/// Request metadata a voter fingerprint is derived from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub ip: String,
    pub user_agent: String,
}

impl UserInfo {
    pub fn new(ip: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self { ip: ip.into(), user_agent: user_agent.into() }
    }

    /// Fingerprint input: `ip::agent`.
    pub fn fingerprint_input(&self) -> String {
        format!("{}::{}", self.ip, self.user_agent)
    }
}

/// First hop of a forwarded-for chain, if it names anything.
pub fn first_forwarded(header: &str) -> Option<&str> {
    header.split(',')
        .next()
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
}

// Backend-specific Rocket implementation
#[cfg(feature = "backend")]
mod backend_impl {
    use super::*;
    use rocket::request::{FromRequest, Outcome};
    use rocket::Request;

    #[rocket::async_trait]
    impl<'r> FromRequest<'r> for UserInfo {
        type Error = ();

        async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
            let headers = req.headers();
            let ip = headers.get_one("X-Forwarded-For")
                .and_then(first_forwarded)
                .map(str::to_string)
                .or_else(|| headers.get_one("X-Real-IP").map(|ip| ip.trim().to_string()))
                .or_else(|| req.remote().map(|addr| addr.ip().to_string()))
                .unwrap_or_else(|| UNKNOWN_IP.to_string());

            let user_agent = headers.get_one("User-Agent").unwrap_or_default();

            Outcome::Success(UserInfo::new(ip, user_agent))
        }
    }
}
