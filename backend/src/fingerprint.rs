use ring::hmac;
use thiserror::Error;
use shared::user_info::UserInfo;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("HASH_SALT secret is not set")]
    MissingSalt,
}

/// Keyed HMAC-SHA256 over `ip::agent`, rendered as lowercase hex.
///
/// The same address, agent and salt always produce the same token; rotating
/// the salt orphans every earlier fingerprint.
#[derive(Clone)]
pub struct Fingerprinter {
    key: hmac::Key,
}

impl Fingerprinter {
    pub fn new(salt: &str) -> Result<Self, FingerprintError> {
        if salt.trim().is_empty() {
            return Err(FingerprintError::MissingSalt);
        }
        Ok(Self { key: hmac::Key::new(hmac::HMAC_SHA256, salt.as_bytes()) })
    }

    pub fn from_secret(salt: Option<&str>) -> Result<Self, FingerprintError> {
        salt.map_or(Err(FingerprintError::MissingSalt), Self::new)
    }

    pub fn digest(&self, input: &str) -> String {
        hex::encode(hmac::sign(&self.key, input.as_bytes()).as_ref())
    }

    pub fn fingerprint(&self, user: &UserInfo) -> String {
        self.digest(&user.fingerprint_input())
    }
}

/// Leading characters of a fingerprint, enough to correlate log lines.
pub fn short(fingerprint: &str) -> &str {
    fingerprint.get(..8).unwrap_or(fingerprint)
}
