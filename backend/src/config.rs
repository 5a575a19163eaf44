use std::time::Duration;
use shuttle_runtime::SecretStore;
use tracing::{error, warn};

pub const DEFAULT_REGISTRATION_LIMIT: u32 = 5;
pub const DEFAULT_REGISTRATION_WINDOW_MINUTES: i64 = 15;
pub const DEFAULT_REPO_CHECK_INTERVAL_SECS: u64 = 120;

/// Runtime settings, read once at startup and handed to the services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub admin_secret: Option<String>,
    pub hash_salt: Option<String>,
    pub github_token: Option<String>,
    pub registration_limit: u32,
    pub registration_window_minutes: i64,
    pub repo_check_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_secret: None,
            hash_salt: None,
            github_token: None,
            registration_limit: DEFAULT_REGISTRATION_LIMIT,
            registration_window_minutes: DEFAULT_REGISTRATION_WINDOW_MINUTES,
            repo_check_interval: Duration::from_secs(DEFAULT_REPO_CHECK_INTERVAL_SECS),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid {} value {:?}", key, raw);
            default
        }),
        None => default,
    }
}

impl AppConfig {
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let config = Self {
            admin_secret: non_empty(lookup("ADMIN_SECRET")),
            hash_salt: non_empty(lookup("HASH_SALT")),
            github_token: non_empty(lookup("GITHUB_TOKEN")),
            registration_limit: parse_or(
                "REGISTRATION_LIMIT",
                lookup("REGISTRATION_LIMIT"),
                DEFAULT_REGISTRATION_LIMIT,
            ),
            registration_window_minutes: parse_or(
                "REGISTRATION_WINDOW_MINUTES",
                lookup("REGISTRATION_WINDOW_MINUTES"),
                DEFAULT_REGISTRATION_WINDOW_MINUTES,
            ),
            repo_check_interval: Duration::from_secs(parse_or(
                "REPO_CHECK_INTERVAL_SECS",
                lookup("REPO_CHECK_INTERVAL_SECS"),
                DEFAULT_REPO_CHECK_INTERVAL_SECS,
            ).max(1)),
        };
        config.report_missing();
        config
    }

    pub fn from_secrets(secrets: &SecretStore) -> Self {
        Self::from_lookup(|key| secrets.get(key))
    }

    fn report_missing(&self) {
        if self.hash_salt.is_none() {
            error!("HASH_SALT not found - every vote will be refused until it is set");
        }
        if self.admin_secret.is_none() {
            warn!("ADMIN_SECRET not found - admin endpoints will reject all calls");
        }
        if self.github_token.is_none() {
            warn!("GITHUB_TOKEN not found - repository checks are disabled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_from_lookup() {
        let secrets: HashMap<&str, &str> = [
            ("ADMIN_SECRET", "admin"),
            ("HASH_SALT", "   "),
            ("REGISTRATION_LIMIT", "50"),
            ("REPO_CHECK_INTERVAL_SECS", "soon"),
        ]
        .into_iter()
        .collect();

        let config = AppConfig::from_lookup(|key| secrets.get(key).map(|v| v.to_string()));
        assert_eq!(config.admin_secret.as_deref(), Some("admin"));
        assert_eq!(config.hash_salt, None);
        assert_eq!(config.github_token, None);
        assert_eq!(config.registration_limit, 50);
        assert_eq!(config.registration_window_minutes, DEFAULT_REGISTRATION_WINDOW_MINUTES);
        assert_eq!(config.repo_check_interval, Duration::from_secs(DEFAULT_REPO_CHECK_INTERVAL_SECS));
    }
}
