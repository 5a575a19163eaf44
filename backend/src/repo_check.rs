//! Background producer that marks teams as pushed once their repository has
//! a commit. It only ever sets the flag; voting never waits on it.

use std::sync::Arc;
use std::time::Duration;
use futures::stream::{self, StreamExt};
use reqwest::StatusCode;
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info, warn};
use shared::{pages_url_for, Team};
use crate::store::{Store, StoreError};

const GITHUB_API: &str = "https://api.github.com";
const CONCURRENT_PROBES: usize = 4;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("GitHub request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("GitHub returned {0}")]
    Status(StatusCode),
}

#[rocket::async_trait]
pub trait RepoProbe: Send + Sync {
    /// Whether `owner/repo` exists and has at least one commit.
    async fn has_commits(&self, owner: &str, repo: &str) -> Result<bool, ProbeError>;
}

pub struct GithubProbe {
    client: reqwest::Client,
    token: String,
    base_url: String,
}

impl GithubProbe {
    pub fn new(token: impl Into<String>) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .user_agent("meme-war-backend")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, token: token.into(), base_url: GITHUB_API.into() })
    }
}

#[rocket::async_trait]
impl RepoProbe for GithubProbe {
    async fn has_commits(&self, owner: &str, repo: &str) -> Result<bool, ProbeError> {
        let url = format!("{}/repos/{}/{}/commits?per_page=1", self.base_url, owner, repo);
        let response = self.client
            .get(&url)
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await?;

        match response.status() {
            // 404: no such repository yet. 409: repository exists but is empty.
            StatusCode::NOT_FOUND | StatusCode::CONFLICT => Ok(false),
            status if status.is_success() => {
                let commits: Vec<serde_json::Value> = response.json().await?;
                Ok(!commits.is_empty())
            }
            status => Err(ProbeError::Status(status)),
        }
    }
}

fn needs_check(team: &Team) -> bool {
    !team.git_stages.pushed
        && !team.github_username.trim().is_empty()
        && !team.repo_name.trim().is_empty()
}

/// One polling pass. Returns how many teams were newly marked as pushed.
pub async fn check_repos(store: &dyn Store, probe: &dyn RepoProbe) -> Result<usize, StoreError> {
    let teams = store.list_teams().await?;
    let pending: Vec<Team> = teams.into_iter().filter(needs_check).collect();
    debug!("Checking {} team repositories", pending.len());

    let found: Vec<Team> = stream::iter(pending)
        .map(|team| async move {
            match probe.has_commits(&team.github_username, &team.repo_name).await {
                Ok(true) => Some(team),
                Ok(false) => None,
                Err(e) => {
                    warn!(team = %team.id, repo = %team.repo_name, "Repository check failed: {}", e);
                    None
                }
            }
        })
        .buffer_unordered(CONCURRENT_PROBES)
        .filter_map(|team| async move { team })
        .collect()
        .await;

    let mut updated = 0;
    for team in found {
        let live_url = pages_url_for(&team.github_username, &team.repo_name);
        if store.mark_pushed(team.id, &live_url).await? {
            info!(team = %team.id, url = %live_url, "Meme pushed");
            updated += 1;
        }
    }
    Ok(updated)
}

pub async fn run_repo_check_task(store: Arc<dyn Store>, probe: Arc<dyn RepoProbe>, every: Duration) {
    let mut interval = interval(every);
    info!("🔍 Repository check service started");

    loop {
        interval.tick().await;
        match check_repos(store.as_ref(), probe.as_ref()).await {
            Ok(0) => {}
            Ok(count) => info!("Marked {} team(s) as pushed", count),
            Err(e) => error!("Repository check failed: {}", e),
        }
    }
}
