use std::sync::Arc;
use rustrict::CensorStr;
use tracing::{info, instrument};
use uuid::Uuid;
use shared::{
    compute_stats, validate_registration, RegisterTeamRequest, RegisterTeamResponse, Stats, Team,
    Timestamp, UserInfo,
};
use crate::error::ApiError;
use crate::rate_limiter::RateLimiter;
use crate::store::Store;

pub struct TeamRegistry {
    store: Arc<dyn Store>,
    limiter: RateLimiter,
}

impl TeamRegistry {
    pub fn new(store: Arc<dyn Store>, limiter: RateLimiter) -> Self {
        Self { store, limiter }
    }

    #[instrument(skip_all)]
    pub async fn register(
        &self,
        request: &RegisterTeamRequest,
        user_info: &UserInfo,
    ) -> Result<RegisterTeamResponse, ApiError> {
        let team = validate_registration(request)?;

        if team.name.is_inappropriate() {
            return Err(ApiError::Validation(format!(
                "Possible profanity detected in team name: {}",
                team.name
            )));
        }

        self.limiter.check_rate_limit(&format!("register:{}", user_info.ip))?;

        let team = self.store.create_team(team).await?;
        info!(team = %team.id, repo = %team.repo_name, "Team registered");

        Ok(RegisterTeamResponse {
            id: team.id,
            repo_name: team.repo_name,
            repo_url: team.repo_url,
        })
    }

    pub async fn team_exists(&self, team_id: Uuid) -> Result<bool, ApiError> {
        Ok(self.store.team_exists(team_id).await?)
    }

    pub async fn list_teams(&self) -> Result<Vec<Team>, ApiError> {
        Ok(self.store.list_teams().await?)
    }

    pub async fn stats(&self, now: Timestamp) -> Result<Stats, ApiError> {
        let (teams, competition) = futures::try_join!(self.store.list_teams(), self.store.competition())?;
        Ok(compute_stats(&teams, &competition, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::MemberInput;
    use crate::store::MemoryStore;

    fn request(name: &str) -> RegisterTeamRequest {
        RegisterTeamRequest {
            team_name: Some(name.into()),
            department: Some("CS".into()),
            faculty: Some("Science".into()),
            github_username: Some("octo".into()),
            members: Some(vec![Some(MemberInput::default()); 3]),
        }
    }

    #[tokio::test]
    async fn test_register_then_exists() {
        let registry = TeamRegistry::new(Arc::new(MemoryStore::new()), RateLimiter::new(10, 15));
        let user = UserInfo::new("127.0.0.1", "agent");

        let created = registry.register(&request("Cat Pics"), &user).await.unwrap();
        assert!(registry.team_exists(created.id).await.unwrap());
        assert!(!registry.team_exists(Uuid::new_v4()).await.unwrap());
        assert_eq!(created.repo_name, "cat-pics-meme-war");

        let stats = registry.stats(Timestamp::now()).await.unwrap();
        assert_eq!(stats.team_count, 1);
        assert_eq!(stats.vote_count, 0);
    }

    #[tokio::test]
    async fn test_rate_limit_per_address() {
        let registry = TeamRegistry::new(Arc::new(MemoryStore::new()), RateLimiter::new(1, 15));
        let first = UserInfo::new("10.0.0.1", "agent");
        let second = UserInfo::new("10.0.0.2", "agent");

        registry.register(&request("One"), &first).await.unwrap();
        let err = registry.register(&request("Two"), &first).await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(_)));
        registry.register(&request("Two"), &second).await.unwrap();
    }
}
