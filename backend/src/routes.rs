use std::sync::Arc;
use rocket::{State, get, post, http::Status, serde::json::Json};
use tracing::instrument;
use shared::{
    AdminRequest, ApiResponse, MessageResponse, RegisterTeamRequest, RegisterTeamResponse, Stats,
    Team, Timestamp, UserInfo, VoteRequest,
};
use crate::{
    admin::{AdminOutcome, AdminSecret, AdminService},
    config::AppConfig,
    error::ApiError,
    fingerprint::Fingerprinter,
    processor::VoteProcessor,
    rate_limiter::RateLimiter,
    registry::TeamRegistry,
    store::Store,
};

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

pub struct AppState {
    pub voting: VoteProcessor,
    pub admin: AdminService,
    pub registry: TeamRegistry,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &AppConfig) -> Self {
        let fingerprinter = Fingerprinter::from_secret(config.hash_salt.as_deref()).ok();
        Self {
            voting: VoteProcessor::new(store.clone(), fingerprinter),
            admin: AdminService::new(store.clone(), config.admin_secret.clone()),
            registry: TeamRegistry::new(
                store,
                RateLimiter::new(config.registration_limit, config.registration_window_minutes),
            ),
        }
    }
}

fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

#[get("/teams")]
pub async fn list_teams(state: &State<AppState>) -> ApiResult<Vec<Team>> {
    ok(state.registry.list_teams().await?)
}

#[get("/stats")]
pub async fn get_stats(state: &State<AppState>) -> ApiResult<Stats> {
    ok(state.registry.stats(Timestamp::now()).await?)
}

#[rocket::options("/<_..>")]
pub async fn all_options() -> Status {
    Status::Ok
}

#[instrument(skip_all)]
#[post("/registerTeam", data = "<request>")]
pub async fn register_team(
    state: &State<AppState>,
    request: Option<Json<RegisterTeamRequest>>,
    user_info: UserInfo,
) -> ApiResult<RegisterTeamResponse> {
    let request = request.map(Json::into_inner).unwrap_or_default();
    ok(state.registry.register(&request, &user_info).await?)
}

#[post("/vote", data = "<request>")]
pub async fn cast_vote(
    state: &State<AppState>,
    request: Option<Json<VoteRequest>>,
    user_info: UserInfo,
) -> ApiResult<MessageResponse> {
    let request = request.map(Json::into_inner).unwrap_or_default();
    ok(state.voting
        .cast_vote(request.team_id.as_deref(), &user_info, Timestamp::now())
        .await?)
}

#[instrument(skip(state, secret, request))]
#[post("/admin/<action>", data = "<request>")]
pub async fn admin_action(
    state: &State<AppState>,
    action: &str,
    secret: AdminSecret,
    request: Option<Json<AdminRequest>>,
) -> ApiResult<AdminOutcome> {
    let request = request.map(Json::into_inner).unwrap_or_default();
    ok(state.admin
        .dispatch(action, secret.0.as_deref(), &request, Timestamp::now())
        .await?)
}
