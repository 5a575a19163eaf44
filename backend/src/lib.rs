pub mod admin;
pub mod catchers;
pub mod competition;
pub mod config;
pub mod cors;
pub mod error;
pub mod fingerprint;
pub mod processor;
pub mod queries;
pub mod rate_limiter;
pub mod registry;
pub mod repo_check;
pub mod routes;
pub mod store;
pub use shared::user_info;
pub use shared::{models::*, user_info::*};

use rocket::{catchers, routes, Build, Rocket};
use crate::catchers::{
    bad_request, forbidden, internal_error, not_found, too_many_requests, unauthorized, unprocessable,
};
use crate::routes::{admin_action, all_options, cast_vote, get_stats, list_teams, register_team, AppState};

pub fn build_rocket(state: AppState) -> Rocket<Build> {
    rocket::build()
        .attach(cors::CORS)
        .manage(state)
        .mount(
            "/",
            routes![
                list_teams,
                get_stats,
                register_team,
                cast_vote,
                admin_action,
                all_options
            ],
        )
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                too_many_requests,
                internal_error
            ],
        )
}
