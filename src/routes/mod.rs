pub mod auth;
pub mod dashboard;
pub mod leads;
pub mod options;
pub mod users;

use axum::Router;
use axum::routing::{delete, get, post, put};

use crate::state::SharedState;

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/common/auth/login/", post(auth::login))
        .route("/api/common/auth/logout/", post(auth::logout))
        .route("/api/common/auth/refresh-token/", post(auth::refresh))
        .route(
            "/api/common/auth/password-reset-request/",
            post(auth::password_reset_request),
        )
        .route(
            "/api/common/auth/password-reset-confirm/",
            post(auth::password_reset_confirm),
        )
        // Users
        .route("/api/common/profile/", get(users::profile))
        .route(
            "/api/common/users/create-employee/",
            post(users::create_employee),
        )
        .route(
            "/api/common/dashboard/reminders/",
            get(dashboard::reminders),
        )
        // Leads
        .route("/api/leads/", get(leads::list).post(leads::create))
        .route("/api/leads/projects/", get(leads::projects))
        .route(
            "/api/leads/{id}/",
            get(leads::get).put(leads::update).delete(leads::delete),
        )
        .route(
            "/api/leads/{id}/convert-to-project/",
            post(leads::convert_to_project),
        )
        .route(
            "/api/leads/{id}/follow-up-status/",
            put(leads::follow_up_status),
        )
        // Lead options
        .route("/api/leads/options/", get(options::list))
        .route("/api/leads/statuses/", post(options::create_status))
        .route("/api/leads/statuses/{id}/", delete(options::delete_status))
        .route("/api/leads/sources/", post(options::create_source))
        .route("/api/leads/sources/{id}/", delete(options::delete_source))
}
