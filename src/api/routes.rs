use axum::{
    routing::{get, post, put},
    Router,
};

use crate::api::handlers::{health, members, teams};
use crate::domain::repositories::Store;

/// Builds the application router over any store
///
/// Middleware (tracing, CORS) is layered on by the binary so tests can
/// drive the bare router.
pub fn router<S: Store>(store: S) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Team routes
        .route("/api/teams", post(teams::create_team::<S>))
        .route("/api/teams/:id", get(teams::get_team::<S>))
        // Member routes
        .route(
            "/api/members",
            post(members::create_member::<S>).get(members::list_members::<S>),
        )
        .route("/api/members/:id", get(members::get_member::<S>))
        .route("/api/members/:id/team", put(members::change_team::<S>))
        // Search routes
        .route("/api/search/members", get(members::search_members::<S>))
        .route(
            "/api/search/members/page",
            get(members::search_members_page::<S>),
        )
        // Aggregates
        .route("/api/stats/members", get(members::member_statistics::<S>))
        .route("/api/stats/teams", get(teams::team_average_ages::<S>))
        .with_state(store)
}
