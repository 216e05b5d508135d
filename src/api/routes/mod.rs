use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::api::handlers;
use crate::auth::middleware::{admin_middleware, auth_middleware};
use crate::AppState;

/// Builds the `/api` router: public routes need no session,
/// protected routes run behind `auth_middleware`, and admin routes stack
/// `admin_middleware` on top of that so a bearer `ADMIN_API_TOKEN` alone is
/// still enough even without a session cookie.
pub fn create_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let public_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/players", get(handlers::players::list_players))
        .route("/player/:id", get(handlers::players::get_player))
        .route("/contest/:id/leaderboard", get(handlers::contests::get_leaderboard))
        .route("/leaderboards", get(handlers::leaderboards::get_leaderboard));

    let protected_routes = Router::new()
        .route("/orders/:playerId", post(handlers::orders::create_order))
        .route("/orders/:orderId/cancel", post(handlers::orders::cancel_order))
        .route("/vesting/start", post(handlers::vesting::start_vesting))
        .route("/vesting/claim", post(handlers::vesting::claim_vesting))
        .route("/contest/:id/enter", post(handlers::contests::enter_contest))
        .route("/contest/:contestId/entry/:entryId", put(handlers::contests::edit_entry))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let admin_routes = Router::new()
        .route("/admin/jobs/trigger", post(handlers::admin::trigger_job))
        .route("/admin/backfill", post(handlers::admin::backfill))
        .route("/admin/bots", get(handlers::admin::bot_stats))
        .route("/admin/bots/trigger", post(handlers::admin::trigger_bots))
        .route("/admin/premium", post(handlers::admin::grant_premium))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), admin_middleware))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new().merge(public_routes).merge(protected_routes).merge(admin_routes)
}
