use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::extract::CookieJar;
use axum::http::StatusCode;
use uuid::Uuid;

use crate::auth::jwt::SessionManager;
use crate::AppState;

pub const SESSION_COOKIE: &str = "sportfolio_session";

/// The dev-bypass user id, used only when `DEV_BYPASS_AUTH` is set outside
/// production. A fixed id rather than a random one so the same
/// seeded account shows up across restarts.
pub const DEV_BYPASS_USER_ID: Uuid = Uuid::from_u128(1);

#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub is_admin: bool,
}

pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if state.config.is_auth_disabled() {
        let user_id = request
            .headers()
            .get("X-Test-User-Id")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or(DEV_BYPASS_USER_ID);

        tracing::debug!(%user_id, "auth disabled, using dev-bypass user");
        request.extensions_mut().insert(AuthUser { user_id, is_admin: true });
        return Ok(next.run(request).await);
    }

    let token = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let session = SessionManager::new(&state.config.session_secret, state.config.session_ttl_seconds as i64);
    let claims = session.verify(&token).map_err(|_| StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        is_admin: claims.is_admin,
    });

    Ok(next.run(request).await)
}

/// Best-effort auth for endpoints that serve a smaller payload to anonymous
/// callers instead of rejecting them outright. Never used on routes that mutate state.
pub fn try_authenticate(state: &AppState, jar: &CookieJar) -> Option<AuthUser> {
    if state.config.is_auth_disabled() {
        return Some(AuthUser { user_id: DEV_BYPASS_USER_ID, is_admin: true });
    }

    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let session = SessionManager::new(&state.config.session_secret, state.config.session_ttl_seconds as i64);
    let claims = session.verify(&token).ok()?;
    Some(AuthUser { user_id: claims.sub, is_admin: claims.is_admin })
}

/// Gate for admin-only routes: either a bearer `ADMIN_API_TOKEN`
/// or an authenticated user whose claim carries `is_admin`. Must run after
/// `auth_middleware` so `AuthUser` is already in extensions when no bearer
/// token is present.
pub async fn admin_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let bearer_ok = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|token| token == state.config.admin_api_token)
        .unwrap_or(false);

    if bearer_ok {
        return Ok(next.run(request).await);
    }

    let claims_ok = request
        .extensions()
        .get::<AuthUser>()
        .map(|u| u.is_admin)
        .unwrap_or(false);

    if claims_ok {
        return Ok(next.run(request).await);
    }

    Err(StatusCode::FORBIDDEN)
}
