use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use chrono::DateTime;
use jetshare_core::Session;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::{AppState, AuthConfig};

// ============================================================================
// Access token claims, as issued by the auth provider
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: usize,
}

// ============================================================================
// Session Middleware
// ============================================================================

/// Rejects the request with 401 unless it carries a valid session, then
/// makes the [`Session`] available to handlers as an extension.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // 1. Cookie first, then Authorization header
    let token = session_token(req.headers(), &state.auth.session_cookie)
        .ok_or_else(AppError::unauthorized)?;

    // 2. Verify signature, audience, expiry
    let session = verify_token(&state.auth, &token)?;

    // 3. Inject session
    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| bearer.token().to_string())
}

pub fn verify_token(auth: &AuthConfig, token: &str) -> Result<Session, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[auth.audience.as_str()]);

    let token_data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(auth.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!("Rejected session token: {}", e);
        AppError::unauthorized()
    })?;

    let claims = token_data.claims;
    let role = claims.role.unwrap_or_else(|| "authenticated".to_string());

    // The anon key is signed with the same secret; it is not a session.
    if role == "anon" {
        return Err(AppError::unauthorized());
    }

    let expires_at = DateTime::from_timestamp(claims.exp as i64, 0).ok_or_else(AppError::unauthorized)?;

    Ok(Session {
        user_id: claims.sub,
        email: claims.email,
        role,
        access_token: token.to_string(),
        expires_at,
    })
}
