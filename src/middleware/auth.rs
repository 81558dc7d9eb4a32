use axum::{
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::{models::CurrentUser, AppState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    // user id
    pub sub: String,
    // expiry (unix timestamp seconds)
    pub exp: usize,
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").or_else(|| raw.strip_prefix("bearer "))?;
    Some(token.trim().to_string())
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    jar.get(cookie_name)
        .map(|c| c.value().to_string())
        .or_else(|| bearer_token(headers))
}

pub fn decode_caller(token: &str, secret: &str) -> Option<CurrentUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()?;

    let id = data.claims.sub.trim();
    if id.is_empty() {
        return None;
    }
    Some(CurrentUser { id: id.to_string() })
}

/// Puts a [`CurrentUser`] in the request extensions when the request carries
/// a valid session token. Requests without one pass through untouched.
pub async fn inject_current_user(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let cookie_name = state.settings.jwt_cookie_name.as_str();

    if let Some(token) = session_token(req.headers(), cookie_name) {
        match decode_caller(&token, &state.settings.jwt_secret) {
            Some(user) => {
                req.extensions_mut().insert(user);
            }
            None => tracing::debug!("ignoring invalid session token"),
        }
    }

    next.run(req).await
}
