//! Session token issuing, verification, and the authenticated-user
//! extractor.
//!
//! Sessions are stateless: a signed token in an `HttpOnly` cookie carries
//! the user id, and every authenticated request loads the fresh user row.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use database::{DatabaseError, User};

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Name of the session cookie.
pub const AUTH_COOKIE: &str = "jwt";

/// Session lifetime.
const TOKEN_TTL_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User id.
    sub: String,
    /// Expiry as a unix timestamp.
    exp: i64,
}

/// Signing and verification keys plus the cookie policy, derived from the
/// configured secret.
pub struct AuthKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    cookie_secure: bool,
}

impl AuthKeys {
    pub fn new(secret: &str, cookie_secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            cookie_secure,
        }
    }

    /// Issue a signed session token for `user_id`.
    pub fn issue_token(&self, user_id: &str) -> Result<String, jsonwebtoken::errors::Error> {
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
    }

    fn verify_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        Ok(data.claims)
    }

    /// `Set-Cookie` value for a fresh session.
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{AUTH_COOKIE}={token}; Path=/; Max-Age={}; HttpOnly; SameSite=Strict",
            TOKEN_TTL_DAYS * 24 * 60 * 60
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value that ends the session.
    pub fn clear_cookie(&self) -> String {
        let mut cookie = format!("{AUTH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Strict");
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Pull the session token out of the `Cookie` header.
fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').map(str::trim).find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        (name == AUTH_COOKIE).then(|| value.to_string())
    })
}

/// Extractor for the authenticated user. Rejects with 401 when the cookie
/// is missing, the token is invalid, or the account no longer exists.
pub struct AuthUser(pub User);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let token = token_from_headers(&parts.headers)
            .ok_or_else(|| ApiError::unauthorized("Unauthorized - No token provided"))?;

        let claims = state
            .auth
            .verify_token(&token)
            .map_err(|_| ApiError::unauthorized("Unauthorized - Invalid token"))?;

        let user = match database::user::get_user(state.db.pool(), &claims.sub).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound { .. }) => {
                return Err(ApiError::unauthorized("Unauthorized - User not found"));
            }
            Err(e) => return Err(ApiError::Database(e)),
        };

        Ok(AuthUser(user))
    }
}
