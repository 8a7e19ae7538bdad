use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderValue},
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::repo::User;
use crate::config::JwtConfig;
use crate::error::{ApiError, AuthError};
use crate::state::AppState;

/// Response header carrying a transparently renewed token.
pub const RENEWED_TOKEN_HEADER: &str = "x-renewed-token";

/// Identity claims embedded in every token. The token is self-contained:
/// no server-side session table exists, and nothing is revocable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    pub iat: usize,
    pub exp: usize,
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub ttl: Duration,
    pub renew_threshold: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            ttl_minutes,
            renew_threshold_minutes,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::from_secs((ttl_minutes as u64) * 60),
            renew_threshold: Duration::from_secs((renew_threshold_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    pub fn sign_identity(&self, sub: Uuid, username: &str, email: &str) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub,
            username: username.to_string(),
            email: email.to_string(),
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %sub, "jwt signed");
        Ok(token)
    }

    pub fn sign(&self, user: &User) -> anyhow::Result<String> {
        self.sign_identity(user.id, &user.username, &user.email)
    }

    /// Validate a token, distinguishing an expired token from a malformed
    /// or tampered one so the client can decide between re-login and
    /// fixing the request.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        match decode::<Claims>(token, &self.decoding, &validation) {
            Ok(data) => {
                debug!(user_id = %data.claims.sub, "jwt verified");
                Ok(data.claims)
            }
            Err(e) => match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(AuthError::TokenExpired),
                _ => Err(AuthError::TokenInvalid),
            },
        }
    }

    /// True when remaining validity has fallen under the renewal threshold.
    pub fn should_renew(&self, claims: &Claims) -> bool {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let remaining = claims.exp as i64 - now;
        remaining < self.renew_threshold.as_secs() as i64
    }
}

/// The authentication gate. Every protected handler takes this extractor;
/// it is the only source of the caller's identity, so no handler can
/// derive an owner id from client-supplied input.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
    pub renewed_token: Option<String>,
}

impl AuthUser {
    pub fn id(&self) -> Uuid {
        self.claims.sub
    }

    /// Headers to attach to the response; carries the renewed token when
    /// the presented one is inside the renewal window.
    pub fn response_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(token) = &self.renewed_token {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert(RENEWED_TOKEN_HEADER, value);
            }
        }
        headers
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(AuthError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or(AuthError::TokenInvalid)?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(kind = e.kind(), "token rejected");
            e
        })?;

        // Sliding renewal: issue a fresh token alongside the response so a
        // continuously active client never has to log in again. A signing
        // failure here must not fail the request itself.
        let renewed_token = if keys.should_renew(&claims) {
            match keys.sign_identity(claims.sub, &claims.username, &claims.email) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!(error = %e, "token renewal failed");
                    None
                }
            }
        } else {
            None
        };

        Ok(AuthUser {
            claims,
            renewed_token,
        })
    }
}
