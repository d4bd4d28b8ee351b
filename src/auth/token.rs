// JWT token issuance and verification service

use crate::auth::{error::AuthError, role::Role};
use chrono::Utc;
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32, // user id
    pub role: Role,
    pub exp: i64, // expiration timestamp
    pub iat: i64, // issued at timestamp
}

/// Token service for JWT operations
///
/// Constructed with the signing secret from the startup configuration, so a
/// missing secret aborts the service instead of failing per request.
pub struct TokenService {
    secret: String,
    access_token_duration: i64,  // in seconds
    refresh_token_duration: i64, // in seconds
}

impl TokenService {
    /// Access tokens expire in 15 minutes (900 seconds)
    /// Refresh tokens expire in 7 days (604800 seconds)
    pub fn new(secret: String) -> Self {
        Self {
            secret,
            access_token_duration: 900,
            refresh_token_duration: 604_800,
        }
    }

    /// Lifetime of refresh tokens in seconds, used for the store-level TTL
    pub fn refresh_token_duration(&self) -> i64 {
        self.refresh_token_duration
    }

    fn issue(&self, user_id: i32, role: Role, duration: i64) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id,
            role,
            iat: now,
            exp: now + duration,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    /// Issue an access token (15 minutes)
    pub fn issue_access_token(&self, user_id: i32, role: Role) -> Result<String, AuthError> {
        self.issue(user_id, role, self.access_token_duration)
    }

    /// Issue a refresh token (7 days)
    pub fn issue_refresh_token(&self, user_id: i32, role: Role) -> Result<String, AuthError> {
        self.issue(user_id, role, self.refresh_token_duration)
    }

    /// Issue both access and refresh tokens
    pub fn issue_pair(&self, user_id: i32, role: Role) -> Result<(String, String), AuthError> {
        let access_token = self.issue_access_token(user_id, role)?;
        let refresh_token = self.issue_refresh_token(user_id, role)?;
        Ok((access_token, refresh_token))
    }

    /// Verify a token's signature and expiry and return its claims
    ///
    /// Failures are classified so callers can distinguish "log in again"
    /// (expired) from tampering (bad signature) and garbage input.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::default();

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::InvalidSignature,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::MalformedToken
            }
            _ => AuthError::Unauthorized,
        })
    }
}
