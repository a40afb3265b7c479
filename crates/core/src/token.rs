//! Bearer token signing and verification
//!
//! Deep links and the REST API authenticate with compact HMAC-SHA256
//! signed tokens in the usual three-part `header.claims.signature`
//! shape. Access and refresh tokens are signed with independent secrets
//! so leaking one never extends the other.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ProfileRole;

type HmacSha256 = Hmac<Sha256>;

/// Access token lifetime in seconds (15 minutes)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;

/// Refresh token lifetime in seconds (7 days)
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Token verification failures
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired")]
    Expired,

    #[error("Wrong token kind")]
    WrongKind,

    #[error("Invalid signing key")]
    InvalidKey,
}

/// Distinguishes short-lived access tokens from refresh tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried inside a signed token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Profile id the token authenticates
    pub sub: Uuid,
    pub role: ProfileRole,
    pub kind: TokenKind,
    /// Issued-at, unix seconds
    pub iat: i64,
    /// Expiry, unix seconds
    pub exp: i64,
}

/// Issue a short-lived access token for a profile
///
/// # Errors
/// Returns an error if the signing key is rejected by HMAC
pub fn issue_access_token(
    profile_id: Uuid,
    role: ProfileRole,
    secret: &str,
) -> Result<String, TokenError> {
    issue(profile_id, role, TokenKind::Access, ACCESS_TOKEN_TTL_SECS, secret)
}

/// Issue a refresh token for a profile
///
/// # Errors
/// Returns an error if the signing key is rejected by HMAC
pub fn issue_refresh_token(
    profile_id: Uuid,
    role: ProfileRole,
    secret: &str,
) -> Result<String, TokenError> {
    issue(profile_id, role, TokenKind::Refresh, REFRESH_TOKEN_TTL_SECS, secret)
}

/// Verify an access token and return its claims
///
/// # Errors
/// Returns an error if the token is malformed, signed with another key,
/// expired, or not an access token
pub fn verify_access_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    verify(token, TokenKind::Access, secret)
}

/// Verify a refresh token and return its claims
///
/// # Errors
/// Returns an error if the token is malformed, signed with another key,
/// expired, or not a refresh token
pub fn verify_refresh_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    verify(token, TokenKind::Refresh, secret)
}

fn issue(
    profile_id: Uuid,
    role: ProfileRole,
    kind: TokenKind,
    ttl_secs: i64,
    secret: &str,
) -> Result<String, TokenError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: profile_id,
        role,
        kind,
        iat: now,
        exp: now + ttl_secs,
    };
    sign(&claims, secret)
}

fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = serde_json::to_vec(claims).map_err(|_| TokenError::Malformed)?;
    let payload = URL_SAFE_NO_PAD.encode(payload);

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{header}.{payload}.{signature}"))
}

fn verify(token: &str, expected_kind: TokenKind, secret: &str) -> Result<Claims, TokenError> {
    let mut parts = token.splitn(3, '.');
    let (Some(header), Some(payload), Some(signature)) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(TokenError::Malformed);
    };

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    // Constant-time comparison via the Mac trait
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::InvalidKey)?;
    mac.update(header.as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.kind != expected_kind {
        return Err(TokenError::WrongKind);
    }
    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
