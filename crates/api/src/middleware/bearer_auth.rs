//! Bearer token authentication middleware
//!
//! Validates the `Authorization: Bearer <token>` header against the
//! access token secret and resolves the caller's profile from the
//! database. Role and display name always come from the profile row,
//! not from token claims, so a role change takes effect on the next
//! request.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use dockline_core::models::Actor;
use dockline_core::token::verify_access_token;

use crate::AppState;
use crate::db;
use crate::error::ApiError;

const AUTH_HEADER_PREFIX: &str = "Bearer ";

/// Pull the raw token out of an Authorization header value
fn extract_bearer(header: Option<&str>) -> Result<&str, ApiError> {
    let header =
        header.ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

    header.strip_prefix(AUTH_HEADER_PREFIX).map_or_else(
        || Err(ApiError::Unauthorized("Invalid Authorization scheme".to_string())),
        Ok,
    )
}

pub async fn bearer_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let token = extract_bearer(header)?;

    let claims = verify_access_token(token, &state.access_token_secret)
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    let profile = match db::profiles::get_profile(&state.pool, claims.sub).await {
        Ok(profile) => profile,
        Err(ApiError::NotFound(_)) => {
            return Err(ApiError::Unauthorized("Unknown profile".to_string()));
        }
        Err(e) => return Err(e),
    };

    tracing::debug!(
        profile_id = %profile.id,
        role = ?profile.role,
        "authenticated request"
    );

    // The bare profile id doubles as the rate limit key
    request.extensions_mut().insert(profile.id);
    request.extensions_mut().insert(Actor {
        profile_id: profile.id,
        role: profile.role,
        display_name: profile.display_name,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer_valid_header() {
        let token = extract_bearer(Some("Bearer abc.def.ghi")).unwrap();
        assert_eq!(token, "abc.def.ghi");
    }

    #[test]
    fn test_extract_bearer_missing_header() {
        let err = extract_bearer(None).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_extract_bearer_wrong_scheme() {
        let err = extract_bearer(Some("Basic dXNlcjpwYXNz")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));

        // Scheme comparison is case sensitive, matching the header we issue
        let err = extract_bearer(Some("bearer abc")).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn test_extract_bearer_empty_token() {
        // An empty token passes extraction and fails signature verification
        let token = extract_bearer(Some("Bearer ")).unwrap();
        assert_eq!(token, "");
    }
}
