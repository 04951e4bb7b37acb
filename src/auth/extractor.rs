// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for session-authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require a valid session:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(claims): Auth) -> impl IntoResponse {
//!     // claims is SessionClaims
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, SessionClaims};
use crate::state::AppState;

/// Extractor for a validated session.
///
/// Reads `Authorization: Bearer <token>` and validates it with the
/// application's session issuer. Any failure rejects with 401.
pub struct Auth(pub SessionClaims);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Already validated further up the stack
        if let Some(claims) = parts.extensions.get::<SessionClaims>().cloned() {
            return Ok(Auth(claims));
        }

        let token = bearer_token(parts)?;
        let claims = state.auth.validate_session(token)?;
        parts.extensions.insert(claims.clone());

        Ok(Auth(claims))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, AuthError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingBearerToken)?
        .to_str()
        .map_err(|_| AuthError::MissingBearerToken)?;

    let (scheme, token) = header
        .trim()
        .split_once(' ')
        .ok_or(AuthError::MissingBearerToken)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AuthError::MissingBearerToken);
    }

    Ok(token.trim())
}
