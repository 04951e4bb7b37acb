// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::models::InvalidAddress;
use crate::storage::UserStoreError;

/// Authentication error type.
///
/// Every variant except [`AuthError::Internal`] is terminal for the request
/// and leaves no partial state behind. The `error_code` is stable so clients
/// can decide whether to request a fresh challenge or give up.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Address is not `0x` followed by 40 hex digits
    #[error("Wallet address is invalid")]
    InvalidAddress,
    /// Signature is not a 65-byte recoverable secp256k1 signature
    #[error("Signature is malformed: {0}")]
    MalformedSignature(String),
    /// Signature is well-formed but was not produced by the wallet
    #[error("Signature verification failed")]
    SignatureVerificationFailed,
    /// No outstanding challenge for the wallet
    #[error("No active challenge for this wallet")]
    NoActiveChallenge,
    /// Challenge TTL elapsed
    #[error("Challenge has expired")]
    ChallengeExpired,
    /// Supplied nonce differs from the outstanding challenge
    #[error("Nonce does not match the active challenge")]
    NonceMismatch,
    #[error("An account already exists for this wallet")]
    AccountAlreadyExists,
    #[error("No account exists for this wallet")]
    AccountNotFound,
    #[error("Session has expired")]
    SessionExpired,
    #[error("Session token is malformed")]
    SessionMalformed,
    #[error("Authorization header with a bearer token is required")]
    MissingBearerToken,
    #[error("Invalid profile field: {0}")]
    InvalidProfile(String),
    /// Collaborator failure (user store, key material)
    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidAddress => "invalid_address",
            AuthError::MalformedSignature(_) => "malformed_signature",
            AuthError::SignatureVerificationFailed => "signature_verification_failed",
            AuthError::NoActiveChallenge => "no_active_challenge",
            AuthError::ChallengeExpired => "challenge_expired",
            AuthError::NonceMismatch => "nonce_mismatch",
            AuthError::AccountAlreadyExists => "account_already_exists",
            AuthError::AccountNotFound => "account_not_found",
            AuthError::SessionExpired => "session_expired",
            AuthError::SessionMalformed => "session_malformed",
            AuthError::MissingBearerToken => "missing_bearer_token",
            AuthError::InvalidProfile(_) => "invalid_profile",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidAddress
            | AuthError::MalformedSignature(_)
            | AuthError::AccountAlreadyExists
            | AuthError::InvalidProfile(_) => StatusCode::BAD_REQUEST,
            AuthError::SignatureVerificationFailed
            | AuthError::NoActiveChallenge
            | AuthError::ChallengeExpired
            | AuthError::NonceMismatch
            | AuthError::AccountNotFound
            | AuthError::SessionExpired
            | AuthError::SessionMalformed
            | AuthError::MissingBearerToken => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<InvalidAddress> for AuthError {
    fn from(_: InvalidAddress) -> Self {
        AuthError::InvalidAddress
    }
}

impl From<UserStoreError> for AuthError {
    fn from(err: UserStoreError) -> Self {
        match err {
            UserStoreError::AlreadyExists(_) => AuthError::AccountAlreadyExists,
            UserStoreError::NotFound(_) => AuthError::AccountNotFound,
            other => AuthError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn verification_failure_returns_401() {
        let response = AuthError::SignatureVerificationFailed.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "signature_verification_failed");
    }

    #[tokio::test]
    async fn internal_error_hides_details() {
        let response = AuthError::Internal("disk on fire".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["error_code"], "internal_error");
    }

    #[test]
    fn invalid_address_is_a_client_error() {
        assert_eq!(AuthError::InvalidAddress.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AccountAlreadyExists.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::AccountNotFound.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn store_conflicts_map_to_account_errors() {
        let addr = crate::models::WalletAddress::parse(
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
        )
        .unwrap();
        assert!(matches!(
            AuthError::from(UserStoreError::AlreadyExists(addr)),
            AuthError::AccountAlreadyExists
        ));
        assert!(matches!(
            AuthError::from(UserStoreError::NotFound(addr)),
            AuthError::AccountNotFound
        ));
    }
}
