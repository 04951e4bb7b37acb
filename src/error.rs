// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::storage::StorageError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error_code: &'static str,
    pub message: String,
}

/// JSON body of every error response.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Human-readable message
    pub error: String,
    /// Stable machine-readable code, e.g. `nonce_mismatch`
    pub error_code: String,
}

impl ApiError {
    pub fn new(status: StatusCode, error_code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code,
            message: message.into(),
        }
    }

    /// Request body or parameters could not be understood.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", message)
    }

    /// Report every client error as 400, leaving server errors untouched.
    pub fn client_errors_as_bad_request(mut self) -> Self {
        if self.status.is_client_error() {
            self.status = StatusCode::BAD_REQUEST;
        }
        self
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let message = match &err {
            AuthError::Internal(detail) => {
                tracing::error!(error = %detail, "Internal authentication error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        Self::new(err.status_code(), err.error_code(), message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.error_code.to_string(),
        });
        (self.status, body).into_response()
    }
}

/// Failures while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("user store: {0}")]
    Storage(#[from] StorageError),
    #[error("authentication: {0}")]
    Auth(#[from] AuthError),
    #[error("invalid bind address {0:?}")]
    BindAddress(String),
    #[error("server I/O: {0}")]
    Io(#[from] std::io::Error),
}
