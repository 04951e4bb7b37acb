// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::FromRequest,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::{ApiError, ErrorBody},
    models::{
        AuthResponse, AuthenticateRequest, LoginRequest, NonceRequest, NonceResponse,
        SignupRequest, TypedDomainInput, UserSummary, ValidateResponse, WalletAddress,
    },
    state::AppState,
};

pub mod auth;
pub mod health;

/// JSON request body whose rejections use the API error format.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/nonce", post(auth::request_nonce))
        .route("/authenticate", post(auth::authenticate))
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/validate", get(auth::validate));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .nest("/auth", auth_routes)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::request_nonce,
        auth::authenticate,
        auth::signup,
        auth::login,
        auth::validate,
        health::health,
        health::liveness
    ),
    components(
        schemas(
            WalletAddress,
            NonceRequest,
            NonceResponse,
            TypedDomainInput,
            AuthenticateRequest,
            SignupRequest,
            LoginRequest,
            UserSummary,
            AuthResponse,
            ValidateResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Wallet sign-in and session validation"),
        (name = "Health", description = "Liveness and readiness checks")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
