// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sign-in endpoints.
//!
//! | Route                     | Account policy   | Client errors |
//! |---------------------------|------------------|---------------|
//! | `POST /auth/authenticate` | find or create   | 400 / 401     |
//! | `POST /auth/signup`       | create only      | always 400    |
//! | `POST /auth/login`        | existing only    | 400 / 401     |

use axum::{extract::State, http::StatusCode, Json};

use super::ApiJson;

use crate::auth::{Auth, AuthOutcome, SignatureScheme, TypedDomain, WalletSubmission};
use crate::error::{ApiError, ErrorBody};
use crate::models::{
    AuthResponse, AuthenticateRequest, LoginRequest, NonceRequest, NonceResponse, SignupRequest,
    UserSummary, ValidateResponse,
};
use crate::state::AppState;

impl From<AuthOutcome> for AuthResponse {
    fn from(outcome: AuthOutcome) -> Self {
        Self {
            user: UserSummary::from(&outcome.user),
            token: outcome.token,
        }
    }
}

/// Issue a sign-in challenge for a wallet.
///
/// Any outstanding challenge for the same wallet is superseded.
#[utoipa::path(
    post,
    path = "/auth/nonce",
    tag = "Auth",
    request_body = NonceRequest,
    responses(
        (status = 200, description = "Challenge issued", body = NonceResponse),
        (status = 400, description = "Invalid wallet address", body = ErrorBody),
    )
)]
pub async fn request_nonce(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<NonceRequest>,
) -> Result<Json<NonceResponse>, ApiError> {
    let issued = state.auth.request_challenge(&request.wallet_address)?;

    Ok(Json(NonceResponse {
        nonce: issued.challenge.nonce,
        sign_message: issued.message,
        wallet_address: issued.challenge.wallet_address,
        issued_at: issued.challenge.issued_at,
        expires_at: issued.challenge.expires_at,
        typed_data: issued.typed_data,
    }))
}

/// Sign in with a wallet, creating the account on first use.
#[utoipa::path(
    post,
    path = "/auth/authenticate",
    tag = "Auth",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid wallet address or domain", body = ErrorBody),
        (status = 401, description = "Verification or challenge failure", body = ErrorBody),
    )
)]
pub async fn authenticate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AuthenticateRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let scheme = if request.use_typed_signature {
        let domain = request
            .domain
            .as_ref()
            .map(TypedDomain::from_input)
            .transpose()?;
        SignatureScheme::Typed(domain)
    } else {
        SignatureScheme::Personal
    };

    let submission = WalletSubmission {
        wallet_address: request.wallet_address,
        signature: request.signature,
        nonce: request.nonce,
    };
    let outcome = state.auth.authenticate(&submission, scheme).await?;

    Ok(Json(outcome.into()))
}

/// Create an account for a wallet. Fails if one already exists.
#[utoipa::path(
    post,
    path = "/auth/signup",
    tag = "Auth",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = AuthResponse),
        (
            status = 400,
            description = "Rejected, including account_already_exists",
            body = ErrorBody
        ),
    )
)]
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SignupRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let submission = WalletSubmission {
        wallet_address: request.wallet_address,
        signature: request.signature,
        nonce: request.nonce,
    };
    let outcome = state
        .auth
        .signup(&submission, request.email)
        .await
        .map_err(|e| ApiError::from(e).client_errors_as_bad_request())?;

    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// Sign in to an existing account. Never creates one.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, description = "Invalid wallet address", body = ErrorBody),
        (status = 401, description = "Rejected, including account_not_found", body = ErrorBody),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let submission = WalletSubmission {
        wallet_address: request.wallet_address,
        signature: request.signature,
        nonce: request.nonce,
    };
    let outcome = state.auth.login(&submission).await?;

    Ok(Json(outcome.into()))
}

/// Check the bearer session and return its account.
#[utoipa::path(
    get,
    path = "/auth/validate",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Session is valid", body = ValidateResponse),
        (status = 401, description = "Missing, malformed or expired session", body = ErrorBody),
    )
)]
pub async fn validate(
    State(state): State<AppState>,
    Auth(claims): Auth,
) -> Result<Json<ValidateResponse>, ApiError> {
    let user = state.auth.session_user(&claims).await?;

    Ok(Json(ValidateResponse {
        valid: true,
        user: UserSummary::from(&user),
    }))
}

#[cfg(test)]
mod tests {
    use crate::api::router;
    use crate::clock::ManualClock;
    use crate::config::AppConfig;
    use crate::state::AppState;
    use alloy::dyn_abi::TypedData;
    use alloy::signers::local::PrivateKeySigner;
    use alloy::signers::SignerSync;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn app() -> (Arc<ManualClock>, Router) {
        let mut config = AppConfig::from_lookup(|_| None).unwrap();
        config.session_secret = Some(b"0123456789abcdef0123456789abcdef".to_vec());
        let clock = Arc::new(ManualClock::starting_now());
        let state = AppState::with_clock(&config, clock.clone()).unwrap();
        (clock, router(state))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        send(app, Method::POST, uri, Some(body), None).await
    }

    async fn request_nonce(app: &Router) -> Value {
        let (status, nonce) = post(app, "/auth/nonce", json!({ "walletAddress": ADDRESS })).await;
        assert_eq!(status, StatusCode::OK);
        nonce
    }

    /// Request a nonce and sign its message; returns the signed submission body.
    async fn signed_body(app: &Router) -> Value {
        let nonce = request_nonce(app).await;

        let signer: PrivateKeySigner = KEY.parse().unwrap();
        let message = nonce["signMessage"].as_str().unwrap();
        let signature = signer.sign_message_sync(message.as_bytes()).unwrap();

        json!({
            "walletAddress": ADDRESS,
            "signature": alloy::hex::encode_prefixed(signature.as_bytes()),
            "nonce": nonce["nonce"],
        })
    }

    #[tokio::test]
    async fn nonce_rejects_invalid_address() {
        let (_clock, app) = app();
        let (status, body) = post(&app, "/auth/nonce", json!({ "walletAddress": "0x123" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_address");
    }

    #[tokio::test]
    async fn malformed_nonce_body_is_a_json_400() {
        let (_clock, app) = app();
        for body in [json!({}), json!({ "walletAddress": 12 })] {
            let (status, error) = post(&app, "/auth/nonce", body.clone()).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "body {body}");
            assert_eq!(error["error_code"], "invalid_request");
            assert!(error["error"].as_str().is_some());
        }
    }

    #[tokio::test]
    async fn signup_missing_field_is_a_json_400() {
        let (_clock, app) = app();
        let mut submission = signed_body(&app).await;
        submission.as_object_mut().unwrap().remove("signature");

        let (status, body) = post(&app, "/auth/signup", submission).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_request");
        assert!(body["error"].as_str().unwrap().contains("signature"));
    }

    #[tokio::test]
    async fn nonce_returns_message_and_typed_data() {
        let (_clock, app) = app();
        let (status, body) = post(
            &app,
            "/auth/nonce",
            json!({ "walletAddress": "0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["walletAddress"], ADDRESS);
        assert_eq!(body["nonce"].as_str().unwrap().len(), 64);
        assert!(body["signMessage"].as_str().unwrap().contains(ADDRESS));
        assert_eq!(body["typedData"]["primaryType"], "WalletAuthentication");
    }

    #[tokio::test]
    async fn authenticate_validate_and_replay() {
        let (_clock, app) = app();
        let submission = signed_body(&app).await;

        let (status, auth) = post(&app, "/auth/authenticate", submission.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(auth["user"]["walletAddress"], ADDRESS);
        let token = auth["token"].as_str().unwrap().to_string();

        let (status, validated) =
            send(&app, Method::GET, "/auth/validate", None, Some(&token)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(validated["valid"], true);
        assert_eq!(validated["user"]["id"], auth["user"]["id"]);

        let (status, replay) = post(&app, "/auth/authenticate", submission).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(replay["error_code"], "no_active_challenge");
    }

    #[tokio::test]
    async fn authenticate_with_typed_signature_and_client_domain() {
        let (_clock, app) = app();
        let nonce = request_nonce(&app).await;

        // Sign exactly what a wallet would receive for eth_signTypedData_v4
        let typed: TypedData = serde_json::from_value(nonce["typedData"].clone()).unwrap();
        let digest = typed.eip712_signing_hash().unwrap();
        let signer: PrivateKeySigner = KEY.parse().unwrap();
        let signature = signer.sign_hash_sync(&digest).unwrap();

        let mut submission = json!({
            "walletAddress": ADDRESS,
            "signature": alloy::hex::encode_prefixed(signature.as_bytes()),
            "nonce": nonce["nonce"],
            "useTypedSignature": true,
            "domain": {
                "name": "Relational Wallet",
                "version": "1",
                "chainId": 43114,
                "verifyingContract": "0xnot-a-contract",
            },
        });
        let (status, body) = post(&app, "/auth/authenticate", submission.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "invalid_address");

        submission["domain"].as_object_mut().unwrap().remove("verifyingContract");
        submission["domain"]["chainId"] = json!(1);
        let (status, body) = post(&app, "/auth/authenticate", submission.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "signature_verification_failed");

        submission["domain"]["chainId"] = json!(43114);
        let (status, auth) = post(&app, "/auth/authenticate", submission).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(auth["user"]["walletAddress"], ADDRESS);
    }

    #[tokio::test]
    async fn expired_challenge_is_401() {
        let (clock, app) = app();
        let submission = signed_body(&app).await;
        clock.advance(chrono::Duration::seconds(301));

        let (status, body) = post(&app, "/auth/authenticate", submission).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "challenge_expired");
    }

    #[tokio::test]
    async fn signup_is_201_then_400_for_existing_account() {
        let (_clock, app) = app();
        let mut submission = signed_body(&app).await;
        submission["email"] = json!("ada@example.com");

        let (status, created) = post(&app, "/auth/signup", submission).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["user"]["email"], "ada@example.com");

        let again = signed_body(&app).await;
        let (status, body) = post(&app, "/auth/signup", again).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "account_already_exists");
    }

    #[tokio::test]
    async fn signup_reports_verification_failure_as_400() {
        let (_clock, app) = app();
        let mut submission = signed_body(&app).await;
        submission["signature"] = json!(format!("0x{}", "11".repeat(65)));

        let (status, body) = post(&app, "/auth/signup", submission).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error_code"], "signature_verification_failed");
    }

    #[tokio::test]
    async fn login_unknown_wallet_is_401() {
        let (_clock, app) = app();
        let submission = signed_body(&app).await;

        let (status, body) = post(&app, "/auth/login", submission).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "account_not_found");
    }

    #[tokio::test]
    async fn validate_requires_bearer() {
        let (_clock, app) = app();
        let (status, body) = send(&app, Method::GET, "/auth/validate", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "missing_bearer_token");

        let (status, body) =
            send(&app, Method::GET, "/auth/validate", None, Some("garbage")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "session_malformed");
    }

    #[tokio::test]
    async fn validate_rejects_expired_session() {
        let (clock, app) = app();
        let submission = signed_body(&app).await;
        let (_, auth) = post(&app, "/auth/authenticate", submission).await;
        let token = auth["token"].as_str().unwrap().to_string();

        clock.advance(chrono::Duration::hours(24) + chrono::Duration::seconds(1));
        let (status, body) = send(&app, Method::GET, "/auth/validate", None, Some(&token)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error_code"], "session_expired");
    }
}
