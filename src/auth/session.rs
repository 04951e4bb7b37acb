// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token issuance and validation.
//!
//! Sessions are HS256 JWTs signed with a process-wide secret. Expiry is the
//! only invalidation mechanism: there is no revocation list, and changing the
//! secret invalidates every outstanding session.

use std::sync::Arc;
use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::AuthError;
use crate::clock::Clock;
use crate::config::{AppConfig, DEFAULT_SESSION_TTL, MIN_SESSION_SECRET_LEN};
use crate::models::WalletAddress;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub wallet_address: WalletAddress,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    pub iss: String,
    /// Unique token id
    pub jti: String,
}

/// Mints and checks session tokens.
pub struct SessionIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: chrono::Duration,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl SessionIssuer {
    pub fn new(
        secret: &[u8],
        ttl: Duration,
        issuer: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_SESSION_TTL.as_secs() as i64));
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
            issuer: issuer.into(),
            clock,
        }
    }

    /// Issuer with a freshly generated secret. Sessions die with the process.
    pub fn with_random_secret(
        ttl: Duration,
        issuer: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let mut secret = [0u8; MIN_SESSION_SECRET_LEN];
        SystemRandom::new()
            .fill(&mut secret)
            .map_err(|_| AuthError::Internal("system RNG unavailable".to_string()))?;
        Ok(Self::new(&secret, ttl, issuer, clock))
    }

    /// Build from configuration, generating a secret if none is configured.
    pub fn from_config(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        match &config.session_secret {
            Some(secret) => Ok(Self::new(
                secret,
                config.session_ttl,
                config.session_issuer.clone(),
                clock,
            )),
            None => {
                warn!("SESSION_SECRET not set; sessions will not survive a restart");
                Self::with_random_secret(config.session_ttl, config.session_issuer.clone(), clock)
            }
        }
    }

    /// Sign a session for `user_id` bound to `wallet`.
    pub fn issue_session(
        &self,
        user_id: &str,
        wallet: &WalletAddress,
    ) -> Result<String, AuthError> {
        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("session expiry out of range".to_string()))?;
        let claims = SessionClaims {
            sub: user_id.to_string(),
            wallet_address: *wallet,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("failed to sign session: {e}")))
    }

    /// Check signature and issuer, then expiry against the injected clock.
    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();
        validation.set_issuer(&[&self.issuer]);

        let claims = decode::<SessionClaims>(token.trim(), &self.decoding_key, &validation)
            .map_err(|_| AuthError::SessionMalformed)?
            .claims;

        if self.clock.now().timestamp() > claims.exp {
            return Err(AuthError::SessionExpired);
        }

        Ok(claims)
    }
}
