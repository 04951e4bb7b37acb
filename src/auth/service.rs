// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet sign-in orchestration.
//!
//! ```text
//! request_challenge ──► ChallengeStore::issue_challenge
//!
//! authenticate / signup / login
//!   1. normalize address
//!   2. lookup challenge, regenerate message     (read-only)
//!   3. verify signature                         (read-only)
//!   4. consume challenge                        (first mutation)
//!   5. resolve account per AccountPolicy
//!   6. issue session
//! ```
//!
//! A failure at any step leaves nothing behind from later steps. A failed
//! signature check does not consume the challenge, so the client may retry
//! against the same nonce.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::challenge::{ChallengeStore, IssuedChallenge};
use super::message::TypedDomain;
use super::session::{SessionClaims, SessionIssuer};
use super::verify::{verify_personal_signature, verify_typed_signature};
use super::AuthError;
use crate::clock::Clock;
use crate::models::WalletAddress;
use crate::storage::{NewUser, UserRecord, UserRepository, UserStoreError};

const MAX_EMAIL_LEN: usize = 254;

/// A signed challenge as submitted by the client.
#[derive(Debug, Clone)]
pub struct WalletSubmission {
    pub wallet_address: String,
    pub signature: String,
    pub nonce: String,
}

/// How the challenge message was signed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureScheme {
    /// EIP-191 `personal_sign` over the text message.
    Personal,
    /// EIP-712 typed data; `None` uses the configured domain.
    Typed(Option<TypedDomain>),
}

/// What to do with the user record once the signature checks out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountPolicy {
    /// Wallet-connect: create on first sight, otherwise stamp the login.
    FindOrCreate,
    /// Sign-up: the wallet must not have an account yet.
    CreateOnly { email: Option<String> },
    /// Login: the wallet must already have an account.
    ExistingOnly,
}

/// Successful sign-in.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub user: UserRecord,
    pub token: String,
    /// Whether the account was created by this sign-in.
    pub created: bool,
}

/// Entry point for wallet sign-in.
pub struct AuthService {
    challenges: Arc<ChallengeStore>,
    sessions: SessionIssuer,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    pub fn new(
        challenges: Arc<ChallengeStore>,
        sessions: SessionIssuer,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenges,
            sessions,
            users,
            clock,
        }
    }

    pub fn challenges(&self) -> &Arc<ChallengeStore> {
        &self.challenges
    }

    pub fn users(&self) -> &Arc<dyn UserRepository> {
        &self.users
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    pub fn request_challenge(&self, wallet_address: &str) -> Result<IssuedChallenge, AuthError> {
        self.challenges.issue_challenge(wallet_address)
    }

    /// Wallet-connect sign-in. Creates the account on first use.
    pub async fn authenticate(
        &self,
        submission: &WalletSubmission,
        scheme: SignatureScheme,
    ) -> Result<AuthOutcome, AuthError> {
        self.sign_in(submission, scheme, AccountPolicy::FindOrCreate)
            .await
    }

    /// Create-only sign-up with optional profile fields.
    pub async fn signup(
        &self,
        submission: &WalletSubmission,
        email: Option<String>,
    ) -> Result<AuthOutcome, AuthError> {
        let email = normalize_email(email)?;
        self.sign_in(
            submission,
            SignatureScheme::Personal,
            AccountPolicy::CreateOnly { email },
        )
        .await
    }

    /// Login for an existing account only.
    pub async fn login(&self, submission: &WalletSubmission) -> Result<AuthOutcome, AuthError> {
        self.sign_in(
            submission,
            SignatureScheme::Personal,
            AccountPolicy::ExistingOnly,
        )
        .await
    }

    pub fn validate_session(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.validate_session(token)
    }

    /// Load the account a validated session belongs to.
    pub async fn session_user(&self, claims: &SessionClaims) -> Result<UserRecord, AuthError> {
        let user = self
            .users
            .find_by_wallet(&claims.wallet_address)
            .await?
            .ok_or(AuthError::AccountNotFound)?;
        if user.id != claims.sub {
            return Err(AuthError::SessionMalformed);
        }
        Ok(user)
    }

    async fn sign_in(
        &self,
        submission: &WalletSubmission,
        scheme: SignatureScheme,
        policy: AccountPolicy,
    ) -> Result<AuthOutcome, AuthError> {
        let wallet = WalletAddress::parse(&submission.wallet_address)?;
        let nonce = submission.nonce.trim();

        let challenge = match self.challenges.lookup(&wallet, nonce) {
            Ok(challenge) => challenge,
            Err(AuthError::ChallengeExpired) => {
                self.challenges.evict_if_expired(&wallet);
                return Err(AuthError::ChallengeExpired);
            }
            Err(e) => return Err(e),
        };

        let messages = self.challenges.messages();
        let verification = match &scheme {
            SignatureScheme::Personal => verify_personal_signature(
                &wallet,
                &messages.personal_message(&challenge),
                &submission.signature,
            ),
            SignatureScheme::Typed(domain) => verify_typed_signature(
                &wallet,
                domain.as_ref().unwrap_or_else(|| messages.default_typed_domain()),
                &messages.typed_message(&challenge),
                &submission.signature,
            ),
        };
        match verification {
            Ok(result) if result.valid => {}
            Ok(result) => {
                debug!(
                    wallet_address = %wallet,
                    recovered = ?result.recovered_address.map(|a| a.to_string()),
                    "Signature from a different signer"
                );
                return Err(AuthError::SignatureVerificationFailed);
            }
            Err(e) => {
                debug!(wallet_address = %wallet, error = %e, "Signature rejected");
                return Err(AuthError::SignatureVerificationFailed);
            }
        }

        self.challenges.consume_challenge(&wallet, nonce)?;

        let now = self.clock.now();
        let (user, created) = self.resolve_account(wallet, policy, now).await?;
        let token = self.sessions.issue_session(&user.id, &wallet)?;

        info!(
            wallet_address = %wallet,
            user_id = %user.id,
            created,
            "Wallet signed in"
        );

        Ok(AuthOutcome {
            user,
            token,
            created,
        })
    }

    async fn resolve_account(
        &self,
        wallet: WalletAddress,
        policy: AccountPolicy,
        now: DateTime<Utc>,
    ) -> Result<(UserRecord, bool), AuthError> {
        let existing = self.users.find_by_wallet(&wallet).await?;

        match (policy, existing) {
            (AccountPolicy::CreateOnly { .. }, Some(_)) => Err(AuthError::AccountAlreadyExists),
            (AccountPolicy::ExistingOnly, None) => Err(AuthError::AccountNotFound),
            (_, Some(user)) => Ok((self.stamp_login(user, now).await?, false)),
            (AccountPolicy::CreateOnly { email }, None) => {
                let user = self
                    .users
                    .create(NewUser {
                        wallet_address: wallet,
                        email,
                        now,
                    })
                    .await?;
                Ok((user, true))
            }
            (_, None) => {
                let created = self
                    .users
                    .create(NewUser {
                        wallet_address: wallet,
                        email: None,
                        now,
                    })
                    .await;
                match created {
                    Ok(user) => Ok((user, true)),
                    Err(UserStoreError::AlreadyExists(_)) => {
                        // Lost a creation race; treat as a returning wallet.
                        warn!(
                            wallet_address = %wallet,
                            "Concurrent account creation, reusing record"
                        );
                        let user = self
                            .users
                            .find_by_wallet(&wallet)
                            .await?
                            .ok_or(AuthError::AccountNotFound)?;
                        Ok((self.stamp_login(user, now).await?, false))
                    }
                    Err(e) => Err(e.into()),
                }
            }
        }
    }

    async fn stamp_login(
        &self,
        mut user: UserRecord,
        now: DateTime<Utc>,
    ) -> Result<UserRecord, AuthError> {
        user.last_login_at = now;
        Ok(self.users.save(&user).await?)
    }
}

/// Trim, drop empty, and reject obviously malformed addresses.
fn normalize_email(email: Option<String>) -> Result<Option<String>, AuthError> {
    let Some(raw) = email else {
        return Ok(None);
    };
    let email = raw.trim();
    if email.is_empty() {
        return Ok(None);
    }

    let invalid = || AuthError::InvalidProfile("email is not a valid address".to_string());
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(Some(email.to_string()))
}
