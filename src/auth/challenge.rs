// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Outstanding sign-in challenges.
//!
//! At most one challenge exists per wallet; issuing a new one supersedes the
//! previous. A challenge is consumed exactly once. Reads and writes for a
//! given wallet are serialized by a single mutex, so two concurrent consumes
//! of the same nonce cannot both succeed.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use serde_json::Value;
use tracing::debug;

use super::message::MessageFormat;
use super::AuthError;
use crate::clock::Clock;
use crate::config::DEFAULT_CHALLENGE_TTL;
use crate::models::WalletAddress;

/// Random bytes per nonce. Rendered as 64 lowercase hex characters.
pub const NONCE_BYTES: usize = 32;

/// Maximum records removed per lock acquisition during a sweep.
pub const SWEEP_BATCH_SIZE: usize = 1024;

/// A pending challenge bound to one wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub wallet_address: WalletAddress,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    /// Expired strictly after `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// A challenge together with the exact texts the wallet should sign.
#[derive(Debug, Clone)]
pub struct IssuedChallenge {
    pub challenge: Challenge,
    pub message: String,
    pub typed_data: Value,
}

/// In-memory store of outstanding challenges keyed by wallet.
pub struct ChallengeStore {
    challenges: Mutex<HashMap<WalletAddress, Challenge>>,
    ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
    messages: Arc<MessageFormat>,
    rng: SystemRandom,
}

impl ChallengeStore {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>, messages: Arc<MessageFormat>) -> Self {
        let ttl = chrono::Duration::from_std(ttl)
            .unwrap_or_else(|_| chrono::Duration::seconds(DEFAULT_CHALLENGE_TTL.as_secs() as i64));
        Self {
            challenges: Mutex::new(HashMap::new()),
            ttl,
            clock,
            messages,
            rng: SystemRandom::new(),
        }
    }

    pub fn messages(&self) -> &MessageFormat {
        &self.messages
    }

    /// Issue a fresh challenge for `raw_address`, replacing any outstanding one.
    pub fn issue_challenge(&self, raw_address: &str) -> Result<IssuedChallenge, AuthError> {
        let wallet_address = WalletAddress::parse(raw_address)?;
        let nonce = self.generate_nonce()?;

        let issued_at = self.clock.now();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("challenge expiry out of range".to_string()))?;
        let challenge = Challenge {
            wallet_address,
            nonce,
            issued_at,
            expires_at,
        };

        let message = self.messages.personal_message(&challenge);
        let typed_data = self.messages.typed_data_json(&challenge);

        let superseded = self
            .lock()
            .insert(wallet_address, challenge.clone())
            .is_some();
        debug!(wallet_address = %wallet_address, superseded, "Issued sign-in challenge");

        Ok(IssuedChallenge {
            challenge,
            message,
            typed_data,
        })
    }

    /// Return the outstanding challenge without consuming it.
    ///
    /// Fails the same way [`consume_challenge`](Self::consume_challenge) would,
    /// but never changes the store.
    pub fn lookup(&self, wallet: &WalletAddress, nonce: &str) -> Result<Challenge, AuthError> {
        let guard = self.lock();
        let challenge = guard.get(wallet).ok_or(AuthError::NoActiveChallenge)?;
        if challenge.is_expired(self.clock.now()) {
            return Err(AuthError::ChallengeExpired);
        }
        if challenge.nonce != nonce {
            return Err(AuthError::NonceMismatch);
        }
        Ok(challenge.clone())
    }

    /// Consume the outstanding challenge for `wallet` if `nonce` matches.
    ///
    /// An expired record is removed. A mismatched nonce leaves the record in
    /// place so the legitimate holder can still use it.
    pub fn consume_challenge(&self, wallet: &WalletAddress, nonce: &str) -> Result<(), AuthError> {
        let now = self.clock.now();
        let mut guard = self.lock();

        let challenge = guard.get(wallet).ok_or(AuthError::NoActiveChallenge)?;
        if challenge.is_expired(now) {
            guard.remove(wallet);
            return Err(AuthError::ChallengeExpired);
        }
        if challenge.nonce != nonce {
            return Err(AuthError::NonceMismatch);
        }

        guard.remove(wallet);
        Ok(())
    }

    /// Drop the challenge for `wallet` if it has expired. Returns whether one
    /// was removed.
    pub fn evict_if_expired(&self, wallet: &WalletAddress) -> bool {
        let now = self.clock.now();
        let mut guard = self.lock();
        let expired = guard
            .get(wallet)
            .is_some_and(|challenge| challenge.is_expired(now));
        if expired {
            guard.remove(wallet);
        }
        expired
    }

    /// Remove every expired challenge. Returns how many were removed.
    ///
    /// Works in batches of [`SWEEP_BATCH_SIZE`], releasing the lock between
    /// batches so request handlers are not stalled by a large sweep.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut removed = 0;

        loop {
            let mut guard = self.lock();
            let expired: Vec<WalletAddress> = guard
                .iter()
                .filter(|(_, challenge)| challenge.is_expired(now))
                .map(|(wallet, _)| *wallet)
                .take(SWEEP_BATCH_SIZE)
                .collect();
            for wallet in &expired {
                guard.remove(wallet);
            }
            drop(guard);

            removed += expired.len();
            if expired.len() < SWEEP_BATCH_SIZE {
                break;
            }
        }

        removed
    }

    /// Number of outstanding (possibly expired) challenges.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn generate_nonce(&self) -> Result<String, AuthError> {
        let mut bytes = [0u8; NONCE_BYTES];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| AuthError::Internal("system RNG unavailable".to_string()))?;
        Ok(alloy::hex::encode(bytes))
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WalletAddress, Challenge>> {
        self.challenges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
