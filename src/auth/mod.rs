// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Wallet sign-in for the Relational Wallet API ("Sign-In with Ethereum").
//!
//! ## Auth Flow
//!
//! 1. Frontend requests a challenge for its wallet address (`POST /auth/nonce`)
//! 2. Wallet signs the returned message (personal_sign or EIP-712 typed data)
//! 3. Frontend submits address, signature and nonce
//! 4. Server:
//!    - Regenerates the message from the stored challenge
//!    - Recovers the signer and compares it with the address
//!    - Consumes the challenge (single use)
//!    - Finds or creates the user record
//!    - Issues an HS256 session token
//! 5. Later requests send `Authorization: Bearer <session token>`
//!
//! ## Security
//!
//! - Nonces carry 256 bits of entropy and expire after 5 minutes by default
//! - A new challenge for the same wallet supersedes the previous one
//! - Verification is off-chain ECDSA recovery only
//! - Sessions expire; there is no revocation list

pub mod challenge;
pub mod error;
pub mod extractor;
pub mod message;
pub mod service;
pub mod session;
pub mod verify;

pub use challenge::{Challenge, ChallengeStore, IssuedChallenge};
pub use error::AuthError;
pub use extractor::Auth;
pub use message::{MessageFormat, TypedDomain};
pub use service::{AccountPolicy, AuthOutcome, AuthService, SignatureScheme, WalletSubmission};
pub use session::{SessionClaims, SessionIssuer};
pub use verify::{verify_personal_signature, verify_typed_signature, Verification};
