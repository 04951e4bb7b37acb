// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational Auth - Wallet Sign-In Service
//!
//! Challenge/response authentication for EVM wallets: the server issues a
//! single-use nonce, the wallet signs it, and a verified signature is
//! exchanged for a session token.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Challenges, signature recovery, sessions, orchestration
//! - `challenge_sweeper` - Background purge of expired challenges
//! - `storage` - User record repositories (in-memory, JSON files)

pub mod api;
pub mod auth;
pub mod challenge_sweeper;
pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod state;
pub mod storage;
