// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Record Storage
//!
//! The authentication core treats user persistence as an external
//! collaborator reached only through the [`UserRepository`] trait. Records
//! are keyed by normalized wallet address, which must be unique.
//!
//! ## Storage Layout (file backend)
//!
//! ```text
//! $DATA_DIR/
//!   users/
//!     {0x-lowercase-address}.json
//! ```

pub mod document_store;
pub mod paths;
pub mod users;

use async_trait::async_trait;

pub use document_store::{DocumentStore, StorageError, StorageResult};
pub use paths::StoragePaths;
pub use users::{FileUserRepository, InMemoryUserRepository, NewUser, UserRecord};

use crate::models::WalletAddress;

/// Errors surfaced by user repositories.
#[derive(Debug, thiserror::Error)]
pub enum UserStoreError {
    /// A record for this wallet already exists
    #[error("user already exists for wallet {0}")]
    AlreadyExists(WalletAddress),
    /// No record for this wallet
    #[error("user not found for wallet {0}")]
    NotFound(WalletAddress),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Persistence collaborator for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<UserRecord>, UserStoreError>;

    /// Insert a new record. Fails with `AlreadyExists` if the wallet is taken.
    async fn create(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError>;

    /// Persist changes to an existing record (e.g. `last_login_at`).
    async fn save(&self, user: &UserRecord) -> Result<UserRecord, UserStoreError>;

    async fn health_check(&self) -> Result<(), UserStoreError> {
        Ok(())
    }

    /// Short backend name for health reporting.
    fn backend(&self) -> &'static str;
}
