// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User record repositories.
//!
//! Two backends implement [`UserRepository`]:
//!
//! - [`InMemoryUserRepository`] - default, process-local
//! - [`FileUserRepository`] - one JSON document per wallet under `DATA_DIR/users/`

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{DocumentStore, StorageError, StoragePaths, UserRepository, UserStoreError};
use crate::models::WalletAddress;

/// User account stored by a repository.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    /// Unique user identifier (UUID)
    pub id: String,
    /// Normalized wallet address (unique)
    pub wallet_address: WalletAddress,
    /// Optional contact email captured at sign-up
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

/// Fields for a new account. `created_at` and `last_login_at` are both set
/// to `now`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub wallet_address: WalletAddress,
    pub email: Option<String>,
    pub now: DateTime<Utc>,
}

impl NewUser {
    fn into_record(self) -> UserRecord {
        UserRecord {
            id: Uuid::new_v4().to_string(),
            wallet_address: self.wallet_address,
            email: self.email,
            created_at: self.now,
            last_login_at: self.now,
        }
    }
}

// =============================================================================
// In-memory backend
// =============================================================================

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<WalletAddress, UserRecord>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let guard = self.users.read().await;
        Ok(guard.get(wallet).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError> {
        let mut guard = self.users.write().await;
        if guard.contains_key(&new_user.wallet_address) {
            return Err(UserStoreError::AlreadyExists(new_user.wallet_address));
        }
        let record = new_user.into_record();
        guard.insert(record.wallet_address, record.clone());
        Ok(record)
    }

    async fn save(&self, user: &UserRecord) -> Result<UserRecord, UserStoreError> {
        let mut guard = self.users.write().await;
        match guard.get_mut(&user.wallet_address) {
            Some(existing) if existing.id == user.id => {
                *existing = user.clone();
                Ok(user.clone())
            }
            Some(_) => Err(UserStoreError::AlreadyExists(user.wallet_address)),
            None => Err(UserStoreError::NotFound(user.wallet_address)),
        }
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

// =============================================================================
// Document store backend
// =============================================================================

/// Repository persisting each user as `users/{wallet}.json`.
///
/// The file name is the normalized address, so uniqueness is enforced by the
/// filesystem on create.
pub struct FileUserRepository {
    store: DocumentStore,
    write_lock: Mutex<()>,
}

impl FileUserRepository {
    /// Open (and create if needed) the store rooted at `root`.
    pub fn open(root: impl AsRef<std::path::Path>) -> Result<Self, StorageError> {
        let mut store = DocumentStore::new(StoragePaths::new(root));
        store.initialize()?;
        Ok(Self {
            store,
            write_lock: Mutex::new(()),
        })
    }
}

#[async_trait]
impl UserRepository for FileUserRepository {
    async fn find_by_wallet(
        &self,
        wallet: &WalletAddress,
    ) -> Result<Option<UserRecord>, UserStoreError> {
        let path = self.store.paths().user(&wallet.as_key());
        match self.store.read_json::<UserRecord>(path) {
            Ok(record) => Ok(Some(record)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn create(&self, new_user: NewUser) -> Result<UserRecord, UserStoreError> {
        let wallet = new_user.wallet_address;
        let record = new_user.into_record();
        let path = self.store.paths().user(&wallet.as_key());

        let _guard = self.write_lock.lock().await;
        match self.store.create_json(path, &record) {
            Ok(()) => Ok(record),
            Err(StorageError::AlreadyExists(_)) => Err(UserStoreError::AlreadyExists(wallet)),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, user: &UserRecord) -> Result<UserRecord, UserStoreError> {
        let path = self.store.paths().user(&user.wallet_address.as_key());

        let _guard = self.write_lock.lock().await;
        let existing = match self.store.read_json::<UserRecord>(&path) {
            Ok(existing) => existing,
            Err(StorageError::NotFound(_)) => {
                return Err(UserStoreError::NotFound(user.wallet_address))
            }
            Err(e) => return Err(e.into()),
        };
        if existing.id != user.id {
            return Err(UserStoreError::AlreadyExists(user.wallet_address));
        }

        self.store.write_json(&path, user)?;
        Ok(user.clone())
    }

    async fn health_check(&self) -> Result<(), UserStoreError> {
        self.store.health_check()?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}
