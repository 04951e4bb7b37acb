// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path utilities for the document store layout.

use std::path::{Path, PathBuf};

/// Storage path utilities rooted at `DATA_DIR`.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all documents.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== User Paths ==========

    /// Directory containing all user records.
    pub fn users_dir(&self) -> PathBuf {
        self.root.join("users")
    }

    /// Path to a user record, keyed by normalized wallet address.
    pub fn user(&self, wallet_key: &str) -> PathBuf {
        self.users_dir().join(format!("{wallet_key}.json"))
    }
}
