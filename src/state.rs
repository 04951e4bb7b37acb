// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tracing::info;

use crate::auth::{AuthService, ChallengeStore, MessageFormat, SessionIssuer};
use crate::clock::{Clock, SystemClock};
use crate::config::AppConfig;
use crate::error::StartupError;
use crate::storage::{FileUserRepository, InMemoryUserRepository, UserRepository};

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    /// Wire the service graph from configuration using the system clock.
    pub fn from_config(config: &AppConfig) -> Result<Self, StartupError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self, StartupError> {
        let users: Arc<dyn UserRepository> = match &config.data_dir {
            Some(dir) => {
                info!(data_dir = %dir.display(), "Using file user store");
                Arc::new(FileUserRepository::open(dir)?)
            }
            None => {
                info!("DATA_DIR not set; using in-memory user store");
                Arc::new(InMemoryUserRepository::new())
            }
        };
        Self::with_users(config, clock, users)
    }

    pub fn with_users(
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        users: Arc<dyn UserRepository>,
    ) -> Result<Self, StartupError> {
        let messages = Arc::new(MessageFormat::new(&config.siwe));
        let challenges = Arc::new(ChallengeStore::new(
            config.challenge_ttl,
            clock.clone(),
            messages,
        ));
        let sessions = SessionIssuer::from_config(config, clock.clone())?;

        Ok(Self::new(Arc::new(AuthService::new(
            challenges, sessions, users, clock,
        ))))
    }

    /// Challenge store shared with the background sweeper.
    pub fn challenges(&self) -> Arc<ChallengeStore> {
        self.auth.challenges().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory_store() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.auth.users().backend(), "memory");
        assert!(state.challenges().is_empty());
    }

    #[test]
    fn data_dir_selects_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_string_lossy().to_string();
        let config =
            AppConfig::from_lookup(|name| (name == "DATA_DIR").then(|| path.clone())).unwrap();

        let state = AppState::from_config(&config).unwrap();
        assert_eq!(state.auth.users().backend(), "file");
        assert!(dir.path().join("users").exists());
    }
}
