// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, defaults, and the [`AppConfig`] loaded once at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//! | `DATA_DIR` | Root directory of the on-disk user store | in-memory store |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM certificate chain and key | plain HTTP |
//! | `SESSION_SECRET` | HS256 session signing secret (>= 32 bytes) | random per process |
//! | `SESSION_TTL_SECS` | Session lifetime | `86400` |
//! | `SESSION_ISSUER` | `iss` claim of session tokens | `relational-auth` |
//! | `CHALLENGE_TTL_SECS` | Challenge lifetime | `300` |
//! | `CHALLENGE_SWEEP_INTERVAL_SECS` | Expired challenge sweep period | `60` |
//! | `SIWE_URI` | URI shown in the sign-in message | `http://localhost:3000` |
//! | `SIWE_STATEMENT` | Statement shown in the sign-in message | `Sign in to Relational Wallet.` |
//! | `SIWE_CHAIN_ID` | Chain id for both signing schemes | `43114` |
//! | `EIP712_DOMAIN_NAME` | Default typed-data domain name | `Relational Wallet` |
//! | `EIP712_DOMAIN_VERSION` | Default typed-data domain version | `1` |
//! | `EIP712_VERIFYING_CONTRACT` | Default typed-data verifying contract | unset |

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::models::WalletAddress;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Root directory of the on-disk user store. Unset selects the in-memory store.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";

/// HS256 secret for session tokens.
///
/// Rotating it invalidates every session issued under the old value.
pub const SESSION_SECRET_ENV: &str = "SESSION_SECRET";
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";
pub const SESSION_ISSUER_ENV: &str = "SESSION_ISSUER";

pub const CHALLENGE_TTL_ENV: &str = "CHALLENGE_TTL_SECS";
pub const CHALLENGE_SWEEP_INTERVAL_ENV: &str = "CHALLENGE_SWEEP_INTERVAL_SECS";

pub const SIWE_URI_ENV: &str = "SIWE_URI";
pub const SIWE_STATEMENT_ENV: &str = "SIWE_STATEMENT";
pub const SIWE_CHAIN_ID_ENV: &str = "SIWE_CHAIN_ID";

pub const EIP712_DOMAIN_NAME_ENV: &str = "EIP712_DOMAIN_NAME";
pub const EIP712_DOMAIN_VERSION_ENV: &str = "EIP712_DOMAIN_VERSION";
pub const EIP712_VERIFYING_CONTRACT_ENV: &str = "EIP712_VERIFYING_CONTRACT";

pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(5 * 60);
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DEFAULT_SESSION_ISSUER: &str = "relational-auth";
pub const DEFAULT_SIWE_URI: &str = "http://localhost:3000";
pub const DEFAULT_SIWE_STATEMENT: &str = "Sign in to Relational Wallet.";
/// Avalanche C-Chain mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 43114;
pub const DEFAULT_DOMAIN_NAME: &str = "Relational Wallet";
pub const DEFAULT_DOMAIN_VERSION: &str = "1";

/// Upper bound for every `*_SECS` setting (one year).
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Minimum HS256 secret length in bytes.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} is not a valid {expected}: {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("SESSION_SECRET must be at least 32 bytes")]
    WeakSessionSecret,
    #[error("TLS_CERT_PATH and TLS_KEY_PATH must be set together")]
    IncompleteTls,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Fixed parts of the sign-in message and the default EIP-712 domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiweConfig {
    /// `host[:port]` of `uri`; the first line of the message.
    pub domain: String,
    pub uri: String,
    pub statement: String,
    pub chain_id: u64,
    pub typed_domain_name: String,
    pub typed_domain_version: String,
    pub verifying_contract: Option<WalletAddress>,
}

impl Default for SiweConfig {
    fn default() -> Self {
        Self {
            domain: "localhost:3000".to_string(),
            uri: DEFAULT_SIWE_URI.to_string(),
            statement: DEFAULT_SIWE_STATEMENT.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            typed_domain_name: DEFAULT_DOMAIN_NAME.to_string(),
            typed_domain_version: DEFAULT_DOMAIN_VERSION.to_string(),
            verifying_contract: None,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub data_dir: Option<PathBuf>,
    pub tls: Option<(PathBuf, PathBuf)>,
    /// `None` means a random secret is generated at startup.
    pub session_secret: Option<Vec<u8>>,
    pub session_ttl: Duration,
    pub session_issuer: String,
    pub challenge_ttl: Duration,
    pub sweep_interval: Duration,
    pub siwe: SiweConfig,
}

impl AppConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let port = match get(PORT_ENV) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                expected: "port number",
                value: raw,
            })?,
            None => 8080,
        };

        let log_format = match get(LOG_FORMAT_ENV).as_deref().map(str::trim) {
            Some("json") => LogFormat::Json,
            Some("pretty") | None => LogFormat::Pretty,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: LOG_FORMAT_ENV,
                    expected: "log format (json|pretty)",
                    value: other.to_string(),
                })
            }
        };

        let tls = match (get(TLS_CERT_PATH_ENV), get(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((PathBuf::from(cert), PathBuf::from(key))),
            (None, None) => None,
            _ => return Err(ConfigError::IncompleteTls),
        };

        let session_secret = match get(SESSION_SECRET_ENV) {
            Some(secret) if secret.len() < MIN_SESSION_SECRET_LEN => {
                return Err(ConfigError::WeakSessionSecret)
            }
            Some(secret) => Some(secret.into_bytes()),
            None => None,
        };

        let uri_raw = get(SIWE_URI_ENV).unwrap_or_else(|| DEFAULT_SIWE_URI.to_string());
        let uri = Url::parse(uri_raw.trim()).map_err(|_| ConfigError::Invalid {
            name: SIWE_URI_ENV,
            expected: "absolute URL",
            value: uri_raw.clone(),
        })?;
        let domain = match (uri.host_str(), uri.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(ConfigError::Invalid {
                    name: SIWE_URI_ENV,
                    expected: "URL with a host",
                    value: uri_raw,
                })
            }
        };

        let verifying_contract = match get(EIP712_VERIFYING_CONTRACT_ENV) {
            Some(raw) => Some(WalletAddress::parse(&raw).map_err(|_| ConfigError::Invalid {
                name: EIP712_VERIFYING_CONTRACT_ENV,
                expected: "contract address",
                value: raw,
            })?),
            None => None,
        };

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            log_format,
            data_dir: get(DATA_DIR_ENV).map(PathBuf::from),
            tls,
            session_secret,
            session_ttl: parse_secs(&get, SESSION_TTL_ENV, DEFAULT_SESSION_TTL)?,
            session_issuer: get(SESSION_ISSUER_ENV)
                .unwrap_or_else(|| DEFAULT_SESSION_ISSUER.to_string()),
            challenge_ttl: parse_secs(&get, CHALLENGE_TTL_ENV, DEFAULT_CHALLENGE_TTL)?,
            sweep_interval: parse_secs(&get, CHALLENGE_SWEEP_INTERVAL_ENV, DEFAULT_SWEEP_INTERVAL)?,
            siwe: SiweConfig {
                domain,
                uri: uri.as_str().trim_end_matches('/').to_string(),
                statement: get(SIWE_STATEMENT_ENV)
                    .unwrap_or_else(|| DEFAULT_SIWE_STATEMENT.to_string()),
                chain_id: match get(SIWE_CHAIN_ID_ENV) {
                    Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                        name: SIWE_CHAIN_ID_ENV,
                        expected: "chain id",
                        value: raw,
                    })?,
                    None => DEFAULT_CHAIN_ID,
                },
                typed_domain_name: get(EIP712_DOMAIN_NAME_ENV)
                    .unwrap_or_else(|| DEFAULT_DOMAIN_NAME.to_string()),
                typed_domain_version: get(EIP712_DOMAIN_VERSION_ENV)
                    .unwrap_or_else(|| DEFAULT_DOMAIN_VERSION.to_string()),
                verifying_contract,
            },
        })
    }
}

fn parse_secs(
    get: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: Duration,
) -> Result<Duration, ConfigError> {
    match get(name) {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if (1..=MAX_DURATION_SECS).contains(&secs) => {
                Ok(Duration::from_secs(secs))
            }
            _ => Err(ConfigError::Invalid {
                name,
                expected: "number of seconds between 1 and 31536000",
                value: raw,
            }),
        },
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = load(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.challenge_ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert!(config.session_secret.is_none());
        assert!(config.data_dir.is_none());
        assert_eq!(config.siwe, SiweConfig::default());
    }

    #[test]
    fn siwe_domain_comes_from_uri() {
        let config = load(&[(SIWE_URI_ENV, "https://app.relational.network/login")]).unwrap();
        assert_eq!(config.siwe.domain, "app.relational.network");
        assert_eq!(config.siwe.uri, "https://app.relational.network/login");
    }

    #[test]
    fn rejects_short_session_secret() {
        let result = load(&[(SESSION_SECRET_ENV, "too-short")]);
        assert!(matches!(result, Err(ConfigError::WeakSessionSecret)));
    }

    #[test]
    fn rejects_half_configured_tls() {
        let result = load(&[(TLS_CERT_PATH_ENV, "/certs/cert.pem")]);
        assert!(matches!(result, Err(ConfigError::IncompleteTls)));
    }

    #[test]
    fn rejects_zero_ttl() {
        let result = load(&[(CHALLENGE_TTL_ENV, "0")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name, .. }) if name == CHALLENGE_TTL_ENV
        ));
    }

    #[test]
    fn rejects_oversized_ttl() {
        let result = load(&[(CHALLENGE_TTL_ENV, "100000000000000")]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name, .. }) if name == CHALLENGE_TTL_ENV
        ));

        let too_long = (MAX_DURATION_SECS + 1).to_string();
        let result = load(&[(SESSION_TTL_ENV, too_long.as_str())]);
        assert!(matches!(
            result,
            Err(ConfigError::Invalid { name, .. }) if name == SESSION_TTL_ENV
        ));

        let longest = MAX_DURATION_SECS.to_string();
        let config = load(&[(SESSION_TTL_ENV, longest.as_str())]).unwrap();
        assert_eq!(config.session_ttl, Duration::from_secs(MAX_DURATION_SECS));
    }

    #[test]
    fn parses_overrides() {
        let config = load(&[
            (PORT_ENV, "9443"),
            (LOG_FORMAT_ENV, "json"),
            (SIWE_CHAIN_ID_ENV, "43113"),
            (EIP712_VERIFYING_CONTRACT_ENV, "0xCcCCccccCCCCcCCCCCCcCcCccCcCCCcCcccccccC"),
            (SESSION_SECRET_ENV, "0123456789abcdef0123456789abcdef"),
        ])
        .unwrap();
        assert_eq!(config.port, 9443);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.siwe.chain_id, 43113);
        assert_eq!(
            config.siwe.verifying_contract.unwrap().to_string(),
            "0xcccccccccccccccccccccccccccccccccccccccc"
        );
        assert_eq!(config.session_secret.unwrap().len(), 32);
    }
}
