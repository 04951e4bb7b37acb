// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! This module defines the request and response data structures used by
//! the REST API. All types derive `Serialize`/`Deserialize` and `ToSchema`
//! for automatic JSON handling and OpenAPI documentation. Field names are
//! camelCase on the wire to match the frontend.
//!
//! ## Wallet Address Type
//!
//! The [`WalletAddress`] newtype wraps a 20-byte EVM address. Client input is
//! accepted in any letter case and normalized on parse; the canonical text
//! form is lowercase hex with a `0x` prefix.

use std::fmt;
use std::str::FromStr;

use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::storage::UserRecord;

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Error returned when a string is not a `0x`-prefixed 40-digit hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid wallet address: {0:?}")]
pub struct InvalidAddress(pub String);

/// Normalized EVM wallet address.
///
/// Equality, hashing and storage keys all use the 20 raw bytes, so two inputs
/// that differ only in letter case are the same address.
///
/// # Example
///
/// ```rust,ignore
/// let addr = WalletAddress::parse("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12")?;
/// assert_eq!(addr.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "0x742d35cc6634c0532925a3b844bc9e7595f4ab12")]
pub struct WalletAddress(Address);

impl WalletAddress {
    /// Parse and normalize a client-supplied address.
    ///
    /// Surrounding whitespace is ignored; the `0x` prefix is required and
    /// exactly 40 hex digits must follow. Checksum casing is not enforced.
    pub fn parse(raw: &str) -> Result<Self, InvalidAddress> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| InvalidAddress(raw.to_string()))?;

        if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidAddress(raw.to_string()));
        }

        let bytes = alloy::hex::decode(digits).map_err(|_| InvalidAddress(raw.to_string()))?;
        Ok(Self(Address::from_slice(&bytes)))
    }

    /// The underlying 20-byte address.
    pub fn as_address(&self) -> Address {
        self.0
    }

    /// Filesystem- and map-safe key (lowercase hex, `0x` prefix).
    pub fn as_key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&alloy::hex::encode_prefixed(self.0))
    }
}

impl From<Address> for WalletAddress {
    fn from(value: Address) -> Self {
        WalletAddress(value)
    }
}

impl FromStr for WalletAddress {
    type Err = InvalidAddress;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = InvalidAddress;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Challenge Models
// =============================================================================

/// Request a sign-in challenge for a wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonceRequest {
    /// Wallet address in any letter case.
    pub wallet_address: String,
}

/// A freshly issued challenge.
///
/// The wallet signs either `sign_message` (personal_sign) or `typed_data`
/// (eth_signTypedData_v4) and submits the signature together with `nonce`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NonceResponse {
    /// Single-use nonce (64 hex characters).
    pub nonce: String,
    /// Human-readable message to sign with personal_sign.
    pub sign_message: String,
    /// Normalized wallet address the challenge is bound to.
    pub wallet_address: WalletAddress,
    /// When the challenge was issued.
    pub issued_at: DateTime<Utc>,
    /// When the challenge stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// EIP-712 payload for the typed-data signing path.
    #[schema(value_type = Object)]
    pub typed_data: Value,
}

/// EIP-712 domain supplied by the client for typed-data signatures.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TypedDomainInput {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verifying_contract: Option<String>,
}

// =============================================================================
// Authentication Models
// =============================================================================

/// Wallet-connect sign-in. Creates the account on first use.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticateRequest {
    pub wallet_address: String,
    /// 65-byte `r || s || v` signature, hex encoded.
    pub signature: String,
    pub nonce: String,
    /// Verify as EIP-712 typed data instead of personal_sign.
    #[serde(default)]
    pub use_typed_signature: bool,
    /// Typed-data domain; the server default is used when absent.
    #[serde(default)]
    pub domain: Option<TypedDomainInput>,
}

/// Create-only sign-up.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub wallet_address: String,
    pub signature: String,
    pub nonce: String,
    /// Optional contact email stored on the new account.
    #[serde(default)]
    pub email: Option<String>,
}

/// Login for an existing account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub wallet_address: String,
    pub signature: String,
    pub nonce: String,
}

/// Public view of a user account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub wallet_address: WalletAddress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: DateTime<Utc>,
}

impl From<&UserRecord> for UserSummary {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.clone(),
            wallet_address: user.wallet_address,
            email: user.email.clone(),
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

/// Successful sign-in: the account and its bearer session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserSummary,
    pub token: String,
}

/// Response for `GET /auth/validate`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValidateResponse {
    pub valid: bool,
    pub user: UserSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_normalizes_case_and_whitespace() {
        let addr = WalletAddress::parse("  0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12 ").unwrap();
        assert_eq!(addr.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f4ab12");

        let upper = WalletAddress::parse("0X742D35CC6634C0532925A3B844BC9E7595F4AB12").unwrap();
        assert_eq!(addr, upper);
    }

    #[test]
    fn wallet_address_rejects_bad_shapes() {
        for raw in [
            "",
            "742d35cc6634c0532925a3b844bc9e7595f4ab12",
            "0x742d35cc6634c0532925a3b844bc9e7595f4ab1",
            "0x742d35cc6634c0532925a3b844bc9e7595f4ab123",
            "0x742d35cc6634c0532925a3b844bc9e7595f4abzz",
            "not-an-address",
        ] {
            assert!(WalletAddress::parse(raw).is_err(), "accepted {raw:?}");
        }
    }

    #[test]
    fn wallet_address_serializes_lowercase() {
        let addr = WalletAddress::parse("0xF39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, r#""0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266""#);

        let back: WalletAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);

        assert!(serde_json::from_str::<WalletAddress>(r#""0x1234""#).is_err());
    }

    #[test]
    fn authenticate_request_defaults_to_personal_sign() {
        let request: AuthenticateRequest = serde_json::from_str(
            r#"{"walletAddress":"0xabc","signature":"0x00","nonce":"n"}"#,
        )
        .unwrap();
        assert!(!request.use_typed_signature);
        assert!(request.domain.is_none());
    }
}
