// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signable message rendering.
//!
//! Both the challenge issuer and the verifier render the message from the
//! same stored [`Challenge`] record, so the output must be a pure function of
//! the record and the fixed [`MessageFormat`].
//!
//! ## Personal-sign layout (EIP-4361)
//!
//! ```text
//! {domain} wants you to sign in with your Ethereum account:
//! {address}
//!
//! {statement}
//!
//! URI: {uri}
//! Version: 1
//! Chain ID: {chain_id}
//! Nonce: {nonce}
//! Issued At: {issued_at}
//! Expiration Time: {expires_at}
//! ```

use std::borrow::Cow;

use alloy::primitives::U256;
use alloy::sol_types::Eip712Domain;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use super::challenge::Challenge;
use super::AuthError;
use crate::config::SiweConfig;
use crate::models::{TypedDomainInput, WalletAddress};

alloy::sol! {
    /// EIP-712 struct signed on the typed-data path.
    #[derive(Debug, PartialEq, Eq)]
    struct WalletAuthentication {
        address wallet;
        string nonce;
        string statement;
        uint64 issuedAt;
        uint64 expiresAt;
    }
}

/// Primary type name as it appears in the EIP-712 type string.
pub const PRIMARY_TYPE: &str = "WalletAuthentication";

/// EIP-712 domain binding a typed signature to this application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedDomain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: Option<WalletAddress>,
}

impl TypedDomain {
    /// Validate a client-supplied domain.
    pub fn from_input(input: &TypedDomainInput) -> Result<Self, AuthError> {
        let verifying_contract = input
            .verifying_contract
            .as_deref()
            .map(WalletAddress::parse)
            .transpose()?;

        Ok(Self {
            name: input.name.clone(),
            version: input.version.clone(),
            chain_id: input.chain_id,
            verifying_contract,
        })
    }

    pub fn to_eip712(&self) -> Eip712Domain {
        Eip712Domain::new(
            Some(Cow::Owned(self.name.clone())),
            Some(Cow::Owned(self.version.clone())),
            Some(U256::from(self.chain_id)),
            self.verifying_contract.map(|addr| addr.as_address()),
            None,
        )
    }

    fn to_json(&self) -> Value {
        let mut domain = json!({
            "name": self.name,
            "version": self.version,
            "chainId": self.chain_id,
        });
        if let Some(contract) = self.verifying_contract {
            domain["verifyingContract"] = json!(contract.to_string());
        }
        domain
    }

    fn type_fields(&self) -> Value {
        let mut fields = vec![
            json!({ "name": "name", "type": "string" }),
            json!({ "name": "version", "type": "string" }),
            json!({ "name": "chainId", "type": "uint256" }),
        ];
        if self.verifying_contract.is_some() {
            fields.push(json!({ "name": "verifyingContract", "type": "address" }));
        }
        Value::Array(fields)
    }
}

/// Fixed application parts of every sign-in message.
#[derive(Debug, Clone)]
pub struct MessageFormat {
    domain: String,
    uri: String,
    statement: String,
    chain_id: u64,
    default_typed_domain: TypedDomain,
}

impl MessageFormat {
    pub fn new(siwe: &SiweConfig) -> Self {
        Self {
            domain: siwe.domain.clone(),
            uri: siwe.uri.clone(),
            statement: siwe.statement.clone(),
            chain_id: siwe.chain_id,
            default_typed_domain: TypedDomain {
                name: siwe.typed_domain_name.clone(),
                version: siwe.typed_domain_version.clone(),
                chain_id: siwe.chain_id,
                verifying_contract: siwe.verifying_contract,
            },
        }
    }

    pub fn default_typed_domain(&self) -> &TypedDomain {
        &self.default_typed_domain
    }

    /// Render the personal-sign text for a challenge.
    pub fn personal_message(&self, challenge: &Challenge) -> String {
        format!(
            "{domain} wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             {statement}\n\
             \n\
             URI: {uri}\n\
             Version: 1\n\
             Chain ID: {chain_id}\n\
             Nonce: {nonce}\n\
             Issued At: {issued_at}\n\
             Expiration Time: {expires_at}",
            domain = self.domain,
            address = challenge.wallet_address,
            statement = self.statement,
            uri = self.uri,
            chain_id = self.chain_id,
            nonce = challenge.nonce,
            issued_at = rfc3339(challenge.issued_at),
            expires_at = rfc3339(challenge.expires_at),
        )
    }

    /// Build the EIP-712 struct for a challenge.
    pub fn typed_message(&self, challenge: &Challenge) -> WalletAuthentication {
        WalletAuthentication {
            wallet: challenge.wallet_address.as_address(),
            nonce: challenge.nonce.clone(),
            statement: self.statement.clone(),
            issuedAt: unix_secs(challenge.issued_at),
            expiresAt: unix_secs(challenge.expires_at),
        }
    }

    /// `eth_signTypedData_v4` payload for a challenge under the default domain.
    pub fn typed_data_json(&self, challenge: &Challenge) -> Value {
        let domain = &self.default_typed_domain;
        let message = self.typed_message(challenge);
        json!({
            "types": {
                "EIP712Domain": domain.type_fields(),
                PRIMARY_TYPE: [
                    { "name": "wallet", "type": "address" },
                    { "name": "nonce", "type": "string" },
                    { "name": "statement", "type": "string" },
                    { "name": "issuedAt", "type": "uint64" },
                    { "name": "expiresAt", "type": "uint64" },
                ],
            },
            "primaryType": PRIMARY_TYPE,
            "domain": domain.to_json(),
            "message": {
                "wallet": challenge.wallet_address.to_string(),
                "nonce": message.nonce,
                "statement": message.statement,
                "issuedAt": message.issuedAt,
                "expiresAt": message.expiresAt,
            },
        })
    }
}

fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn unix_secs(at: DateTime<Utc>) -> u64 {
    u64::try_from(at.timestamp()).unwrap_or_default()
}
