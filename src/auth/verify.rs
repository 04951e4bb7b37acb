// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Off-chain signature verification.
//!
//! Both schemes recover the signer from a 65-byte `r || s || v` secp256k1
//! signature and compare it with the claimed wallet. A signature that cannot
//! be parsed is an error; a parsed signature from the wrong key is
//! `valid: false`. Callers must keep the two apart.

use alloy::primitives::{Signature, B256};
use alloy::sol_types::SolStruct;

use super::message::{TypedDomain, WalletAuthentication};
use super::AuthError;
use crate::models::WalletAddress;

/// Length of an `r || s || v` signature.
pub const SIGNATURE_LEN: usize = 65;

/// Outcome of a well-formed signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub valid: bool,
    /// Signer recovered from the signature, if recovery succeeded.
    pub recovered_address: Option<WalletAddress>,
}

/// Verify an EIP-191 `personal_sign` signature over `message`.
pub fn verify_personal_signature(
    address: &WalletAddress,
    message: &str,
    signature: &str,
) -> Result<Verification, AuthError> {
    let signature = parse_signature(signature)?;
    let recovered = signature
        .recover_address_from_msg(message.as_bytes())
        .ok()
        .map(WalletAddress::from);
    Ok(compare(address, recovered))
}

/// Verify an EIP-712 signature over `message` bound to `domain`.
pub fn verify_typed_signature(
    address: &WalletAddress,
    domain: &TypedDomain,
    message: &WalletAuthentication,
    signature: &str,
) -> Result<Verification, AuthError> {
    let signature = parse_signature(signature)?;
    let digest: B256 = message.eip712_signing_hash(&domain.to_eip712());
    let recovered = signature
        .recover_address_from_prehash(&digest)
        .ok()
        .map(WalletAddress::from);
    Ok(compare(address, recovered))
}

fn compare(expected: &WalletAddress, recovered: Option<WalletAddress>) -> Verification {
    Verification {
        valid: recovered.as_ref() == Some(expected),
        recovered_address: recovered,
    }
}

/// Decode a hex signature (with or without `0x`). Accepts `v` as 0/1 or 27/28.
fn parse_signature(raw: &str) -> Result<Signature, AuthError> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);

    let bytes = alloy::hex::decode(hex)
        .map_err(|e| AuthError::MalformedSignature(format!("not hex: {e}")))?;
    if bytes.len() != SIGNATURE_LEN {
        return Err(AuthError::MalformedSignature(format!(
            "expected {SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        )));
    }

    Signature::from_raw(&bytes).map_err(|e| AuthError::MalformedSignature(e.to_string()))
}
