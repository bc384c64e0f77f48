// Signature-based pre-authorization (permit) module
// This file handles permit digests, Ed25519 signing and verification, and the
// allowance book that signed permits register for the router to pull against
//
// Numan Thabit 2025 Nov

use crate::errors::{Result, RouterError};
use crate::types::{de_amount, Address, Amount};
use blake2::{Blake2b512, Digest};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hex::FromHex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

const ED25519_FLAG: u8 = 0x00;
const PERMIT_DOMAIN: &[u8] = b"ultra-router/permit-single/v1";

/// Serialized signature layout: `flag || signature || pubkey`.
pub const SIGNATURE_LEN: usize = 1 + 64 + 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitDetails {
    pub token: Address,
    #[serde(deserialize_with = "de_amount")]
    pub amount: Amount,
    /// Last block at which the allowance may be spent; 0 means the signing block.
    pub expiration: u64,
    pub nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermitSingle {
    pub details: PermitDetails,
    pub spender: Address,
    /// Last block at which the signature itself may be submitted.
    pub sig_deadline: u64,
}

impl PermitSingle {
    /// Blake2b-256 digest of the canonical permit encoding.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Blake2b512::new();
        hasher.update(PERMIT_DOMAIN);
        hasher.update(self.details.token.as_slice());
        hasher.update(self.details.amount.to_be_bytes());
        hasher.update(self.details.expiration.to_be_bytes());
        hasher.update(self.details.nonce.to_be_bytes());
        hasher.update(self.spender.as_slice());
        hasher.update(self.sig_deadline.to_be_bytes());
        let hash = hasher.finalize();
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&hash[..32]);
        digest
    }
}

/// Account address of an Ed25519 key: first 20 bytes of blake2b(flag || pubkey).
pub fn address_from_public_key(public_key: &[u8; 32]) -> Address {
    let mut hasher = Blake2b512::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    let hash = hasher.finalize();
    let mut raw = [0u8; 20];
    raw.copy_from_slice(&hash[..20]);
    Address::new(raw)
}

fn signing_key(secret_hex: &str) -> Result<SigningKey> {
    let sk_bytes = <[u8; 32]>::from_hex(secret_hex).map_err(|_| RouterError::InvalidSignature)?;
    Ok(SigningKey::from_bytes(&sk_bytes))
}

pub fn address_from_secret(secret_hex: &str) -> Result<Address> {
    let key = signing_key(secret_hex)?;
    Ok(address_from_public_key(&key.verifying_key().to_bytes()))
}

/// Sign a permit with a hex-encoded 32-byte Ed25519 secret.
pub fn sign_permit(permit: &PermitSingle, secret_hex: &str) -> Result<Vec<u8>> {
    let key = signing_key(secret_hex)?;
    let sig = key.sign(&permit.digest());

    let mut serialized = Vec::with_capacity(SIGNATURE_LEN);
    serialized.push(ED25519_FLAG);
    serialized.extend_from_slice(&sig.to_bytes());
    serialized.extend_from_slice(&key.verifying_key().to_bytes());
    Ok(serialized)
}

/// Verify a serialized signature and return the signer's address.
pub fn recover_signer(permit: &PermitSingle, signature: &[u8]) -> Result<Address> {
    if signature.len() != SIGNATURE_LEN || signature[0] != ED25519_FLAG {
        return Err(RouterError::InvalidSignature);
    }
    let sig_bytes: [u8; 64] = signature[1..65]
        .try_into()
        .map_err(|_| RouterError::InvalidSignature)?;
    let pk_bytes: [u8; 32] = signature[65..]
        .try_into()
        .map_err(|_| RouterError::InvalidSignature)?;
    let vk = VerifyingKey::from_bytes(&pk_bytes).map_err(|_| RouterError::InvalidSignature)?;
    vk.verify(&permit.digest(), &Signature::from_bytes(&sig_bytes))
        .map_err(|_| RouterError::InvalidSignature)?;
    Ok(address_from_public_key(&pk_bytes))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PermitAllowance {
    pub amount: Amount,
    pub expiration: u64,
    pub nonce: u64,
}

/// Allowances registered through signed permits, keyed by (owner, token, spender).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermitRegistry {
    allowances: HashMap<(Address, Address, Address), PermitAllowance>,
}

impl PermitRegistry {
    pub fn allowance(&self, owner: Address, token: Address, spender: Address) -> PermitAllowance {
        self.allowances
            .get(&(owner, token, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Verify `signature` over `permit` as `owner` and register the allowance.
    pub fn permit(
        &mut self,
        owner: Address,
        permit: &PermitSingle,
        signature: &[u8],
        block: u64,
    ) -> Result<()> {
        if block > permit.sig_deadline {
            return Err(RouterError::PermitExpired {
                deadline: permit.sig_deadline,
            });
        }
        let signer = recover_signer(permit, signature)?;
        if signer != owner {
            return Err(RouterError::InvalidSigner { signer, owner });
        }

        let key = (owner, permit.details.token, permit.spender);
        let current = self.allowances.get(&key).copied().unwrap_or_default();
        if current.nonce != permit.details.nonce {
            return Err(RouterError::InvalidNonce {
                expected: current.nonce,
                got: permit.details.nonce,
            });
        }
        let expiration = match permit.details.expiration {
            0 => block,
            e => e,
        };
        self.allowances.insert(
            key,
            PermitAllowance {
                amount: permit.details.amount,
                expiration,
                nonce: current.nonce.wrapping_add(1),
            },
        );
        debug!(
            owner = %owner,
            token = %permit.details.token,
            spender = %permit.spender,
            amount = permit.details.amount,
            "permit registered"
        );
        Ok(())
    }

    /// Fail unless `spender` could spend `amount` of `owner`'s `token` permit
    /// at `block`. Leaves the registry untouched.
    pub fn check_spend(
        &self,
        owner: Address,
        spender: Address,
        token: Address,
        amount: Amount,
        block: u64,
    ) -> Result<()> {
        let entry = self
            .allowances
            .get(&(owner, token, spender))
            .ok_or(RouterError::InsufficientAllowance {
                token,
                allowance: 0,
                needed: amount,
            })?;
        if block > entry.expiration {
            return Err(RouterError::AllowanceExpired {
                expiration: entry.expiration,
            });
        }
        if entry.amount < amount {
            return Err(RouterError::InsufficientAllowance {
                token,
                allowance: entry.amount,
                needed: amount,
            });
        }
        Ok(())
    }

    /// Spend `amount` of the allowance `owner` granted `spender` for `token`.
    pub fn spend(
        &mut self,
        owner: Address,
        spender: Address,
        token: Address,
        amount: Amount,
        block: u64,
    ) -> Result<()> {
        self.check_spend(owner, spender, token, amount, block)?;
        if let Some(entry) = self.allowances.get_mut(&(owner, token, spender)) {
            entry.amount -= amount;
        }
        Ok(())
    }
}
