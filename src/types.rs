// Core value types shared by the router, the host chain and executor modules
// Addresses, amounts and the transfer-type tag carried in swap payloads
//
// Numan Thabit 2025 Nov

use crate::errors::RouterError;
use serde::{Deserialize, Deserializer, Serialize};

pub use alloy_primitives::Address;

/// Token amounts. All arithmetic on them is checked.
pub type Amount = u128;

/// The zero address doubles as the chain's native asset when used as a token.
pub const NATIVE: Address = Address::ZERO;

/// Width of an address inside swap payloads.
pub const ADDRESS_LEN: usize = 20;

/// Read an address from the first 20 bytes of `bytes`.
pub fn read_address(bytes: &[u8]) -> Result<Address, RouterError> {
    bytes
        .get(..ADDRESS_LEN)
        .map(Address::from_slice)
        .ok_or(RouterError::InvalidDataLength)
}

/// How an executor step asks the router to move its input funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferType {
    /// Pull from the original caller against the call's transfer authorization.
    TransferFrom,
    /// Push from balance the router already holds.
    Transfer,
    /// Funds are already where they need to be.
    None,
}

impl TransferType {
    pub fn as_byte(self) -> u8 {
        match self {
            TransferType::TransferFrom => 0,
            TransferType::Transfer => 1,
            TransferType::None => 2,
        }
    }
}

impl TryFrom<u8> for TransferType {
    type Error = RouterError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TransferType::TransferFrom),
            1 => Ok(TransferType::Transfer),
            2 => Ok(TransferType::None),
            other => Err(RouterError::UnknownTransferType(other)),
        }
    }
}

/// Deserialize a `u128` from either a decimal string or a plain integer.
///
/// YAML and JSON fixtures carry 18-decimal token amounts that do not fit `u64`.
pub fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Amount, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
    }
    match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Int(n) => Ok(n as Amount),
    }
}

/// Serde adapter for byte payloads carried as `0x`-prefixed hex strings.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
