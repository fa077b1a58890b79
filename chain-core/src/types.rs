//! Basic blockchain types

use crate::{CoreError, CoreResult};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Block number type (64-bit unsigned integer)
pub type BlockNumber = u64;

/// Timestamp in seconds since Unix epoch
pub type Timestamp = i64;

/// Nonce type for transactions
pub type Nonce = u64;

/// Chain identifier a transaction is bound to
pub type ChainId = u32;

/// 32-byte hash type
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, bincode::Encode, bincode::Decode,
)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Create a new hash from byte array
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create hash from a 32-byte slice
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| {
            CoreError::InvalidArgument(format!("hash must be 32 bytes, got {}", slice.len()))
        })?;
        Ok(Self(bytes))
    }

    /// Keccak-256 digest of `data`
    pub fn keccak(data: &[u8]) -> Self {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&Keccak256::digest(data));
        Self(bytes)
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(bytes))
    }

    /// Zero hash (all bytes are 0)
    pub fn zero() -> Self {
        Self([0u8; 32])
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// 20-byte address type, derived from the owner's public key
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Address([u8; 20]);

impl Address {
    /// Address length in bytes
    pub const LENGTH: usize = 20;

    /// Create a new address from byte array
    pub fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Create address from slice
    pub fn from_slice(slice: &[u8]) -> CoreResult<Self> {
        let bytes: [u8; 20] = slice
            .try_into()
            .map_err(|_| CoreError::InvalidAddress(hex::encode(slice)))?;
        Ok(Self(bytes))
    }

    /// Derive the address owning an uncompressed secp256k1 public key
    /// (last 20 bytes of the Keccak-256 of the key without its 0x04 prefix).
    pub fn from_public_key(public_key: &secp256k1::PublicKey) -> Self {
        let pubkey_bytes = public_key.serialize_uncompressed();
        let pubkey_hash = Keccak256::digest(&pubkey_bytes[1..]);
        let mut addr_bytes = [0u8; 20];
        addr_bytes.copy_from_slice(&pubkey_hash[12..32]);
        Self(addr_bytes)
    }

    /// Get the underlying byte array
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Create from hex string, with or without a `0x` prefix
    pub fn from_hex(hex: &str) -> CoreResult<Self> {
        let bytes = hex::decode(hex.trim_start_matches("0x"))?;
        Self::from_slice(&bytes)
    }

    /// Zero address (all bytes are 0)
    pub fn zero() -> Self {
        Self([0u8; 20])
    }
}

impl Default for Address {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Unsigned 128-bit amount used for balances, values and gas.
///
/// All arithmetic is checked: an operation that would wrap returns
/// [`CoreError::Uint128Overflow`] or [`CoreError::Uint128Underflow`] instead.
/// Serialized as a decimal string so that it survives formats without
/// native 128-bit integers (JSON consumers, TOML).
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Uint128(u128);

impl Uint128 {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Largest representable amount
    pub const MAX: Self = Self(u128::MAX);

    /// Create from a raw `u128`
    pub const fn new(value: u128) -> Self {
        Self(value)
    }

    /// Zero value
    pub fn zero() -> Self {
        Self::ZERO
    }

    /// Raw value
    pub fn as_u128(&self) -> u128 {
        self.0
    }

    /// Whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Fixed-width big-endian encoding (used by the hash preimage)
    pub fn to_be_bytes(&self) -> [u8; 16] {
        self.0.to_be_bytes()
    }

    /// Decode a fixed-width big-endian value
    pub fn from_be_bytes(bytes: [u8; 16]) -> Self {
        Self(u128::from_be_bytes(bytes))
    }

    /// Checked addition
    pub fn checked_add(self, other: Self) -> CoreResult<Self> {
        self.0
            .checked_add(other.0)
            .map(Self)
            .ok_or(CoreError::Uint128Overflow)
    }

    /// Checked subtraction
    pub fn checked_sub(self, other: Self) -> CoreResult<Self> {
        self.0
            .checked_sub(other.0)
            .map(Self)
            .ok_or(CoreError::Uint128Underflow)
    }

    /// Checked multiplication
    pub fn checked_mul(self, other: Self) -> CoreResult<Self> {
        self.0
            .checked_mul(other.0)
            .map(Self)
            .ok_or(CoreError::Uint128Overflow)
    }
}

impl fmt::Display for Uint128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for Uint128 {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl From<u64> for Uint128 {
    fn from(value: u64) -> Self {
        Self(value as u128)
    }
}

impl From<usize> for Uint128 {
    fn from(value: usize) -> Self {
        Self(value as u128)
    }
}

impl FromStr for Uint128 {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u128>()
            .map(Self)
            .map_err(|e| CoreError::InvalidArgument(format!("invalid uint128 {:?}: {}", s, e)))
    }
}

impl Serialize for Uint128 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Uint128 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct Uint128Visitor;

        impl Visitor<'_> for Uint128Visitor {
            type Value = Uint128;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or decimal string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Uint128::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                u128::try_from(v)
                    .map(Uint128)
                    .map_err(|_| E::custom("negative amount"))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(Uint128(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(Uint128Visitor)
    }
}
