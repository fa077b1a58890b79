//! Signing capability and signature verification
//!
//! Signing keys are never held globally: whoever signs a transaction passes a
//! [`Signer`] explicitly. Verification needs no key material because the
//! supported algorithm recovers the public key from the signature.

use crate::{Address, CoreError, CoreResult, Hash};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Length of a recoverable secp256k1 signature: `r ‖ s ‖ v`
pub const SECP256K1_SIGNATURE_LENGTH: usize = 65;

/// Signature algorithm identifier, carried as a `u8` on the wire
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
#[repr(u8)]
pub enum SignatureAlgorithm {
    Secp256k1 = 1,
}

impl SignatureAlgorithm {
    /// Recover the address that produced `signature` over `hash`
    pub fn recover_address(&self, hash: &Hash, signature: &[u8]) -> CoreResult<Address> {
        match self {
            SignatureAlgorithm::Secp256k1 => secp256k1_recover(hash, signature),
        }
    }

    /// Check that `signature` over `hash` was made by the key behind `from`
    pub fn verify(&self, hash: &Hash, signature: &[u8], from: &Address) -> CoreResult<()> {
        let signer = self
            .recover_address(hash, signature)
            .map_err(|_| CoreError::InvalidSignature)?;
        if &signer != from {
            return Err(CoreError::InvalidSignature);
        }
        Ok(())
    }
}

impl From<SignatureAlgorithm> for u8 {
    fn from(alg: SignatureAlgorithm) -> Self {
        alg as u8
    }
}

impl TryFrom<u8> for SignatureAlgorithm {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(SignatureAlgorithm::Secp256k1),
            other => Err(CoreError::UnsupportedAlgorithm(other)),
        }
    }
}

/// A capability able to sign transaction hashes for one address
pub trait Signer {
    /// Algorithm of the produced signatures
    fn algorithm(&self) -> SignatureAlgorithm;

    /// Address owning the signing key
    fn address(&self) -> Address;

    /// Sign a 32-byte hash
    fn sign(&self, hash: &Hash) -> CoreResult<Vec<u8>>;
}

/// In-process secp256k1 key
#[derive(Clone)]
pub struct Secp256k1Signer {
    secret_key: SecretKey,
    address: Address,
}

impl Secp256k1Signer {
    /// Load a signer from a 32-byte private key
    pub fn from_bytes(private_key: &[u8]) -> CoreResult<Self> {
        let secp = Secp256k1::new();
        let secret_key = SecretKey::from_slice(private_key)?;
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            address: Address::from_public_key(&public_key),
        })
    }

    /// Generate a fresh random key
    pub fn generate() -> Self {
        loop {
            let bytes: [u8; 32] = rand::random();
            // Out-of-range scalars are astronomically rare; draw again.
            if let Ok(signer) = Self::from_bytes(&bytes) {
                return signer;
            }
        }
    }

    /// Raw private key bytes
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }
}

impl fmt::Debug for Secp256k1Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1Signer")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

impl Signer for Secp256k1Signer {
    fn algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::Secp256k1
    }

    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, hash: &Hash) -> CoreResult<Vec<u8>> {
        let secp = Secp256k1::new();
        let message = Message::from_digest(*hash.as_bytes());

        let sig = secp.sign_ecdsa_recoverable(message, &self.secret_key);
        let (recovery_id, sig_bytes) = sig.serialize_compact();

        let mut bytes = Vec::with_capacity(SECP256K1_SIGNATURE_LENGTH);
        bytes.extend_from_slice(&sig_bytes);
        bytes.push(i32::from(recovery_id) as u8);
        Ok(bytes)
    }
}

fn secp256k1_recover(hash: &Hash, signature: &[u8]) -> CoreResult<Address> {
    if signature.len() != SECP256K1_SIGNATURE_LENGTH {
        return Err(CoreError::InvalidSignature);
    }

    let recovery_id = RecoveryId::try_from(i32::from(signature[64]))?;
    let recoverable_sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)?;

    let secp = Secp256k1::new();
    let message = Message::from_digest(*hash.as_bytes());
    let public_key = secp.recover_ecdsa(message, &recoverable_sig)?;

    Ok(Address::from_public_key(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_and_verify() {
        let signer = Secp256k1Signer::generate();
        let hash = Hash::keccak(b"payload");

        let signature = signer.sign(&hash).unwrap();
        assert_eq!(signature.len(), SECP256K1_SIGNATURE_LENGTH);

        let alg = signer.algorithm();
        assert_eq!(alg.recover_address(&hash, &signature).unwrap(), signer.address());
        assert!(alg.verify(&hash, &signature, &signer.address()).is_ok());
    }

    #[test]
    fn test_verify_rejects_other_address() {
        let signer = Secp256k1Signer::generate();
        let other = Secp256k1Signer::generate();
        let hash = Hash::keccak(b"payload");
        let signature = signer.sign(&hash).unwrap();

        assert_eq!(
            SignatureAlgorithm::Secp256k1.verify(&hash, &signature, &other.address()),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_verify_rejects_other_hash() {
        let signer = Secp256k1Signer::generate();
        let signature = signer.sign(&Hash::keccak(b"a")).unwrap();

        assert_eq!(
            SignatureAlgorithm::Secp256k1.verify(
                &Hash::keccak(b"b"),
                &signature,
                &signer.address()
            ),
            Err(CoreError::InvalidSignature)
        );
    }

    #[test]
    fn test_malformed_signature() {
        let signer = Secp256k1Signer::generate();
        let hash = Hash::keccak(b"payload");
        let alg = SignatureAlgorithm::Secp256k1;

        assert!(alg.verify(&hash, &[0u8; 10], &signer.address()).is_err());

        let mut bad_recovery = signer.sign(&hash).unwrap();
        bad_recovery[64] = 9;
        assert!(alg.verify(&hash, &bad_recovery, &signer.address()).is_err());
    }

    #[test]
    fn test_deterministic_address_from_key() {
        let key = [7u8; 32];
        let a = Secp256k1Signer::from_bytes(&key).unwrap();
        let b = Secp256k1Signer::from_bytes(&a.secret_bytes()).unwrap();
        assert_eq!(a.address(), b.address());

        assert!(Secp256k1Signer::from_bytes(&[0u8; 32]).is_err());
        assert!(Secp256k1Signer::from_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn test_algorithm_byte() {
        assert_eq!(u8::from(SignatureAlgorithm::Secp256k1), 1);
        assert_eq!(
            SignatureAlgorithm::try_from(1).unwrap(),
            SignatureAlgorithm::Secp256k1
        );
        assert_eq!(
            SignatureAlgorithm::try_from(12),
            Err(CoreError::UnsupportedAlgorithm(12))
        );
    }
}
