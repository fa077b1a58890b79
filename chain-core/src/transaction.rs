//! Transaction data structures and operations

use crate::payload::{PayloadType, TxPayload};
use crate::signer::{SignatureAlgorithm, Signer};
use crate::{Address, ChainId, CoreError, CoreResult, Hash, Nonce, Timestamp, Uint128};
use serde::{Deserialize, Serialize};

/// Upper bound on the gas price a transaction may offer
pub const MAX_GAS_PRICE: Uint128 = Uint128::new(1_000_000_000_000);

/// Upper bound on the gas limit a transaction may request
pub const MAX_GAS: Uint128 = Uint128::new(50_000_000_000);

/// Gas price used when the sender does not pick one
pub const DEFAULT_GAS_PRICE: Uint128 = Uint128::new(1_000_000);

/// Largest payload accepted at construction (1 MiB)
pub const MAX_PAYLOAD_LENGTH: usize = 1024 * 1024;

/// Largest wire envelope `from_wire` will decode: a full payload plus room
/// for the fixed fields and the signature
pub const MAX_WIRE_LENGTH: usize = MAX_PAYLOAD_LENGTH + 1024;

/// Transaction signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Signature {
    /// Algorithm that produced `data`
    pub alg: SignatureAlgorithm,
    /// Raw signature bytes
    pub data: Vec<u8>,
}

/// Type-tagged transaction body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct TxData {
    pub payload_type: PayloadType,
    pub payload: Vec<u8>,
}

/// Transaction data structure
///
/// Equality is structural over every field, signature included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, bincode::Encode, bincode::Decode)]
pub struct Transaction {
    /// Content hash over every field except the signature
    pub hash: Hash,
    /// Chain the transaction is bound to
    pub chain_id: ChainId,
    /// Sender; must own the signing key
    pub from: Address,
    /// Recipient (may equal `from`)
    pub to: Address,
    /// Amount moved from `from` to `to` on success
    pub value: Uint128,
    /// Sender nonce
    pub nonce: Nonce,
    /// Creation time, seconds since Unix epoch
    pub timestamp: Timestamp,
    /// Payload type and bytes
    pub data: TxData,
    /// Price paid per unit of gas
    pub gas_price: Uint128,
    /// Maximum gas the execution may consume
    pub gas_limit: Uint128,
    /// Signature over `hash`; `None` until signed
    pub signature: Option<Signature>,
}

impl Transaction {
    /// Create a new unsigned transaction stamped with the current time
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain_id: ChainId,
        from: Address,
        to: Address,
        value: Uint128,
        nonce: Nonce,
        payload_type: PayloadType,
        payload: Vec<u8>,
        gas_price: Uint128,
        gas_limit: Uint128,
    ) -> CoreResult<Self> {
        if gas_price.is_zero() || gas_price > MAX_GAS_PRICE {
            return Err(CoreError::InvalidArgument(format!(
                "gas price {} out of range (0, {}]",
                gas_price, MAX_GAS_PRICE
            )));
        }
        if gas_limit.is_zero() || gas_limit > MAX_GAS {
            return Err(CoreError::InvalidArgument(format!(
                "gas limit {} out of range (0, {}]",
                gas_limit, MAX_GAS
            )));
        }
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(CoreError::InvalidArgument(format!(
                "payload of {} bytes exceeds {}",
                payload.len(),
                MAX_PAYLOAD_LENGTH
            )));
        }

        let mut tx = Self {
            hash: Hash::zero(),
            chain_id,
            from,
            to,
            value,
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
            data: TxData {
                payload_type,
                payload,
            },
            gas_price,
            gas_limit,
            signature: None,
        };
        tx.hash = tx.compute_hash();
        Ok(tx)
    }

    /// Create a plain value transfer
    pub fn transfer(
        chain_id: ChainId,
        from: Address,
        to: Address,
        value: Uint128,
        nonce: Nonce,
        gas_price: Uint128,
        gas_limit: Uint128,
    ) -> CoreResult<Self> {
        Self::new(
            chain_id,
            from,
            to,
            value,
            nonce,
            PayloadType::Binary,
            Vec::new(),
            gas_price,
            gas_limit,
        )
    }

    /// Create a transaction carrying a typed payload
    #[allow(clippy::too_many_arguments)]
    pub fn with_payload(
        chain_id: ChainId,
        from: Address,
        to: Address,
        value: Uint128,
        nonce: Nonce,
        payload: impl Into<TxPayload>,
        gas_price: Uint128,
        gas_limit: Uint128,
    ) -> CoreResult<Self> {
        let payload = payload.into();
        let bytes = payload.encode()?;
        Self::new(
            chain_id,
            from,
            to,
            value,
            nonce,
            payload.payload_type(),
            bytes,
            gas_price,
            gas_limit,
        )
    }

    /// Bytes the transaction hash is computed over.
    ///
    /// Layout (integers big-endian): `from ‖ to ‖ value ‖ nonce ‖ timestamp ‖
    /// u32 len ‖ type tag ‖ u32 len ‖ payload ‖ chain_id ‖ gas_price ‖ gas_limit`.
    pub fn hash_preimage(&self) -> Vec<u8> {
        let tag = self.data.payload_type.as_str().as_bytes();
        let mut buf = Vec::with_capacity(136 + tag.len() + self.data.payload.len());
        buf.extend_from_slice(self.from.as_bytes());
        buf.extend_from_slice(self.to.as_bytes());
        buf.extend_from_slice(&self.value.to_be_bytes());
        buf.extend_from_slice(&self.nonce.to_be_bytes());
        buf.extend_from_slice(&self.timestamp.to_be_bytes());
        buf.extend_from_slice(&(tag.len() as u32).to_be_bytes());
        buf.extend_from_slice(tag);
        buf.extend_from_slice(&(self.data.payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(&self.data.payload);
        buf.extend_from_slice(&self.chain_id.to_be_bytes());
        buf.extend_from_slice(&self.gas_price.to_be_bytes());
        buf.extend_from_slice(&self.gas_limit.to_be_bytes());
        buf
    }

    /// Recompute the content hash from the current fields
    pub fn compute_hash(&self) -> Hash {
        Hash::keccak(&self.hash_preimage())
    }

    /// Whether a signature is attached
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Decode the payload bytes according to the payload type
    pub fn load_payload(&self) -> CoreResult<TxPayload> {
        TxPayload::decode(self.data.payload_type, &self.data.payload)
    }

    /// Sign the transaction.
    ///
    /// The hash is recomputed first so that edits made to the fields since
    /// construction are covered by the signature. Any previous signature is
    /// replaced.
    pub fn sign(&mut self, signer: &dyn Signer) -> CoreResult<()> {
        let signer_address = signer.address();
        if signer_address != self.from {
            return Err(CoreError::SignerMismatch {
                signer: signer_address.to_string(),
                from: self.from.to_string(),
            });
        }

        self.hash = self.compute_hash();
        let data = signer.sign(&self.hash)?;
        self.signature = Some(Signature {
            alg: signer.algorithm(),
            data,
        });
        Ok(())
    }

    /// Admission check: chain binding, content hash and signature, in that order
    pub fn verify_integrity(&self, expected_chain_id: ChainId) -> CoreResult<()> {
        if self.chain_id != expected_chain_id {
            return Err(CoreError::InvalidChainId {
                expected: expected_chain_id,
                actual: self.chain_id,
            });
        }

        self.verify_hash()?;

        let signature = self.signature.as_ref().ok_or(CoreError::InvalidSignature)?;
        signature.alg.verify(&self.hash, &signature.data, &self.from)
    }

    /// Recover the address that signed this transaction
    pub fn sender(&self) -> CoreResult<Address> {
        let signature = self.signature.as_ref().ok_or(CoreError::InvalidSignature)?;
        signature.alg.recover_address(&self.hash, &signature.data)
    }

    /// Encode every field into the wire envelope
    pub fn to_wire(&self) -> CoreResult<Vec<u8>> {
        bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Decode a wire envelope, rejecting it if the transmitted hash does not
    /// match the decoded fields
    pub fn from_wire(bytes: &[u8]) -> CoreResult<Self> {
        if bytes.len() > MAX_WIRE_LENGTH {
            return Err(CoreError::Deserialization(format!(
                "envelope of {} bytes exceeds {}",
                bytes.len(),
                MAX_WIRE_LENGTH
            )));
        }

        // Every claimed container length is checked against the limit
        // before anything is allocated for it
        let config = bincode::config::standard().with_limit::<MAX_WIRE_LENGTH>();
        let (tx, read): (Self, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| CoreError::Deserialization(e.to_string()))?;
        if read != bytes.len() {
            return Err(CoreError::Deserialization(format!(
                "{} trailing bytes after transaction",
                bytes.len() - read
            )));
        }
        tx.verify_hash()?;
        Ok(tx)
    }

    fn verify_hash(&self) -> CoreResult<()> {
        let computed = self.compute_hash();
        if computed != self.hash {
            return Err(CoreError::HashMismatch {
                stored: self.hash.to_hex(),
                computed: computed.to_hex(),
            });
        }
        Ok(())
    }
}
