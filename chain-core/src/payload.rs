//! Transaction payload codec
//!
//! A transaction carries its body as a `(PayloadType, bytes)` pair. Binary
//! payloads are opaque; deploy and call payloads are JSON documents that are
//! validated both when built and when decoded.

use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// JavaScript contract source
pub const SOURCE_TYPE_JAVASCRIPT: &str = "js";

/// TypeScript contract source
pub const SOURCE_TYPE_TYPESCRIPT: &str = "ts";

/// Contract dialects a deploy payload may carry
pub const SUPPORTED_SOURCE_TYPES: [&str; 2] = [SOURCE_TYPE_JAVASCRIPT, SOURCE_TYPE_TYPESCRIPT];

/// Function name reserved for the contract constructor; only run on deploy
pub const CONSTRUCTOR_FUNCTION: &str = "init";

/// Payload type tag
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
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    /// Plain value transfer with optional opaque data
    Binary,
    /// Contract deployment
    Deploy,
    /// Contract function call
    Call,
}

impl PayloadType {
    /// Stable string tag, part of the transaction hash preimage
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadType::Binary => "binary",
            PayloadType::Deploy => "deploy",
            PayloadType::Call => "call",
        }
    }

    /// Whether the payload has to be handed to the contract VM
    pub fn is_contract(&self) -> bool {
        !matches!(self, PayloadType::Binary)
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(PayloadType::Binary),
            "deploy" => Ok(PayloadType::Deploy),
            "call" => Ok(PayloadType::Call),
            other => Err(CoreError::InvalidPayload(format!(
                "unknown payload type {:?}",
                other
            ))),
        }
    }
}

/// Opaque binary payload
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryPayload {
    pub data: Vec<u8>,
}

impl BinaryPayload {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }
}

/// Contract deployment payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeployPayload {
    /// Contract dialect, one of [`SUPPORTED_SOURCE_TYPES`]
    pub source_type: String,
    /// Contract source code
    pub source: String,
    /// JSON array of constructor arguments, or empty
    pub args: String,
}

impl DeployPayload {
    /// Build a deploy payload, rejecting unsupported dialects up front
    pub fn new(
        source: impl Into<String>,
        source_type: impl Into<String>,
        args: impl Into<String>,
    ) -> CoreResult<Self> {
        let payload = Self {
            source_type: source_type.into(),
            source: source.into(),
            args: args.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> CoreResult<()> {
        if !SUPPORTED_SOURCE_TYPES.contains(&self.source_type.as_str()) {
            return Err(CoreError::UnsupportedSourceType(self.source_type.clone()));
        }
        if self.source.is_empty() {
            return Err(CoreError::InvalidPayload("empty contract source".to_string()));
        }
        check_args(&self.args)
    }
}

/// Contract call payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CallPayload {
    /// Name of the contract function to invoke
    pub function: String,
    /// JSON array of call arguments, or empty
    pub args: String,
}

impl CallPayload {
    pub fn new(function: impl Into<String>, args: impl Into<String>) -> CoreResult<Self> {
        let payload = Self {
            function: function.into(),
            args: args.into(),
        };
        payload.validate()?;
        Ok(payload)
    }

    fn validate(&self) -> CoreResult<()> {
        if !is_public_function_name(&self.function) {
            return Err(CoreError::InvalidPayload(format!(
                "invalid function name {:?}",
                self.function
            )));
        }
        check_args(&self.args)
    }
}

/// Decoded transaction payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxPayload {
    Binary(BinaryPayload),
    Deploy(DeployPayload),
    Call(CallPayload),
}

impl TxPayload {
    /// Type tag of this payload
    pub fn payload_type(&self) -> PayloadType {
        match self {
            TxPayload::Binary(_) => PayloadType::Binary,
            TxPayload::Deploy(_) => PayloadType::Deploy,
            TxPayload::Call(_) => PayloadType::Call,
        }
    }

    /// Encode into the bytes carried by a transaction
    pub fn encode(&self) -> CoreResult<Vec<u8>> {
        match self {
            TxPayload::Binary(payload) => Ok(payload.data.clone()),
            TxPayload::Deploy(payload) => {
                serde_json::to_vec(payload).map_err(|e| CoreError::Serialization(e.to_string()))
            }
            TxPayload::Call(payload) => {
                serde_json::to_vec(payload).map_err(|e| CoreError::Serialization(e.to_string()))
            }
        }
    }

    /// Decode and validate the bytes of a transaction payload
    pub fn decode(payload_type: PayloadType, bytes: &[u8]) -> CoreResult<Self> {
        match payload_type {
            PayloadType::Binary => Ok(TxPayload::Binary(BinaryPayload::new(bytes.to_vec()))),
            PayloadType::Deploy => {
                let payload: DeployPayload = serde_json::from_slice(bytes)
                    .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;
                payload.validate()?;
                Ok(TxPayload::Deploy(payload))
            }
            PayloadType::Call => {
                let payload: CallPayload = serde_json::from_slice(bytes)
                    .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;
                payload.validate()?;
                Ok(TxPayload::Call(payload))
            }
        }
    }
}

impl From<BinaryPayload> for TxPayload {
    fn from(payload: BinaryPayload) -> Self {
        TxPayload::Binary(payload)
    }
}

impl From<DeployPayload> for TxPayload {
    fn from(payload: DeployPayload) -> Self {
        TxPayload::Deploy(payload)
    }
}

impl From<CallPayload> for TxPayload {
    fn from(payload: CallPayload) -> Self {
        TxPayload::Call(payload)
    }
}

// `[A-Za-z$][A-Za-z0-9_$]*`, excluding the constructor
fn is_public_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let first_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '$');
    first_ok
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        && name != CONSTRUCTOR_FUNCTION
}

fn check_args(args: &str) -> CoreResult<()> {
    if args.is_empty() {
        return Ok(());
    }
    match serde_json::from_str::<serde_json::Value>(args) {
        Ok(serde_json::Value::Array(_)) => Ok(()),
        Ok(_) => Err(CoreError::InvalidPayload(
            "arguments must be a JSON array".to_string(),
        )),
        Err(e) => Err(CoreError::InvalidPayload(format!("malformed arguments: {}", e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN_SOURCE: &str = "var Token = function() {}; module.exports = Token;";

    #[test]
    fn test_deploy_payload_roundtrip() {
        let deploy =
            DeployPayload::new(TOKEN_SOURCE, "js", r#"["NebulasToken", "NAS", 1000000000]"#)
                .unwrap();
        let payload = TxPayload::from(deploy);
        let bytes = payload.encode().unwrap();

        let decoded = TxPayload::decode(PayloadType::Deploy, &bytes).unwrap();
        assert_eq!(decoded, payload);
        assert_eq!(decoded.payload_type(), PayloadType::Deploy);
    }

    #[test]
    fn test_deploy_json_field_names() {
        let deploy = DeployPayload::new(TOKEN_SOURCE, "ts", "").unwrap();
        let json: serde_json::Value =
            serde_json::from_slice(&TxPayload::Deploy(deploy).encode().unwrap()).unwrap();
        assert_eq!(json["SourceType"], "ts");
        assert_eq!(json["Source"], TOKEN_SOURCE);
        assert_eq!(json["Args"], "");
    }

    #[test]
    fn test_unsupported_source_type_rejected_at_construction() {
        let err = DeployPayload::new(TOKEN_SOURCE, "solidity", "").unwrap_err();
        assert_eq!(err, CoreError::UnsupportedSourceType("solidity".to_string()));
    }

    #[test]
    fn test_unsupported_source_type_rejected_on_decode() {
        let bytes = br#"{"SourceType":"py","Source":"x","Args":""}"#;
        assert_eq!(
            TxPayload::decode(PayloadType::Deploy, bytes).unwrap_err(),
            CoreError::UnsupportedSourceType("py".to_string())
        );
    }

    #[test]
    fn test_call_payload_roundtrip() {
        let call = CallPayload::new("transfer", r#"["n1abc", 10]"#).unwrap();
        let bytes = TxPayload::Call(call.clone()).encode().unwrap();
        assert_eq!(
            TxPayload::decode(PayloadType::Call, &bytes).unwrap(),
            TxPayload::Call(call)
        );
    }

    #[test]
    fn test_call_function_names() {
        assert!(CallPayload::new("totalSupply", "").is_ok());
        assert!(CallPayload::new("$get_1", "").is_ok());
        assert!(CallPayload::new("", "").is_err());
        assert!(CallPayload::new("1abc", "").is_err());
        assert!(CallPayload::new("bad-name", "").is_err());
        assert!(CallPayload::new(CONSTRUCTOR_FUNCTION, "").is_err());
    }

    #[test]
    fn test_args_must_be_json_array() {
        assert!(CallPayload::new("f", "[1, 2]").is_ok());
        assert!(matches!(
            CallPayload::new("f", r#"{"a": 1}"#),
            Err(CoreError::InvalidPayload(_))
        ));
        assert!(matches!(
            CallPayload::new("f", "[1,"),
            Err(CoreError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_malformed_bytes_do_not_panic() {
        for bytes in [&b"0x00"[..], b"", b"{", b"\xff\xfe", br#"{"Function": 5}"#] {
            assert!(matches!(
                TxPayload::decode(PayloadType::Call, bytes),
                Err(CoreError::InvalidPayload(_))
            ));
            assert!(matches!(
                TxPayload::decode(PayloadType::Deploy, bytes),
                Err(CoreError::InvalidPayload(_))
            ));
        }
    }

    #[test]
    fn test_binary_payload_is_verbatim() {
        let decoded = TxPayload::decode(PayloadType::Binary, b"datadata").unwrap();
        assert_eq!(decoded, TxPayload::Binary(BinaryPayload::new(b"datadata".to_vec())));
        assert_eq!(decoded.encode().unwrap(), b"datadata".to_vec());
    }

    #[test]
    fn test_payload_type_tags() {
        for ty in [PayloadType::Binary, PayloadType::Deploy, PayloadType::Call] {
            assert_eq!(ty.as_str().parse::<PayloadType>().unwrap(), ty);
        }
        assert!("transfer".parse::<PayloadType>().is_err());
        assert!(!PayloadType::Binary.is_contract());
        assert!(PayloadType::Call.is_contract());
    }
}
