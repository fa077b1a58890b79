//! Core transaction data structures
//!
//! This crate provides the building blocks the execution engine consumes:
//! - Basic types (Hash, Address, Uint128, etc.)
//! - Payload codec for binary, deploy and call bodies
//! - Transaction construction, hashing, wire encoding and integrity checks
//! - Signing capability and signature verification

pub mod error;
pub mod payload;
pub mod signer;
pub mod transaction;
pub mod types;

// Re-export commonly used types
pub use error::*;
pub use payload::*;
pub use signer::*;
pub use transaction::*;
pub use types::*;
