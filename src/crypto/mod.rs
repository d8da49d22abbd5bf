//! Cryptographic utilities for the ledger
//!
//! This module provides:
//! - SHA-256 hashing and difficulty checks
//! - ECDSA key management (secp256k1)
//! - WIF private key import/export

pub mod hash;
pub mod keys;

pub use hash::{double_sha256, meets_difficulty, sha256, sha256_hex};
pub use keys::{
    public_key_from_hex, sign_digest_hex, verify_digest_hex, wif_decode, wif_encode, KeyError,
    KeyPair,
};
