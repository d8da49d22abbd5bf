//! ECDSA key management for the ledger
//!
//! Provides key pair generation, signing, and verification using
//! the secp256k1 elliptic curve (same as Bitcoin). Keys double as
//! addresses: an address is the compressed public key in hex.

use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::hash::double_sha256;

/// WIF version byte for mainnet private keys
const WIF_VERSION: u8 = 0x80;
/// Marker byte appended to WIF payloads for compressed public keys
const WIF_COMPRESSED: u8 = 0x01;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Invalid message digest")]
    InvalidDigest,
    #[error("Invalid WIF string")]
    InvalidWif,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Create a key pair from a WIF-encoded private key
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        let payload = wif_decode(wif)?;
        let secret_key =
            SecretKey::from_slice(&payload).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format).
    /// This string is also the ledger address of the key.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// Export the private key in Wallet Import Format (Base58Check)
    pub fn to_wif(&self) -> String {
        wif_encode(&self.secret_key.secret_bytes())
    }

    /// Sign a hex-encoded SHA-256 digest, returning the compact signature in hex
    pub fn sign(&self, digest_hex: &str) -> Result<String, KeyError> {
        sign_digest_hex(&self.secret_key, digest_hex)
    }

    /// Verify a hex-encoded compact signature against this key pair's public key
    pub fn verify(&self, digest_hex: &str, signature_hex: &str) -> Result<bool, KeyError> {
        verify_digest_hex(&self.public_key_hex(), digest_hex, signature_hex)
    }
}

/// Encode a 32-byte private key in Wallet Import Format.
/// Payload is version byte, key bytes, compressed marker, then a
/// 4-byte double SHA-256 checksum, all Base58 encoded.
pub fn wif_encode(secret_bytes: &[u8]) -> String {
    let mut payload = Vec::with_capacity(38);
    payload.push(WIF_VERSION);
    payload.extend_from_slice(secret_bytes);
    payload.push(WIF_COMPRESSED);

    let checksum = double_sha256(&payload);
    payload.extend_from_slice(&checksum[..4]);

    bs58::encode(payload).into_string()
}

/// Decode a WIF string into the raw 32-byte private key.
/// Accepts both compressed (38-byte payload) and legacy uncompressed
/// (37-byte payload) encodings.
pub fn wif_decode(wif: &str) -> Result<Vec<u8>, KeyError> {
    let bytes = bs58::decode(wif)
        .into_vec()
        .map_err(|_| KeyError::InvalidWif)?;
    if bytes.len() != 37 && bytes.len() != 38 {
        return Err(KeyError::InvalidWif);
    }

    let (payload, checksum) = bytes.split_at(bytes.len() - 4);
    let expected = double_sha256(payload);
    if checksum != &expected[..4] {
        return Err(KeyError::InvalidWif);
    }
    if payload[0] != WIF_VERSION {
        return Err(KeyError::InvalidWif);
    }
    if payload.len() == 34 && payload[33] != WIF_COMPRESSED {
        return Err(KeyError::InvalidWif);
    }

    Ok(payload[1..33].to_vec())
}

/// Parse a public key from its compressed hex encoding
pub fn public_key_from_hex(hex_key: &str) -> Result<PublicKey, KeyError> {
    let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
    PublicKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPublicKey)
}

/// Sign a hex-encoded SHA-256 digest with a secret key.
/// Returns the 64-byte compact ECDSA signature as a hex string.
pub fn sign_digest_hex(secret_key: &SecretKey, digest_hex: &str) -> Result<String, KeyError> {
    let secp = Secp256k1::new();

    let digest = hex::decode(digest_hex).map_err(|_| KeyError::InvalidDigest)?;
    let message = Message::from_digest_slice(&digest).map_err(|_| KeyError::InvalidDigest)?;

    let signature = secp.sign_ecdsa(&message, secret_key);
    Ok(hex::encode(signature.serialize_compact()))
}

/// Verify a hex-encoded compact signature over a hex-encoded digest
pub fn verify_digest_hex(
    public_key_hex: &str,
    digest_hex: &str,
    signature_hex: &str,
) -> Result<bool, KeyError> {
    let secp = Secp256k1::new();

    let public_key = public_key_from_hex(public_key_hex)?;
    let digest = hex::decode(digest_hex).map_err(|_| KeyError::InvalidDigest)?;
    let message = Message::from_digest_slice(&digest).map_err(|_| KeyError::InvalidDigest)?;

    let sig_bytes = hex::decode(signature_hex).map_err(|_| KeyError::InvalidSignature)?;
    let sig = secp256k1::ecdsa::Signature::from_compact(&sig_bytes)
        .map_err(|_| KeyError::InvalidSignature)?;

    match secp.verify_ecdsa(&message, &sig, &public_key) {
        Ok(()) => Ok(true),
        Err(_) => Ok(false),
    }
}
