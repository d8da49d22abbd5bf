//! Transaction handling for the ledger
//!
//! Implements a UTXO-based transaction model with digital signatures.
//! A transaction spends previously confirmed outputs through signed
//! inputs and creates new outputs, with fee and reward rules enforced
//! during validation.

use crate::crypto::{sha256_hex, verify_digest_hex, KeyError, KeyPair};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blockchain::Blockchain;

// =============================================================================
// Error Types
// =============================================================================

/// Transaction-related validation errors
#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Signature and previous TX are required")]
    MissingSignatureOrPrevious,
    #[error("Amount must be greater than zero")]
    InvalidAmount,
    #[error("Invalid tx input signature")]
    InvalidSignature,
    #[error("Invalid tx hash")]
    InvalidHash,
    #[error("Invalid tx outputs")]
    InvalidOutputs,
    #[error("Invalid tx inputs: {0}")]
    InvalidInputs(String),
    #[error("Invalid tx reward")]
    InvalidReward,
    #[error("Input amounts must be equal or greater than output amounts")]
    InsufficientInputValue,
    #[error("Invalid TXO reference hash")]
    InvalidOutputReference,
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

// =============================================================================
// Transaction Type
// =============================================================================

/// Transaction kind, serialized as its numeric discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TransactionType {
    /// Ordinary value transfer
    Regular = 1,
    /// Miner payout carrying the block reward plus collected fees
    Fee = 2,
}

impl Default for TransactionType {
    fn default() -> Self {
        Self::Regular
    }
}

impl From<TransactionType> for u8 {
    fn from(tx_type: TransactionType) -> u8 {
        tx_type as u8
    }
}

impl TryFrom<u8> for TransactionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Regular),
            2 => Ok(Self::Fee),
            other => Err(format!("unknown transaction type {other}")),
        }
    }
}

// =============================================================================
// Transaction Output
// =============================================================================

/// A value assigned to an address, spendable by a later input
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionOutput {
    pub amount: u64,
    /// Recipient address (compressed public key in hex)
    pub to_address: String,
    /// Hash of the transaction this output belongs to. Empty until the
    /// owning transaction finalizes its hash and back-patches it.
    pub origin_tx_hash: String,
}

impl TransactionOutput {
    pub fn new(amount: u64, to_address: &str) -> Self {
        Self {
            amount,
            to_address: to_address.to_string(),
            origin_tx_hash: String::new(),
        }
    }

    /// Digest that spending inputs sign over when referencing this output
    pub fn content_hash(&self) -> String {
        sha256_hex(format!("{}{}", self.to_address, self.amount).as_bytes())
    }

    pub fn is_valid(&self) -> Result<(), TransactionError> {
        if self.amount < 1 {
            return Err(TransactionError::InvalidAmount);
        }
        Ok(())
    }
}

// =============================================================================
// Transaction Input
// =============================================================================

/// A claim spending a previously confirmed output
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionInput {
    pub amount: u64,
    /// Source address, also the public key the signature verifies against
    pub from_address: String,
    /// Hash of the transaction holding the output being spent
    pub previous_tx_hash: String,
    /// Compact ECDSA signature in hex, empty until signed
    pub signature: String,
}

impl TransactionInput {
    pub fn new(amount: u64, from_address: &str, previous_tx_hash: &str) -> Self {
        Self {
            amount,
            from_address: from_address.to_string(),
            previous_tx_hash: previous_tx_hash.to_string(),
            signature: String::new(),
        }
    }

    /// Build an unsigned input spending the given output.
    /// The caller must `sign` it before use.
    pub fn from_txo(output: &TransactionOutput) -> Self {
        Self {
            amount: output.amount,
            from_address: output.to_address.clone(),
            previous_tx_hash: output.origin_tx_hash.clone(),
            signature: String::new(),
        }
    }

    /// Digest covering the spend claim: previous tx hash, source address, amount
    pub fn message_hash(&self) -> String {
        sha256_hex(
            format!(
                "{}{}{}",
                self.previous_tx_hash, self.from_address, self.amount
            )
            .as_bytes(),
        )
    }

    /// Sign the spend claim with the hex-encoded private key of `from_address`
    pub fn sign(&mut self, private_key_hex: &str) -> Result<(), KeyError> {
        let key_pair = KeyPair::from_private_key_hex(private_key_hex)?;
        self.signature = key_pair.sign(&self.message_hash())?;
        Ok(())
    }

    pub fn is_valid(&self) -> Result<(), TransactionError> {
        if self.previous_tx_hash.is_empty() || self.signature.is_empty() {
            return Err(TransactionError::MissingSignatureOrPrevious);
        }
        if self.amount < 1 {
            return Err(TransactionError::InvalidAmount);
        }

        // Malformed key or signature material counts as a failed verification
        let verified = verify_digest_hex(&self.from_address, &self.message_hash(), &self.signature)
            .unwrap_or(false);
        if !verified {
            return Err(TransactionError::InvalidSignature);
        }
        Ok(())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// A content-addressed bundle of inputs and outputs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[serde(rename = "type")]
    pub tx_type: TransactionType,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    pub hash: String,
    /// Empty for Fee transactions
    pub tx_inputs: Vec<TransactionInput>,
    pub tx_outputs: Vec<TransactionOutput>,
}

impl Transaction {
    /// Create a transaction and finalize its content hash.
    /// Every output's `origin_tx_hash` is back-patched to the final hash,
    /// since an output does not know its origin until the parent commits.
    pub fn new(
        tx_type: TransactionType,
        tx_inputs: Vec<TransactionInput>,
        tx_outputs: Vec<TransactionOutput>,
    ) -> Self {
        let mut tx = Self {
            tx_type,
            timestamp: Utc::now().timestamp_millis(),
            hash: String::new(),
            tx_inputs,
            tx_outputs,
        };
        let hash = tx.content_hash();
        tx.hash = hash.clone();
        for output in &mut tx.tx_outputs {
            output.origin_tx_hash = hash.clone();
        }
        tx
    }

    /// Build the Fee transaction wrapping a miner payout output
    pub fn from_reward(output: TransactionOutput) -> Self {
        Self::new(TransactionType::Fee, Vec::new(), vec![output])
    }

    /// Content hash over type, input signatures, output hashes, and timestamp
    pub fn content_hash(&self) -> String {
        let signatures = self
            .tx_inputs
            .iter()
            .map(|txi| txi.signature.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let output_hashes = self
            .tx_outputs
            .iter()
            .map(|txo| txo.content_hash())
            .collect::<Vec<_>>()
            .join(",");
        sha256_hex(
            format!(
                "{}{}{}{}",
                self.tx_type as u8,
                signatures,
                output_hashes,
                self.timestamp
            )
            .as_bytes(),
        )
    }

    /// Fee paid by this transaction: input value not claimed by outputs.
    /// Zero when there are no inputs (Fee transactions pay no fee).
    pub fn get_fee(&self) -> u64 {
        if self.tx_inputs.is_empty() {
            return 0;
        }
        let input_sum: u64 = self.tx_inputs.iter().map(|txi| txi.amount).sum();
        let output_sum: u64 = self.tx_outputs.iter().map(|txo| txo.amount).sum();
        input_sum.saturating_sub(output_sum)
    }

    /// Validate the transaction against the current difficulty and the
    /// total fees collectable in the block under construction.
    pub fn is_valid(&self, difficulty: u32, total_fees: u64) -> Result<(), TransactionError> {
        if self.hash != self.content_hash() {
            return Err(TransactionError::InvalidHash);
        }

        // At least one output must be individually valid
        if self.tx_outputs.is_empty()
            || !self.tx_outputs.iter().any(|txo| txo.is_valid().is_ok())
        {
            return Err(TransactionError::InvalidOutputs);
        }

        if !self.tx_inputs.is_empty() {
            let failures: Vec<String> = self
                .tx_inputs
                .iter()
                .filter_map(|txi| txi.is_valid().err().map(|err| err.to_string()))
                .collect();
            if !failures.is_empty() {
                return Err(TransactionError::InvalidInputs(failures.join("; ")));
            }

            if self.tx_type == TransactionType::Fee {
                let reward_cap = Blockchain::reward_amount(difficulty) + total_fees;
                if self.tx_outputs[0].amount > reward_cap {
                    return Err(TransactionError::InvalidReward);
                }
            } else {
                let input_sum: u64 = self.tx_inputs.iter().map(|txi| txi.amount).sum();
                let output_sum: u64 = self.tx_outputs.iter().map(|txo| txo.amount).sum();
                if input_sum < output_sum {
                    return Err(TransactionError::InsufficientInputValue);
                }
            }

            if self
                .tx_outputs
                .iter()
                .any(|txo| txo.origin_tx_hash != self.hash)
            {
                return Err(TransactionError::InvalidOutputReference);
            }
        }

        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
