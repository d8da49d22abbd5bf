//! Block implementation for the ledger
//!
//! A block links to its predecessor by hash, carries an ordered list of
//! transactions, and is sealed by a proof-of-work search over its nonce.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::core::transaction::{Transaction, TransactionType};
use crate::crypto::{meets_difficulty, sha256_hex};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Block Errors
// =============================================================================

/// Block validation errors
#[derive(Error, Debug)]
pub enum BlockError {
    #[error("No fee transaction")]
    NoFeeTransaction,
    #[error("Too many fee transactions")]
    TooManyFeeTransactions,
    #[error("Invalid fee transaction: different from miner")]
    FeeNotToMiner,
    #[error("Invalid transactions in block: {0}")]
    InvalidTransactions(String),
    #[error("Invalid index")]
    InvalidIndex,
    #[error("Invalid timestamp")]
    InvalidTimestamp,
    #[error("Invalid previous hash")]
    InvalidPreviousHash,
    #[error("Block was not mined")]
    NotMined,
    #[error("Invalid hash")]
    InvalidHash,
}

// =============================================================================
// Block
// =============================================================================

/// A block in the ledger
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Block {
    /// Position in the chain, genesis is 0
    pub index: u64,
    /// Creation time in milliseconds since the Unix epoch
    pub timestamp: i64,
    pub hash: String,
    pub previous_hash: String,
    pub transactions: Vec<Transaction>,
    /// Proof-of-work counter, 0 until mined
    pub nonce: u64,
    /// Address of the miner that sealed the block, empty until mined
    pub miner: String,
}

impl Block {
    /// Create a new unmined block
    pub fn new(index: u64, previous_hash: String, transactions: Vec<Transaction>) -> Self {
        let mut block = Self {
            index,
            timestamp: Utc::now().timestamp_millis(),
            hash: String::new(),
            previous_hash,
            transactions,
            nonce: 0,
            miner: String::new(),
        };
        block.hash = block.content_hash();
        block
    }

    /// Build an unmined candidate from a mining template
    pub fn from_template(template: &BlockTemplate) -> Self {
        Self::new(
            template.index,
            template.previous_hash.clone(),
            template.transactions.clone(),
        )
    }

    /// Content hash over index, transaction hashes, timestamp, previous
    /// hash, nonce, and miner
    pub fn content_hash(&self) -> String {
        let txs: String = self
            .transactions
            .iter()
            .map(|tx| tx.hash.as_str())
            .collect();
        sha256_hex(
            format!(
                "{}{}{}{}{}{}",
                self.index, txs, self.timestamp, self.previous_hash, self.nonce, self.miner
            )
            .as_bytes(),
        )
    }

    /// Run the proof-of-work search until the hash has `difficulty`
    /// leading zero hex chars. Returns the number of hash attempts.
    /// Unbounded and CPU-bound; difficulty 0 accepts the first candidate.
    pub fn mine(&mut self, difficulty: u32, miner: &str) -> u64 {
        self.miner = miner.to_string();
        let mut attempts = 0u64;
        loop {
            self.nonce += 1;
            self.hash = self.content_hash();
            attempts += 1;
            if meets_difficulty(&self.hash, difficulty) {
                return attempts;
            }
        }
    }

    /// Proof-of-work search that honors a cooperative stop signal.
    /// Checks `stop` each iteration and returns `None` when raised,
    /// leaving the block unmined.
    pub fn mine_interruptible(
        &mut self,
        difficulty: u32,
        miner: &str,
        stop: &AtomicBool,
    ) -> Option<u64> {
        self.miner = miner.to_string();
        let mut attempts = 0u64;
        loop {
            if stop.load(Ordering::Relaxed) {
                return None;
            }
            self.nonce += 1;
            self.hash = self.content_hash();
            attempts += 1;
            if meets_difficulty(&self.hash, difficulty) {
                return Some(attempts);
            }
        }
    }

    /// Validate this block against its declared predecessor and the
    /// current difficulty and fee parameters.
    pub fn is_valid(
        &self,
        previous_hash: &str,
        previous_index: u64,
        difficulty: u32,
        fee_per_tx: u64,
    ) -> Result<(), BlockError> {
        if !self.transactions.is_empty() {
            let fee_count = self
                .transactions
                .iter()
                .filter(|tx| tx.tx_type == TransactionType::Fee)
                .count();
            if fee_count == 0 {
                return Err(BlockError::NoFeeTransaction);
            }
            if fee_count > 1 {
                return Err(BlockError::TooManyFeeTransactions);
            }

            let fee_tx = self
                .transactions
                .iter()
                .find(|tx| tx.tx_type == TransactionType::Fee)
                .ok_or(BlockError::NoFeeTransaction)?;
            if !fee_tx
                .tx_outputs
                .iter()
                .any(|txo| txo.to_address == self.miner)
            {
                return Err(BlockError::FeeNotToMiner);
            }

            let regular_count = self.transactions.len() as u64 - 1;
            let total_fees = fee_per_tx * regular_count;
            let failures: Vec<String> = self
                .transactions
                .iter()
                .filter_map(|tx| tx.is_valid(difficulty, total_fees).err().map(|e| e.to_string()))
                .collect();
            if !failures.is_empty() {
                return Err(BlockError::InvalidTransactions(failures.join("; ")));
            }
        }

        if self.index != previous_index + 1 {
            return Err(BlockError::InvalidIndex);
        }
        if self.timestamp < 1 {
            return Err(BlockError::InvalidTimestamp);
        }
        if self.previous_hash != previous_hash {
            return Err(BlockError::InvalidPreviousHash);
        }
        if self.nonce < 1 || self.miner.is_empty() {
            return Err(BlockError::NotMined);
        }
        if self.hash != self.content_hash() || !meets_difficulty(&self.hash, difficulty) {
            return Err(BlockError::InvalidHash);
        }

        Ok(())
    }
}

// =============================================================================
// Block Template
// =============================================================================

/// The "next work" package handed to miners
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockTemplate {
    pub index: u64,
    pub previous_hash: String,
    pub difficulty: u32,
    pub max_difficulty: u32,
    pub fee_per_tx: u64,
    pub transactions: Vec<Transaction>,
}

// =============================================================================
// Tests
// =============================================================================
