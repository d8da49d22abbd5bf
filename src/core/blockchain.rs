//! Blockchain implementation
//!
//! Owns the ordered block list and the mempool, derives the UTXO set,
//! adjusts difficulty, and gates every transaction and block admission.

use crate::core::block::{Block, BlockError, BlockTemplate};
use crate::core::transaction::{
    Transaction, TransactionError, TransactionOutput, TransactionType,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Chain Parameters
// =============================================================================

/// Tunable chain parameters, injectable per instance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChainParams {
    /// Maximum transactions drafted into a block template
    pub tx_per_block: usize,
    /// Blocks per difficulty step; must be at least 1
    pub difficulty_factor: u64,
    /// Difficulty ceiling advertised to miners in templates
    pub max_difficulty: u32,
    /// Flat fee charged per regular transaction
    pub fee_per_tx: u64,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            tx_per_block: 2,
            difficulty_factor: 5,
            max_difficulty: 62,
            fee_per_tx: 1,
        }
    }
}

// =============================================================================
// Chain Errors
// =============================================================================

/// Errors raised by chain-level admission and validation
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("This wallet has a pending transaction")]
    PendingTransaction,
    #[error("Invalid TX: the TXO is already spent or nonexistent")]
    UtxoSpentOrMissing,
    #[error("Invalid TX -> {0}")]
    InvalidTransaction(#[from] TransactionError),
    #[error("Duplicated TX in blockchain or mempool")]
    DuplicateTransaction,
    #[error("There is no next block to mine")]
    NoNextBlock,
    #[error("Invalid Block -> {0}")]
    InvalidBlock(#[from] BlockError),
    #[error("Invalid TX in block: not every confirmed transaction came from the mempool")]
    MempoolMismatch,
    #[error("Invalid block at index {index}: {source}")]
    InvalidChain { index: u64, source: BlockError },
}

// =============================================================================
// Blockchain
// =============================================================================

/// The ledger: confirmed blocks plus the pending transaction pool
#[derive(Debug, Clone)]
pub struct Blockchain {
    pub params: ChainParams,
    pub blocks: Vec<Block>,
    pub mempool: Vec<Transaction>,
}

impl Blockchain {
    /// Create a chain with default parameters, paying the genesis reward
    /// to `miner`
    pub fn new(miner: &str) -> Self {
        Self::with_params(miner, ChainParams::default())
    }

    /// Create a chain with custom parameters. The genesis block carries a
    /// single Fee transaction rewarding `miner`, mined at the starting
    /// difficulty so the chain is validly populated from the first moment.
    pub fn with_params(miner: &str, params: ChainParams) -> Self {
        let mut chain = Self {
            params,
            blocks: Vec::new(),
            mempool: Vec::new(),
        };

        let difficulty = chain.get_difficulty();
        let reward = Self::reward_amount(difficulty);
        let genesis_tx = Transaction::from_reward(TransactionOutput::new(reward, miner));
        let mut genesis = Block::new(0, String::new(), vec![genesis_tx]);
        genesis.mine(difficulty, miner);
        log::info!("Genesis block created: {}", genesis.hash);

        chain.blocks.push(genesis);
        chain
    }

    /// Get the latest block
    pub fn get_last_block(&self) -> &Block {
        self.blocks
            .last()
            .expect("chain always holds at least the genesis block")
    }

    /// Get a block by its position in the chain
    pub fn get_block_by_index(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    /// Get a block by hash
    pub fn get_block_by_hash(&self, hash: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.hash == hash)
    }

    /// Current difficulty: a step function rising one level every
    /// `difficulty_factor` blocks
    pub fn get_difficulty(&self) -> u32 {
        let len = self.blocks.len() as u64;
        let factor = self.params.difficulty_factor;
        ((len + factor - 1) / factor + 1) as u32
    }

    /// Mining reward at the given difficulty
    pub fn reward_amount(difficulty: u32) -> u64 {
        64u64.saturating_sub(difficulty as u64) * 10
    }

    /// Flat fee charged per regular transaction
    pub fn get_fee_per_tx(&self) -> u64 {
        self.params.fee_per_tx
    }

    /// Unspent outputs held by `address`, derived by scanning confirmed
    /// blocks. Spent outputs are removed by matching input amounts.
    pub fn get_utxo(&self, address: &str) -> Vec<TransactionOutput> {
        let mut outputs: Vec<TransactionOutput> = self
            .blocks
            .iter()
            .flat_map(|b| b.transactions.iter())
            .flat_map(|tx| tx.tx_outputs.iter())
            .filter(|txo| txo.to_address == address)
            .cloned()
            .collect();

        let inputs = self
            .blocks
            .iter()
            .flat_map(|b| b.transactions.iter())
            .flat_map(|tx| tx.tx_inputs.iter())
            .filter(|txi| txi.from_address == address);

        for txi in inputs {
            if let Some(pos) = outputs.iter().position(|txo| txo.amount == txi.amount) {
                outputs.remove(pos);
            }
        }
        outputs
    }

    /// Confirmed balance of `address`
    pub fn get_balance(&self, address: &str) -> u64 {
        self.get_utxo(address).iter().map(|txo| txo.amount).sum()
    }

    /// Locate a transaction by hash in the mempool or a confirmed block
    pub fn get_transaction(&self, hash: &str) -> Option<TransactionSearch> {
        if let Some(pos) = self.mempool.iter().position(|tx| tx.hash == hash) {
            return Some(TransactionSearch {
                transaction: self.mempool[pos].clone(),
                mempool_index: Some(pos),
                block_index: None,
            });
        }

        for (pos, block) in self.blocks.iter().enumerate() {
            if let Some(tx) = block.transactions.iter().find(|tx| tx.hash == hash) {
                return Some(TransactionSearch {
                    transaction: tx.clone(),
                    mempool_index: None,
                    block_index: Some(pos),
                });
            }
        }
        None
    }

    /// Admit a transaction into the mempool.
    /// Rejects conflicting spends, spends of missing outputs, invalid
    /// transactions, and duplicates. Returns the transaction hash.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<String, ChainError> {
        if let Some(first_input) = transaction.tx_inputs.first() {
            let from = first_input.from_address.clone();

            // One in-flight spend per source address
            let has_pending = self
                .mempool
                .iter()
                .flat_map(|tx| tx.tx_inputs.iter())
                .any(|txi| txi.from_address == from);
            if has_pending {
                return Err(ChainError::PendingTransaction);
            }

            let utxo = self.get_utxo(&from);
            for txi in &transaction.tx_inputs {
                let covered = utxo.iter().any(|txo| {
                    txo.origin_tx_hash == txi.previous_tx_hash && txo.amount >= txi.amount
                });
                if !covered {
                    return Err(ChainError::UtxoSpentOrMissing);
                }
            }
        }

        transaction.is_valid(self.get_difficulty(), self.get_fee_per_tx())?;

        let confirmed = self
            .blocks
            .iter()
            .any(|b| b.transactions.iter().any(|tx| tx.hash == transaction.hash));
        if confirmed || self.mempool.iter().any(|tx| tx.hash == transaction.hash) {
            return Err(ChainError::DuplicateTransaction);
        }

        let hash = transaction.hash.clone();
        self.mempool.push(transaction);
        log::info!("Transaction accepted into the mempool: {hash}");
        Ok(hash)
    }

    /// Draft the next mining template, or `None` while the mempool is empty
    pub fn get_next_block(&self) -> Option<BlockTemplate> {
        if self.mempool.is_empty() {
            log::debug!("Mempool is empty, no block to mine");
            return None;
        }

        let transactions: Vec<Transaction> = self
            .mempool
            .iter()
            .take(self.params.tx_per_block)
            .cloned()
            .collect();

        Some(BlockTemplate {
            index: self.blocks.len() as u64,
            previous_hash: self.get_last_block().hash.clone(),
            difficulty: self.get_difficulty(),
            max_difficulty: self.params.max_difficulty,
            fee_per_tx: self.params.fee_per_tx,
            transactions,
        })
    }

    /// Append a mined block after validating it against the current
    /// template, retiring its confirmed transactions from the mempool.
    /// Returns the block hash.
    pub fn add_block(&mut self, block: Block) -> Result<String, ChainError> {
        let template = self.get_next_block().ok_or(ChainError::NoNextBlock)?;
        block.is_valid(
            &template.previous_hash,
            template.index - 1,
            template.difficulty,
            template.fee_per_tx,
        )?;

        let confirmed: Vec<String> = block
            .transactions
            .iter()
            .filter(|tx| tx.tx_type != TransactionType::Fee)
            .map(|tx| tx.hash.clone())
            .collect();
        let remaining: Vec<Transaction> = self
            .mempool
            .iter()
            .filter(|tx| !confirmed.contains(&tx.hash))
            .cloned()
            .collect();
        if remaining.len() + confirmed.len() != self.mempool.len() {
            return Err(ChainError::MempoolMismatch);
        }
        self.mempool = remaining;

        let hash = block.hash.clone();
        log::info!("Block #{} added to the chain: {hash}", block.index);
        self.blocks.push(block);
        Ok(hash)
    }

    /// Validate the whole chain from tip to genesis against the current
    /// parameters, attributing any failure to the offending block index
    pub fn is_valid(&self) -> Result<(), ChainError> {
        for i in (1..self.blocks.len()).rev() {
            let current = &self.blocks[i];
            let previous = &self.blocks[i - 1];
            current
                .is_valid(
                    &previous.hash,
                    previous.index,
                    self.get_difficulty(),
                    self.get_fee_per_tx(),
                )
                .map_err(|source| ChainError::InvalidChain {
                    index: current.index,
                    source,
                })?;
        }
        Ok(())
    }

    /// Snapshot of chain health and size
    pub fn status(&self) -> ChainStatus {
        ChainStatus {
            mempool_size: self.mempool.len(),
            number_of_blocks: self.blocks.len(),
            valid: self.is_valid().is_ok(),
            last_block_hash: self.get_last_block().hash.clone(),
        }
    }

    /// Balance, fee, and spendable outputs for a wallet address
    pub fn wallet_summary(&self, address: &str) -> WalletSummary {
        let utxo = self.get_utxo(address);
        let balance = utxo.iter().map(|txo| txo.amount).sum();
        WalletSummary {
            balance,
            fee_per_tx: self.get_fee_per_tx(),
            utxo,
        }
    }
}

// =============================================================================
// Query Types
// =============================================================================

/// Chain health snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStatus {
    pub mempool_size: usize,
    pub number_of_blocks: usize,
    pub valid: bool,
    pub last_block_hash: String,
}

/// Where a transaction was found: the mempool or a confirmed block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSearch {
    pub transaction: Transaction,
    pub mempool_index: Option<usize>,
    pub block_index: Option<usize>,
}

/// Wallet-facing view of an address
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletSummary {
    pub balance: u64,
    pub fee_per_tx: u64,
    pub utxo: Vec<TransactionOutput>,
}

// =============================================================================
// Tests
// =============================================================================
