//! Core ledger components
//!
//! This module contains the fundamental building blocks:
//! - Transactions (UTXO model with signed inputs and fee/reward rules)
//! - Blocks (proof of work, templates, validation)
//! - Blockchain (chain and mempool management, difficulty, queries)

pub mod block;
pub mod blockchain;
pub mod transaction;

pub use block::{Block, BlockError, BlockTemplate};
pub use blockchain::{
    Blockchain, ChainError, ChainParams, ChainStatus, TransactionSearch, WalletSummary,
};
pub use transaction::{
    Transaction, TransactionError, TransactionInput, TransactionOutput, TransactionType,
};
