//! Ferrochain: a minimal proof-of-work UTXO ledger
//!
//! This crate provides a single authoritative in-memory ledger featuring:
//! - Proof of Work consensus with a stepped difficulty schedule
//! - ECDSA digital signatures (secp256k1)
//! - UTXO-based transaction model with fee and reward accounting
//! - Mempool admission with double-spend prevention
//! - Wallet management with hex and WIF key import/export
//! - Block templates for external mining collaborators
//!
//! # Example
//!
//! ```rust
//! use ferrochain::core::Blockchain;
//! use ferrochain::mining::Miner;
//! use ferrochain::wallet::Wallet;
//!
//! // Create a chain; the genesis reward goes to Alice
//! let alice = Wallet::generate();
//! let mut chain = Blockchain::new(&alice.public_key());
//! println!("Genesis balance: {}", chain.get_balance(&alice.public_key()));
//!
//! // Alice pays Bob, a miner confirms the transfer
//! let bob = Wallet::generate();
//! let utxo = chain.get_utxo(&alice.public_key());
//! let tx = alice
//!     .build_spend(&utxo, &bob.public_key(), 10, chain.get_fee_per_tx())
//!     .unwrap();
//! chain.add_transaction(tx).unwrap();
//!
//! let miner = Miner::new(&Wallet::generate().public_key());
//! let (hash, stats) = miner.mine_next(&mut chain).unwrap().unwrap();
//! println!("Mined block {hash} in {}ms", stats.time_ms);
//!
//! assert_eq!(chain.get_balance(&bob.public_key()), 10);
//! assert!(chain.is_valid().is_ok());
//! ```

pub mod core;
pub mod crypto;
pub mod mining;
pub mod wallet;

// Re-export commonly used types
pub use crate::core::{
    Block, BlockError, BlockTemplate, Blockchain, ChainError, ChainParams, ChainStatus,
    Transaction, TransactionError, TransactionInput, TransactionOutput, TransactionSearch,
    TransactionType, WalletSummary,
};
pub use crate::crypto::KeyPair;
pub use crate::mining::{Miner, MiningStats};
pub use crate::wallet::{Wallet, WalletError};
