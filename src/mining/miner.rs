//! Mining worker for the ledger
//!
//! Turns a block template into a mined block: appends the miner's own
//! Fee payout, runs the proof-of-work search, and submits the result.

use crate::core::{Block, BlockTemplate, Blockchain, ChainError, Transaction, TransactionOutput};
use log::info;
use std::sync::atomic::AtomicBool;
use std::time::Instant;

/// Mining statistics
#[derive(Debug, Clone)]
pub struct MiningStats {
    /// Number of hash attempts
    pub hash_attempts: u64,
    /// Time taken in milliseconds
    pub time_ms: u128,
    /// Hash rate (hashes per second)
    pub hash_rate: f64,
}

/// In-process mining worker
pub struct Miner {
    /// Address receiving block rewards and collected fees
    pub address: String,
}

impl Miner {
    /// Create a new miner
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_string(),
        }
    }

    /// Build an unmined candidate from a template, appending this miner's
    /// Fee payout: a single output worth the block reward plus every fee
    /// paid by the drafted transactions.
    pub fn build_candidate(&self, template: &BlockTemplate) -> Block {
        let mut block = Block::from_template(template);

        let fees: u64 = block.transactions.iter().map(|tx| tx.get_fee()).sum();
        let reward = Blockchain::reward_amount(template.difficulty);
        block
            .transactions
            .push(Transaction::from_reward(TransactionOutput::new(
                reward + fees,
                &self.address,
            )));
        block.hash = block.content_hash();
        block
    }

    /// One full pass against the chain: fetch the template, mine the
    /// candidate, and submit it. `Ok(None)` when the mempool is empty.
    pub fn mine_next(
        &self,
        chain: &mut Blockchain,
    ) -> Result<Option<(String, MiningStats)>, ChainError> {
        let template = match chain.get_next_block() {
            Some(template) => template,
            None => return Ok(None),
        };
        let mut block = self.build_candidate(&template);

        info!(
            "Mining block {} with difficulty {}...",
            block.index, template.difficulty
        );
        let start = Instant::now();
        let attempts = block.mine(template.difficulty, &self.address);
        let stats = Self::stats_for(attempts, start);
        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            block.index, stats.time_ms, attempts, stats.hash_rate
        );

        let hash = chain.add_block(block)?;
        Ok(Some((hash, stats)))
    }

    /// Snapshot-based search for worker threads: mines a candidate from
    /// the template without holding the chain, honoring the stop signal.
    /// Returns `None` when superseded; the caller submits the mined block
    /// with `Blockchain::add_block`.
    pub fn mine_detached(
        &self,
        template: &BlockTemplate,
        stop: &AtomicBool,
    ) -> Option<(Block, MiningStats)> {
        let mut block = self.build_candidate(template);

        info!(
            "Mining block {} with difficulty {}...",
            block.index, template.difficulty
        );
        let start = Instant::now();
        let attempts = block.mine_interruptible(template.difficulty, &self.address, stop)?;
        let stats = Self::stats_for(attempts, start);
        info!(
            "Block {} mined in {}ms ({} attempts, {:.2} H/s)",
            block.index, stats.time_ms, attempts, stats.hash_rate
        );

        Some((block, stats))
    }

    fn stats_for(attempts: u64, start: Instant) -> MiningStats {
        let elapsed = start.elapsed().as_millis();
        let hash_rate = if elapsed > 0 {
            attempts as f64 / (elapsed as f64 / 1000.0)
        } else {
            attempts as f64
        };
        MiningStats {
            hash_attempts: attempts,
            time_ms: elapsed,
            hash_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChainParams;
    use crate::wallet::Wallet;
    use std::sync::atomic::Ordering;

    fn flat_difficulty_params() -> ChainParams {
        ChainParams {
            tx_per_block: 2,
            difficulty_factor: 100,
            max_difficulty: 62,
            fee_per_tx: 1,
        }
    }

    fn funded_chain() -> (Wallet, Blockchain) {
        let wallet = Wallet::generate();
        let chain = Blockchain::with_params(&wallet.public_key(), flat_difficulty_params());
        (wallet, chain)
    }

    fn queue_transfer(chain: &mut Blockchain, wallet: &Wallet) {
        let utxo = chain.get_utxo(&wallet.public_key());
        let tx = wallet
            .build_spend(&utxo, "recipient", 10, chain.get_fee_per_tx())
            .unwrap();
        chain.add_transaction(tx).unwrap();
    }

    #[test]
    fn test_mine_next_with_empty_mempool() {
        let (_, mut chain) = funded_chain();
        let miner = Miner::new("worker");
        assert!(miner.mine_next(&mut chain).unwrap().is_none());
        assert_eq!(chain.blocks.len(), 1);
    }

    #[test]
    fn test_mine_next_confirms_and_collects() {
        let (wallet, mut chain) = funded_chain();
        queue_transfer(&mut chain, &wallet);

        let miner = Miner::new("worker");
        let (hash, stats) = miner.mine_next(&mut chain).unwrap().unwrap();

        assert_eq!(chain.blocks.len(), 2);
        assert_eq!(chain.get_last_block().hash, hash);
        assert!(chain.mempool.is_empty());
        assert!(stats.hash_attempts >= 1);
        // Reward at difficulty 2 plus the single collected fee
        assert_eq!(chain.get_balance("worker"), 621);
        assert!(chain.is_valid().is_ok());
    }

    #[test]
    fn test_mine_detached_then_submit() {
        let (wallet, mut chain) = funded_chain();
        queue_transfer(&mut chain, &wallet);

        let miner = Miner::new("worker");
        let template = chain.get_next_block().unwrap();
        let stop = AtomicBool::new(false);
        let (block, _) = miner.mine_detached(&template, &stop).unwrap();

        chain.add_block(block).unwrap();
        assert_eq!(chain.blocks.len(), 2);
        assert_eq!(chain.get_balance("worker"), 621);
    }

    #[test]
    fn test_mine_detached_honors_stop_signal() {
        let (wallet, mut chain) = funded_chain();
        queue_transfer(&mut chain, &wallet);

        let miner = Miner::new("worker");
        let template = chain.get_next_block().unwrap();
        let stop = AtomicBool::new(false);
        stop.store(true, Ordering::Relaxed);

        assert!(miner.mine_detached(&template, &stop).is_none());
        assert_eq!(chain.blocks.len(), 1);
    }
}
