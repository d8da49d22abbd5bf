//! Mining module: turning block templates into mined blocks

pub mod miner;

pub use miner::{Miner, MiningStats};
