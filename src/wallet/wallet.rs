//! Wallet implementation for the ledger
//!
//! Provides key management, recovery from hex or WIF material, and
//! construction of signed transfer transactions.

use crate::core::transaction::{
    Transaction, TransactionInput, TransactionOutput, TransactionType,
};
use crate::crypto::{KeyError, KeyPair};
use thiserror::Error;

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Insufficient funds: have {have}, need {need}")]
    InsufficientFunds { have: u64, need: u64 },
    #[error("Crypto error: {0}")]
    CryptoError(#[from] KeyError),
}

/// A ledger wallet. The address is the compressed public key in hex.
pub struct Wallet {
    key_pair: KeyPair,
}

impl Wallet {
    /// Create a wallet with a fresh random key pair
    pub fn generate() -> Self {
        Self {
            key_pair: KeyPair::generate(),
        }
    }

    /// Recover a wallet from key material: a 64-char hex string is taken
    /// as a raw private key, anything else is decoded as WIF
    pub fn recover(source: &str) -> Result<Self, KeyError> {
        if source.len() == 64 {
            Self::from_private_key(source)
        } else {
            Self::from_wif(source)
        }
    }

    /// Import a wallet from a hex-encoded private key
    pub fn from_private_key(private_key_hex: &str) -> Result<Self, KeyError> {
        Ok(Self {
            key_pair: KeyPair::from_private_key_hex(private_key_hex)?,
        })
    }

    /// Import a wallet from a WIF-encoded private key
    pub fn from_wif(wif: &str) -> Result<Self, KeyError> {
        Ok(Self {
            key_pair: KeyPair::from_wif(wif)?,
        })
    }

    /// The wallet's public key, which is also its address
    pub fn public_key(&self) -> String {
        self.key_pair.public_key_hex()
    }

    /// The wallet's private key as hex. Keep this secret.
    pub fn private_key(&self) -> String {
        self.key_pair.private_key_hex()
    }

    /// Export the private key in Wallet Import Format
    pub fn to_wif(&self) -> String {
        self.key_pair.to_wif()
    }

    /// Sign a hex-encoded SHA-256 digest with the wallet key
    pub fn sign(&self, message_hash_hex: &str) -> Result<String, KeyError> {
        self.key_pair.sign(message_hash_hex)
    }

    /// Build and sign a transfer spending the wallet's unspent outputs.
    /// Every supplied output is consumed; one output pays the recipient
    /// and one returns the change to this wallet.
    pub fn build_spend(
        &self,
        utxo: &[TransactionOutput],
        to_address: &str,
        amount: u64,
        fee: u64,
    ) -> Result<Transaction, WalletError> {
        let balance: u64 = utxo.iter().map(|txo| txo.amount).sum();
        if balance < amount + fee {
            return Err(WalletError::InsufficientFunds {
                have: balance,
                need: amount + fee,
            });
        }

        let mut inputs: Vec<TransactionInput> =
            utxo.iter().map(TransactionInput::from_txo).collect();
        for input in &mut inputs {
            input.sign(&self.private_key())?;
        }

        let change = balance - amount - fee;
        let outputs = vec![
            TransactionOutput::new(amount, to_address),
            TransactionOutput::new(change, &self.public_key()),
        ];
        Ok(Transaction::new(TransactionType::Regular, inputs, outputs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{sha256_hex, verify_digest_hex};

    fn funded_utxo(owner: &Wallet, amounts: &[u64]) -> Vec<TransactionOutput> {
        amounts
            .iter()
            .map(|&amount| {
                let mut txo = TransactionOutput::new(amount, &owner.public_key());
                txo.origin_tx_hash = sha256_hex(format!("funding {amount}").as_bytes());
                txo
            })
            .collect()
    }

    #[test]
    fn test_generated_wallets_are_unique() {
        let a = Wallet::generate();
        let b = Wallet::generate();
        assert_ne!(a.public_key(), b.public_key());
        assert_eq!(a.public_key().len(), 66);
    }

    #[test]
    fn test_recover_from_private_key() {
        let original = Wallet::generate();
        let recovered = Wallet::recover(&original.private_key()).unwrap();
        assert_eq!(original.public_key(), recovered.public_key());
    }

    #[test]
    fn test_recover_from_wif() {
        let original = Wallet::generate();
        let recovered = Wallet::recover(&original.to_wif()).unwrap();
        assert_eq!(original.public_key(), recovered.public_key());
        assert_eq!(original.private_key(), recovered.private_key());
    }

    #[test]
    fn test_recover_rejects_garbage() {
        assert!(Wallet::recover("definitely not key material").is_err());
    }

    #[test]
    fn test_sign_produces_verifiable_signature() {
        let wallet = Wallet::generate();
        let digest = sha256_hex(b"spend claim");
        let signature = wallet.sign(&digest).unwrap();
        assert!(verify_digest_hex(&wallet.public_key(), &digest, &signature).unwrap());
    }

    #[test]
    fn test_build_spend_consumes_all_outputs() {
        let wallet = Wallet::generate();
        let utxo = funded_utxo(&wallet, &[400, 230]);

        let tx = wallet.build_spend(&utxo, "recipient", 100, 1).unwrap();
        assert_eq!(tx.tx_inputs.len(), 2);
        assert!(tx.tx_inputs.iter().all(|txi| !txi.signature.is_empty()));
        assert_eq!(tx.tx_outputs[0].amount, 100);
        assert_eq!(tx.tx_outputs[0].to_address, "recipient");
        assert_eq!(tx.tx_outputs[1].amount, 529);
        assert_eq!(tx.tx_outputs[1].to_address, wallet.public_key());
        assert_eq!(tx.get_fee(), 1);
        assert!(tx.is_valid(1, 0).is_ok());
    }

    #[test]
    fn test_build_spend_rejects_insufficient_funds() {
        let wallet = Wallet::generate();
        let utxo = funded_utxo(&wallet, &[50]);

        match wallet.build_spend(&utxo, "recipient", 50, 1) {
            Err(WalletError::InsufficientFunds { have, need }) => {
                assert_eq!(have, 50);
                assert_eq!(need, 51);
            }
            other => panic!("expected insufficient funds, got {other:?}"),
        }
    }
}
