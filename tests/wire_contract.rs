//! JSON boundary contracts: the shapes HTTP and miner collaborators
//! exchange with the core must keep their field names and numeric
//! encodings stable.

use ferrochain::core::{
    Block, Blockchain, ChainParams, Transaction, TransactionInput, TransactionOutput,
    TransactionType,
};
use ferrochain::wallet::Wallet;
use serde_json::{json, Value};

fn params() -> ChainParams {
    ChainParams {
        tx_per_block: 2,
        difficulty_factor: 1000,
        max_difficulty: 62,
        fee_per_tx: 1,
    }
}

fn signed_transfer(chain: &Blockchain, from: &Wallet, to: &str, amount: u64) -> Transaction {
    let utxo = chain.get_utxo(&from.public_key());
    from.build_spend(&utxo, to, amount, chain.get_fee_per_tx())
        .unwrap()
}

#[test]
fn transaction_wire_shape() {
    let alice = Wallet::generate();
    let chain = Blockchain::with_params(&alice.public_key(), params());
    let tx = signed_transfer(&chain, &alice, "bob", 10);

    let wire: Value = serde_json::to_value(&tx).unwrap();

    assert_eq!(wire["type"], json!(1));
    assert!(wire["timestamp"].is_i64());
    assert_eq!(wire["hash"].as_str().unwrap().len(), 64);

    let input = &wire["txInputs"][0];
    assert_eq!(input["fromAddress"], json!(alice.public_key()));
    assert!(input["amount"].is_u64());
    assert_eq!(input["previousTxHash"].as_str().unwrap().len(), 64);
    assert!(!input["signature"].as_str().unwrap().is_empty());

    let output = &wire["txOutputs"][0];
    assert_eq!(output["toAddress"], json!("bob"));
    assert_eq!(output["amount"], json!(10));
    assert_eq!(output["originTxHash"], wire["hash"]);
}

#[test]
fn fee_transaction_wire_shape() {
    let tx = Transaction::from_reward(TransactionOutput::new(630, "miner"));
    let wire: Value = serde_json::to_value(&tx).unwrap();

    assert_eq!(wire["type"], json!(2));
    assert_eq!(wire["txInputs"].as_array().unwrap().len(), 0);
    assert_eq!(wire["txOutputs"].as_array().unwrap().len(), 1);
}

#[test]
fn transaction_round_trips_and_still_validates() {
    let alice = Wallet::generate();
    let chain = Blockchain::with_params(&alice.public_key(), params());
    let tx = signed_transfer(&chain, &alice, "bob", 10);

    let wire = serde_json::to_string(&tx).unwrap();
    let parsed: Transaction = serde_json::from_str(&wire).unwrap();

    assert_eq!(parsed.hash, tx.hash);
    assert_eq!(parsed.hash, parsed.content_hash());
    assert!(parsed.is_valid(1, 0).is_ok());
}

#[test]
fn transaction_parses_with_missing_optional_fields() {
    // A submitted body may omit inputs entirely, as a Fee payout does
    let wire = json!({
        "type": 2,
        "timestamp": 1_724_000_000_000i64,
        "hash": "",
        "txOutputs": [{ "toAddress": "miner", "amount": 630 }]
    });
    let parsed: Transaction = serde_json::from_value(wire).unwrap();
    assert_eq!(parsed.tx_type, TransactionType::Fee);
    assert!(parsed.tx_inputs.is_empty());
    assert_eq!(parsed.tx_outputs[0].amount, 630);
    assert!(parsed.tx_outputs[0].origin_tx_hash.is_empty());
}

#[test]
fn unknown_transaction_type_is_rejected() {
    let wire = json!({
        "type": 9,
        "timestamp": 1_724_000_000_000i64,
        "hash": "",
        "txInputs": [],
        "txOutputs": []
    });
    assert!(serde_json::from_value::<Transaction>(wire).is_err());
}

#[test]
fn block_template_wire_shape() {
    let alice = Wallet::generate();
    let mut chain = Blockchain::with_params(&alice.public_key(), params());
    chain
        .add_transaction(signed_transfer(&chain, &alice, "bob", 10))
        .unwrap();

    let template = chain.get_next_block().unwrap();
    let wire: Value = serde_json::to_value(&template).unwrap();

    assert_eq!(wire["index"], json!(1));
    assert_eq!(
        wire["previousHash"],
        json!(chain.get_last_block().hash.clone())
    );
    assert_eq!(wire["difficulty"], json!(chain.get_difficulty()));
    assert_eq!(wire["maxDifficulty"], json!(62));
    assert_eq!(wire["feePerTx"], json!(1));
    assert_eq!(wire["transactions"].as_array().unwrap().len(), 1);
}

#[test]
fn mined_block_round_trips_and_still_validates() {
    let alice = Wallet::generate();
    let chain = Blockchain::with_params(&alice.public_key(), params());
    let genesis = chain.get_last_block();

    let mut block = Block::new(
        1,
        genesis.hash.clone(),
        vec![Transaction::from_reward(TransactionOutput::new(
            620, "worker",
        ))],
    );
    block.mine(2, "worker");

    // The path a miner submission takes: serialize, parse, validate
    let wire = serde_json::to_string(&block).unwrap();
    let parsed: Block = serde_json::from_str(&wire).unwrap();

    assert_eq!(parsed.hash, block.hash);
    assert_eq!(parsed.nonce, block.nonce);
    assert_eq!(parsed.miner, "worker");
    assert!(parsed.is_valid(&genesis.hash, 0, 2, 1).is_ok());
}

#[test]
fn block_wire_uses_camel_case_keys() {
    let chain = Blockchain::with_params("miner", params());
    let wire: Value = serde_json::to_value(chain.get_last_block()).unwrap();

    assert!(wire.get("previousHash").is_some());
    assert!(wire.get("previous_hash").is_none());
    assert!(wire["transactions"][0].get("txOutputs").is_some());
}

#[test]
fn status_and_wallet_views_serialize() {
    let alice = Wallet::generate();
    let chain = Blockchain::with_params(&alice.public_key(), params());

    let status: Value = serde_json::to_value(chain.status()).unwrap();
    assert_eq!(status["numberOfBlocks"], json!(1));
    assert_eq!(status["mempoolSize"], json!(0));
    assert_eq!(status["valid"], json!(true));

    let summary: Value = serde_json::to_value(chain.wallet_summary(&alice.public_key())).unwrap();
    assert_eq!(summary["balance"], json!(630));
    assert_eq!(summary["feePerTx"], json!(1));
    assert_eq!(summary["utxo"].as_array().unwrap().len(), 1);
}
