//! 测试夹具
use crate::models::{BlockInsert, TransactionInsert};
use bigdecimal::BigDecimal;
use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

pub fn block_insert(hash: &str, number: i64) -> BlockInsert {
    BlockInsert {
        hash: hash.to_string(),
        number,
        tx_count: 0,
        gas_used: 21_000,
        gas_limit: 30_000_000,
        ts: Utc.timestamp_opt(1_700_000_000 + number, 0).unwrap(),
        json_data: json!({"hash": hash}),
    }
}

pub fn transaction_insert(hash: &str, block_hash: &str, index: i32) -> TransactionInsert {
    TransactionInsert {
        hash: hash.to_string(),
        block_hash: block_hash.to_string(),
        block_number: 1,
        transaction_index: index,
        gas: 21_000,
        gas_price: BigDecimal::from(0),
        value: BigDecimal::from(1),
        json_data: json!({"hash": hash}),
    }
}

/// eth_getBlockByHash 返回的区块（含完整交易对象）
pub fn rpc_block(hash: &str, number: u64, tx_hashes: &[&str]) -> Value {
    let transactions: Vec<Value> = tx_hashes
        .iter()
        .enumerate()
        .map(|(index, tx_hash)| rpc_transaction(tx_hash, hash, number, index as u64))
        .collect();
    json!({
        "hash": hash,
        "number": format!("{:#x}", number),
        "gasUsed": "0x5208",
        "gasLimit": "0x1c9c380",
        "timestamp": "0x6553f100",
        "parentHash": "0x00",
        "transactions": transactions,
    })
}

pub fn rpc_transaction(hash: &str, block_hash: &str, block_number: u64, index: u64) -> Value {
    json!({
        "hash": hash,
        "blockHash": block_hash,
        "blockNumber": format!("{:#x}", block_number),
        "transactionIndex": format!("{:#x}", index),
        "gas": "0x5208",
        "gasPrice": "0x4a817c800",
        "value": "0xde0b6b3a7640000",
        "input": "0x",
    })
}
