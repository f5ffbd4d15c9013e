use crate::errors::error::AppError;
use crate::models::db::TransactionInsert;
use crate::utils::format::native_unit_to_bigdecimal;
use crate::utils::{hex_to_i64, hex_to_native_unit};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: String,
    block_hash: String,
    block_number: String,
    transaction_index: String,
    gas: String,
    // 部分节点对 EIP-1559 交易不返回 gasPrice
    #[serde(default)]
    gas_price: Option<String>,
    value: String,
}

/// 区块内的一笔交易
#[derive(Debug, Clone)]
pub struct Transaction {
    pub insert: TransactionInsert,
}

impl Transaction {
    pub fn from_rpc(raw: Value) -> Result<Self, AppError> {
        let tx = RpcTransaction::deserialize(&raw)?;

        let transaction_index = i32::try_from(hex_to_i64(&tx.transaction_index)?)
            .map_err(|e| AppError::Conversion(format!("交易 {} 序号溢出: {}", tx.hash, e)))?;
        let gas_price = match tx.gas_price.as_deref() {
            Some(price) => hex_to_native_unit(price)?,
            None => 0.0,
        };

        let insert = TransactionInsert {
            block_number: hex_to_i64(&tx.block_number)?,
            transaction_index,
            gas: hex_to_i64(&tx.gas)?,
            gas_price: native_unit_to_bigdecimal(gas_price)?,
            value: native_unit_to_bigdecimal(hex_to_native_unit(&tx.value)?)?,
            hash: tx.hash,
            block_hash: tx.block_hash,
            json_data: raw,
        };
        Ok(Self { insert })
    }
}
