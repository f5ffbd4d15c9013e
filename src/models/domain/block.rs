use crate::errors::error::AppError;
use crate::models::db::BlockInsert;
use crate::utils::hex_to_i64;
use crate::utils::time::unix_seconds_to_utc;
use serde::Deserialize;
use serde_json::Value;

/// eth_getBlockByHash 结果中需要落库的字段（均为十六进制字符串）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcBlockHeader {
    hash: String,
    number: String,
    gas_used: String,
    gas_limit: String,
    timestamp: String,
}

/// 完整区块：表行 + 待保存的交易对象
#[derive(Debug, Clone)]
pub struct Block {
    pub insert: BlockInsert,
    pub transactions: Vec<Value>,
}

impl Block {
    /// 解析上游返回的区块对象；`transactions` 从原始 JSON 中剥离单独保存
    pub fn from_rpc(mut result: Value) -> Result<Self, AppError> {
        let header = RpcBlockHeader::deserialize(&result)?;

        let transactions = match result.as_object_mut().and_then(|obj| obj.remove("transactions")) {
            Some(Value::Array(list)) => list,
            Some(Value::Null) | None => Vec::new(),
            Some(other) => {
                return Err(AppError::Conversion(format!(
                    "区块 {} 的 transactions 不是数组: {}",
                    header.hash, other
                )));
            }
        };

        let tx_count = i32::try_from(transactions.len())
            .map_err(|e| AppError::Conversion(format!("交易数量溢出: {}", e)))?;

        let insert = BlockInsert {
            number: hex_to_i64(&header.number)?,
            tx_count,
            gas_used: hex_to_i64(&header.gas_used)?,
            gas_limit: hex_to_i64(&header.gas_limit)?,
            ts: unix_seconds_to_utc(hex_to_i64(&header.timestamp)?)?,
            hash: header.hash,
            json_data: result,
        };

        Ok(Self {
            insert,
            transactions,
        })
    }

    pub fn number(&self) -> i64 {
        self.insert.number
    }
}
