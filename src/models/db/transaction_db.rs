use crate::models::db::schema::transactions;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = transactions, primary_key(hash))]
pub struct TransactionInsert {
    pub hash: String,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_index: i32,
    pub gas: i64,
    pub gas_price: BigDecimal,
    pub value: BigDecimal,
    pub json_data: Value,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = transactions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransactionRow {
    pub hash: String,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_index: i32,
    pub gas: i64,
    pub gas_price: BigDecimal,
    pub value: BigDecimal,
    pub json_data: Value,
    pub created_at: DateTime<Utc>,
}

/// 广播给订阅者的交易（去掉 json_data）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionBrief {
    pub hash: String,
    pub block_hash: String,
    pub block_number: i64,
    pub transaction_index: i32,
    pub gas: i64,
    pub gas_price: BigDecimal,
    pub value: BigDecimal,
    pub created_at: DateTime<Utc>,
}

impl From<TransactionRow> for TransactionBrief {
    fn from(row: TransactionRow) -> Self {
        Self {
            hash: row.hash,
            block_hash: row.block_hash,
            block_number: row.block_number,
            transaction_index: row.transaction_index,
            gas: row.gas,
            gas_price: row.gas_price,
            value: row.value,
            created_at: row.created_at,
        }
    }
}

impl TransactionInsert {
    pub fn into_row(self, created_at: DateTime<Utc>) -> TransactionRow {
        TransactionRow {
            hash: self.hash,
            block_hash: self.block_hash,
            block_number: self.block_number,
            transaction_index: self.transaction_index,
            gas: self.gas,
            gas_price: self.gas_price,
            value: self.value,
            json_data: self.json_data,
            created_at,
        }
    }
}
