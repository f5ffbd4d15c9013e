use crate::models::db::schema::blocks;
use chrono::{DateTime, Utc};
use diesel::{AsChangeset, Insertable, Queryable, Selectable};
use serde::Serialize;
use serde_json::Value;

/// upsert 使用：insert 列与 `ON CONFLICT (hash) DO UPDATE` 的 SET 列
#[derive(Debug, Clone, PartialEq, Insertable, AsChangeset)]
#[diesel(table_name = blocks, primary_key(hash))]
pub struct BlockInsert {
    pub hash: String,
    pub number: i64,
    pub tx_count: i32,
    pub gas_used: i64,
    pub gas_limit: i64,
    pub ts: DateTime<Utc>,
    pub json_data: Value,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = blocks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BlockRow {
    pub hash: String,
    pub number: i64,
    pub tx_count: i32,
    pub gas_used: i64,
    pub gas_limit: i64,
    pub ts: DateTime<Utc>,
    pub json_data: Value,
    pub created_at: DateTime<Utc>,
}

/// 广播给订阅者的区块（去掉 json_data）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockBrief {
    pub hash: String,
    pub number: i64,
    pub tx_count: i32,
    pub gas_used: i64,
    pub gas_limit: i64,
    pub ts: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl From<BlockRow> for BlockBrief {
    fn from(row: BlockRow) -> Self {
        Self {
            hash: row.hash,
            number: row.number,
            tx_count: row.tx_count,
            gas_used: row.gas_used,
            gas_limit: row.gas_limit,
            ts: row.ts,
            created_at: row.created_at,
        }
    }
}

impl BlockInsert {
    /// 以给定入库时间落成一行（内存库 / 测试使用）
    pub fn into_row(self, created_at: DateTime<Utc>) -> BlockRow {
        BlockRow {
            hash: self.hash,
            number: self.number,
            tx_count: self.tx_count,
            gas_used: self.gas_used,
            gas_limit: self.gas_limit,
            ts: self.ts,
            json_data: self.json_data,
            created_at,
        }
    }
}
