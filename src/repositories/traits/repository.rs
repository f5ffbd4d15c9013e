use crate::database::Written;
use crate::errors::error::AppError;
use crate::models::{BlockInsert, BlockRow, TransactionInsert, TransactionRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait BlockStore: Send + Sync {
    async fn save(&self, block: BlockInsert) -> Written;
    /// 半开区间 `[from, to)` 内入库的区块，按入库时间升序
    async fn find_committed_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn save(&self, tx: TransactionInsert) -> Written;
    /// 按区块内序号升序
    async fn find_by_block(&self, block_hash: &str) -> Result<Vec<TransactionRow>, AppError>;
}
