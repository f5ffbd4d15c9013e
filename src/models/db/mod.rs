pub mod block_db;
pub mod schema;
pub mod transaction_db;

pub use block_db::{BlockBrief, BlockInsert, BlockRow};
pub use transaction_db::{TransactionBrief, TransactionInsert, TransactionRow};

/// 唯一的写入原语：按主键 hash upsert 的一行
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Block(BlockInsert),
    Transaction(TransactionInsert),
}

impl Record {
    pub fn table(&self) -> &'static str {
        match self {
            Record::Block(_) => "blocks",
            Record::Transaction(_) => "transactions",
        }
    }

    /// 主键值
    pub fn key(&self) -> &str {
        match self {
            Record::Block(block) => &block.hash,
            Record::Transaction(tx) => &tx.hash,
        }
    }
}
