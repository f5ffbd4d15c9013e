pub mod db;
pub mod domain;

pub use db::{BlockBrief, BlockInsert, BlockRow, Record, TransactionBrief, TransactionInsert, TransactionRow};
pub use domain::{Block, Transaction};
