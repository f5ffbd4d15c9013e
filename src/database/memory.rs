//! 内存数据库：测试用，可注入连接 / 语句失败
use crate::database::gateway::{Connector, StorageConnection};
use crate::errors::error::AppError;
use crate::models::{BlockRow, Record, TransactionRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    blocks: BTreeMap<String, BlockRow>,
    transactions: BTreeMap<String, TransactionRow>,
    now: Option<DateTime<Utc>>,
    failing_connects: usize,
    failing_statements: usize,
    connect_attempts: usize,
    statements: usize,
}

#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<MemoryState>>,
}

pub struct MemoryConnection {
    db: MemoryDatabase,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap()
    }

    /// 后续写入的 created_at
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.state().now = Some(now);
    }

    pub fn fail_connects(&self, count: usize) {
        self.state().failing_connects = count;
    }

    pub fn fail_statements(&self, count: usize) {
        self.state().failing_statements = count;
    }

    pub fn connect_attempts(&self) -> usize {
        self.state().connect_attempts
    }

    /// 已尝试执行的语句数（含失败）
    pub fn statements(&self) -> usize {
        self.state().statements
    }

    pub fn block(&self, hash: &str) -> Option<BlockRow> {
        self.state().blocks.get(hash).cloned()
    }

    pub fn block_count(&self) -> usize {
        self.state().blocks.len()
    }

    pub fn transaction(&self, hash: &str) -> Option<TransactionRow> {
        self.state().transactions.get(hash).cloned()
    }

    pub fn transaction_count(&self) -> usize {
        self.state().transactions.len()
    }

    fn begin_statement(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        let mut state = self.state();
        state.statements += 1;
        if state.failing_statements > 0 {
            state.failing_statements -= 1;
            return Err(AppError::DatabaseQuery(DieselError::DatabaseError(
                DatabaseErrorKind::ClosedConnection,
                Box::new("injected statement failure".to_string()),
            )));
        }
        Ok(state)
    }
}

#[async_trait]
impl Connector for MemoryDatabase {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection, AppError> {
        let mut state = self.state();
        state.connect_attempts += 1;
        if state.failing_connects > 0 {
            state.failing_connects -= 1;
            return Err(AppError::Connection("injected connect failure".to_string()));
        }
        Ok(MemoryConnection { db: self.clone() })
    }
}

#[async_trait]
impl StorageConnection for MemoryConnection {
    async fn upsert(&mut self, record: &Record) -> Result<(), AppError> {
        let mut state = self.db.begin_statement()?;
        let now = state.now.unwrap_or_else(Utc::now);
        match record.clone() {
            Record::Block(block) => {
                // 更新分支不改 created_at
                let created_at = state.blocks.get(&block.hash).map_or(now, |row| row.created_at);
                state.blocks.insert(block.hash.clone(), block.into_row(created_at));
            }
            Record::Transaction(tx) => {
                let created_at = state
                    .transactions
                    .get(&tx.hash)
                    .map_or(now, |row| row.created_at);
                state.transactions.insert(tx.hash.clone(), tx.into_row(created_at));
            }
        }
        Ok(())
    }

    async fn blocks_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError> {
        let state = self.db.begin_statement()?;
        let mut rows: Vec<BlockRow> = state
            .blocks
            .values()
            .filter(|row| row.created_at >= from && row.created_at < to)
            .cloned()
            .collect();
        rows.sort_by_key(|row| (row.created_at, row.number));
        Ok(rows)
    }

    async fn transactions_of_block(
        &mut self,
        block_hash: &str,
    ) -> Result<Vec<TransactionRow>, AppError> {
        let state = self.db.begin_statement()?;
        let mut rows: Vec<TransactionRow> = state
            .transactions
            .values()
            .filter(|row| row.block_hash == block_hash)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.transaction_index);
        Ok(rows)
    }
}
