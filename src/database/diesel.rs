use crate::config::DatabaseConfig;
use crate::database::gateway::{Connector, StorageConnection};
use crate::errors::error::AppError;
use crate::models::db::schema::{blocks, transactions};
use crate::models::{BlockRow, Record, TransactionRow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::result::Error as DieselError;
use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

/// PostgreSQL 连接器（每次调用建立一个新的 AsyncPgConnection）
pub struct PgConnector {
    database_url: String,
}

impl PgConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            database_url: config.url(),
        }
    }
}

#[async_trait]
impl Connector for PgConnector {
    type Connection = AsyncPgConnection;

    async fn connect(&self) -> Result<AsyncPgConnection, AppError> {
        Ok(AsyncPgConnection::establish(&self.database_url).await?)
    }
}

#[async_trait]
impl StorageConnection for AsyncPgConnection {
    async fn upsert(&mut self, record: &Record) -> Result<(), AppError> {
        match record {
            Record::Block(block) => {
                diesel::insert_into(blocks::table)
                    .values(block)
                    .on_conflict(blocks::hash)
                    .do_update()
                    .set(block)
                    .execute(self)
                    .await?;
            }
            Record::Transaction(tx) => {
                diesel::insert_into(transactions::table)
                    .values(tx)
                    .on_conflict(transactions::hash)
                    .do_update()
                    .set(tx)
                    .execute(self)
                    .await?;
            }
        }
        Ok(())
    }

    async fn blocks_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError> {
        let rows = blocks::table
            .filter(blocks::created_at.ge(from))
            .filter(blocks::created_at.lt(to))
            .order_by((blocks::created_at.asc(), blocks::number.asc()))
            .select(BlockRow::as_select())
            .load(self)
            .await?;
        Ok(rows)
    }

    async fn transactions_of_block(
        &mut self,
        block_hash: &str,
    ) -> Result<Vec<TransactionRow>, AppError> {
        let rows = transactions::table
            .filter(transactions::block_hash.eq(block_hash))
            .order_by(transactions::transaction_index.asc())
            .select(TransactionRow::as_select())
            .load(self)
            .await?;
        Ok(rows)
    }
}

/// 降级日志用：数据库错误带上驱动返回的错误类型与细节
pub fn describe_error(err: &AppError) -> String {
    match err {
        AppError::DatabaseQuery(DieselError::DatabaseError(kind, info)) => format!(
            "kind={:?}, message={}, table={}, constraint={}, detail={}",
            kind,
            info.message(),
            info.table_name().unwrap_or("unknown"),
            info.constraint_name().unwrap_or("unknown"),
            info.details().unwrap_or("no detail")
        ),
        other => other.to_string(),
    }
}
