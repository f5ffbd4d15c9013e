//! 持久化网关：独占一个数据库连接，负责有界重试、重连与降级。
//!
//! 每条语句的执行阶梯：
//! 1. 首次执行，成功直接返回；
//! 2. `execute_retries > 2` 时，间隔 `execute_timeout` 再重试 `execute_retries` 次；
//! 3. 仍失败则重连后做最后一次尝试；
//! 4. 最后一次也失败：记录严重降级日志，把错误交还调用方，不 panic。
use crate::config::DatabaseConfig;
use crate::database::diesel::describe_error;
use crate::errors::error::AppError;
use crate::models::{BlockRow, Record, TransactionRow};
use crate::{log_debug, log_error, log_info, log_warn};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::sleep;

/// 网关对底层连接要求的语句集合
#[async_trait]
pub trait StorageConnection: Send {
    /// `INSERT ... ON CONFLICT (hash) DO UPDATE SET ...`
    async fn upsert(&mut self, record: &Record) -> Result<(), AppError>;

    /// `from <= created_at < to`，按 created_at 升序
    async fn blocks_between(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError>;

    /// 按 transaction_index 升序
    async fn transactions_of_block(
        &mut self,
        block_hash: &str,
    ) -> Result<Vec<TransactionRow>, AppError>;
}

/// 建立新连接的方式
#[async_trait]
pub trait Connector: Send + Sync {
    type Connection: StorageConnection;

    async fn connect(&self) -> Result<Self::Connection, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrySettings {
    pub conn_retries: u32,
    pub conn_timeout: Duration,
    pub execute_retries: u32,
    pub execute_timeout: Duration,
}

impl From<&DatabaseConfig> for RetrySettings {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            conn_retries: config.conn_retries,
            conn_timeout: config.conn_timeout(),
            execute_retries: config.execute_retries,
            execute_timeout: config.execute_timeout(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            conn_retries: 3,
            conn_timeout: Duration::from_millis(500),
            execute_retries: 3,
            execute_timeout: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Stored,
    /// 降级：写入丢失，仅记录日志
    Lost(String),
}

/// upsert 结果：无论成功与否都带回主键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Written {
    pub key: String,
    pub outcome: WriteOutcome,
}

impl Written {
    pub fn is_stored(&self) -> bool {
        self.outcome == WriteOutcome::Stored
    }
}

/// RPC 客户端与广播调度器共用同一个网关
pub type SharedGateway<C> = Arc<Mutex<PersistenceGateway<C>>>;

pub struct PersistenceGateway<C: Connector> {
    connector: C,
    conn: Option<C::Connection>,
    settings: RetrySettings,
}

impl<C: Connector> PersistenceGateway<C> {
    /// 启动时建立连接；用尽重试后返回 `AppError::Connection`
    pub async fn connect(connector: C, settings: RetrySettings) -> Result<Self, AppError> {
        let mut gateway = Self {
            connector,
            conn: None,
            settings,
        };
        gateway.conn = Some(Self::establish(&gateway.connector, &gateway.settings).await?);
        log_info!("✅ Database connection established");
        Ok(gateway)
    }

    pub fn into_shared(self) -> SharedGateway<C> {
        Arc::new(Mutex::new(self))
    }

    async fn establish(connector: &C, settings: &RetrySettings) -> Result<C::Connection, AppError> {
        let attempts = settings.conn_retries.max(1);
        let mut last_error = None;
        for attempt in 1..=attempts {
            if attempt > 1 {
                sleep(settings.conn_timeout).await;
            }
            match connector.connect().await {
                Ok(conn) => return Ok(conn),
                Err(e) => {
                    log_warn!("数据库连接失败 (第 {}/{} 次): {}", attempt, attempts, e);
                    last_error = Some(e);
                }
            }
        }
        Err(AppError::Connection(format!(
            "重试 {} 次后仍无法连接数据库: {}",
            attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// 丢弃当前连接，等待后重新建立
    async fn reconnect(&mut self) -> Result<(), AppError> {
        self.conn = None;
        sleep(self.settings.conn_timeout).await;
        self.conn = Some(Self::establish(&self.connector, &self.settings).await?);
        log_info!("Database reconnected");
        Ok(())
    }

    async fn attempt<T, F>(&mut self, op: &mut F) -> Result<T, AppError>
    where
        F: for<'a> FnMut(&'a mut C::Connection) -> BoxFuture<'a, Result<T, AppError>> + Send,
    {
        match self.conn.as_mut() {
            Some(conn) => op(conn).await,
            None => Err(AppError::Connection("no database connection".to_string())),
        }
    }

    /// 按重试阶梯执行一条语句。`op` 每次尝试都会被重新调用，
    /// 语句与绑定值在每次尝试时重新构建。
    pub async fn execute<T, F>(&mut self, mut op: F) -> Result<T, AppError>
    where
        T: Send,
        F: for<'a> FnMut(&'a mut C::Connection) -> BoxFuture<'a, Result<T, AppError>> + Send,
    {
        let mut last_error = match self.attempt(&mut op).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };
        log_warn!("DB statement failed: {}", describe_error(&last_error));

        let retries = if self.settings.execute_retries > 2 {
            self.settings.execute_retries
        } else {
            0
        };
        for attempt in 1..=retries {
            sleep(self.settings.execute_timeout).await;
            match self.attempt(&mut op).await {
                Ok(value) => {
                    log_debug!("DB statement succeeded on retry {}", attempt);
                    return Ok(value);
                }
                Err(e) => last_error = e,
            }
        }

        log_warn!(
            "DB problems, reconnecting... last error: {}",
            describe_error(&last_error)
        );
        if let Err(e) = self.reconnect().await {
            log_error!("Database reconnect failed: {}", e);
        }

        self.attempt(&mut op).await.map_err(|e| {
            log_error!(
                "Severe DB problem, degradation. Can't execute statement: {}",
                describe_error(&e)
            );
            e
        })
    }

    /// 唯一写入原语。降级路径下同样返回主键，由 `Written::outcome` 区分是否落库
    pub async fn upsert(&mut self, record: &Record) -> Written {
        let key = record.key().to_string();
        let result = self
            .execute(|conn| {
                let record = record.clone();
                Box::pin(async move { conn.upsert(&record).await })
            })
            .await;

        match result {
            Ok(()) => Written {
                key,
                outcome: WriteOutcome::Stored,
            },
            Err(e) => {
                log_error!("写入 {} {} 丢失: {}", record.table(), key, e);
                Written {
                    key,
                    outcome: WriteOutcome::Lost(e.to_string()),
                }
            }
        }
    }

    /// 半开区间 `[from, to)` 内入库的区块
    pub async fn query_window(
        &mut self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BlockRow>, AppError> {
        self.execute(move |conn| Box::pin(async move { conn.blocks_between(from, to).await }))
            .await
    }

    pub async fn query_by_parent(&mut self, block_hash: &str) -> Result<Vec<TransactionRow>, AppError> {
        let block_hash = block_hash.to_string();
        self.execute(move |conn| {
            let block_hash = block_hash.clone();
            Box::pin(async move { conn.transactions_of_block(&block_hash).await })
        })
        .await
    }
}
