use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use url::Url;

use crate::config::Config;
use crate::database::diesel::PgConnector;
use crate::database::{PersistenceGateway, RetrySettings};
use crate::errors::error::AppError;
use crate::infrastructure::broadcast::BroadcastHub;
use crate::infrastructure::rpc::RpcClient;
use crate::repositories::{BlockRepository, TransactionRepository};
use crate::server;
use crate::services::{BlockService, BroadcastScheduler};
use crate::utils::time::SystemClock;
use crate::{log_error, log_info, log_warn};

/// 应用程序：上游订阅 + 入库、定时广播、下游 WebSocket 服务
pub struct Application {
    client: RpcClient,
    scheduler: BroadcastScheduler,
    hub: BroadcastHub,
    listener: TcpListener,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl Application {
    /// 初始化数据库连接与各组件（不启动任何循环）
    pub async fn build(config: Config) -> Result<Self> {
        let source = validate_source_url(&config.source.url)?;
        log_info!("Upstream source: {}", source);

        let gateway = PersistenceGateway::connect(
            PgConnector::new(&config.database),
            RetrySettings::from(&config.database),
        )
        .await?
        .into_shared();

        let block_repo = Arc::new(BlockRepository::new(gateway.clone()));
        let tx_repo = Arc::new(TransactionRepository::new(gateway));

        let hub = BroadcastHub::new(config.broadcast.channel_capacity);
        let block_service = Arc::new(BlockService::new(block_repo.clone(), tx_repo.clone()));
        let client = RpcClient::new(&config.source, block_service);
        let scheduler = BroadcastScheduler::new(
            &config.broadcast,
            block_repo,
            tx_repo,
            hub.clone(),
            Arc::new(SystemClock),
        );
        let listener = server::bind(&config.server).await?;

        Ok(Self {
            client,
            scheduler,
            hub,
            listener,
        })
    }

    /// 任一核心任务退出即结束；上游连接失败以错误返回
    pub async fn run(self) -> anyhow::Result<()> {
        let Self {
            mut client,
            scheduler,
            hub,
            listener,
        } = self;

        tokio::select! {
            result = client.run() => {
                if let Err(e) = &result {
                    log_error!("RPC client stopped: {}", e);
                }
                result.context("Upstream RPC client failed")?;
            }
            _ = scheduler.run() => {
                log_warn!("Broadcast scheduler stopped");
            }
            result = server::serve(listener, hub) => {
                result.context("Relay server failed")?;
            }
            _ = tokio::signal::ctrl_c() => {
                log_info!("Shutdown signal received");
            }
        }
        Ok(())
    }
}

/// 上游地址只接受 ws / wss
pub fn validate_source_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(AppError::InvalidUrl(format!(
            "不支持的协议 {}（仅支持 ws/wss）: {}",
            other, raw
        ))),
    }
}
