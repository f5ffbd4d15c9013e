use crate::config::BroadcastConfig;
use crate::infrastructure::broadcast::{BroadcastEvent, BroadcastHub};
use crate::models::{BlockBrief, TransactionBrief};
use crate::repositories::{BlockStore, TransactionStore};
use crate::utils::time::{Clock, truncate_to_seconds};
use crate::{log_debug, log_error, log_info, log_warn};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};

/// 一次 tick 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickReport {
    /// 水位未变化，不查询也不推送
    Skipped,
    Broadcast {
        blocks: usize,
        transaction_batches: usize,
        /// 交易查询失败而被跳过的区块数
        failed_batches: usize,
    },
    /// 区块查询失败；水位已推进，该窗口的数据不会再推送
    Failed,
}

/// 定时扫描新入库的区块 / 交易并推送给订阅者。
///
/// 水位（watermark）是上一个窗口的开区间上界，在查询之前推进，
/// 慢查询不会让下一个 tick 重复扫描同一窗口；代价是查询失败时该窗口被跳过。
pub struct BroadcastScheduler {
    blocks: Arc<dyn BlockStore>,
    transactions: Arc<dyn TransactionStore>,
    hub: BroadcastHub,
    clock: Arc<dyn Clock>,
    interval: Duration,
    lag: chrono::Duration,
    watermark: DateTime<Utc>,
}

impl BroadcastScheduler {
    pub fn new(
        config: &BroadcastConfig,
        blocks: Arc<dyn BlockStore>,
        transactions: Arc<dyn TransactionStore>,
        hub: BroadcastHub,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let lag = config.lag();
        let watermark = truncate_to_seconds(clock.now()) - lag;
        Self {
            blocks,
            transactions,
            hub,
            clock,
            interval: config.interval(),
            lag,
            watermark,
        }
    }

    /// 固定间隔执行 tick，tick 之间不会重叠
    pub async fn run(mut self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval 的第一次 tick 立即完成
        ticker.tick().await;
        log_info!(
            "Broadcast scheduler started: interval {:?}, lag {}s",
            self.interval,
            self.lag.num_seconds()
        );
        loop {
            ticker.tick().await;
            if let TickReport::Broadcast {
                blocks,
                transaction_batches,
                failed_batches,
            } = self.tick().await
            {
                if failed_batches > 0 {
                    log_warn!(
                        "{} of {} blocks broadcast without their transactions",
                        failed_batches,
                        blocks
                    );
                } else if blocks > 0 {
                    log_debug!("tick: {} blocks, {} transaction batches", blocks, transaction_batches);
                }
            }
        }
    }

    pub async fn tick(&mut self) -> TickReport {
        let new_watermark = truncate_to_seconds(self.clock.now()) - self.lag;
        if new_watermark == self.watermark {
            return TickReport::Skipped;
        }
        let from = std::mem::replace(&mut self.watermark, new_watermark);
        let to = new_watermark;

        let blocks = match self.blocks.find_committed_between(from, to).await {
            Ok(blocks) => blocks,
            Err(e) => {
                log_error!("查询区块窗口 [{}, {}) 失败，该窗口被跳过: {}", from, to, e);
                return TickReport::Failed;
            }
        };
        if blocks.is_empty() {
            log_debug!("{} - {}: no new blocks", from, to);
            return TickReport::Broadcast {
                blocks: 0,
                transaction_batches: 0,
                failed_batches: 0,
            };
        }
        log_info!("{} - {}: cnt = {}", from, to, blocks.len());

        let hashes: Vec<String> = blocks.iter().map(|b| b.hash.clone()).collect();
        let block_count = blocks.len();
        self.hub.emit(BroadcastEvent::NewBlocks {
            blocks: blocks.into_iter().map(BlockBrief::from).collect(),
        });

        let mut transaction_batches = 0;
        let mut failed_batches = 0;
        for hash in &hashes {
            let txs = match self.transactions.find_by_block(hash).await {
                Ok(txs) => txs,
                Err(e) => {
                    // 只跳过这一个区块的交易，继续处理窗口内其余区块
                    log_error!("查询区块 {} 的交易失败，跳过: {}", hash, e);
                    failed_batches += 1;
                    continue;
                }
            };
            if txs.is_empty() {
                continue;
            }
            self.hub.emit(BroadcastEvent::NewTransactions {
                transactions: txs.into_iter().map(TransactionBrief::from).collect(),
            });
            transaction_batches += 1;
        }

        TickReport::Broadcast {
            blocks: block_count,
            transaction_batches,
            failed_batches,
        }
    }
}
