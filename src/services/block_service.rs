use crate::database::WriteOutcome;
use crate::errors::error::AppError;
use crate::models::{Block, Transaction};
use crate::repositories::{BlockStore, TransactionStore};
use crate::{log_error, log_info, log_warn};
use serde_json::Value;
use std::sync::Arc;

/// 一个区块的保存结果
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub block_hash: String,
    pub block_stored: bool,
    pub transactions_stored: usize,
    pub transactions_failed: usize,
}

pub struct BlockService {
    blocks: Arc<dyn BlockStore>,
    transactions: Arc<dyn TransactionStore>,
}

impl BlockService {
    pub fn new(blocks: Arc<dyn BlockStore>, transactions: Arc<dyn TransactionStore>) -> Self {
        Self {
            blocks,
            transactions,
        }
    }

    /// 先写区块，再按列表顺序逐笔写交易。
    /// 单笔交易解码或写入失败只记日志，不影响后续交易。
    pub async fn process_and_save_block(&self, result: Value) -> Result<SaveReport, AppError> {
        let block = Block::from_rpc(result)?;
        let number = block.number();
        let Block {
            insert,
            transactions,
        } = block;

        let written = self.blocks.save(insert).await;
        if let WriteOutcome::Lost(reason) = &written.outcome {
            log_error!("区块 #{} {} 未能写入: {}", number, written.key, reason);
        }
        let mut report = SaveReport {
            block_stored: written.is_stored(),
            block_hash: written.key,
            ..SaveReport::default()
        };

        for raw in transactions {
            let tx = match Transaction::from_rpc(raw) {
                Ok(tx) => tx,
                Err(e) => {
                    log_warn!("区块 {} 中的交易解码失败，跳过: {}", report.block_hash, e);
                    report.transactions_failed += 1;
                    continue;
                }
            };
            let written = self.transactions.save(tx.insert).await;
            match written.outcome {
                WriteOutcome::Stored => report.transactions_stored += 1,
                WriteOutcome::Lost(reason) => {
                    log_error!("交易 {} 未能写入: {}", written.key, reason);
                    report.transactions_failed += 1;
                }
            }
        }

        log_info!(
            "Block #{} {} saved: {} txs stored, {} failed",
            number,
            report.block_hash,
            report.transactions_stored,
            report.transactions_failed
        );
        Ok(report)
    }
}
