use crate::models::{BlockBrief, TransactionBrief};
use crate::log_debug;
use serde::Serialize;
use tokio::sync::broadcast;

pub const NEW_BLOCKS_EVENT: &str = "new blocks";
pub const NEW_TRANSACTIONS_EVENT: &str = "new transactions";

/// 推送给所有订阅者的事件
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum BroadcastEvent {
    #[serde(rename = "new blocks")]
    NewBlocks { blocks: Vec<BlockBrief> },
    #[serde(rename = "new transactions")]
    NewTransactions { transactions: Vec<TransactionBrief> },
}

impl BroadcastEvent {
    pub fn name(&self) -> &'static str {
        match self {
            BroadcastEvent::NewBlocks { .. } => NEW_BLOCKS_EVENT,
            BroadcastEvent::NewTransactions { .. } => NEW_TRANSACTIONS_EVENT,
        }
    }
}

/// 单一广播频道，所有下游连接订阅同一个 topic
#[derive(Clone)]
pub struct BroadcastHub {
    sender: broadcast::Sender<BroadcastEvent>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// 返回收到事件的订阅者数量；没有订阅者不算错误
    pub fn emit(&self, event: BroadcastEvent) -> usize {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => {
                log_debug!("broadcast '{}' to {} subscribers", name, receivers);
                receivers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BroadcastEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
