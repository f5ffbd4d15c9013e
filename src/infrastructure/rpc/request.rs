use crate::log_debug;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

/// 客户端认识的 JSON-RPC 方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcMethod {
    EthSubscribe,
    EthGetBlockByHash,
    EthSubscription,
    Unrecognized(String),
}

impl RpcMethod {
    pub fn as_str(&self) -> &str {
        match self {
            RpcMethod::EthSubscribe => "eth_subscribe",
            RpcMethod::EthGetBlockByHash => "eth_getBlockByHash",
            RpcMethod::EthSubscription => "eth_subscription",
            RpcMethod::Unrecognized(name) => name,
        }
    }
}

impl From<&str> for RpcMethod {
    fn from(name: &str) -> Self {
        match name {
            "eth_subscribe" => RpcMethod::EthSubscribe,
            "eth_getBlockByHash" => RpcMethod::EthGetBlockByHash,
            "eth_subscription" => RpcMethod::EthSubscription,
            other => RpcMethod::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RpcRequest {
    pub id: String,
    pub method: RpcMethod,
    pub params: Value,
    /// 已重试次数
    pub attempts: u32,
    pub result: Option<Value>,
}

impl RpcRequest {
    pub fn to_frame(&self) -> String {
        json!({
            "jsonrpc": "2.0",
            "id": self.id,
            "method": self.method.as_str(),
            "params": self.params,
        })
        .to_string()
    }
}

#[derive(Debug, PartialEq)]
pub enum Retry {
    Resend(RpcRequest),
    Abandoned(RpcRequest),
}

/// 在途请求表。id 由实例内计数器分配，重连后继续递增，不会复用
pub struct RequestTracker {
    next_id: u64,
    in_flight: HashMap<String, RpcRequest>,
    attempts_limit: u32,
    attempts_timeout: Duration,
}

impl RequestTracker {
    pub fn new(attempts_limit: u32, attempts_timeout: Duration) -> Self {
        Self {
            next_id: 1,
            in_flight: HashMap::new(),
            attempts_limit,
            attempts_timeout,
        }
    }

    fn allocate_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    pub fn create(&mut self, method: RpcMethod, params: Value) -> RpcRequest {
        let request = RpcRequest {
            id: self.allocate_id(),
            method,
            params,
            attempts: 0,
            result: None,
        };
        self.in_flight.insert(request.id.clone(), request.clone());
        request
    }

    pub fn lookup(&self, id: &str) -> Option<&RpcRequest> {
        self.in_flight.get(id)
    }

    pub fn complete(&mut self, id: &str) -> Option<RpcRequest> {
        self.in_flight.remove(id)
    }

    /// 达到上限则放弃（不再放回表中）；否则等待固定间隔后换新 id 重新登记
    pub async fn retry(&mut self, mut request: RpcRequest) -> Retry {
        self.in_flight.remove(&request.id);
        if request.attempts >= self.attempts_limit {
            return Retry::Abandoned(request);
        }

        sleep(self.attempts_timeout).await;
        let old_id = std::mem::replace(&mut request.id, self.allocate_id());
        request.attempts += 1;
        log_debug!(
            "{} retry {}/{}: id {} -> {}",
            request.method,
            request.attempts,
            self.attempts_limit,
            old_id,
            request.id
        );
        self.in_flight.insert(request.id.clone(), request.clone());
        Retry::Resend(request)
    }

    /// 连接断开时丢弃所有在途请求；计数器保持不变
    pub fn abandon_all(&mut self) -> usize {
        let dropped = self.in_flight.len();
        self.in_flight.clear();
        dropped
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
