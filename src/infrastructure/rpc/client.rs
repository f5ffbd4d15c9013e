//! 上游 JSON-RPC WebSocket 客户端。
//!
//! 连接生命周期是一个显式状态机：
//! `Disconnected → Connecting → Subscribed → Disconnected → ...`。
//! 每个连接周期内帧按到达顺序逐个处理；连接关闭后丢弃所有在途请求，
//! 等待 `reconnect_delay` 再重连。建立连接失败则整个客户端退出。
use crate::config::SourceConfig;
use crate::errors::error::AppError;
use crate::infrastructure::rpc::message::InboundMessage;
use crate::infrastructure::rpc::request::{RequestTracker, Retry, RpcMethod, RpcRequest};
use crate::services::BlockService;
use crate::utils::format::json_preview;
use crate::{log_debug, log_error, log_info, log_warn};
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Subscribed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Subscribed => "subscribed",
        };
        f.write_str(name)
    }
}

/// 出站帧的去向
#[async_trait]
pub trait FrameSink: Send {
    async fn send_frame(&mut self, frame: String) -> Result<(), AppError>;
}

#[async_trait]
impl FrameSink for WsSink {
    async fn send_frame(&mut self, frame: String) -> Result<(), AppError> {
        self.send(Message::Text(frame.into())).await?;
        Ok(())
    }
}

#[async_trait]
impl FrameSink for mpsc::UnboundedSender<String> {
    async fn send_frame(&mut self, frame: String) -> Result<(), AppError> {
        self.send(frame)
            .map_err(|e| AppError::Connection(format!("frame channel closed: {}", e)))
    }
}

pub struct RpcClient {
    url: String,
    reconnect_delay: Duration,
    tracker: RequestTracker,
    block_service: Arc<BlockService>,
    state: ConnectionState,
}

impl RpcClient {
    pub fn new(config: &SourceConfig, block_service: Arc<BlockService>) -> Self {
        Self {
            url: config.url.clone(),
            reconnect_delay: config.reconnect_delay(),
            tracker: RequestTracker::new(
                config.request_attempts_limit,
                config.request_attempts_timeout(),
            ),
            block_service,
            state: ConnectionState::Disconnected,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        log_info!("RPC source {}: {} -> {}", self.url, self.state, next);
        self.state = next;
    }

    /// 连接失败返回 `AppError::Connection`；正常情况下永不返回
    pub async fn run(&mut self) -> Result<(), AppError> {
        loop {
            self.transition(ConnectionState::Connecting);
            let (stream, _) = connect_async(self.url.as_str()).await.map_err(|e| {
                self.state = ConnectionState::Disconnected;
                AppError::Connection(format!("无法连接上游 {}: {}", self.url, e))
            })?;
            let (mut write, mut read) = stream.split();

            self.transition(ConnectionState::Subscribed);
            match self.subscribe(&mut write).await {
                Ok(()) => {
                    while let Some(message) = read.next().await {
                        let text = match message {
                            Ok(Message::Text(text)) => text.as_str().to_owned(),
                            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes.to_vec()) {
                                Ok(text) => text,
                                Err(e) => {
                                    log_warn!("丢弃非 UTF-8 的二进制帧: {}", e);
                                    continue;
                                }
                            },
                            Ok(Message::Close(frame)) => {
                                log_warn!("上游关闭连接: {:?}", frame);
                                break;
                            }
                            // ping/pong 由 tungstenite 自动应答
                            Ok(_) => continue,
                            Err(e) => {
                                log_error!("读取上游帧失败: {}", e);
                                break;
                            }
                        };
                        if let Err(e) = self.handle_frame(&text, &mut write).await {
                            log_error!("发送请求失败，结束本次连接: {}", e);
                            break;
                        }
                    }
                }
                Err(e) => log_error!("订阅 newHeads 失败: {}", e),
            }

            self.transition(ConnectionState::Disconnected);
            let dropped = self.tracker.abandon_all();
            if dropped > 0 {
                log_warn!("连接断开，放弃 {} 个在途请求", dropped);
            }
            sleep(self.reconnect_delay).await;
        }
    }

    async fn send<S: FrameSink + ?Sized>(
        &mut self,
        sink: &mut S,
        request: &RpcRequest,
    ) -> Result<(), AppError> {
        log_debug!("-> {} id={} {}", request.method, request.id, request.params);
        sink.send_frame(request.to_frame()).await
    }

    pub async fn subscribe<S: FrameSink + ?Sized>(&mut self, sink: &mut S) -> Result<(), AppError> {
        let request = self
            .tracker
            .create(RpcMethod::EthSubscribe, json!(["newHeads"]));
        self.send(sink, &request).await
    }

    /// 处理一帧。协议层面的问题（无效帧、未知 id）只记日志；
    /// 只有出站发送失败才返回错误
    pub async fn handle_frame<S: FrameSink + ?Sized>(
        &mut self,
        text: &str,
        sink: &mut S,
    ) -> Result<(), AppError> {
        match InboundMessage::parse(text) {
            Ok(InboundMessage::Answer { id, result }) => self.on_answer(id, result, sink).await,
            Ok(InboundMessage::Notification { method, params }) => {
                self.on_notification(&method, params, sink).await
            }
            Err(e) => {
                log_warn!("{}", e);
                Ok(())
            }
        }
    }

    async fn on_answer<S: FrameSink + ?Sized>(
        &mut self,
        id: String,
        result: Value,
        sink: &mut S,
    ) -> Result<(), AppError> {
        let Some(request) = self.tracker.lookup(&id).cloned() else {
            log_warn!("{}", AppError::UnknownCorrelation(id));
            return Ok(());
        };

        match request.method.clone() {
            RpcMethod::EthGetBlockByHash => self.on_block(request, result, sink).await,
            RpcMethod::EthSubscribe => {
                log_info!("Subscribed to newHeads: {}", result);
                self.tracker.complete(&id);
                Ok(())
            }
            other => {
                log_debug!("忽略 {} 的应答", other);
                self.tracker.complete(&id);
                Ok(())
            }
        }
    }

    async fn on_notification<S: FrameSink + ?Sized>(
        &mut self,
        method: &str,
        params: Value,
        sink: &mut S,
    ) -> Result<(), AppError> {
        match RpcMethod::from(method) {
            RpcMethod::EthSubscription => self.on_new_head(params, sink).await,
            other => {
                log_warn!("未处理的推送方法: {}", other);
                Ok(())
            }
        }
    }

    async fn on_new_head<S: FrameSink + ?Sized>(
        &mut self,
        params: Value,
        sink: &mut S,
    ) -> Result<(), AppError> {
        let hash = params
            .pointer("/result/hash")
            .and_then(Value::as_str)
            .filter(|hash| !hash.is_empty());
        let Some(hash) = hash else {
            log_warn!("newHeads 推送缺少区块 hash: {}", json_preview(&params, 200));
            return Ok(());
        };

        log_debug!("New head {} ({} requests in flight)", hash, self.tracker.in_flight());
        let request = self
            .tracker
            .create(RpcMethod::EthGetBlockByHash, json!([hash, true]));
        self.send(sink, &request).await
    }

    async fn on_block<S: FrameSink + ?Sized>(
        &mut self,
        mut request: RpcRequest,
        result: Value,
        sink: &mut S,
    ) -> Result<(), AppError> {
        if is_empty_result(&result) {
            request.result = Some(result);
            let empty = AppError::TransientEmptyResult(format!(
                "{} {}",
                request.method, request.params
            ));
            log_debug!("{}", empty);
            return match self.tracker.retry(request).await {
                Retry::Resend(request) => self.send(sink, &request).await,
                Retry::Abandoned(request) => {
                    log_warn!(
                        "{}: {} (last result: {})",
                        AppError::RequestExhausted {
                            method: request.method.to_string(),
                            attempts: request.attempts,
                        },
                        request.params,
                        request.result.as_ref().unwrap_or(&Value::Null)
                    );
                    Ok(())
                }
            };
        }

        self.tracker.complete(&request.id);
        match self.block_service.process_and_save_block(result).await {
            Ok(report) if !report.block_stored => {
                log_warn!("区块 {} 未落库，仅写入了其交易", report.block_hash);
            }
            Ok(_) => {}
            Err(e) => log_error!("区块 {} 处理失败: {}", request.params, e),
        }
        Ok(())
    }
}

/// 节点尚未同步到该区块时可能返回 null、空对象 / 数组、false 或 0
fn is_empty_result(result: &Value) -> bool {
    match result {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(number) => number.as_f64() == Some(0.0),
        Value::String(text) => text.is_empty() || text == "0",
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}
