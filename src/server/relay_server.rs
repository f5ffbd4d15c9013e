use crate::config::ServerConfig;
use crate::errors::error::AppError;
use crate::infrastructure::broadcast::{BroadcastEvent, BroadcastHub};
use crate::{log_debug, log_info, log_warn};
use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;

/// 下游订阅者的 WebSocket 入口：`/ws` 推送广播事件，`/health` 健康检查
pub fn build_router(hub: BroadcastHub) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(hub)
}

pub async fn bind(config: &ServerConfig) -> Result<TcpListener, AppError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    log_info!("Relay server listening on {}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve(listener: TcpListener, hub: BroadcastHub) -> Result<(), AppError> {
    axum::serve(listener, build_router(hub)).await?;
    Ok(())
}

async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<BroadcastHub>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn health_handler(State(hub): State<BroadcastHub>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "subscribers": hub.subscriber_count(),
    }))
}

async fn handle_socket(mut socket: WebSocket, hub: BroadcastHub) {
    let mut events = hub.subscribe();
    log_info!("Subscriber connected ({} total)", hub.subscriber_count());

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    if !forward(&mut socket, &event).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    log_warn!("Subscriber lagged behind, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log_debug!("Subscriber socket error: {}", e);
                    break;
                }
            },
        }
    }
    log_info!("Subscriber disconnected");
}

/// 返回 false 表示连接已不可写
async fn forward(socket: &mut WebSocket, event: &BroadcastEvent) -> bool {
    let text = match serde_json::to_string(event) {
        Ok(text) => text,
        Err(e) => {
            log_warn!("事件 '{}' 序列化失败: {}", event.name(), e);
            return true;
        }
    };
    socket.send(Message::Text(text.into())).await.is_ok()
}
