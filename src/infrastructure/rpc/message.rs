use crate::errors::error::AppError;
use crate::utils::format::json_preview;
use serde_json::{Map, Value};

/// 上游推来的一帧，按 JSON-RPC 2.0 分类
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// 对我方请求的应答
    Answer { id: String, result: Value },
    /// 服务端主动推送（订阅）
    Notification { method: String, params: Value },
}

impl InboundMessage {
    pub fn parse(text: &str) -> Result<Self, AppError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| AppError::MalformedMessage(format!("invalid json: {}", e)))?;
        let object = value
            .as_object()
            .ok_or_else(|| malformed("not an object", &value))?;

        match object.get("jsonrpc").and_then(Value::as_str) {
            Some(version) if !version.is_empty() => {}
            _ => return Err(malformed("missing jsonrpc", &value)),
        }

        if object.contains_key("result") {
            if let Some(id) = correlation_id(object) {
                return Ok(InboundMessage::Answer {
                    id,
                    result: object.get("result").cloned().unwrap_or(Value::Null),
                });
            }
        }

        match object.get("method").and_then(Value::as_str) {
            Some(method) if !method.is_empty() => Ok(InboundMessage::Notification {
                method: method.to_string(),
                params: object.get("params").cloned().unwrap_or(Value::Null),
            }),
            _ => Err(malformed("neither answer nor notification", &value)),
        }
    }
}

/// 数字 id 与字符串 id 统一成字符串
fn correlation_id(object: &Map<String, Value>) -> Option<String> {
    match object.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn malformed(reason: &str, frame: &Value) -> AppError {
    AppError::MalformedMessage(format!("{}: {}", reason, json_preview(frame, 200)))
}
