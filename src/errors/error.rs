use diesel::result::Error as DieselError;
use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

#[derive(Error, Debug)]
pub enum AppError {
    // 捕获所有 SQL 执行、ORM 映射错误等
    #[error("Database query error: {0}")]
    DatabaseQuery(#[from] DieselError),

    /// 上游 / 数据库连接失败（已用尽重试次数）
    #[error("连接错误: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("配置错误: {0}")]
    Config(#[from] config::ConfigError),

    /// 无法识别的 JSON-RPC 帧
    #[error("无效的RPC消息: {0}")]
    MalformedMessage(String),

    /// 应答 id 不在在途请求集合中
    #[error("未知的请求id: {0}")]
    UnknownCorrelation(String),

    /// 区块查询返回空结果（可重试）
    #[error("空结果: {0}")]
    TransientEmptyResult(String),

    /// 重试次数耗尽
    #[error("请求重试耗尽: {method} (尝试 {attempts} 次)")]
    RequestExhausted { method: String, attempts: u32 },

    /// 类型转换错误（hex→i64、时间转换等）
    #[error("类型转换错误: {0}")]
    Conversion(String),

    #[error("无效的URL: {0}")]
    InvalidUrl(String),
}

impl From<diesel::ConnectionError> for AppError {
    fn from(err: diesel::ConnectionError) -> Self {
        AppError::Connection(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::InvalidUrl(err.to_string())
    }
}
