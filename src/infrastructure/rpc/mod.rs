pub mod client;
pub mod message;
pub mod request;

pub use client::{ConnectionState, FrameSink, RpcClient};
pub use message::InboundMessage;
pub use request::{RequestTracker, Retry, RpcMethod, RpcRequest};
