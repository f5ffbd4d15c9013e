pub mod broadcast;
pub mod rpc;
