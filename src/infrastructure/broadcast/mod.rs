pub mod hub;

pub use hub::{BroadcastEvent, BroadcastHub};
