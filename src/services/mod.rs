pub mod block_service;
pub mod broadcast_service;

pub use block_service::{BlockService, SaveReport};
pub use broadcast_service::{BroadcastScheduler, TickReport};
