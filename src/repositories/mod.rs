pub mod base;
pub mod block_repository;
pub mod traits;
pub mod transaction_repository;

pub use block_repository::BlockRepository;
pub use traits::{BlockStore, TransactionStore};
pub use transaction_repository::TransactionRepository;
