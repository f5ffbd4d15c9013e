pub mod repository;

pub use repository::{BlockStore, TransactionStore};
