pub mod diesel;
pub mod gateway;
#[cfg(test)]
pub mod memory;

pub use gateway::{
    Connector, PersistenceGateway, RetrySettings, SharedGateway, StorageConnection, WriteOutcome,
    Written,
};
