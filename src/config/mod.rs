pub mod config;

pub use self::config::{BroadcastConfig, Config, DatabaseConfig, ServerConfig, SourceConfig};
