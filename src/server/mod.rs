pub mod relay_server;

pub use relay_server::{bind, build_router, serve};
