pub mod convert;
pub mod format;
pub mod logger;
pub mod time;

pub use convert::*;
