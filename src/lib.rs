pub mod config;
pub mod core;
pub mod error;
pub mod http_server;
pub mod monitoring;
pub mod search;
pub mod sink;
pub mod source;

pub use crate::config::{AccountCredentials, Config};
pub use crate::core::SearchScheduler;
pub use crate::error::{PollerError, Result};
pub use crate::http_server::HttpServer;
