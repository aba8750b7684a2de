// src/lib.rs
pub mod config;
pub mod executor;
pub mod logging;
pub mod server;

pub use config::{ConfigValidationError, ServerConfig};
pub use server::{Connection, ConnectionHandler, Server, ServerBuilder, ServerError};
