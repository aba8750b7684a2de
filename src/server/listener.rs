// ────────────────────────────────
// src/server/listener.rs
// Low-level TCP bind, kept apart from the accept loop.
// ────────────────────────────────
use crate::config::NetworkConfig;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};

/// Binds to the configured host and port. A hostname resolving to several
/// addresses is tried in order until one binds.
pub async fn bind_tcp(network: &NetworkConfig) -> io::Result<TcpListener> {
    let listener = TcpListener::bind((network.hostname(), network.port())).await?;
    Ok(listener)
}

/// Source of accepted connections for the accept loop.
#[async_trait]
pub trait Accept: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Accept for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}
