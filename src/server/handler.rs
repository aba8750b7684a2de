// src/server/handler.rs
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use uuid::Uuid;

/// Handles one accepted connection. The server defines no protocol of its
/// own; implementations own the socket until they return.
#[async_trait]
pub trait ConnectionHandler: Send + Sync + 'static {
    async fn handle(&self, conn: Connection) -> io::Result<()>;
}

/// An accepted socket plus the idle timeout its reads must respect.
#[derive(Debug)]
pub struct Connection {
    id: Uuid,
    stream: TcpStream,
    peer: SocketAddr,
    idle_timeout: Duration,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr, idle_timeout: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            stream,
            peer,
            idle_timeout,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Reads into `buf`, failing with `TimedOut` if nothing arrives within
    /// the idle timeout. `Ok(0)` is end-of-stream.
    pub async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match tokio::time::timeout(self.idle_timeout, self.stream.read(buf)).await {
            Ok(result) => result,
            Err(_) => Err(io::Error::new(
                io::ErrorKind::TimedOut,
                format!("no data from {} for {:?}", self.peer, self.idle_timeout),
            )),
        }
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        self.stream.write_all(buf).await
    }

    /// Closes the write half; the peer sees end-of-stream.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.stream.shutdown().await
    }

    pub fn into_inner(self) -> TcpStream {
        self.stream
    }
}

/// Default handler: reads and throws away bytes until the peer closes or the
/// connection goes idle, then closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardHandler;

#[async_trait]
impl ConnectionHandler for DiscardHandler {
    async fn handle(&self, mut conn: Connection) -> io::Result<()> {
        let mut buf = [0u8; 4096];
        let result = loop {
            match conn.read(&mut buf).await {
                Ok(0) => break Ok(()),
                Ok(_) => continue,
                Err(e) => break Err(e),
            }
        };
        // Best effort; the peer may already be gone.
        let _ = conn.shutdown().await;
        result
    }
}
