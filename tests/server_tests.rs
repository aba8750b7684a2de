// tests/server_tests.rs
use async_trait::async_trait;
use rust_tcp_server::config::{
    ExecutionStrategy, LoggingConfig, NetworkConfig, ServerConfig, WorkerPoolConfig,
};
use rust_tcp_server::{Connection, ConnectionHandler, Server, ServerBuilder, ServerError};
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

const STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct CountingHandler {
    handled: AtomicUsize,
}

#[async_trait]
impl ConnectionHandler for CountingHandler {
    async fn handle(&self, _conn: Connection) -> io::Result<()> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn config_with_pool(port: u16, pool: WorkerPoolConfig) -> ServerConfig {
    let network = NetworkConfig::builder()
        .hostname("127.0.0.1")
        .unwrap()
        .port(port)
        .unwrap()
        .client_connection_timeout_secs(1)
        .unwrap()
        .build()
        .unwrap();
    let mut logging = LoggingConfig::builder();
    logging.file_logging_enabled(false);

    ServerConfig::builder()
        .network(network)
        .worker_pool(pool)
        .logging(logging.build().unwrap())
        .build()
}

fn config_for(port: u16) -> ServerConfig {
    config_with_pool(port, WorkerPoolConfig::default())
}

async fn start(server: &mut Server<impl ConnectionHandler>) -> SocketAddr {
    timeout(STEP_TIMEOUT, server.start())
        .await
        .expect("start() hung")
        .expect("start() failed")
}

/// Reads until the server side goes away; either a clean EOF or a reset.
async fn assert_server_closes(stream: &mut TcpStream) {
    let mut buf = [0u8; 64];
    let result = timeout(STEP_TIMEOUT, async {
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(e) => return Err(e),
            }
        }
    })
    .await
    .expect("connection was never closed");

    if let Err(e) = result {
        assert_eq!(e.kind(), io::ErrorKind::ConnectionReset, "unexpected error: {e}");
    }
}

#[tokio::test]
async fn test_server_starts_and_binds_to_port() {
    let port = free_port();
    let mut server = ServerBuilder::new(config_for(port)).build();

    let addr = start(&mut server).await;
    assert_eq!(addr.port(), port);
    assert_eq!(server.local_addr(), Some(addr));
    assert!(server.is_running());

    let stream = timeout(Duration::from_secs(1), TcpStream::connect(addr))
        .await
        .expect("connect timed out");
    assert!(stream.is_ok());

    server.stop().await;
}

#[tokio::test]
async fn test_bind_failure_surfaces_from_start() {
    let port = free_port();
    let mut first = ServerBuilder::new(config_for(port)).build();
    let addr = start(&mut first).await;

    let mut second = ServerBuilder::new(config_for(port)).build();
    let err = timeout(STEP_TIMEOUT, second.start())
        .await
        .expect("second start() hung")
        .unwrap_err();

    assert!(matches!(err, ServerError::Bind { .. }));
    assert_eq!(
        err.io_error().map(io::Error::kind),
        Some(io::ErrorKind::AddrInUse)
    );
    assert!(err.to_string().contains(&format!("127.0.0.1:{}", port)));
    assert!(!second.is_running());

    // The first server is unaffected.
    assert!(TcpStream::connect(addr).await.is_ok());
    first.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let mut server = ServerBuilder::new(config_for(free_port())).build();
    start(&mut server).await;

    server.stop().await;
    assert!(!server.is_running());
    server.stop().await;
    assert!(!server.is_running());
    assert_eq!(server.local_addr(), None);
}

#[tokio::test]
async fn test_stop_before_start_is_noop() {
    let mut server = Server::new(config_for(free_port()));
    server.stop().await;
    assert!(!server.is_running());
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let mut server = ServerBuilder::new(config_for(free_port())).build();
    start(&mut server).await;

    let err = server.start().await.unwrap_err();
    assert!(matches!(err, ServerError::AlreadyRunning));
    server.stop().await;
}

#[tokio::test]
async fn test_connected_clients_are_closed_after_stop() {
    // The default handler holds the connection until it goes idle, so stop()
    // has to cut it off once the grace period runs out.
    let mut server = ServerBuilder::new(config_for(free_port()))
        .with_grace_period(Duration::from_millis(100))
        .build();
    let addr = start(&mut server).await;

    let mut clients = Vec::new();
    for _ in 0..3 {
        clients.push(TcpStream::connect(addr).await.unwrap());
    }

    timeout(STEP_TIMEOUT, server.stop())
        .await
        .expect("stop() hung");

    for client in &mut clients {
        assert_server_closes(client).await;
    }
    assert!(TcpStream::connect(addr).await.is_err());
}

#[tokio::test]
async fn test_idle_client_is_closed_after_connection_timeout() {
    // config_for sets a one second client timeout; nothing stops the server.
    let mut server = ServerBuilder::new(config_for(free_port())).build();
    let addr = start(&mut server).await;

    let started = tokio::time::Instant::now();
    let mut client = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 8];
    let read = timeout(Duration::from_secs(3), client.read(&mut buf))
        .await
        .expect("idle connection was never closed");
    let elapsed = started.elapsed();

    assert_eq!(read.unwrap(), 0);
    assert!(elapsed >= Duration::from_millis(900), "closed too early: {elapsed:?}");
    assert!(server.is_running());

    // The listener is unaffected by one connection timing out.
    assert!(TcpStream::connect(addr).await.is_ok());
    server.stop().await;
}

async fn connect_many(addr: SocketAddr, n: usize) {
    let clients = (0..n).map(|_| {
        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            assert_server_closes(&mut stream).await;
        })
    });

    let results = timeout(STEP_TIMEOUT, futures::future::join_all(clients))
        .await
        .expect("clients did not finish");
    for result in results {
        result.unwrap();
    }
}

#[tokio::test]
async fn test_concurrent_clients_are_all_dispatched() {
    let handler = Arc::new(CountingHandler::default());
    let mut server = ServerBuilder::new(config_for(free_port()))
        .with_shared_handler(handler.clone())
        .build();
    let addr = start(&mut server).await;

    connect_many(addr, 10).await;
    server.stop().await;

    assert_eq!(handler.handled.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_bounded_pool_dispatches_every_client() {
    let mut pool = WorkerPoolConfig::builder();
    pool.min_pool_size(2)
        .unwrap()
        .max_pool_size(4)
        .unwrap()
        .queue_size(10)
        .unwrap()
        .execution_strategy(ExecutionStrategy::BoundedPool);
    let config = config_with_pool(free_port(), pool.build().unwrap());

    let handler = Arc::new(CountingHandler::default());
    let mut server = ServerBuilder::new(config)
        .with_shared_handler(handler.clone())
        .build();
    let addr = start(&mut server).await;

    connect_many(addr, 10).await;
    server.stop().await;

    assert_eq!(handler.handled.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_customized_pool_with_per_task_strategy_still_serves() {
    let mut pool = WorkerPoolConfig::builder();
    pool.min_pool_size(1).unwrap().max_pool_size(1).unwrap();
    let config = config_with_pool(free_port(), pool.build().unwrap());

    let handler = Arc::new(CountingHandler::default());
    let mut server = ServerBuilder::new(config)
        .with_shared_handler(handler.clone())
        .build();
    let addr = start(&mut server).await;

    // Far more concurrent clients than the ignored max_pool_size.
    connect_many(addr, 5).await;
    server.stop().await;

    assert_eq!(handler.handled.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_server_can_restart_after_stop() {
    let port = free_port();
    let handler = Arc::new(CountingHandler::default());
    let mut server = ServerBuilder::new(config_for(port))
        .with_shared_handler(handler.clone())
        .build();

    start(&mut server).await;
    server.stop().await;

    let addr = start(&mut server).await;
    assert_eq!(addr.port(), port);
    connect_many(addr, 1).await;
    server.stop().await;

    assert_eq!(handler.handled.load(Ordering::SeqCst), 1);
}
