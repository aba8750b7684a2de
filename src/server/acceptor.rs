// src/server/acceptor.rs
use super::handler::{Connection, ConnectionHandler};
use super::listener::{bind_tcp, Accept};
use crate::config::ServerConfig;
use crate::executor::{ExecutionResource, Job};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn, Instrument};

/// Pause after a failed accept so a persistent error (e.g. fd exhaustion)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// How often finished connection tasks are collected while accepting.
const REAP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptorState {
    Created,
    Binding,
    Bound,
    BindFailed,
    Accepting,
    Closed,
}

/// Result of the bind attempt, sent exactly once.
pub type BindOutcome = Result<SocketAddr, Arc<io::Error>>;

/// Owns the listening socket and the execution resource for one server run.
pub struct ConnectionAcceptor<H> {
    config: Arc<ServerConfig>,
    handler: Arc<H>,
    executor: ExecutionResource,
    grace_period: Duration,
    state: watch::Sender<AcceptorState>,
    bind_failure: Option<Arc<io::Error>>,
    bound_tx: Option<oneshot::Sender<BindOutcome>>,
}

impl<H: ConnectionHandler> ConnectionAcceptor<H> {
    /// Returns the acceptor and the receiving end of its bind outcome.
    pub fn new(
        config: Arc<ServerConfig>,
        handler: Arc<H>,
        executor: ExecutionResource,
        grace_period: Duration,
    ) -> (Self, oneshot::Receiver<BindOutcome>) {
        let (bound_tx, bound_rx) = oneshot::channel();
        let (state, _) = watch::channel(AcceptorState::Created);
        let acceptor = Self {
            config,
            handler,
            executor,
            grace_period,
            state,
            bind_failure: None,
            bound_tx: Some(bound_tx),
        };
        (acceptor, bound_rx)
    }

    pub fn state(&self) -> AcceptorState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<AcceptorState> {
        self.state.subscribe()
    }

    /// The captured bind error, if binding was attempted and failed.
    pub fn bind_failure(&self) -> Option<&io::Error> {
        self.bind_failure.as_deref()
    }

    /// Binds, then accepts until `shutdown` flips to true or its sender is
    /// dropped. On exit the execution resource is drained, then aborted once
    /// the grace period runs out. An acceptor runs at most once.
    pub async fn run(&mut self, mut shutdown: watch::Receiver<bool>) {
        if self.state() != AcceptorState::Created {
            warn!("Acceptor already ran (state {:?}), ignoring", self.state());
            return;
        }

        self.set_state(AcceptorState::Binding);
        let address = self.config.network.address();

        let bound = match bind_tcp(&self.config.network).await {
            Ok(listener) => listener.local_addr().map(|addr| (listener, addr)),
            Err(e) => Err(e),
        };

        let (listener, local_addr) = match bound {
            Ok(bound) => bound,
            Err(e) => {
                error!("Failed to bind to {}: {}", address, e);
                let e = Arc::new(e);
                self.bind_failure = Some(e.clone());
                self.set_state(AcceptorState::BindFailed);
                self.signal_bound(Err(e));
                return;
            }
        };

        self.set_state(AcceptorState::Bound);
        info!(
            "Listening on {} ({:?} execution)",
            local_addr,
            self.executor.strategy()
        );
        self.signal_bound(Ok(local_addr));

        self.set_state(AcceptorState::Accepting);
        self.accept_loop(&listener, &mut shutdown).await;

        drop(listener);
        self.set_state(AcceptorState::Closed);
        info!("Listener on {} closed, draining connections", local_addr);

        let report = self.executor.shutdown(self.grace_period).await;
        if report.forced {
            warn!(
                "Forced shutdown after {:?}: {} connections cancelled",
                self.grace_period, report.cancelled
            );
        } else {
            debug!("All connections finished");
        }
    }

    async fn accept_loop<L: Accept>(
        &mut self,
        listener: &L,
        shutdown: &mut watch::Receiver<bool>,
    ) {
        if *shutdown.borrow() {
            return;
        }

        let mut reap = tokio::time::interval(REAP_INTERVAL);
        reap.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.dispatch(stream, peer),
                    Err(e) => {
                        warn!("Exception accepting client connection: {}", e);
                        tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    }
                },
                _ = reap.tick() => self.executor.reap_finished(),
            }
        }
    }

    fn dispatch(&mut self, stream: TcpStream, peer: SocketAddr) {
        let conn = Connection::new(
            stream,
            peer,
            self.config.network.client_connection_timeout(),
        );
        let span = tracing::info_span!("connection", id = %conn.id(), %peer);
        let handler = self.handler.clone();

        let job: Job = Box::pin(
            async move {
                debug!("Connection accepted");
                match handler.handle(conn).await {
                    Ok(()) => debug!("Connection closed"),
                    Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                        debug!("Connection idle: {}", e)
                    }
                    Err(e) => warn!("Connection error: {}", e),
                }
            }
            .instrument(span),
        );

        if let Err(rejected) = self.executor.execute(job) {
            warn!("Dropping connection from {}: {}", peer, rejected);
        }
    }

    fn set_state(&self, state: AcceptorState) {
        self.state.send_replace(state);
    }

    fn signal_bound(&mut self, outcome: BindOutcome) {
        if let Some(tx) = self.bound_tx.take() {
            // The starter may have given up waiting; nothing to do then.
            let _ = tx.send(outcome);
        }
    }
}
