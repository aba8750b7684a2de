pub mod acceptor;
pub mod builder;
pub mod handler;
pub mod lifecycle;
pub mod listener;

pub use acceptor::{AcceptorState, BindOutcome, ConnectionAcceptor};
pub use builder::ServerBuilder;
pub use handler::{Connection, ConnectionHandler, DiscardHandler};
pub use lifecycle::{Server, ServerError, DEFAULT_BIND_TIMEOUT, DEFAULT_GRACE_PERIOD};
