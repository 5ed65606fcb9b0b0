//! Transport abstraction layer for Quickdraw.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract the
//! line-oriented socket each client speaks over. The core only ever sees
//! "read a line / write a line / close" — the concrete socket type lives
//! behind these traits.

#![allow(async_fn_in_trait)]

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpLineConnection, TcpLineTransport};

use std::fmt;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// The local address the transport is bound to.
    fn local_addr(&self) -> std::io::Result<std::net::SocketAddr>;
}

/// A single connection that can exchange text lines.
///
/// `read_line` and `write_line` take `&self` and are independently
/// locked, so a reader task and a writer task can share one connection
/// without a pending read stalling writes.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Receives the next line from the remote peer, without the
    /// trailing newline.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    async fn read_line(&self) -> Result<Option<String>, Self::Error>;

    /// Sends one line to the remote peer. The newline is appended here;
    /// `line` must not contain one.
    async fn write_line(&self, line: &str) -> Result<(), Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}
