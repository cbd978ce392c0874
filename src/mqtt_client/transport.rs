//! Transport abstraction for the engine.
//!
//! The engine never opens sockets itself: it drives a [`TransportLink`] for
//! outbound calls and consumes [`TransportEvent`] stimuli for everything the
//! transport reports back. TCP, TLS or an in-memory pipe all fit behind the
//! same pair of surfaces.

use thiserror::Error;

/// Error type for transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),
}

/// What the transport reports back to the engine. Delivered in order through
/// the engine's stimulus queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection requested by `connect` is up.
    Connected,
    /// The connection requested by `connect` could not be established.
    ConnectFailed,
    /// A chunk of bytes arrived. Chunk boundaries are arbitrary.
    Received(Vec<u8>),
    /// The peer or the transport closed the connection.
    Closed,
    /// The transport itself is gone (process-level failure).
    Terminated,
}

/// Outbound calls the engine makes on the transport.
///
/// Implementations must not block the engine: `write` hands the bytes to the
/// transport's own queue and returns.
pub trait TransportLink {
    /// Start connecting to the configured remote. Completion arrives as a
    /// `Connected` or `ConnectFailed` event.
    fn connect(&mut self);

    /// Queue bytes for transmission.
    fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;

    /// Close after pending writes have drained.
    fn close(&mut self);

    /// Drop the connection immediately.
    fn abort(&mut self);
}
