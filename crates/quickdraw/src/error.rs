//! Unified error type for the Quickdraw server.

use quickdraw_protocol::ProtocolError;
use quickdraw_registry::RegistryError;
use quickdraw_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When embedding the `quickdraw` meta-crate you deal with this single
/// type; the `#[from]` attributes let `?` convert sub-crate errors
/// automatically.
///
/// Note what is *not* here: lock timeouts. A timed-out collection is a
/// normal outcome surfaced to the client as `TRY_AGAIN`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum QuickdrawError {
    /// A transport-level error (bind, accept, read, write).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (unrecognized directive).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registry-level error (unknown player).
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
