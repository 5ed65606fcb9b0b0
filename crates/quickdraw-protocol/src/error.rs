//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Parsing is the only fallible operation — rendering a
/// [`ServerDirective`](crate::ServerDirective) cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The inbound line is not a known client directive.
    ///
    /// Per the protocol-violation policy, the connection handler logs
    /// this and keeps the connection open — a bad line is not fatal.
    #[error("unknown directive: {0:?}")]
    UnknownDirective(String),
}
