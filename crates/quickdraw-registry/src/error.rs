//! Error types for the registry layer.

/// Errors that can occur during registry operations.
///
/// Deliberately small: membership changes are idempotent and fan-out
/// skips dead channels, so the only real failure is addressing a player
/// who isn't there.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No registered player with this id.
    #[error("player {0} not registered")]
    NotFound(quickdraw_protocol::PlayerId),
}
