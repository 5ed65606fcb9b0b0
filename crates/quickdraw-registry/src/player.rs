//! Player types: the registry's record of one connected client.

use quickdraw_protocol::PlayerId;
use tokio::sync::mpsc;

/// The outbound line channel for one player.
///
/// The connection's writer task owns the receiving end and drains it
/// into the socket. Sends are synchronous and never block, which is why
/// the registry can fan out while holding no lock across I/O.
pub type Outbox = mpsc::UnboundedSender<String>;

/// One connected player's identity, as assigned at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    /// Which player this is.
    pub id: PlayerId,

    /// Display name, unique for the registry's lifetime (`Player_<n>`
    /// from a monotonic counter — names are never reused, even after
    /// the original holder disconnects).
    pub name: String,
}
