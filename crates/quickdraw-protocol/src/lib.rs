//! Wire protocol for Quickdraw.
//!
//! This crate defines the "language" that clients and servers speak:
//!
//! - **Types** ([`ClientDirective`], [`ServerDirective`], [`Recipient`],
//!   [`PlayerId`]) — the directives that travel on the wire, one per line.
//! - **Codec** (render/parse on the directive types) — how those
//!   directives are converted to/from text lines.
//! - **Errors** ([`ProtocolError`]) — what can go wrong when parsing.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw lines) and the game
//! engine (player context). It doesn't know about connections or rounds —
//! it only knows how to turn directives into lines and back.
//!
//! ```text
//! Transport (lines) → Protocol (directives) → Engine (game state)
//! ```

mod codec;
mod error;
mod types;

pub use error::ProtocolError;
pub use types::{ClientDirective, PlayerId, Recipient, ServerDirective};
