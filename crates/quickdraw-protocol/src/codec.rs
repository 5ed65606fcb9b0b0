//! Line codec: directives to text lines and back.
//!
//! The wire format is one directive per line, plain text, no framing
//! beyond the newline (the transport strips it). Rendering is infallible;
//! parsing rejects anything that isn't a known client directive so the
//! connection handler can log and move on.

use std::str::FromStr;

use crate::{ClientDirective, ProtocolError, ServerDirective};

impl ServerDirective {
    /// Renders this directive as the exact line sent to clients,
    /// without a trailing newline.
    pub fn to_line(&self) -> String {
        match self {
            Self::Name(name) => format!("NAME:{name}"),
            Self::Go => "GO".to_string(),
            Self::Winner(name) => format!("WINNER:{name}"),
            Self::Score(n) => format!("SCORE:{n}"),
            Self::GameOver(name) => format!("GAME_OVER:{name} wins!"),
            Self::Collected(n) => format!("COLLECTED:{n}"),
            Self::ResourceWin(n) => format!("RESOURCE_WIN:{n}"),
            Self::TryAgain => "TRY_AGAIN".to_string(),
        }
    }
}

impl FromStr for ClientDirective {
    type Err = ProtocolError;

    /// Parses one inbound line. Surrounding whitespace is tolerated
    /// (clients on some platforms send `\r\n`); anything unrecognized
    /// is an [`ProtocolError::UnknownDirective`].
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        match line.trim() {
            "CLICK" => Ok(Self::Click),
            "COLLECT_RESOURCE" => Ok(Self::CollectResource),
            "QUIT" => Ok(Self::Quit),
            other => {
                Err(ProtocolError::UnknownDirective(other.to_string()))
            }
        }
    }
}
