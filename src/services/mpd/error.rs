use std::io;

use super::parse::ParseError;

/// Errors that can occur while talking to the MPD daemon
#[derive(thiserror::Error, Debug)]
pub enum MpdError {
    /// Socket level failure
    #[error("MPD connection I/O failed: {0}")]
    Io(#[from] io::Error),

    /// The daemon closed the connection
    #[error("MPD closed the connection")]
    Closed,

    /// The daemon rejected a command with an `ACK` line
    #[error("MPD rejected `{command}` (code {code}): {message}")]
    Ack {
        /// Numeric MPD error code
        code: u32,
        /// Command that was rejected
        command: String,
        /// Human readable reason given by MPD
        message: String,
    },

    /// The daemon answered with something the line protocol does not allow
    #[error("MPD protocol violation: {0}")]
    Protocol(String),

    /// A response record could not be parsed into a typed value
    #[error("Failed to parse MPD response: {0}")]
    Parse(#[from] ParseError),
}

impl MpdError {
    /// Whether the error means the connection to the daemon is gone.
    ///
    /// The bridge never reconnects, so a fatal error terminates the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Closed | Self::Protocol(_))
    }
}
