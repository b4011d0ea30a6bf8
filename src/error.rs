use std::{io, net::SocketAddr, time::Duration};

use thiserror::Error;

pub type Result<T, E = DyadError> = std::result::Result<T, E>;

/// Everything that can end a dyad session. There is no recovery path for any
/// of these: the session tears down and the error reaches the operator.
#[derive(Error, Debug)]
pub enum DyadError {
    #[error("failed to open haptic device #{index}: {reason}")]
    DeviceInit { index: usize, reason: String },

    #[error("failed to load firmware \"{path}\": {reason}")]
    FirmwareLoad { path: String, reason: String },

    #[error("haptic device I/O loop failed: {0}")]
    DevicePump(String),

    #[error("could not bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed while waiting for a peer to connect: {0}")]
    Accept(#[source] io::Error),

    #[error("could not connect to host at {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("peer closed the link mid-frame ({received} of 8 bytes received)")]
    FrameTruncated { received: usize },

    #[error("link to peer lost: {0}")]
    LinkLost(#[source] io::Error),

    #[error("no traffic from peer within {0:?}")]
    LinkTimeout(Duration),

    #[error("invalid config: {0}")]
    Config(String),
}

impl DyadError {
    /// True for failures of the network link once it was established
    pub fn is_link_failure(&self) -> bool {
        matches!(
            self,
            DyadError::FrameTruncated { .. } | DyadError::LinkLost(_) | DyadError::LinkTimeout(_)
        )
    }
}
