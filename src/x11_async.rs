//! X11 Async Readiness
//!
//! Lets the tokio event loop sleep until the X connection has data, by
//! registering the connection socket with the runtime's reactor.

use anyhow::{Context, Result};
use std::os::unix::io::RawFd;
use tokio::io::unix::AsyncFd;
use tracing::trace;

/// Readable-interest registration for the X socket
///
/// x11rb buffers events internally, so callers must drain
/// `poll_for_event` completely before waiting again.
pub struct X11Readiness {
    fd: AsyncFd<RawFd>,
}

impl X11Readiness {
    pub fn new(fd: RawFd) -> Result<Self> {
        let fd = AsyncFd::new(fd).context("Failed to register X11 socket with the reactor")?;
        Ok(Self { fd })
    }

    /// Resolves once the socket has become readable.
    pub async fn wait_readable(&self) -> Result<()> {
        let mut guard = self
            .fd
            .readable()
            .await
            .context("Failed waiting for X11 socket")?;
        guard.clear_ready();
        trace!("X11 socket readable");
        Ok(())
    }
}
