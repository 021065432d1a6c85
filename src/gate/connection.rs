//! Per-connection hijack capability.

use tokio_util::sync::CancellationToken;

/// Lets a handler drop the connection its request arrived on.
///
/// [`crate::serve_with_hijack`] puts one into the extensions of every request.
/// Closing it makes the connection task drop the socket immediately, without
/// writing a status line, headers or body. Requests served by a plain
/// `axum::serve` carry no handle; the gate then falls back to a 403.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    kill: CancellationToken,
}

impl ConnectionHandle {
    pub(crate) fn new(kill: CancellationToken) -> Self {
        ConnectionHandle { kill }
    }

    /// Asks the connection task to drop the connection.
    pub fn close(&self) {
        self.kill.cancel();
    }

    /// Whether [`ConnectionHandle::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.kill.is_cancelled()
    }
}
