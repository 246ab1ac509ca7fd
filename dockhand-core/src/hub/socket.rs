//! Push-socket capability trait
//!
//! The hub never terminates a WebSocket itself; the surrounding
//! application upgrades the connection and hands the hub an object
//! with this shape.

use async_trait::async_trait;

use crate::error::SocketError;

/// A duplex text channel to one browser client
#[async_trait]
pub trait PushSocket: Send {
    /// Writes one text frame
    ///
    /// # Errors
    ///
    /// Returns a [`SocketError`] when the transport is closed or the
    /// write fails; the hub reacts by removing the client.
    async fn send(&mut self, text: &str) -> Result<(), SocketError>;

    /// Reads the next text frame, or `None` once the peer has closed
    ///
    /// The client's delivery loop pumps this and feeds the frames to
    /// the hub's control-message handler; `None` unregisters the
    /// client. Implementations must tolerate the pending read being
    /// dropped when an outbound write wins the race.
    async fn receive(&mut self) -> Option<String>;

    /// Closes the transport; best effort
    async fn close(&mut self);
}
