use crate::control::protocol::Command;
use serde_json::Value;
use std::sync::mpsc::{Receiver, SyncSender};

/// Message from the control server to the view loop.
pub enum ControlMsg {
    /// A controller connected.
    Connected,
    /// The active controller disconnected.
    Disconnected,
    /// A decoded command, with the connection's outbound event channel.
    Command {
        /// The decoded command (possibly `Unknown`).
        command: Command,
        /// Where SCREENSHOT_RESULT events for this controller go.
        respond_to: SyncSender<Value>,
    },
}

/// Receiving end owned by the view loop.
pub struct ControlEndpoint {
    /// Inbound message stream, drained once per tick.
    pub rx: Receiver<ControlMsg>,
}
