//! Client side of the wire protocol
//!
//! A [`Connection`] sits between the socket and the game. Everything the
//! server sends before the game signals it is ready (typically while assets
//! load) is held back verbatim and replayed in arrival order afterwards, so
//! the welcome and the first snapshots are never lost.

use log::{debug, info, warn};
use shared::{ClientMessage, ProtocolError, ServerMessage, Snapshot, Welcome};
use std::collections::VecDeque;
use tokio::sync::mpsc;

/// Receiver of decoded server messages and connection lifecycle events
pub trait ConnectionEvents {
    fn on_welcome(&mut self, welcome: Welcome);

    fn on_state(&mut self, snapshot: Snapshot);

    fn on_closed(&mut self) {}
}

pub struct Connection {
    outbound: mpsc::UnboundedSender<String>,
    buffered: VecDeque<String>,
    ready: bool,
    closed: bool,
}

impl Connection {
    /// `outbound` feeds the socket writer.
    pub fn new(outbound: mpsc::UnboundedSender<String>) -> Self {
        Self {
            outbound,
            buffered: VecDeque::new(),
            ready: false,
            closed: false,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn buffered_len(&self) -> usize {
        self.buffered.len()
    }

    /// Accepts one raw text frame from the socket
    pub fn receive<E: ConnectionEvents>(&mut self, text: String, events: &mut E) {
        if self.closed {
            return;
        }
        if self.ready {
            Self::dispatch(&text, events);
        } else {
            self.buffered.push_back(text);
        }
    }

    /// Flushes everything buffered so far, then switches to live delivery
    pub fn signal_ready<E: ConnectionEvents>(&mut self, events: &mut E) {
        if self.ready {
            return;
        }
        debug!("Replaying {} buffered messages", self.buffered.len());
        while let Some(text) = self.buffered.pop_front() {
            Self::dispatch(&text, events);
        }
        self.ready = true;
    }

    /// Encodes and queues a message for the server
    ///
    /// Returns false if the connection is closed or the writer has gone away.
    pub fn send(&self, message: &ClientMessage) -> bool {
        if self.closed {
            return false;
        }
        match message.encode() {
            Ok(text) => self.outbound.send(text).is_ok(),
            Err(e) => {
                warn!("Failed to encode {:?}: {}", message, e);
                false
            }
        }
    }

    /// Marks the connection closed and notifies `events` once
    pub fn close<E: ConnectionEvents>(&mut self, events: &mut E) {
        if self.closed {
            return;
        }
        info!("Connection closed");
        self.closed = true;
        self.buffered.clear();
        events.on_closed();
    }

    fn dispatch<E: ConnectionEvents>(text: &str, events: &mut E) {
        match ServerMessage::decode(text) {
            Ok(ServerMessage::Welcome(welcome)) => events.on_welcome(welcome),
            Ok(ServerMessage::AuthoritativeState(snapshot)) => events.on_state(snapshot),
            Err(ProtocolError::UnknownType(kind)) => {
                warn!("Ignoring unknown message type `{}`", kind)
            }
            Err(e) => warn!("Dropping malformed server message: {}", e),
        }
    }
}
