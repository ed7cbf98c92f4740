//! Session registry for connected players
//!
//! This module tracks the server side of every live connection:
//! - Session lifecycle (connect, disconnect) and capacity limits
//! - Player id and colour assignment
//! - Ready signalling used to start the game loop
//! - Outbound message queues used for direct sends and broadcasts
//!
//! The registry is owned by the server loop alone, so it needs no locking.
//! Socket tasks only ever see the sending half of a session's queue.

use log::{debug, info};
use shared::PLAYER_COLORS;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use tokio::sync::mpsc;

/// A connected player and the queue feeding its socket writer
#[derive(Debug)]
pub struct Session {
    /// Unique id assigned by the server, doubles as the player id
    pub id: u32,
    /// Colour handed out in the welcome message
    pub color: String,
    /// Remote address, kept for logging
    pub addr: SocketAddr,
    /// Whether the client has signalled it finished loading
    pub ready: bool,
    /// Serialized messages waiting to be written to the socket
    pub sender: mpsc::UnboundedSender<String>,
}

impl Session {
    pub fn new(
        id: u32,
        color: String,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Self {
        Self {
            id,
            color,
            addr,
            ready: false,
            sender,
        }
    }

    /// Queues a message for this session's writer task
    ///
    /// Returns false when the writer has already gone away, which means the
    /// socket is closing and the session should be dropped.
    pub fn send(&self, text: &str) -> bool {
        self.sender.send(text.to_string()).is_ok()
    }
}

/// Manages every connected session
///
/// Ids start from 1 and are never reused during a server run. Colours are
/// handed out round-robin from a fixed palette.
pub struct ClientManager {
    /// Connected sessions indexed by their id
    sessions: BTreeMap<u32, Session>,
    /// Next id for a new connection
    next_id: u32,
    /// Palette cursor for the next colour
    next_color: usize,
    /// Maximum number of concurrent sessions allowed
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            sessions: BTreeMap::new(),
            next_id: 1,
            next_color: 0,
            max_clients,
        }
    }

    /// Attempts to register a new connection
    ///
    /// Returns the assigned id and colour, or None if the server is full.
    pub fn add_client(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
    ) -> Option<(u32, String)> {
        if self.sessions.len() >= self.max_clients {
            return None;
        }

        let id = self.next_id;
        self.next_id += 1;
        let color = PLAYER_COLORS[self.next_color % PLAYER_COLORS.len()].to_string();
        self.next_color += 1;

        info!("Client {} connected from {}", id, addr);
        self.sessions
            .insert(id, Session::new(id, color.clone(), addr, sender));

        Some((id, color))
    }

    /// Removes a session. Returns false if it was already gone.
    pub fn remove_client(&mut self, id: u32) -> bool {
        if let Some(session) = self.sessions.remove(&id) {
            info!("Client {} disconnected ({})", session.id, session.addr);
            true
        } else {
            false
        }
    }

    /// Marks a session ready. Returns false for unknown ids.
    pub fn mark_ready(&mut self, id: u32) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.ready = true;
                true
            }
            None => false,
        }
    }

    pub fn ready_count(&self) -> usize {
        self.sessions.values().filter(|s| s.ready).count()
    }

    /// Sends to a single session. Returns false if it is unknown or closed.
    pub fn send_to(&self, id: u32, text: &str) -> bool {
        self.sessions
            .get(&id)
            .map(|session| session.send(text))
            .unwrap_or(false)
    }

    /// Delivers one serialized message to every session
    ///
    /// Returns the ids whose queues are closed so the caller can treat them as
    /// disconnected.
    pub fn broadcast(&self, text: &str) -> Vec<u32> {
        let mut closed = Vec::new();
        for session in self.sessions.values() {
            if !session.send(text) {
                debug!("Client {} queue closed during broadcast", session.id);
                closed.push(session.id);
            }
        }
        closed
    }

    /// Returns the number of currently connected sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
