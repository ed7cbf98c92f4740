//! Server network layer handling WebSocket sessions and game loop coordination

use crate::clock::Clock;
use crate::client_manager::ClientManager;
use crate::game::Game;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientMessage, ProtocolError, ServerMessage, Welcome};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

/// Events sent from socket tasks to the main server loop
#[derive(Debug)]
pub enum ServerEvent {
    Connected {
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
        /// Receives the assigned id, or None when the server is full
        reply: oneshot::Sender<Option<u32>>,
    },
    Message {
        client_id: u32,
        text: String,
    },
    Disconnected {
        client_id: u32,
    },
    Shutdown,
}

/// Main server coordinating networking and game simulation
///
/// The server loop is the only owner of the game and the session registry.
/// Socket tasks talk to it exclusively through [`ServerEvent`]s, and it talks
/// back through each session's outbound queue.
pub struct Server {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    game: Game,
    clock: Arc<dyn Clock>,
    tick_duration: Duration,
    ticker: Option<Interval>,

    event_tx: mpsc::UnboundedSender<ServerEvent>,
    event_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl Server {
    pub async fn bind(
        addr: &str,
        game: Game,
        clock: Arc<dyn Clock>,
        max_clients: usize,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on ws://{}", local_addr);

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let tick_duration = game.config().tick_duration();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            game,
            clock,
            tick_duration,
            ticker: None,
            event_tx,
            event_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Handle for injecting events, e.g. [`ServerEvent::Shutdown`]
    pub fn event_sender(&self) -> mpsc::UnboundedSender<ServerEvent> {
        self.event_tx.clone()
    }

    /// Spawns task that accepts TCP connections and upgrades them
    fn spawn_acceptor(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(Self::handle_socket(stream, addr, event_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
                if event_tx.is_closed() {
                    break;
                }
            }
        });
    }

    /// Drives one WebSocket: registers it, forwards frames, reports the close
    async fn handle_socket(
        stream: TcpStream,
        addr: SocketAddr,
        event_tx: mpsc::UnboundedSender<ServerEvent>,
    ) {
        let ws = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                warn!("WebSocket handshake with {} failed: {}", addr, e);
                return;
            }
        };
        let (mut write, mut read) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let (reply_tx, reply_rx) = oneshot::channel();
        let connected = ServerEvent::Connected {
            addr,
            sender: out_tx,
            reply: reply_tx,
        };
        if event_tx.send(connected).is_err() {
            return;
        }

        let client_id = match reply_rx.await {
            Ok(Some(id)) => id,
            _ => {
                info!("Refusing connection from {}: server full", addr);
                let _ = write.send(Message::Close(None)).await;
                return;
            }
        };

        // Runs until the server drops the session's queue.
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = write.send(Message::text(text)).await {
                    debug!("Write to client {} failed: {}", client_id, e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        while let Some(frame) = read.next().await {
            match frame {
                Ok(message) if message.is_close() => break,
                Ok(message) if message.is_text() || message.is_binary() => {
                    match message.to_text() {
                        Ok(text) => {
                            let event = ServerEvent::Message {
                                client_id,
                                text: text.to_string(),
                            };
                            if event_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Non UTF-8 frame from client {}: {}", client_id, e),
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    error!("Socket error from client {}: {}", client_id, e);
                    break;
                }
            }
        }

        let _ = event_tx.send(ServerEvent::Disconnected { client_id });
    }

    fn arm_ticker(&mut self) {
        let mut ticker = interval(self.tick_duration);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.ticker = Some(ticker);
    }

    /// Serializes the current snapshot once and hands it to every session
    fn broadcast_state(&mut self) {
        let snapshot = self.game.snapshot();
        self.broadcast(ServerMessage::AuthoritativeState(snapshot));
    }

    fn broadcast(&mut self, message: ServerMessage) {
        let text = match message.encode() {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode broadcast: {}", e);
                return;
            }
        };

        let mut closed = self.clients.broadcast(&text);
        while let Some(client_id) = closed.pop() {
            closed.extend(self.drop_session(client_id));
        }
    }

    fn send_to(&self, client_id: u32, message: &ServerMessage) {
        match message.encode() {
            Ok(text) => {
                if !self.clients.send_to(client_id, &text) {
                    debug!("Client {} queue closed before send", client_id);
                }
            }
            Err(e) => error!("Failed to encode message for client {}: {}", client_id, e),
        }
    }

    fn handle_connect(
        &mut self,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<String>,
        reply: oneshot::Sender<Option<u32>>,
    ) {
        let Some((client_id, color)) = self.clients.add_client(addr, sender) else {
            warn!("Server full, rejecting {}", addr);
            let _ = reply.send(None);
            return;
        };

        self.game.add_player(client_id, &color);
        self.send_to(client_id, &ServerMessage::Welcome(Welcome { id: client_id, color }));
        self.send_to(
            client_id,
            &ServerMessage::AuthoritativeState(self.game.snapshot()),
        );
        let _ = reply.send(Some(client_id));
        self.broadcast_state();
    }

    /// Removes a session and tells everyone else. Returns sessions found closed
    /// during the roster broadcast.
    fn drop_session(&mut self, client_id: u32) -> Vec<u32> {
        if !self.clients.remove_client(client_id) {
            return Vec::new();
        }
        self.game.remove_player(client_id);

        if self.clients.is_empty() {
            info!("No players left, stopping game");
            self.game.stop();
            self.ticker = None;
        }

        match ServerMessage::AuthoritativeState(self.game.snapshot()).encode() {
            Ok(text) => self.clients.broadcast(&text),
            Err(e) => {
                error!("Failed to encode roster update: {}", e);
                Vec::new()
            }
        }
    }

    fn handle_disconnect(&mut self, client_id: u32) {
        let mut closed = self.drop_session(client_id);
        while let Some(id) = closed.pop() {
            closed.extend(self.drop_session(id));
        }
    }

    /// Decodes and applies one client message
    fn handle_message(&mut self, client_id: u32, text: &str) {
        let message = match ClientMessage::decode(text) {
            Ok(message) => message,
            Err(ProtocolError::UnknownType(kind)) => {
                warn!("Unknown message type `{}` from client {}", kind, client_id);
                return;
            }
            Err(e) => {
                warn!("Dropping message from client {}: {}", client_id, e);
                return;
            }
        };

        match message {
            ClientMessage::Input(input) => self.game.apply_input(client_id, input),
            ClientMessage::ToggleInvincible => {
                self.game.toggle_invincible(client_id);
            }
            ClientMessage::Ready => {
                info!("Client {} is ready", client_id);
                self.clients.mark_ready(client_id);
                if self.clients.ready_count() > 0
                    && self.game.start(self.clock.now_ms()).is_ok()
                {
                    self.arm_ticker();
                }
            }
            ClientMessage::RequestRestart => {
                info!("Client {} requested restart", client_id);
                if self.game.request_restart(self.clock.now_ms()).is_ok() {
                    self.arm_ticker();
                }
            }
        }
    }

    /// Runs one simulation step and broadcasts its result
    fn run_tick(&mut self, last_tick: &mut Instant) {
        let started = Instant::now();
        let wall_dt = started.duration_since(*last_tick).as_secs_f32();
        *last_tick = started;

        if let Some(snapshot) = self.game.tick(self.clock.now_ms()) {
            self.broadcast(ServerMessage::AuthoritativeState(snapshot));
        }
        if !self.game.is_running() {
            self.ticker = None;
        }

        let elapsed = started.elapsed();
        if elapsed > self.tick_duration {
            warn!(
                "Tick {} overran its budget: {:?} > {:?}",
                self.game.tick_count(),
                elapsed,
                self.tick_duration
            );
        }

        // Periodic performance monitoring
        if self.game.tick_count() % 60 == 0 && wall_dt > 0.0 {
            debug!(
                "Tick {}: {} clients, {:.1}Hz, wave {}",
                self.game.tick_count(),
                self.clients.len(),
                1.0 / wall_dt,
                self.game.wave()
            );
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_acceptor();
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tokio::select! {
                // Handle socket events
                event = self.event_rx.recv() => {
                    match event {
                        Some(ServerEvent::Connected { addr, sender, reply }) => {
                            self.handle_connect(addr, sender, reply);
                        }
                        Some(ServerEvent::Message { client_id, text }) => {
                            self.handle_message(client_id, &text);
                        }
                        Some(ServerEvent::Disconnected { client_id }) => {
                            self.handle_disconnect(client_id);
                        }
                        Some(ServerEvent::Shutdown) | None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                },

                // Handle server tick events, only while a round is running
                _ = next_tick(&mut self.ticker) => {
                    self.run_tick(&mut last_tick);
                },
            }
        }

        Ok(())
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}
