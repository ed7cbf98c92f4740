use crate::connection::Connection;
use crate::game::{ClientConfig, ClientGameState};
use crate::input::{InputSampler, KeySource};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::ClientMessage;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::Message;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Headless WebSocket client
///
/// Runs the client core against a live server on a fixed frame cadence and
/// logs the presentation commands a renderer would apply.
pub struct Client<K: KeySource> {
    url: String,
    game_state: ClientGameState,
    input_sampler: InputSampler,
    keys: K,
    commands_applied: usize,
}

impl<K: KeySource> Client<K> {
    pub fn new(url: &str, config: ClientConfig, keys: K) -> Self {
        Client {
            url: url.to_string(),
            game_state: ClientGameState::new(config),
            input_sampler: InputSampler::new(),
            keys,
            commands_applied: 0,
        }
    }

    pub fn game_state(&self) -> &ClientGameState {
        &self.game_state
    }

    /// Total presentation commands produced so far
    pub fn commands_applied(&self) -> usize {
        self.commands_applied
    }

    /// Plays until `duration` elapses or the server goes away.
    pub async fn run(&mut self, duration: Duration) -> Result<(), Box<dyn std::error::Error>> {
        info!("Connecting to {}...", self.url);
        let (ws, _) = tokio_tungstenite::connect_async(self.url.as_str()).await?;
        let (mut write, mut read) = ws.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
        let writer = tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if let Err(e) = write.send(Message::text(text)).await {
                    debug!("Write to server failed: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
        });

        let mut connection = Connection::new(out_tx);
        // Nothing to load headless, so the client is ready straight away.
        connection.signal_ready(&mut self.game_state);
        connection.send(&ClientMessage::Ready);

        let mut frame_interval = interval(FRAME_INTERVAL);
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let started = Instant::now();
        let mut last_frame = started;

        loop {
            tokio::select! {
                frame = read.next() => match frame {
                    Some(Ok(message)) if message.is_close() => {
                        connection.close(&mut self.game_state);
                        break;
                    }
                    Some(Ok(message)) if message.is_text() || message.is_binary() => {
                        match message.into_text() {
                            Ok(text) => connection.receive(text, &mut self.game_state),
                            Err(e) => warn!("Non UTF-8 frame from server: {}", e),
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Socket error: {}", e);
                        connection.close(&mut self.game_state);
                        break;
                    }
                    None => {
                        connection.close(&mut self.game_state);
                        break;
                    }
                },

                _ = frame_interval.tick() => {
                    let now = Instant::now();
                    let now_ms = now.duration_since(started).as_millis() as u64;
                    let dt = now.duration_since(last_frame).as_secs_f32();
                    last_frame = now;

                    self.game_state.set_time(now_ms);
                    let keys = self.keys.keys(now_ms);
                    for message in self.input_sampler.sample(&keys) {
                        connection.send(&message);
                    }
                    if keys.fire {
                        self.game_state.try_fire(now_ms);
                    }

                    self.game_state.frame(now_ms, dt);
                    for command in self.game_state.drain_commands() {
                        debug!("{:?}", command);
                        self.commands_applied += 1;
                    }

                    if now.duration_since(started) >= duration {
                        info!("Session time elapsed");
                        break;
                    }
                },
            }
        }

        drop(connection);
        let _ = writer.await;
        info!(
            "Client stopped after {} presentation commands",
            self.commands_applied
        );
        Ok(())
    }
}
