//! # Wave Shooter Client Library
//!
//! This library is the client-side synchronization core for the multiplayer
//! wave shooter. It never draws anything itself: authoritative snapshots go in,
//! and an ordered stream of presentation commands comes out for whatever owns
//! sprites, sounds and HUD text.
//!
//! ## Architecture Overview
//!
//! The server is the only authority. The client keeps just enough local state
//! to make play feel responsive:
//!
//! ### Shot Prediction
//! Firing spawns a projectile immediately under a local id. When the server's
//! snapshot later contains a new projectile owned by this player, the oldest
//! outstanding prediction takes over the server id instead of a second sprite
//! appearing. Predictions the server never confirms expire after two seconds.
//!
//! ### State Reconciliation
//! Each snapshot is diffed by id against the previous one. New ids spawn,
//! known ids update, missing ids despawn. Hit flashes, explosions, the wave
//! banner and the game over screen fire exactly once per transition.
//!
//! ### Interpolation
//! Remote players and enemies blend from where they are drawn towards their
//! latest authoritative position over a short fixed window. The local player
//! snaps.
//!
//! ## Module Organization
//!
//! ### Connection Module (`connection`)
//! - Buffers server messages until the game signals it is ready
//! - Decodes envelopes and dispatches typed callbacks
//! - Encodes outgoing messages
//!
//! ### Reconciler Module (`reconciler`)
//! Snapshot diffing and transition detection.
//!
//! ### Prediction Module (`prediction`)
//! The per-owner FIFO of predicted shots.
//!
//! ### Input Module (`input`)
//! Key state sampling with rising-edge detection for toggles.
//!
//! ### Game Module (`game`)
//! Ties the above together behind [`game::ClientGameState`].
//!
//! ### Network Module (`network`)
//! A headless WebSocket client that drives the core on a frame cadence.
//!
//! ## Usage Example
//!
//! ```rust
//! use client::connection::Connection;
//! use client::game::{ClientConfig, ClientGameState};
//! use shared::{ServerMessage, Welcome};
//! use tokio::sync::mpsc;
//!
//! let (tx, _rx) = mpsc::unbounded_channel();
//! let mut connection = Connection::new(tx);
//! let mut state = ClientGameState::new(ClientConfig::default());
//!
//! let welcome = ServerMessage::Welcome(Welcome { id: 1, color: "#ff0000".into() });
//! connection.receive(welcome.encode().unwrap(), &mut state);
//! connection.signal_ready(&mut state);
//!
//! assert_eq!(state.local_id(), Some(1));
//! ```

pub mod connection;
pub mod game;
pub mod input;
pub mod interpolation;
pub mod network;
pub mod prediction;
pub mod presentation;
pub mod reconciler;
