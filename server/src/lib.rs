//! # Wave Shooter Server Library
//!
//! This library provides the authoritative server for the multiplayer wave
//! shooter. It owns the canonical world, applies client inputs, runs the enemy
//! waves and broadcasts a full snapshot to every client after each tick.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Every gameplay decision (movement, firing, damage, wave progression, game
//! over) is made here. Clients only predict their own shots and render what the
//! server tells them.
//!
//! ### Session Management
//! Handles the lifecycle of client connections:
//! - Id and colour assignment on connect
//! - Ready signalling that starts the game loop
//! - Disconnection cleanup and stopping the loop when the room empties
//!
//! ### State Broadcasting
//! After each tick the snapshot is serialized once and queued for every
//! session. Newcomers receive a welcome and an immediate snapshot so they can
//! render before the loop is running.
//!
//! ## Architecture Design
//!
//! ### Single-Writer Event Loop
//! One task owns the game and the session registry and alternates between
//! handling a socket event and running a tick. Socket tasks only forward
//! frames through channels, so game state never needs a lock.
//!
//! ### Tick Pipeline
//! Each tick runs, in order: buffered player input, enemy descent, enemy fire,
//! projectile movement, collisions, end-of-round checks, broadcast.
//!
//! ### Injected Time
//! Timed rules take an explicit `now_ms`. The network loop reads it from a
//! [`clock::Clock`], and tests drive a [`clock::ManualClock`] instead of
//! sleeping.
//!
//! ## Module Organization
//!
//! - `store`: keyed players and projectiles, snapshot capture
//! - `waves`: enemy grid spawning, descent and reset
//! - `players`: movement, firing cooldown, damage and invincibility
//! - `projectiles`: spawning, movement and off-screen culling
//! - `firing`: enemy fire timers
//! - `collision`: AABB overlap pass producing collision events
//! - `game`: the tick scheduler and its Idle / Running / GameOver phases
//! - `client_manager`: connected sessions and their outbound queues
//! - `network`: WebSocket transport and the server loop

pub mod client_manager;
pub mod clock;
pub mod collision;
pub mod config;
pub mod firing;
pub mod game;
pub mod network;
pub mod players;
pub mod projectiles;
pub mod store;
pub mod waves;
