//! Client input sampling with edge detection
//!
//! The keyboard itself belongs to whatever hosts the client. It reports the
//! raw key state once per frame, and the sampler turns that into protocol
//! messages: movement and fire every frame, toggles only when a key goes down.

use shared::{ClientMessage, InputState};

/// Raw key state for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
    pub toggle_invincible: bool,
    pub restart: bool,
}

impl KeyState {
    pub fn input(&self) -> InputState {
        InputState {
            left: self.left,
            right: self.right,
            up: self.up,
            down: self.down,
            fire: self.fire,
        }
    }
}

/// Anything that can report which keys are held at a given time
pub trait KeySource {
    fn keys(&mut self, now_ms: u64) -> KeyState;
}

/// Transforms per-frame key state into outgoing messages
#[derive(Debug, Default)]
pub struct InputSampler {
    // Previous frame key states for edge detection
    prev_toggle: bool,
    prev_restart: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages to send for this frame
    ///
    /// The `input` message always comes first.
    pub fn sample(&mut self, keys: &KeyState) -> Vec<ClientMessage> {
        let mut messages = vec![ClientMessage::Input(keys.input())];

        // Detect key press events (current && !previous)
        if keys.toggle_invincible && !self.prev_toggle {
            messages.push(ClientMessage::ToggleInvincible);
        }
        if keys.restart && !self.prev_restart {
            messages.push(ClientMessage::RequestRestart);
        }

        self.prev_toggle = keys.toggle_invincible;
        self.prev_restart = keys.restart;
        messages
    }
}

/// Headless key source that strafes back and forth
///
/// Direction flips every `strafe_ms`. The fire key is held throughout when
/// `fire` is set, so shots go out as fast as the cooldown allows.
#[derive(Debug, Clone)]
pub struct StrafeBot {
    strafe_ms: u64,
    fire: bool,
}

impl StrafeBot {
    pub fn new(strafe_ms: u64, fire: bool) -> Self {
        Self {
            strafe_ms: strafe_ms.max(1),
            fire,
        }
    }
}

impl KeySource for StrafeBot {
    fn keys(&mut self, now_ms: u64) -> KeyState {
        let leftward = (now_ms / self.strafe_ms) % 2 == 0;
        KeyState {
            left: leftward,
            right: !leftward,
            fire: self.fire,
            ..KeyState::default()
        }
    }
}
