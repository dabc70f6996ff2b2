//! # Groove Engine
//!
//! Per-guild audio playback engine for Discord-style music bots.
//!
//! This crate is the playback core a bot embeds: it turns a queue of remote
//! media references into a continuous, pausable, skippable stream of Opus
//! frames delivered to a voice transport. The chat-protocol client, the
//! slash-command layer and the voice handshake stay outside: they talk to
//! the engine through [`engine::AudioEngine`] and implement the
//! [`transport::VoiceTransport`] boundary.
//!
//! ## Architecture
//!
//! - [`audio::queue`]: per-guild playlist with loop modes (off/one/all)
//! - [`audio::session`]: guild → session registry and the pause gate
//! - [`audio::connection`]: extractor + transcoder subprocess pipeline
//!   producing fixed 20 ms PCM frames
//! - [`audio::relay`]: bounded hand-off, Opus encode, transport send
//! - [`audio::driver`]: the per-guild playback loop
//! - [`metadata`]: async track metadata / playlist resolution (yt-dlp)
//!
//! One guild plays one track at a time; within a track the decode pipeline
//! and the frame relay run as two tasks connected by a bounded capacity-2
//! channel that drops frames under backpressure (freshness over
//! completeness).

pub mod audio;
pub mod config;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod transport;

pub use crate::audio::queue::{Queue, QueueRegistry};
pub use crate::audio::session::{GuildSession, PauseGate, SessionRegistry};
pub use crate::audio::track::{LoopMode, Track};
pub use crate::config::EngineConfig;
pub use crate::engine::AudioEngine;
pub use crate::error::PlaybackError;
pub use crate::transport::VoiceTransport;

use std::fmt;

/// Identificador de guild (servidor). Unidad de aislamiento de todo el
/// estado del motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuildId(pub u64);

impl fmt::Display for GuildId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u64> for GuildId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
