//! # Audio Module
//!
//! Core playback machinery: queue, sessions, the subprocess decode
//! pipeline, the frame relay and the per-guild playback driver.
//!
//! ## Architecture
//!
//! ### [`queue`] - Queue Management
//! - Thread-safe per-guild playlist with loop modes (off/one/all)
//! - Snapshot listing, shuffle, positional remove/insert/move
//!
//! ### [`connection`] - Decode Pipeline
//! - Chains an extractor and a transcoder subprocess into a raw PCM stream
//! - Frames it into fixed 20 ms chunks and feeds the relay channel
//!
//! ### [`relay`] - Frame Relay
//! - Bounded capacity-2 hand-off with drop-on-full backpressure
//! - Pause gate, Opus encoding, transport delivery
//!
//! ### [`driver`] - Playback Driver
//! - Sequential per-guild loop: dequeue, play, advance
//!
//! ## Audio Quality
//!
//! - **Sample Rate**: 48kHz (Discord standard)
//! - **Bit Depth**: 16-bit signed integers, little endian
//! - **Channels**: Stereo (2 channels)
//! - **Frame**: 960 samples per channel, 20 ms

pub mod connection;
pub mod driver;
pub mod queue;
pub mod relay;
pub mod session;
pub mod track;

/// Canales de audio (estéreo).
pub const CHANNELS: usize = 2;
/// Frecuencia de muestreo en Hz.
pub const SAMPLE_RATE: usize = 48_000;
/// Muestras por canal por frame (20 ms a 48 kHz).
pub const FRAME_SIZE: usize = 960;
/// Bytes de PCM s16le por frame: 960 muestras * 2 canales * 2 bytes.
pub const FRAME_BYTES: usize = FRAME_SIZE * CHANNELS * 2;
/// Tamaño máximo del paquete Opus de salida.
pub const MAX_OPUS_BYTES: usize = FRAME_SIZE * CHANNELS * 2;
/// Capacidad del canal de frames entre pipeline y relay.
pub const RELAY_CAPACITY: usize = 2;

/// Un frame de PCM intercalado listo para codificar.
pub type PcmFrame = Vec<i16>;
