use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::audio::{CHANNELS, SAMPLE_RATE};

/// Configuración del motor de audio.
///
/// El motor depende solo del contrato de bytes de los procesos externos
/// ("acepta una referencia o bytes por stdin, emite bytes crudos por
/// stdout"), así que tanto los binarios como sus argumentos son
/// configurables.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    // Procesos externos
    pub extractor_bin: String,
    pub extractor_args: Vec<String>,
    pub transcoder_bin: String,
    pub transcoder_args: Vec<String>,

    // Límites
    pub max_queue_size: usize,
    pub max_playlist_size: usize,

    // Rendimiento
    pub read_buffer_size: usize,
}

impl EngineConfig {
    /// Carga la configuración desde variables de entorno (con `.env`).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            extractor_bin: std::env::var("EXTRACTOR_BIN")
                .unwrap_or(defaults.extractor_bin),
            extractor_args: std::env::var("EXTRACTOR_ARGS")
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or(defaults.extractor_args),
            transcoder_bin: std::env::var("TRANSCODER_BIN")
                .unwrap_or(defaults.transcoder_bin),
            transcoder_args: std::env::var("TRANSCODER_ARGS")
                .map(|s| s.split_whitespace().map(str::to_owned).collect())
                .unwrap_or(defaults.transcoder_args),
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            max_playlist_size: std::env::var("MAX_PLAYLIST_SIZE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            read_buffer_size: std::env::var("READ_BUFFER_SIZE")
                .unwrap_or_else(|_| "16384".to_string())
                .parse()?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// Catches common mistakes before the engine spawns its first
    /// subprocess pipeline.
    pub fn validate(&self) -> Result<()> {
        if self.extractor_bin.trim().is_empty() {
            anyhow::bail!("Extractor binary must not be empty");
        }

        if self.transcoder_bin.trim().is_empty() {
            anyhow::bail!("Transcoder binary must not be empty");
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.max_playlist_size == 0 {
            anyhow::bail!("Max playlist size must be greater than 0");
        }

        if self.read_buffer_size == 0 {
            anyhow::bail!("Read buffer size must be greater than 0");
        }

        Ok(())
    }

    /// Resumen de la configuración para logging (sin datos sensibles).
    pub fn summary(&self) -> String {
        format!(
            "Engine Config:\n  \
            Pipeline: {} | {} ({} Hz, {} canales)\n  \
            Limits: {} queue, {} playlist\n  \
            IO: {} byte read buffer",
            self.extractor_bin,
            self.transcoder_bin,
            SAMPLE_RATE,
            CHANNELS,
            self.max_queue_size,
            self.max_playlist_size,
            self.read_buffer_size,
        )
    }
}

/// Default configuration values.
///
/// The transcoder arguments pin the frame contract the whole engine is
/// built around: s16le, interleaved stereo, 48 kHz on stdout.
impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            extractor_bin: "yt-dlp".to_string(),
            extractor_args: vec!["-f", "bestaudio", "-o", "-"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            transcoder_bin: "ffmpeg".to_string(),
            transcoder_args: vec![
                "-re",
                "-i",
                "pipe:0",
                "-f",
                "s16le",
                "-ar",
                "48000",
                "-ac",
                "2",
                "pipe:1",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            max_queue_size: 1000,
            max_playlist_size: 100,
            read_buffer_size: 16384,
        }
    }
}
