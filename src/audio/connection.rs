//! Pipeline de decodificación: de una referencia remota a frames PCM.
//!
//! Una [`Connection`] encadena dos subprocesos (el extractor saca el mejor
//! audio disponible como bytes crudos, el transcodificador lo convierte a
//! PCM s16le 48 kHz estéreo) y trocea la salida en frames de 20 ms que
//! entrega al relay por un canal acotado. Una conexión conduce como mucho
//! una pista a la vez; cada pista recibe una conexión fresca.

use parking_lot::Mutex;
use std::process::Stdio;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::audio::session::PauseGate;
use crate::audio::{relay, PcmFrame, FRAME_BYTES, RELAY_CAPACITY};
use crate::config::EngineConfig;
use crate::error::PlaybackError;
use crate::transport::VoiceTransport;

#[derive(Default)]
struct ConnectionState {
    playing: bool,
    stop_requested: bool,
    frame_tx: Option<flume::Sender<PcmFrame>>,
    extractor: Option<Child>,
    transcoder: Option<Child>,
}

/// Conexión de reproducción sobre un transporte de voz.
pub struct Connection {
    transport: Arc<dyn VoiceTransport>,
    config: Arc<EngineConfig>,
    state: Mutex<ConnectionState>,
    sending: Arc<AtomicBool>,
}

impl Connection {
    pub fn new(transport: Arc<dyn VoiceTransport>, config: Arc<EngineConfig>) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(ConnectionState::default()),
            sending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Reproduce una referencia de medio hasta agotarla, fallar o recibir
    /// stop. El fin de stream limpio es éxito, no error.
    pub async fn play(&self, url: &str, pause: &PauseGate) -> Result<(), PlaybackError> {
        {
            let mut state = self.state.lock();
            if state.playing {
                return Err(PlaybackError::AlreadyPlaying);
            }
            state.playing = true;
            state.stop_requested = false;
        }

        let result = self.stream(url, pause).await;

        // Limpieza garantizada en toda salida: speaking fuera, bandera
        // fuera, hijos restantes muertos al soltarse (kill_on_drop).
        self.transport.set_speaking(false).await;
        {
            let mut state = self.state.lock();
            state.playing = false;
            state.extractor = None;
            state.transcoder = None;
        }

        result
    }

    async fn stream(&self, url: &str, pause: &PauseGate) -> Result<(), PlaybackError> {
        let config = &self.config;

        let mut extractor = Command::new(&config.extractor_bin)
            .args(&config.extractor_args)
            .arg(url)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::ProcessStart {
                command: config.extractor_bin.clone(),
                source: e,
            })?;

        let extracted: Stdio = extractor
            .stdout
            .take()
            .ok_or_else(|| broken_pipe(&config.extractor_bin))?
            .try_into()
            .map_err(|e| PlaybackError::ProcessStart {
                command: config.extractor_bin.clone(),
                source: e,
            })?;

        let mut transcoder = Command::new(&config.transcoder_bin)
            .args(&config.transcoder_args)
            .stdin(extracted)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PlaybackError::ProcessStart {
                command: config.transcoder_bin.clone(),
                source: e,
            })?;

        let pcm_out = transcoder
            .stdout
            .take()
            .ok_or_else(|| broken_pipe(&config.transcoder_bin))?;
        let mut pcm = BufReader::with_capacity(config.read_buffer_size, pcm_out);

        debug!(
            "🎛️ Pipeline activo: {} | {} → pcm",
            config.extractor_bin, config.transcoder_bin
        );
        self.transport.set_speaking(true).await;

        // Reemplaza cualquier canal previo (soltar el emisor viejo lo
        // cierra) y arranca el consumidor del relay.
        let frame_rx = {
            let mut state = self.state.lock();
            state.extractor = Some(extractor);
            state.transcoder = Some(transcoder);

            let (tx, rx) = flume::bounded(RELAY_CAPACITY);
            state.frame_tx = Some(tx);
            rx
        };

        tokio::spawn(relay::run(
            frame_rx,
            self.transport.clone(),
            pause.subscribe(),
            self.sending.clone(),
        ));

        let mut buf = vec![0u8; FRAME_BYTES];
        loop {
            {
                let mut state = self.state.lock();
                if state.stop_requested {
                    kill_children(&mut state);
                    break;
                }
            }

            match pcm.read_exact(&mut buf).await {
                Ok(_) => {}
                // Fin de stream (incluso con frame parcial): éxito
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(PlaybackError::StreamRead(e)),
            }

            let frame: PcmFrame = buf
                .chunks_exact(2)
                .map(|b| i16::from_le_bytes([b[0], b[1]]))
                .collect();

            let tx = self.state.lock().frame_tx.clone();
            if let Some(tx) = tx {
                // Canal lleno: frame descartado. Latencia acotada por
                // encima de completitud.
                let _ = tx.try_send(frame);
            }
        }

        Ok(())
    }

    /// Detiene el stream activo. Idempotente y seguro desde otra tarea:
    /// un segundo stop mientras hay uno pendiente no hace nada.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        if state.stop_requested {
            return;
        }
        state.stop_requested = true;
        kill_children(&mut state);
        // Cerrar el canal termina el relay
        state.frame_tx = None;
        info!("⏹️ Stream detenido");
    }
}

fn kill_children(state: &mut ConnectionState) {
    if let Some(child) = state.extractor.as_mut() {
        let _ = child.start_kill();
    }
    if let Some(child) = state.transcoder.as_mut() {
        let _ = child.start_kill();
    }
}

fn broken_pipe(command: &str) -> PlaybackError {
    PlaybackError::ProcessStart {
        command: command.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout no capturado"),
    }
}
