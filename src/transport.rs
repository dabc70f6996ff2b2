//! Frontera con el transporte de voz.
//!
//! El motor nunca toca el cliente del protocolo directamente: el handshake
//! (join/leave, negociación de sesión) vive en la capa de comandos, que
//! entrega al motor un objeto que cumple este contrato.

use anyhow::Result;
use async_trait::async_trait;

/// Transporte de voz de un guild: acepta frames Opus ya codificados.
///
/// El motor comprueba `is_ready` antes de cada envío y garantiza
/// `set_speaking(false)` en toda salida del stream.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// ¿La sesión de voz puede recibir frames ahora mismo?
    fn is_ready(&self) -> bool;

    /// Indicador de "hablando" de la sesión.
    async fn set_speaking(&self, speaking: bool);

    /// Envía un frame Opus por el canal de salida.
    async fn send_frame(&self, opus: &[u8]) -> Result<()>;

    /// Cierra la sesión de voz (el driver lo invoca al agotar la cola).
    async fn disconnect(&self);
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Inicializa el logging de pruebas una sola vez; respeta `RUST_LOG`.
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// Transporte en memoria que captura lo enviado, para las pruebas del
    /// relay, la conexión y el driver.
    #[derive(Default)]
    pub struct TestTransport {
        ready: AtomicBool,
        speaking: AtomicBool,
        disconnected: AtomicBool,
        fail_sends: AtomicBool,
        frames: Mutex<Vec<Vec<u8>>>,
    }

    impl TestTransport {
        pub fn new() -> Self {
            Self {
                ready: AtomicBool::new(true),
                ..Default::default()
            }
        }

        pub fn set_ready(&self, ready: bool) {
            self.ready.store(ready, Ordering::SeqCst);
        }

        pub fn fail_sends(&self) {
            self.fail_sends.store(true, Ordering::SeqCst);
        }

        pub fn sent_frames(&self) -> Vec<Vec<u8>> {
            self.frames.lock().clone()
        }

        pub fn sent_count(&self) -> usize {
            self.frames.lock().len()
        }

        pub fn is_speaking(&self) -> bool {
            self.speaking.load(Ordering::SeqCst)
        }

        pub fn is_disconnected(&self) -> bool {
            self.disconnected.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VoiceTransport for TestTransport {
        fn is_ready(&self) -> bool {
            self.ready.load(Ordering::SeqCst)
        }

        async fn set_speaking(&self, speaking: bool) {
            self.speaking.store(speaking, Ordering::SeqCst);
        }

        async fn send_frame(&self, opus: &[u8]) -> Result<()> {
            if self.fail_sends.load(Ordering::SeqCst) {
                anyhow::bail!("canal de voz cerrado");
            }
            self.frames.lock().push(opus.to_vec());
            Ok(())
        }

        async fn disconnect(&self) {
            self.disconnected.store(true, Ordering::SeqCst);
        }
    }
}
