//! Frame relay: el consumidor entre el pipeline de decodificación y el
//! transporte de voz.
//!
//! Lee frames PCM del canal acotado, espera la puerta de pausa, codifica a
//! Opus y entrega al transporte. Un relay por stream activo; sale cuando el
//! canal se cierra (fin normal) o ante un error de codificación/envío (fin
//! anormal). Un fallo interno termina solo esta tarea, nunca el proceso.

use audiopus::{coder::Encoder, Application, Channels, SampleRate};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::audio::{PcmFrame, MAX_OPUS_BYTES};
use crate::error::PlaybackError;
use crate::transport::VoiceTransport;

/// Limpia la bandera "enviando" en cualquier salida del relay.
struct SendingGuard(Arc<AtomicBool>);

impl Drop for SendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Ejecuta el relay hasta que el canal se cierre o falle el envío.
///
/// La bandera `sending` evita un doble arranque accidental sobre la misma
/// conexión: el segundo relay se retira sin consumir nada.
pub(crate) async fn run(
    frames: flume::Receiver<PcmFrame>,
    transport: Arc<dyn VoiceTransport>,
    pause: watch::Receiver<bool>,
    sending: Arc<AtomicBool>,
) {
    if sending.swap(true, Ordering::SeqCst) {
        warn!("⚠️ Relay ya activo en esta conexión, ignorando doble arranque");
        return;
    }
    let _guard = SendingGuard(sending);

    match relay_loop(frames, transport, pause).await {
        Ok(()) => debug!("Relay: canal cerrado, saliendo"),
        Err(e) => warn!("⚠️ Relay terminado antes de tiempo: {e}"),
    }
}

async fn relay_loop(
    frames: flume::Receiver<PcmFrame>,
    transport: Arc<dyn VoiceTransport>,
    mut pause: watch::Receiver<bool>,
) -> Result<(), PlaybackError> {
    let mut encoder = Encoder::new(SampleRate::Hz48000, Channels::Stereo, Application::Audio)?;
    let mut packet = [0u8; MAX_OPUS_BYTES];

    while let Ok(frame) = frames.recv_async().await {
        // Pausa: el frame se retrasa, nunca se descarta. Despertar por
        // notificación, sin sondeo.
        if pause.wait_for(|paused| !*paused).await.is_err() {
            // La puerta desapareció; se continúa como no-pausado.
        }

        let len = encoder.encode(&frame, &mut packet)?;

        if !transport.is_ready() {
            return Err(PlaybackError::TransportNotReady);
        }

        transport
            .send_frame(&packet[..len])
            .await
            .map_err(|e| PlaybackError::TransportSend(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::session::PauseGate;
    use crate::audio::{CHANNELS, FRAME_SIZE, RELAY_CAPACITY};
    use crate::transport::test_support::TestTransport;
    use std::time::Duration;

    fn silence() -> PcmFrame {
        vec![0i16; FRAME_SIZE * CHANNELS]
    }

    fn spawn_relay(
        transport: Arc<TestTransport>,
        gate: &PauseGate,
    ) -> (flume::Sender<PcmFrame>, tokio::task::JoinHandle<()>, Arc<AtomicBool>) {
        crate::transport::test_support::init_tracing();
        let (tx, rx) = flume::bounded(RELAY_CAPACITY);
        let sending = Arc::new(AtomicBool::new(false));
        let handle = tokio::spawn(run(rx, transport, gate.subscribe(), sending.clone()));
        (tx, handle, sending)
    }

    #[tokio::test]
    async fn test_relay_encodes_until_channel_closes() {
        let transport = Arc::new(TestTransport::new());
        let gate = PauseGate::new();
        let (tx, handle, sending) = spawn_relay(transport.clone(), &gate);

        for _ in 0..3 {
            tx.send_async(silence()).await.unwrap();
        }
        drop(tx);
        handle.await.unwrap();

        let sent = transport.sent_frames();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(|f| !f.is_empty()));
        assert!(!sending.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_pause_stalls_frames_without_dropping() {
        let transport = Arc::new(TestTransport::new());
        let gate = PauseGate::new();
        gate.pause();

        let (tx, handle, _) = spawn_relay(transport.clone(), &gate);
        tx.send_async(silence()).await.unwrap();
        tx.send_async(silence()).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(transport.sent_count(), 0);

        gate.resume();
        drop(tx);
        handle.await.unwrap();

        // Retrasados, no perdidos
        assert_eq!(transport.sent_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_not_ready_aborts_relay() {
        let transport = Arc::new(TestTransport::new());
        transport.set_ready(false);
        let gate = PauseGate::new();

        let (tx, handle, _) = spawn_relay(transport.clone(), &gate);
        tx.send_async(silence()).await.unwrap();
        handle.await.unwrap();

        assert_eq!(transport.sent_count(), 0);
        // El emisor sigue vivo pero el consumidor ya no está
        assert!(tx.is_disconnected());
    }

    #[tokio::test]
    async fn test_send_failure_ends_relay_without_panic() {
        let transport = Arc::new(TestTransport::new());
        transport.fail_sends();
        let gate = PauseGate::new();

        let (tx, handle, _) = spawn_relay(transport.clone(), &gate);
        tx.send_async(silence()).await.unwrap();
        handle.await.unwrap();

        assert_eq!(transport.sent_count(), 0);
    }

    #[tokio::test]
    async fn test_double_start_is_rejected() {
        let transport = Arc::new(TestTransport::new());
        let gate = PauseGate::new();

        let (tx, rx) = flume::bounded::<PcmFrame>(RELAY_CAPACITY);
        let sending = Arc::new(AtomicBool::new(true)); // ya hay uno activo
        tx.send_async(silence()).await.unwrap();

        run(rx, transport.clone(), gate.subscribe(), sending.clone()).await;

        assert_eq!(transport.sent_count(), 0);
        // El relay rechazado no toca la bandera del activo
        assert!(sending.load(Ordering::SeqCst));
    }
}
