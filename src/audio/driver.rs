//! Bucle de reproducción por guild.
//!
//! Un driver por guild, garantizado por `Queue::begin_playing`. Saca pistas
//! de la cola en orden, conduce una conexión fresca por pista y avanza.
//! Los fallos de una pista se registran y no detienen la cola; al agotarla
//! el driver limpia el estado y se desconecta del canal de voz.

use std::sync::Arc;
use tracing::{info, warn};

use crate::audio::connection::Connection;
use crate::audio::queue::Queue;
use crate::audio::session::{GuildSession, PauseGate, SessionRegistry};
use crate::config::EngineConfig;
use crate::transport::VoiceTransport;
use crate::GuildId;

/// Ejecuta la cola del guild hasta vaciarla. El llamador debe haber tomado
/// la bandera con `queue.begin_playing()`.
pub(crate) async fn run(
    guild_id: GuildId,
    config: Arc<EngineConfig>,
    queue: Arc<Queue>,
    sessions: SessionRegistry,
    transport: Arc<dyn VoiceTransport>,
) {
    info!("▶️ Iniciando reproducción en guild {guild_id}");

    // Una puerta de pausa por tanda: una pausa sobrevive al cambio de
    // pista; una tanda nueva siempre arranca sonando.
    let pause = PauseGate::new();

    loop {
        let Some(track) = queue.dequeue() else { break };
        info!("🎵 Reproduciendo: {}", track.title());

        let connection = Arc::new(Connection::new(transport.clone(), config.clone()));
        sessions.set(
            guild_id,
            GuildSession::new(connection.clone(), pause.clone()),
        );

        // Secuencial a propósito: un guild reproduce una pista a la vez
        if let Err(e) = connection.play(track.url(), &pause).await {
            warn!("⚠️ Error reproduciendo {}: {e}", track.title());
            continue;
        }
    }

    queue.end_playing();
    queue.clear_current();
    sessions.remove(guild_id);
    transport.disconnect().await;
    info!("👋 Cola agotada en guild {guild_id}, desconectado del canal de voz");
}
