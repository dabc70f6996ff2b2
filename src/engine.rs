//! Fachada del motor: la única API que ve la capa de comandos.
//!
//! Posee los dos registros (colas y sesiones) y el resolutor de metadatos;
//! nada de esto es un singleton de proceso. Cada operación devuelve un
//! texto corto de estado que distingue éxito, "nada que hacer" y fallo.
//! El formato de respuestas ricas queda arriba, en el bot.

use std::sync::Arc;

use crate::audio::driver;
#[cfg(test)]
use crate::audio::queue::Queue;
use crate::audio::queue::QueueRegistry;
use crate::audio::session::SessionRegistry;
use crate::audio::track::{LoopMode, Track};
use crate::config::EngineConfig;
use crate::metadata::MetadataResolver;
use crate::transport::VoiceTransport;
use crate::GuildId;

pub struct AudioEngine {
    config: Arc<EngineConfig>,
    queues: QueueRegistry,
    sessions: SessionRegistry,
    resolver: MetadataResolver,
}

impl AudioEngine {
    pub fn new(config: EngineConfig) -> Self {
        let resolver = MetadataResolver::new(config.extractor_bin.clone());
        Self {
            queues: QueueRegistry::new(config.max_queue_size),
            sessions: SessionRegistry::new(),
            resolver,
            config: Arc::new(config),
        }
    }

    pub fn resolver(&self) -> &MetadataResolver {
        &self.resolver
    }

    /// Encola una pista (o una playlist completa) y arranca el driver del
    /// guild si no estaba reproduciendo.
    pub async fn play(
        &self,
        guild_id: GuildId,
        transport: Arc<dyn VoiceTransport>,
        input: &str,
    ) -> String {
        let queue = self.queues.get(guild_id);

        let reply = if self.resolver.is_playlist(input) {
            match self
                .resolver
                .playlist_entries(input, self.config.max_playlist_size)
                .await
            {
                Ok(tracks) if !tracks.is_empty() => {
                    for track in &tracks {
                        self.resolver.spawn_fill(track.clone());
                    }
                    let added = queue.enqueue_many(tracks);
                    format!("📜 {added} pistas de la playlist agregadas a la cola.")
                }
                _ => return "⚠️ No se pudo extraer la playlist.".to_string(),
            }
        } else {
            let track = Track::new(input);
            match queue.enqueue(track.clone()) {
                Ok(()) => {
                    self.resolver.spawn_fill(track);
                    "🎶 Agregada a la cola.".to_string()
                }
                Err(e) => return format!("⚠️ {e}"),
            }
        };

        if queue.begin_playing() {
            tokio::spawn(driver::run(
                guild_id,
                self.config.clone(),
                queue,
                self.sessions.clone(),
                transport,
            ));
        }

        reply
    }

    /// Detiene la reproducción, limpia la cola y retira la sesión. El
    /// driver termina solo en su siguiente dequeue vacío.
    pub fn stop(&self, guild_id: GuildId) -> String {
        let queue = self.queues.get(guild_id);
        let session = self.sessions.get(guild_id);

        if session.is_none() && queue.is_empty() && !queue.is_playing() {
            return "📭 No hay nada que detener.".to_string();
        }

        queue.clear();
        if let Some(session) = session {
            session.connection.stop();
        }
        self.sessions.remove(guild_id);

        "⏹️ Reproducción detenida y cola limpiada.".to_string()
    }

    /// Salta la pista actual; el driver avanza a la siguiente.
    pub fn skip(&self, guild_id: GuildId) -> String {
        let Some(session) = self.sessions.get(guild_id) else {
            return "❌ No hay nada reproduciéndose.".to_string();
        };

        self.queues.get(guild_id).clear_current();
        session.connection.stop();

        "⏭️ Pista saltada.".to_string()
    }

    pub fn pause(&self, guild_id: GuildId) -> String {
        match self.sessions.get(guild_id) {
            Some(session) if session.pause.pause() => "⏸️ Reproducción pausada.".to_string(),
            Some(_) => "⏸️ Ya estaba pausada.".to_string(),
            None => "❌ No hay nada reproduciéndose.".to_string(),
        }
    }

    pub fn resume(&self, guild_id: GuildId) -> String {
        match self.sessions.get(guild_id) {
            Some(session) if session.pause.resume() => "▶️ Reproducción reanudada.".to_string(),
            Some(_) => "▶️ Ya estaba sonando.".to_string(),
            None => "❌ No hay nada reproduciéndose.".to_string(),
        }
    }

    /// La pista sonando ahora mismo, si hay alguna.
    pub fn now_playing(&self, guild_id: GuildId) -> Option<Track> {
        self.queues.get(guild_id).current()
    }

    /// Instantánea de la cola: pista actual y pendientes en orden.
    pub fn queue_snapshot(&self, guild_id: GuildId) -> (Option<Track>, Vec<Track>) {
        let queue = self.queues.get(guild_id);
        (queue.current(), queue.list())
    }

    pub fn clear_queue(&self, guild_id: GuildId) -> String {
        self.queues.get(guild_id).clear();
        "🧹 Cola limpiada.".to_string()
    }

    pub fn shuffle_queue(&self, guild_id: GuildId) -> String {
        self.queues.get(guild_id).shuffle();
        "🔀 Cola mezclada.".to_string()
    }

    /// Elimina la pista pendiente en `index` (0-based).
    pub fn remove(&self, guild_id: GuildId, index: usize) -> String {
        if self.queues.get(guild_id).remove(index) {
            format!("❌ Pista {index} eliminada de la cola.")
        } else {
            "⚠️ Índice inválido.".to_string()
        }
    }

    /// Inserta una pista en `index` (0-based, [0, len]).
    pub fn insert(&self, guild_id: GuildId, index: usize, url: &str) -> String {
        let track = Track::new(url);
        if self.queues.get(guild_id).insert(index, track.clone()) {
            self.resolver.spawn_fill(track.clone());
            format!("➕ Insertada en la posición {index}: {}", track.title())
        } else {
            "⚠️ Posición de inserción inválida.".to_string()
        }
    }

    pub fn move_track(&self, guild_id: GuildId, from: usize, to: usize) -> String {
        if self.queues.get(guild_id).move_track(from, to) {
            format!("🔁 Pista movida de la posición {from} a la {to}.")
        } else {
            "⚠️ Movimiento inválido. Revisa las posiciones.".to_string()
        }
    }

    pub fn set_loop_mode(&self, guild_id: GuildId, mode: LoopMode) -> String {
        self.queues.get(guild_id).set_loop_mode(mode);
        format!("🔁 Modo de repetición: {mode}")
    }

    pub fn toggle_loop_mode(&self, guild_id: GuildId) -> String {
        let mode = self.queues.get(guild_id).toggle_loop_mode();
        format!("🔄 Modo de repetición alternado: {mode}")
    }

    #[cfg(test)]
    fn queue(&self, guild_id: GuildId) -> Arc<Queue> {
        self.queues.get(guild_id)
    }
}
