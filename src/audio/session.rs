use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::watch;

use crate::audio::connection::Connection;
use crate::GuildId;

/// Bandera de pausa compartida entre la capa de comandos (escritor) y el
/// frame relay (lector).
///
/// Sobre `tokio::sync::watch` en lugar del sondeo con sleep del diseño
/// original: el relay se despierta exactamente cuando cambia la bandera.
/// La semántica se conserva: pausar detiene el stream, nunca descarta
/// frames.
#[derive(Debug, Clone)]
pub struct PauseGate {
    tx: Arc<watch::Sender<bool>>,
}

impl PauseGate {
    pub fn new() -> Self {
        Self {
            tx: Arc::new(watch::channel(false).0),
        }
    }

    /// Pausa. Devuelve falso si ya estaba pausado.
    pub fn pause(&self) -> bool {
        !self.tx.send_replace(true)
    }

    /// Reanuda. Devuelve falso si no estaba pausado.
    pub fn resume(&self) -> bool {
        self.tx.send_replace(false)
    }

    pub fn is_paused(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receptor para que el relay espere cambios sin sondear.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Sesión de audio de un guild: la conexión viva y su bandera de pausa.
///
/// Cada pista recibe una conexión fresca; la bandera de pausa es una por
/// guild durante toda una tanda de reproducción, así una pausa sobrevive
/// al cambio de pista.
#[derive(Clone)]
pub struct GuildSession {
    pub connection: Arc<Connection>,
    pub pause: PauseGate,
}

impl GuildSession {
    pub fn new(connection: Arc<Connection>, pause: PauseGate) -> Self {
        Self { connection, pause }
    }
}

/// Registro guild → sesión. `get` nunca crea, `set` reemplaza, `remove` es
/// idempotente.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<GuildId, GuildSession>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<GuildSession> {
        self.sessions.get(&guild_id).map(|s| s.clone())
    }

    pub fn set(&self, guild_id: GuildId, session: GuildSession) {
        self.sessions.insert(guild_id, session);
    }

    pub fn remove(&self, guild_id: GuildId) {
        self.sessions.remove(&guild_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::transport::test_support::TestTransport;

    fn session() -> GuildSession {
        let transport = Arc::new(TestTransport::new());
        let config = Arc::new(EngineConfig::default());
        GuildSession::new(Arc::new(Connection::new(transport, config)), PauseGate::new())
    }

    #[test]
    fn test_pause_gate_transitions() {
        let gate = PauseGate::new();
        assert!(!gate.is_paused());

        assert!(gate.pause());
        assert!(!gate.pause()); // ya pausado
        assert!(gate.is_paused());

        assert!(gate.resume());
        assert!(!gate.resume()); // ya sonando
        assert!(!gate.is_paused());
    }

    #[test]
    fn test_pause_gate_shared_across_clones() {
        let gate = PauseGate::new();
        let clone = gate.clone();
        gate.pause();
        assert!(clone.is_paused());
    }

    #[test]
    fn test_registry_get_never_creates() {
        let registry = SessionRegistry::new();
        assert!(registry.get(GuildId(7)).is_none());

        registry.set(GuildId(7), session());
        assert!(registry.get(GuildId(7)).is_some());

        registry.remove(GuildId(7));
        registry.remove(GuildId(7)); // idempotente
        assert!(registry.get(GuildId(7)).is_none());
    }

    #[test]
    fn test_set_overwrites_session() {
        let registry = SessionRegistry::new();
        let first = session();
        registry.set(GuildId(1), first.clone());

        let second = session();
        registry.set(GuildId(1), second.clone());

        let stored = registry.get(GuildId(1)).unwrap();
        assert!(Arc::ptr_eq(&stored.connection, &second.connection));
        assert!(!Arc::ptr_eq(&stored.connection, &first.connection));
    }
}
