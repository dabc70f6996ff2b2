use dashmap::DashMap;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

use crate::audio::track::{LoopMode, Track};
use crate::error::PlaybackError;
use crate::GuildId;

#[derive(Debug, Default)]
struct QueueState {
    tracks: VecDeque<Track>,
    current: Option<Track>,
    loop_mode: LoopMode,
    playing: bool,
}

/// Cola de reproducción de un guild.
///
/// Todas las operaciones se serializan bajo un único mutex; la cola se crea
/// perezosamente en el registro y se vacía (no se destruye) al parar o
/// salir del canal.
#[derive(Debug)]
pub struct Queue {
    state: Mutex<QueueState>,
    max_size: usize,
}

impl Queue {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            max_size,
        }
    }

    /// Agrega una pista al final de la cola.
    pub fn enqueue(&self, track: Track) -> Result<(), PlaybackError> {
        let mut state = self.state.lock();
        if state.tracks.len() >= self.max_size {
            return Err(PlaybackError::QueueFull(self.max_size));
        }
        debug!("➕ En cola: {}", track.title());
        state.tracks.push_back(track);
        Ok(())
    }

    /// Agrega varias pistas preservando su orden. Devuelve cuántas cupieron.
    pub fn enqueue_many(&self, tracks: Vec<Track>) -> usize {
        let mut state = self.state.lock();
        let space = self.max_size.saturating_sub(state.tracks.len());
        let added = tracks.len().min(space);
        state.tracks.extend(tracks.into_iter().take(added));
        info!("➕ {} pistas agregadas a la cola", added);
        added
    }

    /// Saca la siguiente pista según el modo de repetición.
    ///
    /// Único punto donde se asigna la pista actual. Con loop "one" devuelve
    /// la pista actual sin avanzar; con loop "all" la cabeza sacada vuelve
    /// al final antes de devolverse.
    pub fn dequeue(&self) -> Option<Track> {
        let mut state = self.state.lock();

        if state.loop_mode == LoopMode::One {
            if let Some(current) = state.current.clone() {
                info!("🔂 Repitiendo pista: {}", current.title());
                return Some(current);
            }
        }

        let track = state.tracks.pop_front()?;

        if state.loop_mode == LoopMode::All {
            state.tracks.push_back(track.clone());
        }

        state.current = Some(track.clone());
        Some(track)
    }

    /// Copia instantánea de las pistas pendientes (excluye la actual).
    pub fn list(&self) -> Vec<Track> {
        self.state.lock().tracks.iter().cloned().collect()
    }

    /// Vacía las pistas pendientes y la referencia actual. El modo de
    /// repetición no cambia.
    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.tracks.clear();
        state.current = None;
        info!("🗑️ Cola limpiada");
    }

    pub fn set_loop_mode(&self, mode: LoopMode) {
        self.state.lock().loop_mode = mode;
        info!("🔁 Modo de repetición: {}", mode);
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.state.lock().loop_mode
    }

    /// Cicla off → one → all → off y devuelve el modo resultante.
    pub fn toggle_loop_mode(&self) -> LoopMode {
        let mut state = self.state.lock();
        state.loop_mode = state.loop_mode.next();
        info!("🔄 Modo de repetición: {}", state.loop_mode);
        state.loop_mode
    }

    /// Mezcla las pistas pendientes. La actual no participa.
    pub fn shuffle(&self) {
        let mut state = self.state.lock();
        state.tracks.make_contiguous().shuffle(&mut rand::thread_rng());
        info!("🔀 Cola mezclada");
    }

    /// Elimina la pista en `index` (0-based). Falso fuera de rango.
    pub fn remove(&self, index: usize) -> bool {
        let mut state = self.state.lock();
        if index >= state.tracks.len() {
            return false;
        }
        state.tracks.remove(index);
        true
    }

    /// Inserta en `index` (0-based, rango válido [0, len]).
    pub fn insert(&self, index: usize, track: Track) -> bool {
        let mut state = self.state.lock();
        if index > state.tracks.len() {
            return false;
        }
        state.tracks.insert(index, track);
        true
    }

    /// Reubica una pista de `from` a `to`. Falso si algún índice se sale.
    pub fn move_track(&self, from: usize, to: usize) -> bool {
        let mut state = self.state.lock();
        let len = state.tracks.len();
        if from >= len || to >= len {
            return false;
        }
        if from != to {
            if let Some(track) = state.tracks.remove(from) {
                state.tracks.insert(to, track);
            }
        }
        true
    }

    pub fn current(&self) -> Option<Track> {
        self.state.lock().current.clone()
    }

    /// Borra la referencia a la pista actual (señal de "nada sonando").
    /// Solo stop/skip deberían llamarlo.
    pub fn clear_current(&self) {
        self.state.lock().current = None;
    }

    pub fn is_playing(&self) -> bool {
        self.state.lock().playing
    }

    /// Toma la bandera de reproducción. Devuelve falso si otro driver ya la
    /// tiene; garantiza un único driver por guild.
    pub fn begin_playing(&self) -> bool {
        let mut state = self.state.lock();
        if state.playing {
            return false;
        }
        state.playing = true;
        true
    }

    pub fn end_playing(&self) {
        self.state.lock().playing = false;
    }

    pub fn len(&self) -> usize {
        self.state.lock().tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().tracks.is_empty()
    }
}

/// Registro guild → cola. Las colas se crean perezosamente y viven lo que
/// viva el proceso.
#[derive(Debug, Clone)]
pub struct QueueRegistry {
    queues: Arc<DashMap<GuildId, Arc<Queue>>>,
    max_size: usize,
}

impl QueueRegistry {
    pub fn new(max_size: usize) -> Self {
        Self {
            queues: Arc::new(DashMap::new()),
            max_size,
        }
    }

    /// Devuelve la cola del guild, creándola si es la primera referencia.
    pub fn get(&self, guild_id: GuildId) -> Arc<Queue> {
        self.queues
            .entry(guild_id)
            .or_insert_with(|| Arc::new(Queue::new(self.max_size)))
            .clone()
    }
}
