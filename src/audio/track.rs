use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Metadatos de una pista, resueltos de forma asíncrona tras el enqueue.
#[derive(Debug, Clone, Default)]
pub struct TrackMeta {
    pub title: String,
    pub duration: String,
    pub uploader: String,
}

/// Una pista de la cola.
///
/// La URL es inmutable desde la creación; los metadatos llegan después
/// (consistencia eventual: hasta entonces el título mostrado es la URL
/// cruda). Clonar una pista es barato: los metadatos se comparten.
#[derive(Debug, Clone)]
pub struct Track {
    url: String,
    meta: Arc<RwLock<TrackMeta>>,
    added_at: DateTime<Utc>,
}

impl Track {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            meta: Arc::new(RwLock::new(TrackMeta::default())),
            added_at: Utc::now(),
        }
    }

    /// Crea una pista con metadatos ya conocidos (entradas de playlist).
    pub fn with_title(url: impl Into<String>, title: impl Into<String>) -> Self {
        let track = Self::new(url);
        track.meta.write().title = title.into();
        track
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Título resuelto, o la URL mientras los metadatos están pendientes.
    pub fn title(&self) -> String {
        let meta = self.meta.read();
        if meta.title.is_empty() {
            self.url.clone()
        } else {
            meta.title.clone()
        }
    }

    pub fn duration_display(&self) -> String {
        self.meta.read().duration.clone()
    }

    pub fn uploader(&self) -> String {
        self.meta.read().uploader.clone()
    }

    pub fn added_at(&self) -> DateTime<Utc> {
        self.added_at
    }

    /// Publica los metadatos resueltos. Visible inmediatamente para todos
    /// los clones de la pista.
    pub fn set_meta(&self, meta: TrackMeta) {
        *self.meta.write() = meta;
    }

    /// Identidad de pista: mismo objeto compartido, no misma URL.
    pub fn same_as(&self, other: &Track) -> bool {
        Arc::ptr_eq(&self.meta, &other.meta)
    }
}

/// Política de repetición de la cola.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopMode {
    /// Consumir cada pista una vez.
    #[default]
    Off,
    /// Repetir la pista actual indefinidamente.
    One,
    /// Reciclar la cola completa.
    All,
}

impl LoopMode {
    /// Ciclo off → one → all → off.
    pub fn next(self) -> Self {
        match self {
            LoopMode::Off => LoopMode::One,
            LoopMode::One => LoopMode::All,
            LoopMode::All => LoopMode::Off,
        }
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopMode::Off => write!(f, "off"),
            LoopMode::One => write!(f, "one"),
            LoopMode::All => write!(f, "all"),
        }
    }
}
