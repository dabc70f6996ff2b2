use thiserror::Error;

/// Errores del motor de reproducción.
///
/// Todos los fallos por pista quedan aislados a esa pista: el driver los
/// registra y continúa con la cola. Ningún error de este módulo debe
/// terminar el proceso anfitrión.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Ya hay un stream activo en esta conexión.
    #[error("ya hay una pista reproduciéndose en esta conexión")]
    AlreadyPlaying,

    /// El extractor o el transcodificador no pudo lanzarse.
    #[error("no se pudo iniciar `{command}`: {source}")]
    ProcessStart {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Error de lectura del stream PCM (distinto de fin de stream, que es
    /// un resultado exitoso).
    #[error("error leyendo el stream de audio: {0}")]
    StreamRead(#[source] std::io::Error),

    /// Fallo del codificador Opus.
    #[error("error codificando a opus: {0}")]
    Encode(#[from] audiopus::Error),

    /// El transporte de voz no está listo para enviar.
    #[error("el transporte de voz no está listo")]
    TransportNotReady,

    /// El transporte rechazó un frame saliente.
    #[error("el transporte rechazó el frame: {0}")]
    TransportSend(String),

    /// La cola alcanzó su capacidad máxima.
    #[error("la cola está llena (máximo {0} pistas)")]
    QueueFull(usize),
}
