//! Resolución asíncrona de metadatos de pistas.
//!
//! Envuelve el binario extractor en modo "solo imprimir": títulos,
//! duraciones y subidores llegan después del enqueue y parchean la pista
//! en sitio. El motor tolera indefinidamente pistas con metadatos en
//! blanco; mientras tanto se muestra la URL cruda.

use anyhow::Result;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

use crate::audio::track::{Track, TrackMeta};

const META_FORMAT: &str = "%(title)s|%(duration_string)s|%(uploader)s";
const PLAYLIST_FORMAT: &str = "%(title)s|%(url)s";
const SEARCH_FORMAT: &str = "%(title)s|%(duration_string)s|%(uploader)s|%(webpage_url)s";

/// Resultado de una búsqueda (solo datos; la interacción de selección es
/// asunto de la capa de comandos).
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub title: String,
    pub duration: String,
    pub uploader: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct MetadataResolver {
    bin: String,
}

impl MetadataResolver {
    pub fn new(bin: impl Into<String>) -> Self {
        Self { bin: bin.into() }
    }

    /// Resuelve los metadatos de la pista en segundo plano. Un fallo se
    /// registra y deja la pista con sus valores por defecto.
    pub fn spawn_fill(&self, track: Track) {
        let bin = self.bin.clone();
        tokio::spawn(async move {
            if let Err(e) = fill(&bin, &track).await {
                warn!("⚠️ No se pudieron resolver metadatos de {}: {e}", track.url());
            }
        });
    }

    /// Expande una playlist a sus pistas, hasta `max` entradas.
    pub async fn playlist_entries(&self, playlist_url: &str, max: usize) -> Result<Vec<Track>> {
        let output = Command::new(&self.bin)
            .args(["--flat-playlist", "--print", PLAYLIST_FORMAT])
            .arg(playlist_url)
            .output()
            .await?;

        if !output.status.success() {
            anyhow::bail!(
                "la expansión de la playlist falló: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let tracks = parse_playlist_output(&String::from_utf8_lossy(&output.stdout));
        debug!("📜 Playlist expandida: {} pistas", tracks.len());
        Ok(tracks.into_iter().take(max).collect())
    }

    /// Búsqueda de los mejores `limit` resultados para una consulta.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let output = Command::new(&self.bin)
            .arg(format!("ytsearch{limit}:{query}"))
            .args(["--print", SEARCH_FORMAT])
            .output()
            .await?;

        if !output.status.success() {
            anyhow::bail!(
                "la búsqueda falló: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(parse_search_output(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Heurística de playlist: parámetro `list` o ruta de playlist.
    pub fn is_playlist(&self, input: &str) -> bool {
        match Url::parse(input) {
            Ok(url) => {
                url.path().contains("playlist")
                    || url.query_pairs().any(|(k, _)| k == "list")
            }
            Err(_) => false,
        }
    }
}

async fn fill(bin: &str, track: &Track) -> Result<()> {
    let output = Command::new(bin)
        .args(["--quiet", "--no-warnings", "--no-playlist", "--print", META_FORMAT])
        .arg(track.url())
        .output()
        .await?;

    if !output.status.success() {
        anyhow::bail!(
            "el extractor devolvió error: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    match parse_meta_line(stdout.trim()) {
        Some(meta) => {
            debug!("🏷️ Metadatos resueltos: {}", meta.title);
            track.set_meta(meta);
            Ok(())
        }
        None => anyhow::bail!("salida de metadatos ilegible: {stdout:?}"),
    }
}

fn parse_meta_line(line: &str) -> Option<TrackMeta> {
    let mut parts = line.splitn(3, '|');
    Some(TrackMeta {
        title: parts.next()?.to_string(),
        duration: parts.next()?.to_string(),
        uploader: parts.next()?.to_string(),
    })
}

fn parse_playlist_output(output: &str) -> Vec<Track> {
    output
        .lines()
        .filter_map(|line| {
            let (title, url) = line.split_once('|')?;
            // Las entradas planas pueden traer solo el ID del video
            let url = if Url::parse(url).is_ok() {
                url.to_string()
            } else {
                format!("https://www.youtube.com/watch?v={url}")
            };
            Some(Track::with_title(url, title))
        })
        .collect()
}

fn parse_search_output(output: &str) -> Vec<SearchResult> {
    output
        .lines()
        .filter_map(|line| {
            let mut parts = line.splitn(4, '|');
            Some(SearchResult {
                title: parts.next()?.to_string(),
                duration: parts.next()?.to_string(),
                uploader: parts.next()?.to_string(),
                url: parts.next()?.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_meta_line() {
        let meta = parse_meta_line("Una Canción|3:21|Alguien").unwrap();
        assert_eq!(meta.title, "Una Canción");
        assert_eq!(meta.duration, "3:21");
        assert_eq!(meta.uploader, "Alguien");

        // El título puede contener el separador: solo se corta dos veces
        let meta = parse_meta_line("a|b|c|d").unwrap();
        assert_eq!(meta.uploader, "c|d");

        assert!(parse_meta_line("sin separadores").is_none());
    }

    #[test]
    fn test_parse_playlist_resolves_bare_ids() {
        let tracks = parse_playlist_output(
            "Primera|dQw4w9WgXcQ\nSegunda|https://example.com/full\nlínea ilegible\n",
        );

        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].url(), "https://www.youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(tracks[0].title(), "Primera");
        assert_eq!(tracks[1].url(), "https://example.com/full");
    }

    #[test]
    fn test_parse_search_output() {
        let results =
            parse_search_output("T1|1:00|U1|https://example.com/1\nT2|2:00|U2|https://example.com/2\n");
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].url, "https://example.com/2");
    }

    #[test]
    fn test_is_playlist_heuristic() {
        let resolver = MetadataResolver::new("yt-dlp");
        assert!(resolver.is_playlist("https://www.youtube.com/playlist?list=PLx"));
        assert!(resolver.is_playlist("https://www.youtube.com/watch?v=abc&list=PLx"));
        assert!(!resolver.is_playlist("https://www.youtube.com/watch?v=abc"));
        assert!(!resolver.is_playlist("no es una url"));
    }
}
