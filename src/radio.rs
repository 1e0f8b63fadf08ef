// ============================================================================
// Module : radio
// ============================================================================
// Lecteur de radios internet
//
// - Liste fixe de stations
// - La lecture est déléguée à un AudioSink (trait)
// - En production : MpvSink lance un processus `mpv` externe
//
// CONCEPTS RUST :
// 1. Trait comme point d'injection (AudioSink)
// 2. Générique statique : RadioPlayer<S: AudioSink>
// 3. RAII : Drop tue le processus mpv si le lecteur disparaît
// ============================================================================

use std::process::{Child, Command, Stdio};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Station de radio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RadioStation {
    pub name: &'static str,
    pub url: &'static str,
}

/// Stations disponibles
pub const STATIONS: [RadioStation; 4] = [
    RadioStation {
        name: "La Première",
        url: "http://stream.srg-ssr.ch/m/la-1ere/mp3_128",
    },
    RadioStation {
        name: "Couleur 3",
        url: "http://stream.srg-ssr.ch/m/couleur3/mp3_128",
    },
    RadioStation {
        name: "NRJ France",
        url: "https://streaming.nrjaudio.fm/oumvmk8fnozc",
    },
    RadioStation {
        name: "FIP",
        url: "http://icecast.radiofrance.fr/fip-midfi.mp3",
    },
];

// ============================================================================
// Trait : AudioSink
// ============================================================================

/// Sortie audio capable de jouer un flux
pub trait AudioSink {
    /// Démarre la lecture du flux (le précédent a déjà été arrêté)
    fn start(&mut self, url: &str) -> Result<()>;

    /// Arrête la lecture en cours (sans effet si rien ne joue)
    fn stop(&mut self);
}

/// Sortie audio basée sur le lecteur `mpv`
#[derive(Debug, Default)]
pub struct MpvSink {
    child: Option<Child>,
}

impl MpvSink {
    pub fn new() -> Self {
        Self { child: None }
    }
}

impl AudioSink for MpvSink {
    fn start(&mut self, url: &str) -> Result<()> {
        // stdout/stderr coupés : mpv écrirait par-dessus le TUI
        let child = Command::new("mpv")
            .args(["--no-video", "--really-quiet", url])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("Impossible de lancer mpv (est-il installé ?)")?;

        debug!(pid = child.id(), url, "mpv started");
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(error = ?e, "Failed to kill mpv");
            }
            // Récupère le zombie
            let _ = child.wait();
        }
    }
}

impl Drop for MpvSink {
    fn drop(&mut self) {
        self.stop();
    }
}

// ============================================================================
// Structure : RadioPlayer
// ============================================================================

/// Lecteur : une station à la fois
pub struct RadioPlayer<S: AudioSink> {
    sink: S,
    current: Option<usize>,
}

impl<S: AudioSink> RadioPlayer<S> {
    pub fn new(sink: S) -> Self {
        Self { sink, current: None }
    }

    /// Joue la station `index`
    ///
    /// Le flux courant est toujours arrêté avant de démarrer le suivant.
    pub fn play(&mut self, index: usize) -> Result<()> {
        let station = STATIONS
            .get(index)
            .with_context(|| format!("Station inconnue : {}", index))?;

        self.stop();
        self.sink.start(station.url)?;
        self.current = Some(index);
        info!(station = station.name, "Radio playing");
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(index) = self.current.take() {
            debug!(station = STATIONS[index].name, "Radio stopped");
        }
        self.sink.stop();
    }

    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_station(&self) -> Option<&'static RadioStation> {
        self.current.and_then(|i| STATIONS.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sink qui enregistre les appels
    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
        fail: bool,
    }

    impl AudioSink for RecordingSink {
        fn start(&mut self, url: &str) -> Result<()> {
            if self.fail {
                anyhow::bail!("no audio device");
            }
            self.events.push(format!("start {}", url));
            Ok(())
        }

        fn stop(&mut self) {
            self.events.push("stop".to_string());
        }
    }

    #[test]
    fn test_play_and_stop() {
        let mut player = RadioPlayer::new(RecordingSink::default());
        assert!(!player.is_playing());

        player.play(3).unwrap();
        assert!(player.is_playing());
        assert_eq!(player.current_station().unwrap().name, "FIP");

        player.stop();
        assert!(!player.is_playing());
        assert!(player.current_station().is_none());
    }

    #[test]
    fn test_switch_stops_previous_stream_first() {
        let mut player = RadioPlayer::new(RecordingSink::default());
        player.play(0).unwrap();
        player.play(1).unwrap();

        assert_eq!(
            player.sink.events,
            vec![
                "stop".to_string(),
                format!("start {}", STATIONS[0].url),
                "stop".to_string(),
                format!("start {}", STATIONS[1].url),
            ]
        );
        assert_eq!(player.current_station().unwrap().name, "Couleur 3");
    }

    #[test]
    fn test_unknown_station() {
        let mut player = RadioPlayer::new(RecordingSink::default());
        assert!(player.play(STATIONS.len()).is_err());
        assert!(player.sink.events.is_empty());
    }

    #[test]
    fn test_sink_failure_leaves_player_stopped() {
        let mut player = RadioPlayer::new(RecordingSink {
            fail: true,
            ..Default::default()
        });
        assert!(player.play(0).is_err());
        assert!(!player.is_playing());
    }
}
