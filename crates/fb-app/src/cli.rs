use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fb_core::config::{LinkConfig, ResyncMode};

/// fftbin — reads FFT bin frames from a serial link and prints the spectrum.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Fichier de configuration TOML. Défaut : config/default.toml.
    #[arg(short, long, default_value = "config/default.toml", global = true)]
    pub config: PathBuf,

    /// Niveau de log : error, warn, info, debug, trace.
    #[arg(long, default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Lire des trames depuis un port série, un fichier ou stdin.
    Read(ReadArgs),
    /// Écrire des trames synthétiques (tonalité + FFT) comme la carte.
    Simulate(SimulateArgs),
}

/// Output layout for decoded frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Port série (remplace serial.port).
    #[arg(long, conflicts_with_all = ["file", "stdin"])]
    pub port: Option<String>,

    /// Rejouer une capture binaire au lieu du port série.
    #[arg(long, conflicts_with = "stdin")]
    pub file: Option<PathBuf>,

    /// Lire le flux depuis l'entrée standard.
    #[arg(long, default_value_t = false)]
    pub stdin: bool,

    /// Débit du port série.
    #[arg(long)]
    pub baud: Option<u32>,

    /// Timeout par lecture sur le port série, en ms.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Budget total par trame, en ms (0 = aucun).
    #[arg(long)]
    pub deadline_ms: Option<u64>,

    /// Recherche d'en-tête octet par octet au lieu de par paires.
    #[arg(long, default_value_t = false)]
    pub sliding: bool,

    /// Nombre de trames à lire.
    #[arg(long, default_value_t = 1, conflicts_with = "follow")]
    pub count: u32,

    /// Lire jusqu'à la fin du flux ou Ctrl-C.
    #[arg(long, default_value_t = false)]
    pub follow: bool,

    /// Format de sortie.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Afficher tous les bins, pas seulement la première moitié.
    #[arg(long, default_value_t = false)]
    pub full: bool,

    /// Fréquence d'échantillonnage du signal analysé (Hz).
    #[arg(long)]
    pub sample_rate: Option<u32>,

    /// Taille de la FFT sur la carte.
    #[arg(long)]
    pub window_size: Option<usize>,
}

/// Where `read` takes its bytes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transport {
    Serial(String),
    File(PathBuf),
    Stdin,
}

impl ReadArgs {
    /// Apply CLI overrides on top of the loaded config.
    pub fn apply(&self, config: &mut LinkConfig) {
        if let Some(ref port) = self.port {
            config.serial.port.clone_from(port);
        }
        if let Some(baud) = self.baud {
            config.serial.baud_rate = baud;
        }
        if let Some(ms) = self.timeout_ms {
            config.serial.timeout_ms = ms;
        }
        if self.deadline_ms.is_some() {
            config.reader.deadline_ms = self.deadline_ms;
        }
        if self.sliding {
            config.reader.resync = ResyncMode::Sliding;
        }
        if let Some(rate) = self.sample_rate {
            config.spectrum.sample_rate = rate;
        }
        if let Some(size) = self.window_size {
            config.spectrum.window_size = size;
        }
        config.clamp_all();
    }

    #[must_use]
    pub fn transport(&self, config: &LinkConfig) -> Transport {
        if self.stdin {
            Transport::Stdin
        } else if let Some(ref path) = self.file {
            Transport::File(path.clone())
        } else {
            Transport::Serial(config.serial.port.clone())
        }
    }
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Fichier de sortie. Défaut : stdout.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Fréquence de la tonalité de test (Hz).
    #[arg(long, default_value_t = 10_000.0)]
    pub frequency: f32,

    /// Amplitude de la tonalité.
    #[arg(long, default_value_t = 1.0)]
    pub amplitude: f32,

    /// Nombre de trames à écrire.
    #[arg(long, default_value_t = 1)]
    pub frames: u32,

    /// Paires d'octets parasites avant chaque trame.
    #[arg(long, default_value_t = 0)]
    pub noise_pairs: usize,

    /// Graine du générateur de bruit.
    #[arg(long, default_value_t = 0x5EED)]
    pub seed: u64,

    /// Pause entre deux trames, en ms (la carte émet toutes les 2000 ms).
    #[arg(long, default_value_t = 0)]
    pub interval_ms: u64,
}
