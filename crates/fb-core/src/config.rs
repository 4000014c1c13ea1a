use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// How the reader searches the byte stream for the magic header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResyncMode {
    /// Consume two bytes per attempt. A header straddling two pairs is missed.
    #[default]
    Pair,
    /// Slide one byte at a time. Finds headers at any offset.
    Sliding,
}

/// Serial transport settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SerialConfig {
    /// Device path (`/dev/ttyUSB0`, `COM3`, ...).
    pub port: String,
    /// Line speed. The board transmits at 115200 8N1.
    pub baud_rate: u32,
    /// Per-read timeout. Bounds how long the reader waits before it
    /// re-checks its deadline and cancellation token.
    pub timeout_ms: u64,
}

/// Frame reader settings.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ReaderConfig {
    pub resync: ResyncMode,
    /// Wall-clock budget for one frame. `None` or `0` = wait forever.
    pub deadline_ms: Option<u64>,
}

/// Frequency axis settings for the consumer.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpectrumConfig {
    /// Sample rate of the signal the board analysed, in Hz.
    pub sample_rate: u32,
    /// FFT length used on the board.
    pub window_size: usize,
}

/// Complete link configuration.
///
/// Serializable to TOML. Every field has a sane default.
///
/// # Example
/// ```
/// use fb_core::config::LinkConfig;
/// let config = LinkConfig::default();
/// assert_eq!(config.serial.baud_rate, 115_200);
/// assert_eq!(config.spectrum.window_size, 1024);
/// ```
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct LinkConfig {
    pub serial: SerialConfig,
    pub reader: ReaderConfig,
    pub spectrum: SpectrumConfig,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
            timeout_ms: 100,
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            window_size: 1024,
        }
    }
}

impl LinkConfig {
    /// Clamp all numeric fields to their valid ranges.
    /// Called after TOML deserialization to prevent out-of-range values.
    pub fn clamp_all(&mut self) {
        self.serial.baud_rate = self.serial.baud_rate.clamp(300, 4_000_000);
        self.serial.timeout_ms = self.serial.timeout_ms.clamp(1, 60_000);
        self.spectrum.sample_rate = self.spectrum.sample_rate.max(1);
        self.spectrum.window_size = self.spectrum.window_size.max(1);
        self.reader.deadline_ms = self.reader.deadline_ms.filter(|&ms| ms > 0);
    }

    /// Reject values that cannot be clamped into something usable.
    ///
    /// # Errors
    /// Returns [`CoreError::Config`] when the serial port path is empty.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.serial.port.trim().is_empty() {
            return Err(CoreError::Config("serial.port est vide".to_string()));
        }
        Ok(())
    }
}

/// Structure TOML intermédiaire pour désérialisation avec valeurs optionnelles.
#[derive(Deserialize)]
struct ConfigFile {
    serial: Option<SerialSection>,
    reader: Option<ReaderSection>,
    spectrum: Option<SpectrumSection>,
}

#[derive(Deserialize)]
struct SerialSection {
    port: Option<String>,
    baud_rate: Option<u32>,
    timeout_ms: Option<u64>,
}

#[derive(Deserialize)]
struct ReaderSection {
    resync: Option<ResyncMode>,
    deadline_ms: Option<u64>,
}

#[derive(Deserialize)]
struct SpectrumSection {
    sample_rate: Option<u32>,
    window_size: Option<usize>,
}

/// Charge un fichier TOML et fusionne avec les valeurs par défaut.
///
/// # Errors
/// Returns an error if the file is missing, cannot be read or parsed, or
/// holds a value that fails [`LinkConfig::validate`].
///
/// # Example
/// ```no_run
/// use fb_core::config::load_config;
/// use std::path::Path;
/// let config = load_config(Path::new("config/default.toml")).unwrap();
/// ```
pub fn load_config(path: &Path) -> Result<LinkConfig> {
    if !path.exists() {
        return Err(CoreError::FileNotFound {
            path: path.display().to_string(),
        }
        .into());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Impossible de lire {}", path.display()))?;

    let file: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Erreur de parsing TOML dans {}", path.display()))?;

    let mut config = LinkConfig::default();

    if let Some(s) = file.serial {
        if let Some(v) = s.port {
            config.serial.port = v;
        }
        if let Some(v) = s.baud_rate {
            config.serial.baud_rate = v;
        }
        if let Some(v) = s.timeout_ms {
            config.serial.timeout_ms = v;
        }
    }

    if let Some(r) = file.reader {
        if let Some(v) = r.resync {
            config.reader.resync = v;
        }
        if r.deadline_ms.is_some() {
            config.reader.deadline_ms = r.deadline_ms;
        }
    }

    if let Some(s) = file.spectrum {
        if let Some(v) = s.sample_rate {
            config.spectrum.sample_rate = v;
        }
        if let Some(v) = s.window_size {
            config.spectrum.window_size = v;
        }
    }

    config.clamp_all();
    config.validate()?;
    log::debug!("Config chargée depuis {}", path.display());
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_toml(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let file = write_toml("[serial]\nport = \"/dev/ttyACM0\"\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyACM0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.reader.resync, ResyncMode::Pair);
        assert_eq!(config.reader.deadline_ms, None);
        assert_eq!(config.spectrum.sample_rate, 48_000);
    }

    #[test]
    fn all_sections_override() {
        let file = write_toml(
            "[serial]\nbaud_rate = 9600\ntimeout_ms = 250\n\
             [reader]\nresync = \"sliding\"\ndeadline_ms = 5000\n\
             [spectrum]\nsample_rate = 16000\nwindow_size = 512\n",
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.serial.timeout_ms, 250);
        assert_eq!(config.reader.resync, ResyncMode::Sliding);
        assert_eq!(config.reader.deadline_ms, Some(5000));
        assert_eq!(config.spectrum.sample_rate, 16_000);
        assert_eq!(config.spectrum.window_size, 512);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let file = write_toml("[serial]\ntimeout_ms = 0\n[spectrum]\nwindow_size = 0\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.serial.timeout_ms, 1);
        assert_eq!(config.spectrum.window_size, 1);
    }

    #[test]
    fn zero_deadline_means_no_deadline() {
        let file = write_toml("[reader]\ndeadline_ms = 0\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.reader.deadline_ms, None);
    }

    #[test]
    fn empty_port_is_rejected() {
        let file = write_toml("[serial]\nport = \"  \"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn missing_file_reports_not_found() {
        let err = load_config(Path::new("does/not/exist.toml")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::FileNotFound { .. })
        ));
    }

    #[test]
    fn shipped_default_matches_builtin_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
        let config = load_config(&path).unwrap();
        let builtin = LinkConfig::default();
        assert_eq!(config.serial.port, builtin.serial.port);
        assert_eq!(config.serial.baud_rate, builtin.serial.baud_rate);
        assert_eq!(config.serial.timeout_ms, builtin.serial.timeout_ms);
        assert_eq!(config.reader.resync, builtin.reader.resync);
        assert_eq!(config.spectrum.window_size, builtin.spectrum.window_size);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let file = write_toml("[serial\nport = 3");
        assert!(load_config(file.path()).is_err());
    }
}
