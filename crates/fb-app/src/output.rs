use std::io::Write;

use anyhow::Result;
use fb_core::config::SpectrumConfig;
use fb_core::frame::{Frame, Peak};
use serde::Serialize;

use crate::cli::OutputFormat;

#[derive(Serialize)]
struct BinReport {
    frequency: f32,
    magnitude: f32,
}

#[derive(Serialize)]
struct PeakReport {
    index: usize,
    frequency: f32,
    magnitude: f32,
}

impl From<Peak> for PeakReport {
    fn from(p: Peak) -> Self {
        Self {
            index: p.index,
            frequency: p.frequency,
            magnitude: p.magnitude,
        }
    }
}

/// One JSON line per frame.
#[derive(Serialize)]
struct FrameReport {
    frame: u32,
    declared_length: u32,
    sample_count: usize,
    trailing_bytes: u32,
    sample_rate: u32,
    window_size: usize,
    peak: Option<PeakReport>,
    bins: Vec<BinReport>,
}

/// Write one decoded frame as a spectrum.
///
/// Only the first half of the bins is written unless `full` is set, since the
/// board sends the mirrored magnitude of a real-input FFT.
///
/// # Errors
/// Returns an error if writing to `out` fails.
pub fn render<W: Write>(
    out: &mut W,
    index: u32,
    frame: &Frame,
    spectrum_config: &SpectrumConfig,
    format: OutputFormat,
    full: bool,
) -> Result<()> {
    let spectrum = frame.spectrum(spectrum_config.sample_rate, spectrum_config.window_size);
    let spectrum = if full { spectrum } else { spectrum.half() };
    let peak = spectrum.peak();

    match format {
        OutputFormat::Table => {
            write!(
                out,
                "# trame {index} : {} échantillons",
                frame.sample_count()
            )?;
            if let Some(p) = peak {
                write!(
                    out,
                    ", pic {:.1} Hz (bin {}, {:.4})",
                    p.frequency, p.index, p.magnitude
                )?;
            }
            writeln!(out)?;
            for (freq, mag) in spectrum.iter() {
                writeln!(out, "{freq:>10.2}  {mag:.6}")?;
            }
        }
        OutputFormat::Csv => {
            writeln!(out, "frame,frequency_hz,magnitude")?;
            for (freq, mag) in spectrum.iter() {
                writeln!(out, "{index},{freq},{mag}")?;
            }
        }
        OutputFormat::Json => {
            let report = FrameReport {
                frame: index,
                declared_length: frame.declared_length,
                sample_count: frame.sample_count(),
                trailing_bytes: frame.trailing_bytes(),
                sample_rate: spectrum_config.sample_rate,
                window_size: spectrum_config.window_size,
                peak: peak.map(PeakReport::from),
                bins: spectrum
                    .iter()
                    .map(|(frequency, magnitude)| BinReport {
                        frequency,
                        magnitude,
                    })
                    .collect(),
            };
            serde_json::to_writer(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
