use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use fb_core::config::LinkConfig;
use fb_signal::fft::{FftPipeline, Window};
use fb_signal::tone::ToneGenerator;
use fb_wire::{MAGIC, write_frame};

use crate::cli::SimulateArgs;

/// `fftbin simulate`: emit frames shaped like the board's.
///
/// Each frame is the full mirrored magnitude spectrum of one window of the
/// test tone, optionally preceded by random non-magic byte pairs.
///
/// # Errors
/// Returns an error if the output cannot be created or written.
pub fn run_simulate(args: &SimulateArgs, config: &LinkConfig) -> Result<()> {
    let mut sink: Box<dyn Write> = match args.out {
        Some(ref path) => Box::new(BufWriter::new(
            File::create(path)
                .with_context(|| format!("Impossible de créer {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };
    write_frames(&mut sink, args, config)?;
    if let Some(ref path) = args.out {
        log::info!("{} trames écrites dans {}", args.frames, path.display());
    }
    Ok(())
}

pub(crate) fn write_frames<W: Write>(
    sink: &mut W,
    args: &SimulateArgs,
    config: &LinkConfig,
) -> Result<()> {
    let window = config.spectrum.window_size;
    let mut tone = ToneGenerator::new(config.spectrum.sample_rate, args.frequency, args.amplitude);
    let mut fft = FftPipeline::new(window, Window::Rectangular);
    let mut rng = fastrand::Rng::with_seed(args.seed);
    let mut block = vec![0.0f32; window];

    for i in 0..args.frames {
        write_noise(sink, &mut rng, args.noise_pairs)?;
        tone.fill(&mut block);
        let bins = fft.device_frame(&block);
        write_frame(sink, &bins).with_context(|| format!("Écriture de la trame {i} échouée"))?;
        log::debug!("Trame {i} : {} bins", bins.len());

        if args.interval_ms > 0 && i + 1 < args.frames {
            thread::sleep(Duration::from_millis(args.interval_ms));
        }
    }
    Ok(())
}

/// Random byte pairs in which no two adjacent bytes form the magic header.
///
/// A pair never starts with `MAGIC[1]` nor ends with `MAGIC[0]`, so the
/// header cannot appear inside a pair, across two pairs, or across the
/// boundary with the surrounding frames. Both resync modes skip it cleanly.
fn write_noise<W: Write>(sink: &mut W, rng: &mut fastrand::Rng, pairs: usize) -> Result<()> {
    let mut noise = Vec::with_capacity(pairs * 2);
    for _ in 0..pairs {
        let mut pair = [rng.u8(..), rng.u8(..)];
        while pair[0] == MAGIC[1] || pair[1] == MAGIC[0] || pair == MAGIC {
            pair = [rng.u8(..), rng.u8(..)];
        }
        noise.extend_from_slice(&pair);
    }
    sink.write_all(&noise)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use clap::Parser;
    use fb_core::config::ResyncMode;
    use fb_wire::{FrameReader, encoded_len};

    use super::*;
    use crate::cli::{Cli, Command};

    fn simulate_args(extra: &[&str]) -> SimulateArgs {
        let mut argv = vec!["fftbin", "simulate"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Simulate(args) => args,
            Command::Read(_) => panic!("expected simulate"),
        }
    }

    #[test]
    fn frames_decode_to_reference_peak() {
        let args = simulate_args(&["--frames", "2", "--noise-pairs", "16"]);
        let config = LinkConfig::default();
        let mut bytes = Vec::new();
        write_frames(&mut bytes, &args, &config).unwrap();
        assert_eq!(bytes.len(), 2 * (32 + encoded_len(1024)));

        let mut reader = FrameReader::new(Cursor::new(bytes));
        for _ in 0..2 {
            let frame = reader.read_frame().unwrap();
            assert_eq!(frame.sample_count(), 1024);
            let peak = frame.spectrum(48_000, 1024).half().peak().unwrap();
            assert_eq!(peak.index, 213);
        }
        assert_eq!(reader.stats().skipped_bytes, 64);
    }

    #[test]
    fn sliding_resync_decodes_every_simulated_frame() {
        let args = simulate_args(&["--frames", "3", "--noise-pairs", "64", "--seed", "11"]);
        let config = LinkConfig::default();
        let mut bytes = Vec::new();
        write_frames(&mut bytes, &args, &config).unwrap();

        let mut reader = FrameReader::new(Cursor::new(bytes)).with_resync(ResyncMode::Sliding);
        for _ in 0..3 {
            let frame = reader.read_frame().unwrap();
            assert_eq!(frame.sample_count(), 1024);
            let peak = frame.spectrum(48_000, 1024).half().peak().unwrap();
            assert_eq!(peak.index, 213);
        }
        assert_eq!(reader.stats().skipped_bytes, 3 * 128);
    }

    #[test]
    fn noise_never_contains_magic_at_any_offset() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut noise = vec![MAGIC[0]];
        write_noise(&mut noise, &mut rng, 4096).unwrap();
        noise.push(MAGIC[0]);
        assert!(noise.windows(2).all(|window| window != MAGIC));
    }
}
