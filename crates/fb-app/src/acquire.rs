use std::io::{self, Read, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use fb_core::config::LinkConfig;
use fb_wire::{CancelToken, FrameError, FrameReader};

use crate::cli::{ReadArgs, Transport};
use crate::output;
use crate::transport;

/// `fftbin read`: open the transport, decode frames, print their spectra.
///
/// The transport is owned by this function and closed on every return path.
///
/// # Errors
/// Returns an error if the transport cannot be opened, a frame fails to
/// decode (outside `--follow` end-of-stream), or output fails.
pub fn run_read(args: &ReadArgs, mut config: LinkConfig) -> Result<()> {
    args.apply(&mut config);
    config.validate()?;

    let transport = args.transport(&config);
    let source = transport::open(&transport, &config.serial)?;

    let token = CancelToken::new();
    let handler_token = token.clone();
    let action = interrupt_action(&transport);
    if let Err(e) = ctrlc::set_handler(move || {
        if on_interrupt(action, &handler_token) {
            std::process::exit(130);
        }
    }) {
        log::warn!("Gestionnaire Ctrl-C non installé : {e}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    read_frames(source, args, &config, token, &mut out)
}

/// What Ctrl-C does while a read is in progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum InterruptAction {
    /// Reads time out periodically, so the reader sees the token and stops cleanly.
    Cancel,
    /// `read` may block until the producer writes or closes. The handler
    /// restarts it, so leave the process instead.
    Exit,
}

pub(crate) fn interrupt_action(transport: &Transport) -> InterruptAction {
    match transport {
        Transport::Serial(_) => InterruptAction::Cancel,
        Transport::File(_) | Transport::Stdin => InterruptAction::Exit,
    }
}

/// Handle one Ctrl-C. Returns `true` when the process must exit now,
/// which is also the case for a second Ctrl-C after a cancel.
pub(crate) fn on_interrupt(action: InterruptAction, token: &CancelToken) -> bool {
    if action == InterruptAction::Exit || token.is_cancelled() {
        return true;
    }
    token.cancel();
    false
}

/// Read loop, separated from transport acquisition for testing.
pub(crate) fn read_frames<R: Read, W: Write>(
    source: R,
    args: &ReadArgs,
    config: &LinkConfig,
    token: CancelToken,
    out: &mut W,
) -> Result<()> {
    let mut reader = FrameReader::new(source)
        .with_resync(config.reader.resync)
        .with_cancel(token);
    if let Some(ms) = config.reader.deadline_ms {
        reader = reader.with_timeout(Duration::from_millis(ms));
    }

    let mut index: u32 = 0;
    while args.follow || index < args.count {
        let frame = match reader.read_frame() {
            Ok(frame) => frame,
            Err(FrameError::StreamExhausted | FrameError::Cancelled) if args.follow => {
                log::info!("Fin de lecture après {index} trames");
                break;
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Lecture de la trame {index} échouée"));
            }
        };
        log::info!(
            "Trame {index} : {} octets déclarés, {} échantillons",
            frame.declared_length,
            frame.sample_count()
        );
        output::render(out, index, &frame, &config.spectrum, args.format, args.full)?;
        index += 1;
    }

    let stats = reader.stats();
    log::debug!(
        "{} trames décodées, {} octets ignorés",
        stats.frames,
        stats.skipped_bytes
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;

    use clap::Parser;
    use fb_wire::encode_frame;

    use super::*;
    use crate::cli::{Cli, Command};

    fn read_args(extra: &[&str]) -> ReadArgs {
        let mut argv = vec!["fftbin", "read", "--stdin"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Read(args) => args,
            Command::Simulate(_) => panic!("expected read"),
        }
    }

    fn two_frames() -> Vec<u8> {
        let mut bytes = vec![0x01, 0x02];
        bytes.extend(encode_frame(&[1.0, 2.0, 3.0, 4.0]).unwrap());
        bytes.extend(encode_frame(&[4.0, 3.0, 2.0, 1.0]).unwrap());
        bytes
    }

    #[test]
    fn reads_requested_count() {
        let args = read_args(&["--count", "2", "--format", "csv"]);
        let mut out = Vec::new();
        read_frames(
            Cursor::new(two_frames()),
            &args,
            &LinkConfig::default(),
            CancelToken::new(),
            &mut out,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("frame,frequency_hz,magnitude").count(), 2);
    }

    #[test]
    fn follow_stops_cleanly_at_end_of_stream() {
        let args = read_args(&["--follow", "--format", "json"]);
        let mut out = Vec::new();
        read_frames(
            Cursor::new(two_frames()),
            &args,
            &LinkConfig::default(),
            CancelToken::new(),
            &mut out,
        )
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);
    }

    #[test]
    fn missing_frame_is_an_error_without_follow() {
        let args = read_args(&["--count", "3"]);
        let result = read_frames(
            Cursor::new(two_frames()),
            &args,
            &LinkConfig::default(),
            CancelToken::new(),
            &mut Vec::new(),
        );
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FrameError>(),
            Some(FrameError::StreamExhausted)
        ));
    }

    #[test]
    fn truncated_frame_fails_even_with_follow() {
        let mut bytes = encode_frame(&[1.0]).unwrap();
        bytes.extend_from_slice(&[0xAA, 0xBB, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00]);
        let args = read_args(&["--follow"]);
        let result = read_frames(
            Cursor::new(bytes),
            &args,
            &LinkConfig::default(),
            CancelToken::new(),
            &mut Vec::new(),
        );
        assert!(matches!(
            result.unwrap_err().downcast_ref::<FrameError>(),
            Some(FrameError::TruncatedFrame { .. })
        ));
    }

    #[test]
    fn only_serial_reads_are_cancelled_in_place() {
        assert_eq!(
            interrupt_action(&Transport::Serial("/dev/ttyUSB0".into())),
            InterruptAction::Cancel
        );
        assert_eq!(interrupt_action(&Transport::Stdin), InterruptAction::Exit);
        assert_eq!(
            interrupt_action(&Transport::File("cap.bin".into())),
            InterruptAction::Exit
        );
    }

    #[test]
    fn stdin_interrupt_exits_immediately() {
        let token = CancelToken::new();
        assert!(on_interrupt(interrupt_action(&Transport::Stdin), &token));
    }

    #[test]
    fn serial_interrupt_cancels_then_exits_on_repeat() {
        let token = CancelToken::new();
        let action = interrupt_action(&Transport::Serial("/dev/ttyUSB0".into()));
        assert!(!on_interrupt(action, &token));
        assert!(token.is_cancelled());
        assert!(on_interrupt(action, &token));
    }

    #[test]
    fn cancelled_token_ends_follow() {
        let token = CancelToken::new();
        token.cancel();
        let args = read_args(&["--follow"]);
        let mut out = Vec::new();
        read_frames(
            Cursor::new(two_frames()),
            &args,
            &LinkConfig::default(),
            token,
            &mut out,
        )
        .unwrap();
        assert!(out.is_empty());
    }
}
