use std::fs::File;
use std::io::{self, BufReader, Read};
use std::time::Duration;

use anyhow::{Context, Result};
use fb_core::config::SerialConfig;
use serialport::{DataBits, FlowControl, Parity, StopBits};

use crate::cli::Transport;

/// Byte source handed to the frame reader. Closed when dropped.
pub type Source = BufReader<Box<dyn Read + Send>>;

/// Open the transport selected on the command line.
///
/// Serial ports are opened 8N1 without flow control, with `timeout_ms` as
/// the per-read timeout so the reader can observe its deadline and Ctrl-C.
///
/// # Errors
/// Returns an error if the port or file cannot be opened.
pub fn open(transport: &Transport, serial: &SerialConfig) -> Result<Source> {
    let inner: Box<dyn Read + Send> = match transport {
        Transport::Serial(port) => {
            let handle = serialport::new(port.as_str(), serial.baud_rate)
                .data_bits(DataBits::Eight)
                .parity(Parity::None)
                .stop_bits(StopBits::One)
                .flow_control(FlowControl::None)
                .timeout(Duration::from_millis(serial.timeout_ms))
                .open()
                .with_context(|| format!("Impossible d'ouvrir le port série {port}"))?;
            log::info!("Port série {port} ouvert à {} bauds", serial.baud_rate);
            Box::new(handle)
        }
        Transport::File(path) => {
            let file = File::open(path)
                .with_context(|| format!("Impossible d'ouvrir {}", path.display()))?;
            log::info!("Lecture de la capture {}", path.display());
            Box::new(file)
        }
        Transport::Stdin => Box::new(io::stdin()),
    };
    Ok(BufReader::new(inner))
}
