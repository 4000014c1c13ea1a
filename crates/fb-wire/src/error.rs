use thiserror::Error;

use crate::reader::ReaderState;

/// Errors raised while reading or writing a frame.
#[derive(Error, Debug)]
pub enum FrameError {
    /// The stream ended while the reader was still looking for `AA BB`.
    #[error("Flux épuisé avant l'en-tête de trame")]
    StreamExhausted,

    /// The stream ended after the header matched. Partial data is dropped.
    #[error("Trame tronquée pendant {state:?} : {received} octets reçus après l'en-tête")]
    TruncatedFrame {
        /// Where the reader was when the stream ended.
        state: ReaderState,
        /// Bytes read after the magic header before the stream ended.
        received: usize,
    },

    /// The deadline expired before a full frame arrived.
    #[error("Délai dépassé en attente de trame")]
    TimedOut,

    /// The cancellation token fired.
    #[error("Lecture de trame annulée")]
    Cancelled,

    /// Payload does not fit in the `u32` length field.
    #[error("Charge utile trop grande : {samples} échantillons")]
    PayloadTooLarge {
        /// Number of samples that were offered.
        samples: usize,
    },

    /// Any other transport failure.
    #[error("Erreur d'E/S : {0}")]
    Io(#[from] std::io::Error),
}
