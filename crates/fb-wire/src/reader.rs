use std::io::{ErrorKind, Read};
use std::thread;
use std::time::Duration;

use fb_core::config::ResyncMode;
use fb_core::frame::Frame;

use crate::deadline::{CancelToken, Deadline};
use crate::error::FrameError;

/// Frame start marker.
pub const MAGIC: [u8; 2] = [0xAA, 0xBB];
/// Size of the `u32` length field that follows the marker.
pub const LENGTH_FIELD_SIZE: usize = 4;

const SAMPLE_SIZE: usize = Frame::SAMPLE_SIZE as usize;

// The length field is untrusted; grow past this only as bytes actually arrive.
const MAX_PREALLOC_SAMPLES: usize = 64 * 1024;

// Pause before retrying a non-blocking source that had nothing to give.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(1);

/// Position of the reader inside the frame it is decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReaderState {
    SeekingHeader,
    ReadingLength,
    ReadingSamples,
    Done,
}

/// Counters accumulated across calls on one reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReadStats {
    /// Frames decoded successfully.
    pub frames: u64,
    /// Bytes discarded while searching for the magic header.
    pub skipped_bytes: u64,
}

/// Blocking decoder for one frame at a time.
///
/// Owns its source for the duration of each call. Pass `&mut source` to keep
/// the source afterwards; any bytes the frame did not declare stay unread.
///
/// # Example
/// ```
/// use std::io::Cursor;
/// use fb_wire::FrameReader;
///
/// let mut bytes = vec![0xAA, 0xBB, 8, 0, 0, 0];
/// bytes.extend_from_slice(&1.0f32.to_le_bytes());
/// bytes.extend_from_slice(&2.0f32.to_le_bytes());
///
/// let mut reader = FrameReader::new(Cursor::new(bytes));
/// let frame = reader.read_frame().unwrap();
/// assert_eq!(frame.samples, vec![1.0, 2.0]);
/// ```
pub struct FrameReader<R> {
    source: R,
    resync: ResyncMode,
    timeout: Option<Duration>,
    cancel: Option<CancelToken>,
    state: ReaderState,
    stats: ReadStats,
}

impl<R: Read> FrameReader<R> {
    #[must_use]
    pub fn new(source: R) -> Self {
        Self {
            source,
            resync: ResyncMode::default(),
            timeout: None,
            cancel: None,
            state: ReaderState::SeekingHeader,
            stats: ReadStats::default(),
        }
    }

    #[must_use]
    pub fn with_resync(mut self, resync: ResyncMode) -> Self {
        self.resync = resync;
        self
    }

    /// Give every `read_frame` call a wall-clock budget.
    ///
    /// Only enforced when the source returns control, i.e. on data, on
    /// `TimedOut`/`WouldBlock`, or on `Interrupted`.
    #[must_use]
    pub fn with_timeout(mut self, budget: Duration) -> Self {
        self.timeout = Some(budget);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Synchronize on the next header and decode exactly one frame.
    ///
    /// # Errors
    /// - [`FrameError::StreamExhausted`] if the stream ends before a header
    /// - [`FrameError::TruncatedFrame`] if it ends inside the length or payload
    /// - [`FrameError::TimedOut`] / [`FrameError::Cancelled`] when the budget
    ///   or token stops the read
    /// - [`FrameError::Io`] for any other transport error
    pub fn read_frame(&mut self) -> Result<Frame, FrameError> {
        let deadline = self.timeout.map(Deadline::after);
        self.state = ReaderState::SeekingHeader;

        self.seek_header(deadline.as_ref())?;

        self.state = ReaderState::ReadingLength;
        let mut length = [0u8; LENGTH_FIELD_SIZE];
        self.fill(&mut length, deadline.as_ref(), 0)?;
        let declared_length = u32::from_le_bytes(length);
        let sample_count = declared_length as usize / SAMPLE_SIZE;

        if !declared_length.is_multiple_of(Frame::SAMPLE_SIZE) {
            log::warn!(
                "Longueur déclarée {declared_length} non multiple de 4, {} octets ignorés",
                declared_length % Frame::SAMPLE_SIZE
            );
        }

        self.state = ReaderState::ReadingSamples;
        let mut samples = Vec::with_capacity(sample_count.min(MAX_PREALLOC_SAMPLES));
        let mut word = [0u8; SAMPLE_SIZE];
        for i in 0..sample_count {
            self.fill(
                &mut word,
                deadline.as_ref(),
                LENGTH_FIELD_SIZE + i * SAMPLE_SIZE,
            )?;
            samples.push(f32::from_le_bytes(word));
        }

        self.state = ReaderState::Done;
        self.stats.frames += 1;
        log::debug!("Trame décodée : {sample_count} échantillons");
        Ok(Frame::new(declared_length, samples))
    }

    /// Where the last call stopped. `Done` after a successful read.
    #[must_use]
    pub fn state(&self) -> ReaderState {
        self.state
    }

    #[must_use]
    pub fn stats(&self) -> ReadStats {
        self.stats
    }

    fn seek_header(&mut self, deadline: Option<&Deadline>) -> Result<(), FrameError> {
        let mut skipped: u64 = 0;

        match self.resync {
            ResyncMode::Pair => loop {
                let mut pair = [0u8; 2];
                self.fill(&mut pair, deadline, 0)?;
                if pair == MAGIC {
                    break;
                }
                skipped += 2;
            },
            ResyncMode::Sliding => {
                let mut prev: Option<u8> = None;
                loop {
                    let mut byte = [0u8; 1];
                    self.fill(&mut byte, deadline, 0)?;
                    if prev == Some(MAGIC[0]) && byte[0] == MAGIC[1] {
                        break;
                    }
                    if prev.is_some() {
                        skipped += 1;
                    }
                    prev = Some(byte[0]);
                }
            }
        }

        self.stats.skipped_bytes += skipped;
        if skipped > 0 {
            log::debug!("En-tête trouvé après {skipped} octets ignorés");
        }
        Ok(())
    }

    /// Read exactly `buf.len()` bytes, classifying end of stream by state.
    ///
    /// `received` is how many bytes of the frame body came before `buf`.
    fn fill(
        &mut self,
        buf: &mut [u8],
        deadline: Option<&Deadline>,
        received: usize,
    ) -> Result<(), FrameError> {
        let mut filled = 0;
        while filled < buf.len() {
            self.check_budget(deadline)?;
            match self.source.read(&mut buf[filled..]) {
                Ok(0) => return Err(self.end_of_stream(received + filled)),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    // Per-read timeout of the transport: loop back to re-check the budget.
                    if e.kind() == ErrorKind::WouldBlock {
                        thread::sleep(WOULD_BLOCK_BACKOFF);
                    }
                }
                Err(e) => return Err(FrameError::Io(e)),
            }
        }
        Ok(())
    }

    fn check_budget(&self, deadline: Option<&Deadline>) -> Result<(), FrameError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(FrameError::Cancelled);
        }
        if deadline.is_some_and(Deadline::is_expired) {
            return Err(FrameError::TimedOut);
        }
        Ok(())
    }

    fn end_of_stream(&self, received: usize) -> FrameError {
        match self.state {
            ReaderState::SeekingHeader => FrameError::StreamExhausted,
            state => FrameError::TruncatedFrame { state, received },
        }
    }
}

/// Decode one frame from `source` with the default pair-wise resync.
///
/// # Errors
/// See [`FrameReader::read_frame`].
///
/// # Example
/// ```
/// use std::io::Cursor;
/// let mut source = Cursor::new(vec![0xAA, 0xBB, 0, 0, 0, 0]);
/// let frame = fb_wire::read_frame(&mut source).unwrap();
/// assert!(frame.is_empty());
/// ```
pub fn read_frame<R: Read>(source: &mut R) -> Result<Frame, FrameError> {
    FrameReader::new(source).read_frame()
}
