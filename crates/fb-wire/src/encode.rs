use std::io::Write;

use crate::error::FrameError;
use crate::reader::{LENGTH_FIELD_SIZE, MAGIC};

/// Total wire size of a frame carrying `sample_count` samples.
#[inline(always)]
#[must_use]
pub const fn encoded_len(sample_count: usize) -> usize {
    MAGIC.len() + LENGTH_FIELD_SIZE + sample_count * 4
}

fn declared_length(samples: &[f32]) -> Result<u32, FrameError> {
    samples
        .len()
        .checked_mul(4)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(FrameError::PayloadTooLarge {
            samples: samples.len(),
        })
}

/// Encode `samples` as one frame: magic, `u32` LE byte length, `f32` LE payload.
///
/// # Errors
/// Returns [`FrameError::PayloadTooLarge`] if the byte length overflows `u32`.
///
/// # Example
/// ```
/// use fb_wire::encode_frame;
/// let bytes = encode_frame(&[1.0]).unwrap();
/// assert_eq!(bytes, vec![0xAA, 0xBB, 4, 0, 0, 0, 0x00, 0x00, 0x80, 0x3F]);
/// ```
pub fn encode_frame(samples: &[f32]) -> Result<Vec<u8>, FrameError> {
    let length = declared_length(samples)?;
    let mut out = Vec::with_capacity(encoded_len(samples.len()));
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&length.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    Ok(out)
}

/// Encode and write one frame, then flush.
///
/// # Errors
/// Returns [`FrameError::PayloadTooLarge`] or the writer's I/O error.
pub fn write_frame<W: Write>(writer: &mut W, samples: &[f32]) -> Result<(), FrameError> {
    let bytes = encode_frame(samples)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_reference_bytes() {
        let bytes = encode_frame(&[1.0, 2.0]).unwrap();
        assert_eq!(&bytes[..6], &[0xAA, 0xBB, 0x08, 0x00, 0x00, 0x00]);
        assert_eq!(&bytes[6..10], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[10..], &2.0f32.to_le_bytes());
        assert_eq!(bytes.len(), encoded_len(2));
    }

    #[test]
    fn empty_payload_has_zero_length() {
        assert_eq!(encode_frame(&[]).unwrap(), vec![0xAA, 0xBB, 0, 0, 0, 0]);
    }

    #[test]
    fn write_frame_appends_to_writer() {
        let mut sink = vec![0x55];
        write_frame(&mut sink, &[0.5]).unwrap();
        assert_eq!(sink.len(), 1 + encoded_len(1));
        assert_eq!(&sink[1..3], &MAGIC);
    }
}
