/// One decoded FFT bin frame.
///
/// Created fresh by every read, fully materialized, never mutated afterwards.
/// `declared_length` is the byte count announced on the wire; `samples` holds
/// `declared_length / 4` values in stream order.
///
/// # Example
/// ```
/// use fb_core::frame::Frame;
/// let frame = Frame::new(8, vec![1.0, 2.0]);
/// assert_eq!(frame.sample_count(), 2);
/// assert_eq!(frame.trailing_bytes(), 0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Payload length announced by the length field, in bytes.
    pub declared_length: u32,
    /// Decoded little-endian `f32` values.
    pub samples: Vec<f32>,
}

impl Frame {
    /// Size in bytes of one encoded sample.
    pub const SAMPLE_SIZE: u32 = 4;

    /// Pair a declared wire length with its samples.
    ///
    /// The two are stored as given. [`Frame::trailing_bytes`] is derived from
    /// `declared_length` alone, `sample_count` from `samples` alone.
    #[must_use]
    pub fn new(declared_length: u32, samples: Vec<f32>) -> Self {
        Self {
            declared_length,
            samples,
        }
    }

    /// Number of decoded samples (`floor(declared_length / 4)`).
    #[must_use]
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Bytes announced by the length field but not part of any sample.
    ///
    /// Non-zero when the sender declared a length that is not a multiple of 4.
    /// Those bytes are left unread in the stream.
    #[must_use]
    pub fn trailing_bytes(&self) -> u32 {
        self.declared_length % Self::SAMPLE_SIZE
    }

    /// View the samples as magnitude bins of a `window_size`-point FFT.
    #[must_use]
    pub fn spectrum(&self, sample_rate: u32, window_size: usize) -> Spectrum<'_> {
        Spectrum::new(&self.samples, sample_rate, window_size)
    }
}

/// Largest bin of a spectrum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Peak {
    /// Bin index.
    pub index: usize,
    /// Bin center frequency in Hz.
    pub frequency: f32,
    /// Bin magnitude.
    pub magnitude: f32,
}

/// Frequency-axis view over a slice of magnitude bins.
///
/// Bin `i` sits at `sample_rate / window_size * i` Hz.
///
/// # Example
/// ```
/// use fb_core::frame::Spectrum;
/// let bins = [0.0f32; 1024];
/// let spectrum = Spectrum::new(&bins, 48_000, 1024);
/// assert!((spectrum.frequency(2) - 93.75).abs() < 1e-3);
/// assert_eq!(spectrum.half().len(), 512);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Spectrum<'a> {
    bins: &'a [f32],
    sample_rate: u32,
    window_size: usize,
}

impl<'a> Spectrum<'a> {
    #[must_use]
    pub fn new(bins: &'a [f32], sample_rate: u32, window_size: usize) -> Self {
        Self {
            bins,
            sample_rate,
            window_size,
        }
    }

    /// Width of one bin in Hz. Zero when `window_size` is zero.
    #[must_use]
    pub fn bin_width(&self) -> f32 {
        if self.window_size == 0 {
            return 0.0;
        }
        self.sample_rate as f32 / self.window_size as f32
    }

    #[inline(always)]
    #[must_use]
    pub fn frequency(&self, index: usize) -> f32 {
        self.bin_width() * index as f32
    }

    #[must_use]
    pub fn frequencies(&self) -> Vec<f32> {
        (0..self.bins.len()).map(|i| self.frequency(i)).collect()
    }

    /// The first `len / 2` bins, i.e. the non-mirrored half of a real-input FFT.
    #[must_use]
    pub fn half(&self) -> Spectrum<'a> {
        Spectrum {
            bins: &self.bins[..self.bins.len() / 2],
            ..*self
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// `(frequency, magnitude)` pairs in bin order.
    pub fn iter(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.bins
            .iter()
            .enumerate()
            .map(|(i, &mag)| (self.frequency(i), mag))
    }

    /// Largest bin. Ties keep the lowest index; NaN bins are ignored.
    #[must_use]
    pub fn peak(&self) -> Option<Peak> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &mag) in self.bins.iter().enumerate() {
            if mag.is_nan() {
                continue;
            }
            match best {
                Some((_, m)) if mag <= m => {}
                _ => best = Some((i, mag)),
            }
        }
        best.map(|(index, magnitude)| Peak {
            index,
            frequency: self.frequency(index),
            magnitude,
        })
    }
}
