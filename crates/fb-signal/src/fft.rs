use std::sync::Arc;

use realfft::num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

/// Window applied before the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Window {
    /// No windowing. This is what the board does.
    #[default]
    Rectangular,
    Hann,
}

/// FFT pipeline: forward real FFT using realfft, magnitude output.
///
/// Pre-allocates the FFT plan and scratch buffers; only the returned
/// magnitude vector is allocated per call. Magnitudes are not normalized,
/// matching `arm_cmplx_mag_f32` on the board.
///
/// # Example
/// ```
/// use fb_signal::fft::{FftPipeline, Window};
/// let mut fft = FftPipeline::new(256, Window::Rectangular);
/// let spectrum = fft.magnitudes(&vec![0.0f32; 256]);
/// assert_eq!(spectrum.len(), 129); // N/2 + 1
/// ```
pub struct FftPipeline {
    fft_size: usize,
    input_buf: Vec<f32>,
    spectrum_buf: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    plan: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
}

impl FftPipeline {
    /// Create a new FFT pipeline with the given window size.
    ///
    /// # Panics
    /// Panics if `size` is 0.
    #[must_use]
    pub fn new(size: usize, window: Window) -> Self {
        assert!(size > 0, "FFT size must be > 0");

        let mut planner = RealFftPlanner::<f32>::new();
        let plan = planner.plan_fft_forward(size);

        let input_buf = plan.make_input_vec();
        let spectrum_buf = plan.make_output_vec();
        let scratch = plan.make_scratch_vec();

        let window: Vec<f32> = match window {
            Window::Rectangular => vec![1.0; size],
            Window::Hann if size == 1 => vec![1.0],
            Window::Hann => (0..size)
                .map(|i| {
                    0.5 * (1.0
                        - (2.0 * std::f32::consts::PI * i as f32 / (size as f32 - 1.0)).cos())
                })
                .collect(),
        };

        Self {
            fft_size: size,
            input_buf,
            spectrum_buf,
            scratch,
            plan,
            window,
        }
    }

    /// Magnitude of bins `0..=N/2`.
    ///
    /// `samples` shorter than the FFT size are zero-padded, longer ones truncated.
    pub fn magnitudes(&mut self, samples: &[f32]) -> Vec<f32> {
        let n = self.fft_size.min(samples.len());

        for (i, slot) in self.input_buf.iter_mut().enumerate() {
            *slot = if i < n {
                samples[i] * self.window[i]
            } else {
                0.0
            };
        }

        if let Err(e) = self.plan.process_with_scratch(
            &mut self.input_buf,
            &mut self.spectrum_buf,
            &mut self.scratch,
        ) {
            log::warn!("FFT échouée : {e}");
            return vec![0.0; self.spectrum_buf.len()];
        }

        self.spectrum_buf
            .iter()
            .map(|c| (c.re * c.re + c.im * c.im).sqrt())
            .collect()
    }

    /// Full `N`-bin magnitude spectrum with the upper half mirrored.
    ///
    /// This is the payload layout the board puts on the wire.
    ///
    /// # Example
    /// ```
    /// use fb_signal::fft::{FftPipeline, Window};
    /// let mut fft = FftPipeline::new(8, Window::Rectangular);
    /// let bins = fft.device_frame(&[1.0; 8]);
    /// assert_eq!(bins.len(), 8);
    /// assert!((bins[0] - 8.0).abs() < 1e-4);
    /// ```
    pub fn device_frame(&mut self, samples: &[f32]) -> Vec<f32> {
        let half = self.magnitudes(samples);
        (0..self.fft_size)
            .map(|k| {
                if k < half.len() {
                    half[k]
                } else {
                    half[self.fft_size - k]
                }
            })
            .collect()
    }
}
