/// Phase-continuous sine generator.
///
/// Stands in for the board's fixed test input (a 10 kHz tone sampled at 48 kHz).
///
/// # Example
/// ```
/// use fb_signal::tone::ToneGenerator;
/// let mut tone = ToneGenerator::new(48_000, 10_000.0, 1.0);
/// let block = tone.generate(1024);
/// assert_eq!(block.len(), 1024);
/// ```
#[derive(Clone, Debug)]
pub struct ToneGenerator {
    sample_rate: u32,
    frequency: f32,
    amplitude: f32,
    phase: f32,
}

impl ToneGenerator {
    #[must_use]
    pub fn new(sample_rate: u32, frequency: f32, amplitude: f32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frequency,
            amplitude,
            phase: 0.0,
        }
    }

    /// Fill `out` with the next samples, continuing from the previous call.
    pub fn fill(&mut self, out: &mut [f32]) {
        let step = std::f32::consts::TAU * self.frequency / self.sample_rate as f32;
        for slot in out.iter_mut() {
            *slot = self.amplitude * self.phase.sin();
            self.phase = (self.phase + step) % std::f32::consts::TAU;
        }
    }

    #[must_use]
    pub fn generate(&mut self, len: usize) -> Vec<f32> {
        let mut out = vec![0.0; len];
        self.fill(&mut out);
        out
    }
}
