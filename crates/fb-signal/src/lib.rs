// Test-signal generation and FFT magnitude spectra, shaped like what the board transmits.

pub mod fft;
pub mod tone;
