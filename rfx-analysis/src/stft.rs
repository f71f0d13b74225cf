//! Short-Time Fourier Transform building blocks for phase-vocoder effects.
//!
//! A [`Stft`] owns a window and a planned forward/inverse FFT pair of one
//! size. `analyze` windows a block and produces the positive-frequency half
//! of its spectrum in polar form; `synthesize` rebuilds the full spectrum by
//! Hermitian symmetry, inverts it and applies the synthesis window so the
//! caller only has to overlap-add.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;
use tracing::trace;

/// Analysis/synthesis window shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectralWindow {
    /// Periodic Hann (raised cosine), sums to a constant at 75% overlap
    #[default]
    Hann,
    /// `(1 - x^2)^1.25` over `x` in [-1, 1], used for extreme stretching
    Paulstretch,
}

impl SpectralWindow {
    /// Sample the window into `size` points
    pub fn build(self, size: usize) -> Vec<f32> {
        match self {
            SpectralWindow::Hann => (0..size)
                .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
                .collect(),
            SpectralWindow::Paulstretch => {
                let denom = (size.max(2) - 1) as f32;
                (0..size)
                    .map(|i| {
                        let x = -1.0 + 2.0 * i as f32 / denom;
                        (1.0 - x * x).max(0.0).powf(1.25)
                    })
                    .collect()
            }
        }
    }
}

/// Magnitude/phase spectrum of one analysis frame (positive bins only)
#[derive(Debug, Clone, Default)]
pub struct SpectralFrame {
    pub magnitudes: Vec<f32>,
    pub phases: Vec<f32>,
}

impl SpectralFrame {
    /// Create a silent frame with `num_bins` bins
    pub fn new(num_bins: usize) -> Self {
        Self {
            magnitudes: vec![0.0; num_bins],
            phases: vec![0.0; num_bins],
        }
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.magnitudes.len()
    }
}

/// Windowed FFT analysis and resynthesis of fixed-size blocks
pub struct Stft {
    size: usize,
    window: Vec<f32>,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    /// Working buffer for FFT (avoid allocation per frame)
    work: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    /// Normalization factor for IFFT
    norm_factor: f32,
}

impl Stft {
    /// Create a new STFT processor. `size` must be even and at least 2.
    pub fn new(size: usize, window: SpectralWindow) -> Self {
        debug_assert!(size >= 2 && size % 2 == 0, "STFT size must be even");

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(size);
        let inverse = planner.plan_fft_inverse(size);
        let scratch_len = forward
            .get_inplace_scratch_len()
            .max(inverse.get_inplace_scratch_len());

        trace!(size, ?window, "planned STFT");

        Self {
            size,
            window: window.build(size),
            forward,
            inverse,
            work: vec![Complex::new(0.0, 0.0); size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            norm_factor: 1.0 / size as f32,
        }
    }

    /// FFT size
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of positive frequency bins (size/2 + 1)
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.size / 2 + 1
    }

    /// The window applied on both analysis and synthesis
    #[inline]
    pub fn window(&self) -> &[f32] {
        &self.window
    }

    /// Window `input` (exactly `size` samples), transform it and store the
    /// positive-frequency spectrum in `frame`
    pub fn analyze(&mut self, input: &[f32], frame: &mut SpectralFrame) {
        debug_assert_eq!(input.len(), self.size);
        debug_assert_eq!(frame.num_bins(), self.num_bins());

        for ((w, &x), &win) in self.work.iter_mut().zip(input).zip(&self.window) {
            *w = Complex::new(x * win, 0.0);
        }

        self.forward
            .process_with_scratch(&mut self.work, &mut self.scratch);

        for (k, bin) in self.work.iter().take(self.num_bins()).enumerate() {
            frame.magnitudes[k] = bin.norm();
            frame.phases[k] = bin.arg();
        }
    }

    /// Rebuild a block from `frame`, apply the synthesis window and write
    /// `size` samples into `output`
    pub fn synthesize(&mut self, frame: &SpectralFrame, output: &mut [f32]) {
        debug_assert_eq!(output.len(), self.size);
        debug_assert_eq!(frame.num_bins(), self.num_bins());

        let num_bins = self.num_bins();
        for k in 1..num_bins - 1 {
            self.work[k] = Complex::from_polar(frame.magnitudes[k], frame.phases[k]);
        }
        // DC and Nyquist are real: snap their phase to 0 or π
        for k in [0, num_bins - 1] {
            let magnitude = frame.magnitudes[k];
            let real = if frame.phases[k].cos() < 0.0 {
                -magnitude
            } else {
                magnitude
            };
            self.work[k] = Complex::new(real, 0.0);
        }
        // Hermitian symmetry for a real-valued result
        for k in 1..self.size / 2 {
            self.work[self.size - k] = self.work[k].conj();
        }

        self.inverse
            .process_with_scratch(&mut self.work, &mut self.scratch);

        for ((out, bin), &win) in output.iter_mut().zip(&self.work).zip(&self.window) {
            *out = bin.re * win * self.norm_factor;
        }
    }
}

/// Growable overlap-add accumulator
#[derive(Debug, Clone, Default)]
pub struct OverlapAdd {
    buffer: Vec<f32>,
}

impl OverlapAdd {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `frame` starting at `offset`, growing the buffer as needed
    pub fn add(&mut self, offset: usize, frame: &[f32]) {
        let end = offset + frame.len();
        if self.buffer.len() < end {
            self.buffer.resize(end, 0.0);
        }
        for (acc, &x) in self.buffer[offset..end].iter_mut().zip(frame) {
            *acc += x;
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.buffer
    }
}

/// Wrap phase to [-π, π]
#[inline]
pub fn wrap_phase(phase: f32) -> f32 {
    const TWO_PI: f32 = 2.0 * PI;
    let wrapped = phase - TWO_PI * ((phase + PI) / TWO_PI).floor();
    if wrapped > PI {
        wrapped - TWO_PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hann_overlap_sums_to_constant() {
        // Squared Hann at 75% overlap sums to 1.5
        let size = 256;
        let hop = size / 4;
        let window = SpectralWindow::Hann.build(size);
        for n in 0..hop {
            let sum: f32 = (0..4).map(|j| window[n + j * hop].powi(2)).sum();
            assert!((sum - 1.5).abs() < 1e-4, "sum at {} = {}", n, sum);
        }
    }

    #[test]
    fn test_paulstretch_window_shape() {
        let window = SpectralWindow::Paulstretch.build(65);
        assert!(window[0].abs() < 1e-6);
        assert!(window[64].abs() < 1e-6);
        assert!((window[32] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_stft_roundtrip() {
        let size = 512;
        let mut stft = Stft::new(size, SpectralWindow::Hann);
        let mut frame = SpectralFrame::new(stft.num_bins());

        let input: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / 48000.0).sin() * 0.5)
            .collect();
        let mut output = vec![0.0; size];

        stft.analyze(&input, &mut frame);
        stft.synthesize(&frame, &mut output);

        // Result is the input with the window applied twice
        for i in 0..size {
            let expected = input[i] * stft.window()[i].powi(2);
            assert!(
                (output[i] - expected).abs() < 1e-4,
                "sample {}: {} vs {}",
                i,
                output[i],
                expected
            );
        }
    }

    #[test]
    fn test_sine_peaks_in_expected_bin() {
        let size = 1024;
        let mut stft = Stft::new(size, SpectralWindow::Hann);
        let mut frame = SpectralFrame::new(stft.num_bins());

        // Exactly bin 32
        let input: Vec<f32> = (0..size)
            .map(|i| (2.0 * PI * 32.0 * i as f32 / size as f32).sin())
            .collect();
        stft.analyze(&input, &mut frame);

        let peak_bin = frame
            .magnitudes
            .iter()
            .enumerate()
            .fold((0, 0.0f32), |best, (k, &m)| if m > best.1 { (k, m) } else { best })
            .0;
        assert_eq!(peak_bin, 32);
    }

    #[test]
    fn test_overlap_add_grows() {
        let mut ola = OverlapAdd::new();
        ola.add(0, &[1.0, 1.0]);
        ola.add(1, &[1.0, 1.0, 1.0]);
        assert_eq!(ola.as_slice(), &[1.0, 2.0, 1.0, 1.0]);
        assert_eq!(ola.len(), 4);
    }

    #[test]
    fn test_edge_bins_synthesize_as_real() {
        let size = 64;
        let mut stft = Stft::new(size, SpectralWindow::Paulstretch);
        let window = stft.window().to_vec();
        let mut frame = SpectralFrame::new(stft.num_bins());
        let mut output = vec![0.0; size];

        // DC with an arbitrary phase keeps its full magnitude
        frame.magnitudes[0] = size as f32;
        frame.phases[0] = 1.0;
        stft.synthesize(&frame, &mut output);
        for (out, win) in output.iter().zip(&window) {
            assert!((out - win).abs() < 1e-4);
        }

        frame.phases[0] = 2.5;
        stft.synthesize(&frame, &mut output);
        for (out, win) in output.iter().zip(&window) {
            assert!((out + win).abs() < 1e-4);
        }

        // Nyquist alone alternates sign every sample
        frame.magnitudes[0] = 0.0;
        frame.magnitudes[size / 2] = size as f32;
        frame.phases[size / 2] = 0.3;
        stft.synthesize(&frame, &mut output);
        for (i, (out, win)) in output.iter().zip(&window).enumerate() {
            let expected = if i % 2 == 0 { *win } else { -win };
            assert!((out - expected).abs() < 1e-4, "sample {}", i);
        }
    }

    #[test]
    fn test_phase_wrap() {
        assert!(wrap_phase(0.0).abs() < 0.001);
        assert!((wrap_phase(PI + 0.1) - (-PI + 0.1)).abs() < 0.001);
        assert!((wrap_phase(-PI - 0.1) - (PI - 0.1)).abs() < 0.001);
        let wrapped = wrap_phase(7.0 * PI);
        assert!((wrapped.abs() - PI).abs() < 0.001);
    }
}
