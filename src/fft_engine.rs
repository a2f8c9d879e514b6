//! Single-line FFT power spectrum
//!
//! [`FftEngine`] computes one spectrogram line at a time: window the input,
//! run a forward complex FFT, and convert to a DC-centered log-power (or
//! linear-magnitude) row.
//!
//! ## Signal flow
//!
//! ```text
//! input → [window] → [FFT] → |·|²/N² → 10·log10(·) → dB line (DC centered)
//! ```
//!
//! DC centering uses the index map `k = i XOR (N/2)`: for power-of-two N,
//! flipping the top bit of the bin index is a branchless equivalent of
//! fftshift.
//!
//! Plan creation and destruction go through one process-wide planner lock;
//! execution on distinct plans is concurrent and lock-free, so each worker
//! owns its own `FftEngine`.

use std::sync::{Arc, Mutex, OnceLock};

use rustfft::{Fft, FftPlanner};

use crate::types::{Complex32, EngineError, EngineResult};
use crate::windows::Window;

/// Floor applied to normalized power before taking the log.
const POWER_FLOOR: f32 = 1e-20;

fn planner() -> &'static Mutex<FftPlanner<f32>> {
    static PLANNER: OnceLock<Mutex<FftPlanner<f32>>> = OnceLock::new();
    PLANNER.get_or_init(|| Mutex::new(FftPlanner::new()))
}

/// Plan a forward FFT of the given size under the process-wide planner lock.
pub(crate) fn plan_forward(size: usize) -> Arc<dyn Fft<f32>> {
    planner()
        .lock()
        .expect("FFT planner lock poisoned")
        .plan_fft_forward(size)
}

/// Plan an inverse FFT of the given size under the process-wide planner lock.
pub(crate) fn plan_inverse(size: usize) -> Arc<dyn Fft<f32>> {
    planner()
        .lock()
        .expect("FFT planner lock poisoned")
        .plan_fft_inverse(size)
}

/// Output scale of a spectrum line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpectrumScale {
    /// `10·log10(|X[k]|² / N²)` in dB, floored at 1e-20 before the log.
    #[default]
    LogPower,
    /// `|X[k]| / N` linear magnitude.
    Linear,
}

/// Windowed single-line FFT processor.
pub struct FftEngine {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    line: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl std::fmt::Debug for FftEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FftEngine").field("size", &self.size).finish()
    }
}

impl FftEngine {
    /// Create an engine for power-of-two `size` with the given analysis
    /// window (Hann by default).
    pub fn new(size: usize, window: Window) -> EngineResult<Self> {
        if !size.is_power_of_two() {
            return Err(EngineError::InvalidArgument(format!(
                "fft_size must be a power of two, got {size}"
            )));
        }
        let fft = plan_forward(size);
        let scratch = vec![Complex32::default(); fft.get_inplace_scratch_len()];
        Ok(Self {
            size,
            fft,
            window: window.generate(size),
            line: vec![Complex32::default(); size],
            scratch,
        })
    }

    /// FFT size N.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Compute one DC-centered log-power line. `input` and `output` must
    /// both hold exactly N elements.
    pub fn compute_power_spectrum(&mut self, input: &[Complex32], output: &mut [f32]) {
        self.compute_spectrum(input, output, SpectrumScale::LogPower, true);
    }

    /// Generic spectrum line: selectable output scale, optional DC
    /// centering.
    pub fn compute_spectrum(
        &mut self,
        input: &[Complex32],
        output: &mut [f32],
        scale: SpectrumScale,
        center_dc: bool,
    ) {
        assert_eq!(input.len(), self.size);
        assert_eq!(output.len(), self.size);

        for i in 0..self.size {
            self.line[i] = input[i] * self.window[i];
        }
        self.fft.process_with_scratch(&mut self.line, &mut self.scratch);

        let inv_n = 1.0 / self.size as f32;
        let half = self.size >> 1;
        for (i, out) in output.iter_mut().enumerate() {
            let k = if center_dc { i ^ half } else { i };
            let re = self.line[k].re * inv_n;
            let im = self.line[k].im * inv_n;
            let power = re * re + im * im;
            *out = match scale {
                SpectrumScale::LogPower => 10.0 * power.max(POWER_FLOOR).log10(),
                SpectrumScale::Linear => power.sqrt(),
            };
        }
    }
}
