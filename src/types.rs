//! Core types for the analysis engine
//!
//! The engine works on complex single-precision I/Q samples throughout:
//! every input format is decoded to [`Complex32`] at the source boundary,
//! and every derived product (spectrogram lines, correlation magnitudes)
//! is a dense `f32` buffer.

use num_complex::Complex;
use thiserror::Error;

/// A single complex I/Q sample.
pub type Complex32 = Complex<f32>;

/// A buffer of I/Q samples.
pub type SampleBuffer = Vec<Complex32>;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur during engine operations.
///
/// Errors are `Clone` because job results are delivered through channels
/// and may be observed from more than one place; I/O failures therefore
/// carry the OS reason as a string rather than the non-cloneable
/// `std::io::Error`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Open/stat/mmap/read/write failure on a file path.
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },

    /// Unsupported or malformed sample format descriptor.
    #[error("unsupported sample format: {0}")]
    Format(String),

    /// A sample query was made with no active source.
    #[error("no input source is open")]
    NotOpen,

    /// The spectrogram tiler found zero full FFT windows.
    #[error("no full FFT window fits in the requested tile")]
    EmptyTile,

    /// A request parameter was out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Reserved for callers that abandon a job; never produced internally.
    #[error("job cancelled")]
    Cancelled,
}

impl EngineError {
    /// Build an [`EngineError::Io`] from a path and an `std::io::Error`.
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        EngineError::Io {
            path: path.as_ref().display().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Flatten complex samples into interleaved I/Q floats (`[re0, im0, re1, …]`).
///
/// The host bridge ships sample blocks across its boundary in this layout.
pub fn to_interleaved(samples: &[Complex32]) -> Vec<f32> {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        out.push(s.re);
        out.push(s.im);
    }
    out
}

/// Rebuild complex samples from interleaved I/Q floats.
///
/// A trailing odd float is ignored.
pub fn from_interleaved(data: &[f32]) -> Vec<Complex32> {
    data.chunks_exact(2)
        .map(|p| Complex32::new(p[0], p[1]))
        .collect()
}
