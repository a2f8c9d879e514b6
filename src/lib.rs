//! # iqscope: I/Q recording analysis engine
//!
//! Core of an interactive spectrogram/analysis front-end for complex
//! I/Q recordings. The engine opens an on-disk recording of any common
//! numeric encoding, exposes it as a uniform stream of complex f32
//! samples through a read-only memory map, and computes derived data on a
//! worker pool:
//!
//! - **Spectrogram tiles**: batches of windowed FFT log-power lines at a
//!   chosen zoom and stride
//! - **Cross-correlation**: FFT-based normalized matched filtering of a
//!   pattern against a window of the recording
//! - **Self-correlation**: sliding cyclic-prefix autocorrelation for
//!   symbol/timing discovery
//! - **SigMF export**: slice extraction with optional
//!   bandpass-to-baseband filtering
//!
//! ## Signal flow
//!
//! ```text
//! file ──mmap──▶ InputSource ──decode──▶ Complex32 stream
//!                     │
//!        ┌────────────┼──────────────┬──────────────┐
//!        ▼            ▼              ▼              ▼
//!   Spectrogram   Correlation   Self-corr      Bandpass+SigMF
//!     tiler         engine        engine          export
//!        └────────────┴──────┬───────┴──────────────┘
//!                            ▼
//!                   worker pool → JobHandle
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use iqscope::prelude::*;
//!
//! let mut session = Session::new();
//! let info = session.open_file("capture.cs16", None)?;
//! println!("{} samples at {} Hz", info.total_samples, info.sample_rate);
//!
//! // 256 lines of a 1024-bin spectrogram, computed off-thread.
//! let tile = session.compute_fft_tile(0, 1024, 1)?.wait()?;
//! assert_eq!(tile.power.len(), tile.lines * tile.fft_size);
//! ```

pub mod bandpass;
pub mod correlation;
pub mod fft_engine;
pub mod input_source;
pub mod job;
pub mod nco;
pub mod sample_format;
pub mod session;
pub mod sigmf;
pub mod spectrogram;
pub mod types;
pub mod windows;

pub use correlation::{cross_correlate, self_correlate};
pub use fft_engine::{FftEngine, SpectrumScale};
pub use input_source::{InputSource, DEFAULT_SAMPLE_RATE};
pub use job::JobHandle;
pub use sample_format::SampleFormat;
pub use session::{
    CorrelationConfig, CorrelationMode, ExportConfig, ExportInfo, FileInfo, Session,
};
pub use sigmf::{SigMfAnnotation, SigMfMeta, SigMfWriteConfig};
pub use spectrogram::{SpectrogramTile, TileRequest, TILE_LINES};
pub use types::{from_interleaved, to_interleaved, Complex32, EngineError, EngineResult, SampleBuffer};
pub use windows::Window;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::session::{
        CorrelationConfig, CorrelationMode, ExportConfig, FileInfo, Session,
    };
    pub use crate::types::{Complex32, EngineError, EngineResult};
    pub use crate::sample_format::SampleFormat;
    pub use crate::spectrogram::{SpectrogramTile, TILE_LINES};
}
