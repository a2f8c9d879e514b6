//! Bridge-facing session
//!
//! [`Session`] is the surface the host bridge talks to: it owns the
//! active [`InputSource`] and dispatches derived-data requests to the
//! worker pool. Synchronous operations (`open_file`, `get_samples`) fail
//! immediately with a typed error; asynchronous operations return a
//! [`JobHandle`] that carries either the result buffer or the error.
//!
//! The source is held behind an `Arc`: replacing it with `open_file` (or
//! dropping it with `close`) leaves in-flight jobs reading the old
//! mapping, which stays alive until the last job finishes.
//!
//! ## Example
//!
//! ```rust,ignore
//! use iqscope::session::Session;
//!
//! let mut session = Session::new();
//! let info = session.open_file("capture.sigmf-meta", None)?;
//! println!("{} samples at {} Hz", info.total_samples, info.sample_rate);
//!
//! let tile = session.compute_fft_tile(0, 1024, 1)?.wait()?;
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::bandpass::bandpass_filter;
use crate::correlation::{cross_correlate, self_correlate};
use crate::input_source::InputSource;
use crate::job::{submit, JobHandle};
use crate::sample_format::SampleFormat;
use crate::sigmf::{write_recording, SigMfWriteConfig};
use crate::spectrogram::{compute_tile, SpectrogramTile, TileRequest};
use crate::types::{Complex32, EngineError, EngineResult, SampleBuffer};

/// Summary of a freshly opened recording.
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Path of the mapped data file.
    pub path: PathBuf,
    /// Detected or overridden sample format.
    pub format: SampleFormat,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Whole samples in the file.
    pub total_samples: usize,
    /// File size in bytes.
    pub file_size: u64,
    /// Center frequency, when metadata supplied a non-zero one.
    pub center_frequency: Option<f64>,
    /// Raw SigMF metadata JSON, when a sidecar was read.
    pub sigmf_meta_json: Option<String>,
}

/// Correlation mode and its parameters.
#[derive(Debug, Clone)]
pub enum CorrelationMode {
    /// Cross-correlate a pattern file against the window.
    File {
        /// Path of the pattern recording.
        pattern_path: PathBuf,
        /// Optional format override for the pattern file.
        pattern_format: Option<SampleFormat>,
    },
    /// Sliding cyclic-prefix self-correlation within the window.
    SelfSync {
        /// Symbol length in samples.
        tu: usize,
        /// Cyclic prefix length in samples.
        cp_len: usize,
    },
}

/// A correlation request over a window of the active source.
#[derive(Debug, Clone)]
pub struct CorrelationConfig {
    /// First sample of the search window.
    pub window_start: usize,
    /// Window length in samples (clamped to the file).
    pub window_length: usize,
    /// Mode-specific parameters.
    pub mode: CorrelationMode,
}

/// Parameters for a SigMF export.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output base path; `<path>.sigmf-data` and `<path>.sigmf-meta` are
    /// written.
    pub output_path: PathBuf,
    /// First exported sample.
    pub start_sample: usize,
    /// One past the last exported sample.
    pub end_sample: usize,
    /// Sample rate recorded in the metadata.
    pub sample_rate: f64,
    /// Whether to bandpass-filter the slice before writing.
    pub apply_bandpass: bool,
    /// Lower band edge in Hz (relative to baseband).
    pub bandpass_low: f64,
    /// Upper band edge in Hz.
    pub bandpass_high: f64,
    /// Center frequency recorded in the metadata; omitted when zero.
    pub center_frequency: f64,
    /// Optional description.
    pub description: Option<String>,
    /// Optional author.
    pub author: Option<String>,
}

/// Result of a completed export.
#[derive(Debug, Clone)]
pub struct ExportInfo {
    /// Path of the written data file.
    pub data_path: PathBuf,
    /// Path of the written meta file.
    pub meta_path: PathBuf,
    /// Samples written after clamping.
    pub samples_written: usize,
}

/// The engine surface exposed to the host bridge. One active source at a
/// time; derived data is computed on the worker pool.
#[derive(Debug, Default)]
pub struct Session {
    source: Option<Arc<InputSource>>,
}

impl Session {
    /// Create a session with no open source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a recording, replacing any active source.
    pub fn open_file(
        &mut self,
        path: impl AsRef<Path>,
        format: Option<SampleFormat>,
    ) -> EngineResult<FileInfo> {
        let source = InputSource::open(path, format)?;
        let info = FileInfo {
            path: source.path().to_path_buf(),
            format: source.format(),
            sample_rate: source.sample_rate(),
            total_samples: source.total_samples(),
            file_size: source.file_size(),
            center_frequency: (source.center_frequency() != 0.0)
                .then(|| source.center_frequency()),
            sigmf_meta_json: source.sigmf_meta_json().map(str::to_owned),
        };
        info!(path = %info.path.display(), format = %info.format, "source replaced");
        self.source = Some(source);
        Ok(info)
    }

    /// Release the active source. Idempotent.
    pub fn close(&mut self) {
        if self.source.take().is_some() {
            info!("source closed");
        }
    }

    /// Whether a source is open.
    pub fn is_open(&self) -> bool {
        self.source.is_some()
    }

    /// The active source.
    pub fn source(&self) -> EngineResult<&Arc<InputSource>> {
        self.source.as_ref().ok_or(EngineError::NotOpen)
    }

    /// Read samples `[start, start+length)` from the active source,
    /// clamped to the file; empty when `start` is past the end.
    ///
    /// The bridge flattens the result to interleaved I/Q floats with
    /// [`crate::types::to_interleaved`].
    pub fn get_samples(&self, start: usize, length: usize) -> EngineResult<SampleBuffer> {
        Ok(self.source()?.read(start, length))
    }

    /// Read `length` samples at indices `start + i·stride` (see
    /// [`InputSource::read_strided`]).
    pub fn get_samples_strided(
        &self,
        start: usize,
        length: usize,
        stride: usize,
    ) -> EngineResult<SampleBuffer> {
        Ok(self.source()?.read_strided(start, length, stride))
    }

    /// One-shot open/read/close of an arbitrary file, without disturbing
    /// the active source.
    pub fn read_file_samples(
        path: impl AsRef<Path>,
        format: Option<SampleFormat>,
        start: usize,
        length: usize,
    ) -> EngineResult<SampleBuffer> {
        let source = InputSource::open(path, format)?;
        Ok(source.read(start, length))
    }

    /// Compute a spectrogram tile on the worker pool.
    pub fn compute_fft_tile(
        &self,
        start_sample: usize,
        fft_size: usize,
        zoom_level: usize,
    ) -> EngineResult<JobHandle<SpectrogramTile>> {
        let source = Arc::clone(self.source()?);
        let request = TileRequest {
            start_sample,
            fft_size,
            zoom_level,
        };
        Ok(submit("tile", move || compute_tile(&source, request)))
    }

    /// Run a correlation over a window of the active source on the worker
    /// pool.
    ///
    /// In file mode the pattern recording is opened inside the job and the
    /// shorter sequence slides through the longer one; in self mode the
    /// window is correlated against itself at symbol distance `tu`.
    pub fn correlate(&self, config: CorrelationConfig) -> EngineResult<JobHandle<Vec<f32>>> {
        let source = Arc::clone(self.source()?);
        Ok(submit("correlation", move || {
            let window = source.read(config.window_start, config.window_length);
            match config.mode {
                CorrelationMode::File {
                    pattern_path,
                    pattern_format,
                } => {
                    let pattern_source = InputSource::open(&pattern_path, pattern_format)?;
                    let pattern =
                        pattern_source.read(0, pattern_source.total_samples());
                    Ok(cross_correlate(&window, &pattern))
                }
                CorrelationMode::SelfSync { tu, cp_len } => {
                    self_correlate(&window, tu, cp_len)
                }
            }
        }))
    }

    /// Export a slice of the active source as a SigMF recording, on the
    /// worker pool.
    ///
    /// With `apply_bandpass` set, the band `[bandpass_low, bandpass_high]`
    /// is mixed to baseband and low-pass filtered before writing.
    pub fn export_sigmf(&self, config: ExportConfig) -> EngineResult<JobHandle<ExportInfo>> {
        let source = Arc::clone(self.source()?);
        Ok(submit("export", move || {
            if config.end_sample < config.start_sample {
                return Err(EngineError::InvalidArgument(format!(
                    "end_sample {} precedes start_sample {}",
                    config.end_sample, config.start_sample
                )));
            }
            let count = config.end_sample - config.start_sample;
            let mut samples: Vec<Complex32> = source.read(config.start_sample, count);

            if config.apply_bandpass {
                let center = (config.bandpass_low + config.bandpass_high) / 2.0;
                let bandwidth = (config.bandpass_high - config.bandpass_low).abs();
                samples = bandpass_filter(&samples, center, bandwidth, config.sample_rate);
            }

            let write_config = SigMfWriteConfig {
                sample_rate: config.sample_rate,
                center_frequency: config.center_frequency,
                description: config.description.clone(),
                author: config.author.clone(),
                sample_start: 0,
                sample_count: samples.len() as u64,
                ..Default::default()
            };
            let (data_path, meta_path) =
                write_recording(&config.output_path, &write_config, &samples)?;
            Ok(ExportInfo {
                data_path,
                meta_path,
                samples_written: samples.len(),
            })
        }))
    }
}
