//! Asynchronous job layer
//!
//! Tile, correlation, and export requests run on the rayon worker pool
//! (sized to host parallelism, at least one thread) so the submitting
//! thread never blocks on DSP work. Each job captures its inputs by value
//! (including an `Arc` of the input source, which keeps the mapping alive
//! for the job's whole run) and delivers its result through a
//! [`JobHandle`].
//!
//! Results arrive in completion order, not submission order; every job is
//! self-contained. Cancellation is cooperative in the weakest sense:
//! dropping a handle abandons the result, and the worker's buffers are
//! reclaimed when the job finishes anyway.

use std::sync::mpsc::{self, Receiver, TryRecvError};

use tracing::debug;

use crate::types::{EngineError, EngineResult};

/// Completion handle for a submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: Receiver<EngineResult<T>>,
}

impl<T> JobHandle<T> {
    /// Block until the job completes and take its result.
    ///
    /// Returns `Cancelled` if the worker died without delivering (a
    /// panicked job); the engine itself never produces that variant.
    pub fn wait(self) -> EngineResult<T> {
        self.rx.recv().unwrap_or(Err(EngineError::Cancelled))
    }

    /// Take the result if the job has already completed.
    pub fn try_take(&mut self) -> Option<EngineResult<T>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EngineError::Cancelled)),
        }
    }
}

/// Run a job on the worker pool and return its completion handle.
pub fn submit<T, F>(kind: &'static str, job: F) -> JobHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> EngineResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    debug!(kind, "job submitted");
    rayon::spawn(move || {
        let result = job();
        debug!(kind, ok = result.is_ok(), "job completed");
        // The receiver may be gone; an abandoned result is just dropped.
        let _ = tx.send(result);
    });
    JobHandle { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_wait_returns_result() {
        let handle = submit("test", || Ok(41 + 1));
        assert_eq!(handle.wait(), Ok(42));
    }

    #[test]
    fn test_error_propagates() {
        let handle: JobHandle<()> =
            submit("test", || Err(EngineError::InvalidArgument("nope".into())));
        assert!(matches!(handle.wait(), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_try_take_eventually_sees_result() {
        let mut handle = submit("test", || {
            std::thread::sleep(Duration::from_millis(20));
            Ok(7u32)
        });
        // Poll until the worker delivers.
        for _ in 0..200 {
            if let Some(result) = handle.try_take() {
                assert_eq!(result, Ok(7));
                return;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("job never completed");
    }

    #[test]
    fn test_jobs_complete_independently() {
        let slow = submit("test", || {
            std::thread::sleep(Duration::from_millis(30));
            Ok("slow")
        });
        let fast = submit("test", || Ok("fast"));
        // A failing job does not disturb its neighbors.
        let failing: JobHandle<&str> = submit("test", || Err(EngineError::EmptyTile));

        assert_eq!(fast.wait(), Ok("fast"));
        assert_eq!(failing.wait(), Err(EngineError::EmptyTile));
        assert_eq!(slow.wait(), Ok("slow"));
    }

    #[test]
    fn test_dropped_handle_does_not_wedge_the_pool() {
        for _ in 0..32 {
            let handle = submit("test", || Ok(0u8));
            drop(handle);
        }
        // The pool still serves new jobs.
        assert_eq!(submit("test", || Ok(1u8)).wait(), Ok(1));
    }
}
