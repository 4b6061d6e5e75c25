//! Progress reporting and cooperative cancellation between pipeline phases.
//!
//! Transforms never suspend mid-phase. After each major phase the pipeline
//! reports a completion fraction and polls for cancellation; a cancelled call
//! returns [`FhtError::Cancelled`] without producing output.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use crate::error::FhtError;

/// Major phases of a filter round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Mirrored padding into the power-of-two canvas.
    Pad,
    /// Forward 2D Hartley transform.
    Forward,
    /// Frequency-domain filtering.
    Filter,
    /// Inverse 2D Hartley transform.
    Inverse,
    /// Crop back to the region of interest.
    Crop,
}

impl Phase {
    /// Completion fraction reported once this phase is done.
    pub fn fraction(self) -> f64 {
        match self {
            Phase::Pad => 0.1,
            Phase::Forward => 0.4,
            Phase::Filter => 0.6,
            Phase::Inverse => 0.9,
            Phase::Crop => 1.0,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Pad => "padding",
            Phase::Forward => "forward transform",
            Phase::Filter => "filtering",
            Phase::Inverse => "inverse transform",
            Phase::Crop => "crop",
        };
        f.write_str(name)
    }
}

/// Receiver side of the progress contract.
///
/// Implementations must be cheap: `report` runs on the transform thread.
pub trait ProgressSink: Sync {
    /// Called with a fraction in `[0, 1]` after `phase` completes.
    fn report(&self, phase: Phase, fraction: f64);

    /// Polled after every report; `true` aborts the call.
    fn is_cancelled(&self) -> bool;
}

/// Sink that ignores progress and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _phase: Phase, _fraction: f64) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Progress update delivered through a [`ProgressHandle`] channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Phase that just completed.
    pub phase: Phase,
    /// Overall completion fraction.
    pub fraction: f64,
}

/// Shared cancel flag plus an optional progress channel.
///
/// Clone the handle (or the flag from [`ProgressHandle::cancel_flag`]) into
/// the controlling thread and call [`ProgressHandle::cancel`] to stop the
/// worker at its next phase boundary.
#[derive(Debug, Clone, Default)]
pub struct ProgressHandle {
    cancel_flag: Arc<AtomicBool>,
    tx: Option<Arc<Mutex<Sender<ProgressUpdate>>>>,
}

impl ProgressHandle {
    /// Handle with a cancel flag and no progress channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that also forwards every update to the returned receiver.
    pub fn with_channel() -> (Self, Receiver<ProgressUpdate>) {
        let (tx, rx) = channel();
        let handle = Self {
            cancel_flag: Arc::new(AtomicBool::new(false)),
            tx: Some(Arc::new(Mutex::new(tx))),
        };
        (handle, rx)
    }

    /// Request cancellation at the next phase boundary.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Flag shared with every clone of this handle.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel_flag)
    }
}

impl ProgressSink for ProgressHandle {
    fn report(&self, phase: Phase, fraction: f64) {
        if let Some(tx) = &self.tx {
            if let Ok(tx) = tx.lock() {
                // A dropped receiver only means nobody is listening.
                let _ = tx.send(ProgressUpdate { phase, fraction });
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::SeqCst)
    }
}

/// Report `phase` as done and abort if cancellation was requested.
pub(crate) fn checkpoint<P: ProgressSink + ?Sized>(
    progress: &P,
    phase: Phase,
) -> Result<(), FhtError> {
    progress.report(phase, phase.fraction());
    if progress.is_cancelled() {
        tracing::debug!(%phase, "transform cancelled at phase boundary");
        return Err(FhtError::Cancelled { phase });
    }
    Ok(())
}
