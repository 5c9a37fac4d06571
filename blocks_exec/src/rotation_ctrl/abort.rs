//! Abort signal polled by blocking commands

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// An emergency stop signal, checked once per polling iteration.
pub trait AbortSignal {
    /// True if the running command must end now.
    fn is_aborted(&self) -> bool;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A signal which is never raised.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverAbort;

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AbortSignal for NeverAbort {
    fn is_aborted(&self) -> bool {
        false
    }
}

impl AbortSignal for AtomicBool {
    fn is_aborted(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}

impl<T: AbortSignal + ?Sized> AbortSignal for Arc<T> {
    fn is_aborted(&self) -> bool {
        (**self).is_aborted()
    }
}

impl<T: AbortSignal + ?Sized> AbortSignal for &T {
    fn is_aborted(&self) -> bool {
        (**self).is_aborted()
    }
}
