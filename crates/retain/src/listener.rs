use std::fmt;
use std::sync::Arc;

use retain_types::HeapDump;

/// Receives a heap dump to analyze.
///
/// Called exactly once per suspected leak. The caller does not wait for, or look
/// at, the outcome: an implementation that cannot finish must report that on
/// its own channel.
pub trait Listener: Send + Sync {
    fn analyze(&self, heap_dump: HeapDump);
}

impl<L: Listener + ?Sized> Listener for &L {
    fn analyze(&self, heap_dump: HeapDump) {
        (**self).analyze(heap_dump)
    }
}

impl<L: Listener + ?Sized> Listener for Box<L> {
    fn analyze(&self, heap_dump: HeapDump) {
        (**self).analyze(heap_dump)
    }
}

impl<L: Listener + ?Sized> Listener for Arc<L> {
    fn analyze(&self, heap_dump: HeapDump) {
        (**self).analyze(heap_dump)
    }
}

/// Listener backed by a closure.
pub struct FnListener<F> {
    f: F,
}

impl<F> fmt::Debug for FnListener<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnListener").finish_non_exhaustive()
    }
}

impl<F> Listener for FnListener<F>
where
    F: Fn(HeapDump) + Send + Sync,
{
    fn analyze(&self, heap_dump: HeapDump) {
        (self.f)(heap_dump)
    }
}

pub fn from_fn<F>(f: F) -> FnListener<F>
where
    F: Fn(HeapDump) + Send + Sync,
{
    FnListener { f }
}
