use parking_lot::Mutex;
use retain_types::HeapDump;

use crate::Listener;

/// Listener that keeps every heap dump it receives, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingListener {
    received: Mutex<Vec<HeapDump>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.received.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.received.lock().is_empty()
    }

    /// Clones of everything received so far.
    pub fn received(&self) -> Vec<HeapDump> {
        self.received.lock().clone()
    }

    /// Drains and returns everything received so far.
    pub fn take(&self) -> Vec<HeapDump> {
        std::mem::take(&mut *self.received.lock())
    }
}

impl Listener for RecordingListener {
    fn analyze(&self, heap_dump: HeapDump) {
        self.received.lock().push(heap_dump);
    }
}
