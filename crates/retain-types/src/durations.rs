use facet::Facet;
use std::time::Duration;

/// Timing diagnostics recorded while a suspected leak was confirmed and dumped.
#[derive(Facet, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Durations {
    /// Time from the request to watch the reference until the GC was triggered.
    pub watch_duration_ms: u64,

    /// Time spent forcing garbage collection.
    pub gc_duration_ms: u64,

    /// Time spent writing the heap snapshot.
    pub heap_dump_duration_ms: u64,
}

impl Durations {
    pub const fn new(watch_duration_ms: u64, gc_duration_ms: u64, heap_dump_duration_ms: u64) -> Self {
        Self {
            watch_duration_ms,
            gc_duration_ms,
            heap_dump_duration_ms,
        }
    }

    /// Builds from elapsed wall-clock spans, saturating at `u64::MAX` milliseconds.
    pub fn from_elapsed(watch: Duration, gc: Duration, heap_dump: Duration) -> Self {
        Self::new(saturating_ms(watch), saturating_ms(gc), saturating_ms(heap_dump))
    }
}

fn saturating_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
