use std::path::{Path, PathBuf};

use crate::{Durations, ExcludedRefs, InvariantError, ReferenceKey};

/// A heap snapshot on disk, tied to the watched reference that caused it.
///
/// Built once, after the snapshot file has been fully written, and never
/// modified afterwards. The descriptor only carries the path: whoever wrote the
/// file stays responsible for deleting it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapDump {
    heap_dump_file: PathBuf,
    reference_key: ReferenceKey,
    reference_name: String,
    excluded_refs: ExcludedRefs,
    compute_retained_heap_size: bool,
    durations: Durations,
}

impl HeapDump {
    /// Validates and assembles a descriptor.
    ///
    /// Only the shape is checked. Whether the file exists, or whether the key is
    /// really unique, is the caller's business.
    pub fn new(
        heap_dump_file: impl Into<PathBuf>,
        reference_key: ReferenceKey,
        reference_name: impl Into<String>,
        excluded_refs: ExcludedRefs,
        compute_retained_heap_size: bool,
        durations: Durations,
    ) -> Result<Self, InvariantError> {
        let heap_dump_file = heap_dump_file.into();
        if heap_dump_file.as_os_str().is_empty() {
            return Err(InvariantError::EmptyField("heap_dump_file"));
        }
        Ok(Self {
            heap_dump_file,
            reference_key,
            reference_name: reference_name.into(),
            excluded_refs,
            compute_retained_heap_size,
            durations,
        })
    }

    /// Builds a descriptor from raw timings, always computing retained size.
    #[deprecated(note = "use `HeapDump::new` with a `Durations` value")]
    pub fn with_raw_durations(
        heap_dump_file: impl Into<PathBuf>,
        reference_key: ReferenceKey,
        reference_name: impl Into<String>,
        excluded_refs: ExcludedRefs,
        watch_duration_ms: u64,
        gc_duration_ms: u64,
        heap_dump_duration_ms: u64,
    ) -> Result<Self, InvariantError> {
        Self::new(
            heap_dump_file,
            reference_key,
            reference_name,
            excluded_refs,
            true,
            Durations::new(watch_duration_ms, gc_duration_ms, heap_dump_duration_ms),
        )
    }

    pub fn builder() -> HeapDumpBuilder {
        HeapDumpBuilder::default()
    }

    /// The snapshot file, which you might want to upload somewhere.
    pub fn heap_dump_file(&self) -> &Path {
        &self.heap_dump_file
    }

    pub fn reference_key(&self) -> &ReferenceKey {
        &self.reference_key
    }

    /// Free-form label for the leaking instance. Never used for correlation.
    pub fn reference_name(&self) -> &str {
        &self.reference_name
    }

    pub fn excluded_refs(&self) -> &ExcludedRefs {
        &self.excluded_refs
    }

    pub fn compute_retained_heap_size(&self) -> bool {
        self.compute_retained_heap_size
    }

    pub fn durations(&self) -> Durations {
        self.durations
    }

    pub fn watch_duration_ms(&self) -> u64 {
        self.durations.watch_duration_ms
    }

    pub fn gc_duration_ms(&self) -> u64 {
        self.durations.gc_duration_ms
    }

    pub fn heap_dump_duration_ms(&self) -> u64 {
        self.durations.heap_dump_duration_ms
    }
}

/// Collects descriptor inputs one at a time; unset inputs are reported by [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct HeapDumpBuilder {
    heap_dump_file: Option<PathBuf>,
    reference_key: Option<ReferenceKey>,
    reference_name: Option<String>,
    excluded_refs: Option<ExcludedRefs>,
    compute_retained_heap_size: Option<bool>,
    durations: Option<Durations>,
}

impl HeapDumpBuilder {
    pub fn heap_dump_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.heap_dump_file = Some(path.into());
        self
    }

    pub fn reference_key(mut self, key: ReferenceKey) -> Self {
        self.reference_key = Some(key);
        self
    }

    pub fn reference_name(mut self, name: impl Into<String>) -> Self {
        self.reference_name = Some(name.into());
        self
    }

    pub fn excluded_refs(mut self, excluded_refs: ExcludedRefs) -> Self {
        self.excluded_refs = Some(excluded_refs);
        self
    }

    /// Defaults to `true` when never called.
    pub fn compute_retained_heap_size(mut self, compute: bool) -> Self {
        self.compute_retained_heap_size = Some(compute);
        self
    }

    pub fn durations(mut self, durations: Durations) -> Self {
        self.durations = Some(durations);
        self
    }

    pub fn build(self) -> Result<HeapDump, InvariantError> {
        let heap_dump_file = self
            .heap_dump_file
            .ok_or(InvariantError::MissingField("heap_dump_file"))?;
        let reference_key = self
            .reference_key
            .ok_or(InvariantError::MissingField("reference_key"))?;
        let reference_name = self
            .reference_name
            .ok_or(InvariantError::MissingField("reference_name"))?;
        let excluded_refs = self
            .excluded_refs
            .ok_or(InvariantError::MissingField("excluded_refs"))?;
        let durations = self.durations.ok_or(InvariantError::MissingField("durations"))?;
        HeapDump::new(
            heap_dump_file,
            reference_key,
            reference_name,
            excluded_refs,
            self.compute_retained_heap_size.unwrap_or(true),
            durations,
        )
    }
}
