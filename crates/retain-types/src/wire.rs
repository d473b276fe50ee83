use facet::Facet;

use crate::{Durations, ExcludedRefs, HeapDump, InvariantError, ReferenceKey};

pub const HANDOFF_FORMAT_VERSION: u32 = 1;

/// Serializable mirror of [`HeapDump`], written next to the snapshot for a later analyzer run.
///
/// Decoding goes back through [`HeapDump::new`], so a record read from disk is
/// held to the same rules as one built in process.
#[derive(Facet, Debug, Clone, PartialEq, Eq)]
pub struct HeapDumpRecord {
    pub format_version: u32,
    pub heap_dump_file: String,
    pub reference_key: String,
    pub reference_name: String,
    pub excluded_refs: ExcludedRefs,
    pub compute_retained_heap_size: bool,
    pub durations: Durations,
}

impl TryFrom<&HeapDump> for HeapDumpRecord {
    type Error = InvariantError;

    fn try_from(heap_dump: &HeapDump) -> Result<Self, Self::Error> {
        let heap_dump_file = heap_dump
            .heap_dump_file()
            .to_str()
            .ok_or(InvariantError::NonUtf8Path("heap_dump_file"))?;
        Ok(Self {
            format_version: HANDOFF_FORMAT_VERSION,
            heap_dump_file: heap_dump_file.to_owned(),
            reference_key: heap_dump.reference_key().as_str().to_owned(),
            reference_name: heap_dump.reference_name().to_owned(),
            excluded_refs: heap_dump.excluded_refs().clone(),
            compute_retained_heap_size: heap_dump.compute_retained_heap_size(),
            durations: heap_dump.durations(),
        })
    }
}

impl TryFrom<HeapDumpRecord> for HeapDump {
    type Error = InvariantError;

    fn try_from(record: HeapDumpRecord) -> Result<Self, Self::Error> {
        if record.format_version != HANDOFF_FORMAT_VERSION {
            return Err(InvariantError::UnsupportedVersion {
                expected: HANDOFF_FORMAT_VERSION,
                got: record.format_version,
            });
        }
        HeapDump::new(
            record.heap_dump_file,
            ReferenceKey::new(record.reference_key)?,
            record.reference_name,
            record.excluded_refs,
            record.compute_retained_heap_size,
            record.durations,
        )
    }
}
