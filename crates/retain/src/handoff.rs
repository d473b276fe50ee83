//! On-disk hand-off between the watching process and a later analyzer run.
//!
//! For a snapshot `heap-1.hprof` tagged with key `a1b2c3` the descriptor lands
//! in `heap-1.hprof.a1b2c3.handoff.json`, either beside the snapshot or in an
//! override directory. The key is part of the name so snapshots that share a
//! file name never share a hand-off file.
//!
//! Writes go to a uniquely named temporary file in the target directory and are
//! then moved into place without replacing anything already there, so an
//! analyzer polling the directory never sees a half-written or overwritten file.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use retain_types::{HeapDump, HeapDumpRecord, InvariantError, ReferenceKey};
use tracing::{info, warn};

use crate::Listener;

pub const HANDOFF_SUFFIX: &str = ".handoff.json";

#[derive(Debug)]
pub enum HandoffError {
    Io {
        context: String,
        source: std::io::Error,
    },
    Encode(String),
    Decode(String),
    Invariant(InvariantError),
}

impl HandoffError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl fmt::Display for HandoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Encode(message) => write!(f, "encode hand-off record: {message}"),
            Self::Decode(message) => write!(f, "decode hand-off record: {message}"),
            Self::Invariant(source) => write!(f, "invalid hand-off record: {source}"),
        }
    }
}

impl Error for HandoffError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Invariant(source) => Some(source),
            _ => None,
        }
    }
}

impl From<InvariantError> for HandoffError {
    fn from(error: InvariantError) -> Self {
        Self::Invariant(error)
    }
}

/// Where the hand-off file for `heap_dump_file`, tagged with `reference_key`, goes.
pub fn handoff_path_for(
    heap_dump_file: &Path,
    reference_key: &ReferenceKey,
    dir: Option<&Path>,
) -> PathBuf {
    let mut name = heap_dump_file
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "heap_dump".into());
    name.push(".");
    name.push(escape_key(reference_key));
    name.push(HANDOFF_SUFFIX);
    match dir.or_else(|| heap_dump_file.parent()) {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

// Keeps `[A-Za-z0-9_-]` and writes every other byte as `%XX`, so distinct keys
// stay distinct on disk.
fn escape_key(reference_key: &ReferenceKey) -> String {
    let mut out = String::with_capacity(reference_key.as_str().len());
    for byte in reference_key.as_str().bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Persists `heap_dump` and returns the path of the hand-off file.
///
/// Fails rather than overwrite an existing hand-off file.
pub fn write_handoff(heap_dump: &HeapDump, dir: Option<&Path>) -> Result<PathBuf, HandoffError> {
    let record = HeapDumpRecord::try_from(heap_dump)?;
    let json = facet_json::to_string(&record).map_err(|e| HandoffError::Encode(e.to_string()))?;

    let path = handoff_path_for(heap_dump.heap_dump_file(), heap_dump.reference_key(), dir);
    let parent = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    // Dropping `tmp` on any error path below deletes the temporary file.
    let mut tmp = tempfile::Builder::new()
        .prefix(".handoff-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| HandoffError::io(format!("create temporary file in {}", parent.display()), e))?;
    tmp.write_all(json.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| HandoffError::io(format!("write {}", tmp.path().display()), e))?;
    tmp.persist_noclobber(&path)
        .map_err(|e| HandoffError::io(format!("persist {}", path.display()), e.error))?;
    Ok(path)
}

pub fn read_handoff(path: &Path) -> Result<HeapDump, HandoffError> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| HandoffError::io(format!("read {}", path.display()), e))?;
    let record: HeapDumpRecord =
        facet_json::from_str(&json).map_err(|e| HandoffError::Decode(e.to_string()))?;
    Ok(HeapDump::try_from(record)?)
}

/// Writes each heap dump to a hand-off file for an out-of-process analyzer.
#[derive(Debug, Clone, Default)]
pub struct HandoffListener {
    dir: Option<PathBuf>,
}

impl HandoffListener {
    /// Hand-off files go next to each snapshot.
    pub fn beside_snapshot() -> Self {
        Self { dir: None }
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: Some(dir.into()),
        }
    }

    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }
}

impl Listener for HandoffListener {
    fn analyze(&self, heap_dump: HeapDump) {
        match write_handoff(&heap_dump, self.dir()) {
            Ok(path) => info!(
                key = %heap_dump.reference_key(),
                name = heap_dump.reference_name(),
                handoff = %path.display(),
                "heap dump handed off for analysis"
            ),
            Err(error) => warn!(
                key = %heap_dump.reference_key(),
                file = %heap_dump.heap_dump_file().display(),
                %error,
                "failed to hand off heap dump"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retain_types::{Durations, ExcludedRefs, Exclusion, ExclusionTarget, ReferenceKey};

    fn sample(heap_dump_file: &Path) -> HeapDump {
        let excluded_refs = ExcludedRefs::new(vec![
            Exclusion {
                target: ExclusionTarget::InstanceField {
                    class_name: "android.app.ActivityThread$ActivityClientRecord".into(),
                    field_name: "nextIdle".into(),
                },
                reason: "framework keeps the last idle record".into(),
                always_exclude: false,
            },
            Exclusion {
                target: ExclusionTarget::Thread {
                    thread_name: "FinalizerWatchdogDaemon".into(),
                },
                reason: "daemon thread".into(),
                always_exclude: true,
            },
        ]);
        HeapDump::new(
            heap_dump_file,
            ReferenceKey::new("a1b2c3").expect("non-empty key must work"),
            "MainActivity",
            excluded_refs,
            false,
            Durations::new(5_000, 120, 340),
        )
        .expect("valid inputs must work")
    }

    fn key(value: &str) -> ReferenceKey {
        ReferenceKey::new(value).expect("non-empty key must work")
    }

    fn with_key(heap_dump: &HeapDump, value: &str) -> HeapDump {
        HeapDump::new(
            heap_dump.heap_dump_file(),
            key(value),
            heap_dump.reference_name(),
            heap_dump.excluded_refs().clone(),
            heap_dump.compute_retained_heap_size(),
            heap_dump.durations(),
        )
        .expect("valid inputs must work")
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .expect("read dir")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn handoff_path_sits_beside_snapshot_by_default() {
        let path = handoff_path_for(Path::new("/data/leaks/heap-1.hprof"), &key("a1b2c3"), None);
        assert_eq!(path, Path::new("/data/leaks/heap-1.hprof.a1b2c3.handoff.json"));

        let path = handoff_path_for(
            Path::new("/data/leaks/heap-1.hprof"),
            &key("a1b2c3"),
            Some(Path::new("/spool")),
        );
        assert_eq!(path, Path::new("/spool/heap-1.hprof.a1b2c3.handoff.json"));
    }

    #[test]
    fn handoff_path_escapes_key_without_merging_distinct_keys() {
        let file = Path::new("/data/heap.hprof");
        let slashed = handoff_path_for(file, &key("../a/b c"), None);
        assert_eq!(slashed, Path::new("/data/heap.hprof.%2E%2E%2Fa%2Fb%20c.handoff.json"));

        let underscored = handoff_path_for(file, &key("a_b"), None);
        let spaced = handoff_path_for(file, &key("a b"), None);
        let escaped = handoff_path_for(file, &key("a%20b"), None);
        assert_ne!(underscored, spaced);
        assert_ne!(spaced, escaped);
    }

    #[test]
    fn written_handoff_reads_back_identically() {
        let dir = tempfile::tempdir().expect("tempdir");
        let snapshot = dir.path().join("heap-1.hprof");
        std::fs::write(&snapshot, b"JAVA PROFILE 1.0.2\0").expect("write snapshot");
        let heap_dump = sample(&snapshot);

        let path = write_handoff(&heap_dump, None).expect("hand-off must be written");
        assert_eq!(path, dir.path().join("heap-1.hprof.a1b2c3.handoff.json"));
        assert_eq!(
            file_names(dir.path()),
            vec!["heap-1.hprof", "heap-1.hprof.a1b2c3.handoff.json"]
        );

        let restored = read_handoff(&path).expect("hand-off must decode");
        assert_eq!(restored, heap_dump);
    }

    #[test]
    fn listener_writes_into_configured_dir() {
        let snapshots = tempfile::tempdir().expect("tempdir");
        let spool = tempfile::tempdir().expect("tempdir");
        let heap_dump = sample(&snapshots.path().join("heap-1.hprof"));

        HandoffListener::in_dir(spool.path()).analyze(heap_dump.clone());

        let restored = read_handoff(&spool.path().join("heap-1.hprof.a1b2c3.handoff.json"))
            .expect("hand-off must decode");
        assert_eq!(restored, heap_dump);
    }

    #[test]
    fn same_named_snapshots_from_different_dirs_keep_both_keys() {
        let root = tempfile::tempdir().expect("tempdir");
        let spool = tempfile::tempdir().expect("tempdir");
        let first = with_key(&sample(&root.path().join("a").join("heap.hprof")), "key-first");
        let second = with_key(&sample(&root.path().join("b").join("heap.hprof")), "key-second");

        let listener = HandoffListener::in_dir(spool.path());
        listener.analyze(first.clone());
        listener.analyze(second.clone());

        assert_eq!(
            file_names(spool.path()),
            vec![
                "heap.hprof.key-first.handoff.json",
                "heap.hprof.key-second.handoff.json",
            ]
        );
        let restored_first = read_handoff(&spool.path().join("heap.hprof.key-first.handoff.json"))
            .expect("first hand-off must decode");
        let restored_second = read_handoff(&spool.path().join("heap.hprof.key-second.handoff.json"))
            .expect("second hand-off must decode");
        assert_eq!(restored_first, first);
        assert_eq!(restored_second, second);
    }

    #[test]
    fn existing_handoff_is_never_replaced() {
        let dir = tempfile::tempdir().expect("tempdir");
        let heap_dump = sample(&dir.path().join("heap-1.hprof"));
        let path = write_handoff(&heap_dump, None).expect("first write must work");
        let before = std::fs::read_to_string(&path).expect("read hand-off");

        let relabelled = HeapDump::new(
            heap_dump.heap_dump_file(),
            heap_dump.reference_key().clone(),
            "SomethingElse",
            heap_dump.excluded_refs().clone(),
            true,
            heap_dump.durations(),
        )
        .expect("valid inputs must work");
        let err = write_handoff(&relabelled, None).expect_err("second write must not clobber");
        assert!(matches!(err, HandoffError::Io { .. }));

        assert_eq!(std::fs::read_to_string(&path).expect("read hand-off"), before);
        assert_eq!(file_names(dir.path()), vec!["heap-1.hprof.a1b2c3.handoff.json"]);
    }

    #[test]
    fn listener_swallows_write_failures() {
        let dir = tempfile::tempdir().expect("tempdir");
        let missing = dir.path().join("does-not-exist");
        HandoffListener::in_dir(&missing).analyze(sample(&dir.path().join("heap-1.hprof")));
        assert!(!missing.exists());
    }

    #[test]
    fn garbage_handoff_is_a_decode_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.handoff.json");
        std::fs::write(&path, "{\"format_version\": 1").expect("write");
        let err = read_handoff(&path).expect_err("truncated json must fail");
        assert!(matches!(err, HandoffError::Decode(_)));
    }

    #[test]
    fn missing_handoff_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_handoff(&dir.path().join("nope.handoff.json")).expect_err("missing file must fail");
        assert!(matches!(err, HandoffError::Io { .. }));
        assert!(err.source().is_some());
    }
}
