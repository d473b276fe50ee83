use std::fmt;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::InvariantError;

/// Correlation key shared by a keyed weak reference and the heap dump that captured it.
///
/// The analyzer looks for the keyed reference whose `key` field equals this value
/// byte for byte, so the string is carried exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey(String);

impl ReferenceKey {
    pub fn new(value: impl Into<String>) -> Result<Self, InvariantError> {
        let value = value.into();
        if value.is_empty() {
            return Err(InvariantError::EmptyField("reference_key"));
        }
        Ok(Self(value))
    }

    /// Mints a key that no other call in this process will return.
    ///
    /// The high part is a per-process prefix so keys from separate runs that end
    /// up in the same hand-off directory are unlikely to collide.
    pub fn next_process_local() -> Self {
        static NEXT_COUNTER: AtomicU64 = AtomicU64::new(1);
        let counter = NEXT_COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:04x}-{counter:012x}", process_prefix_u16()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ReferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ReferenceKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn process_prefix_u16() -> u16 {
    static PROCESS_PREFIX: OnceLock<u16> = OnceLock::new();
    *PROCESS_PREFIX.get_or_init(|| {
        let pid = std::process::id() as u64;
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos() as u64)
            .unwrap_or(0);
        ((seed ^ pid) & 0xFFFF) as u16
    })
}
