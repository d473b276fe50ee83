use std::future::Future;

use retain_types::HeapDump;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::Listener;

/// Forwards heap dumps to a background task over an unbounded channel.
///
/// `analyze` never blocks. If the receiving side is gone the heap dump is
/// dropped with a warning.
#[derive(Debug, Clone)]
pub struct ChannelListener {
    name: &'static str,
    tx: mpsc::UnboundedSender<HeapDump>,
}

impl ChannelListener {
    pub fn new(name: &'static str, tx: mpsc::UnboundedSender<HeapDump>) -> Self {
        Self { name, tx }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Listener for ChannelListener {
    fn analyze(&self, heap_dump: HeapDump) {
        let key = heap_dump.reference_key().clone();
        match self.tx.send(heap_dump) {
            Ok(()) => debug!(worker = self.name, %key, "queued heap dump for analysis"),
            Err(_) => warn!(worker = self.name, %key, "analysis worker is gone, dropping heap dump"),
        }
    }
}

/// Spawns a tokio task that runs `handler` on each heap dump, one at a time.
///
/// The task ends once every clone of the returned listener is dropped and the
/// queue has drained. Must be called from within a tokio runtime.
pub fn spawn_worker<F, Fut>(name: &'static str, mut handler: F) -> (ChannelListener, JoinHandle<()>)
where
    F: FnMut(HeapDump) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<HeapDump>();
    let handle = tokio::spawn(async move {
        let mut analyzed = 0u64;
        while let Some(heap_dump) = rx.recv().await {
            debug!(
                worker = name,
                key = %heap_dump.reference_key(),
                file = %heap_dump.heap_dump_file().display(),
                "analyzing heap dump"
            );
            handler(heap_dump).await;
            analyzed += 1;
        }
        info!(worker = name, analyzed, "analysis worker stopped");
    });
    (ChannelListener::new(name, tx), handle)
}
