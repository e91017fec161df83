//! Background snapshot writer.
//!
//! The render loop hands the latest snapshot over a `watch` channel; the
//! writer task waits out the debounce window and writes whatever is newest,
//! so bursts of updates cost a single write.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use super::{PersistedSnapshot, SnapshotFile};

/// Handle to the writer task.
#[derive(Debug)]
pub struct Persister {
    sender: watch::Sender<Option<PersistedSnapshot>>,
    handle: JoinHandle<()>,
}

impl Persister {
    /// Spawn the writer on the current tokio runtime.
    pub fn spawn(file: SnapshotFile, debounce: Duration) -> Self {
        let (sender, receiver) = watch::channel(None);
        let handle = tokio::spawn(write_loop(Arc::new(file), receiver, debounce));
        Self { sender, handle }
    }

    /// Queue a snapshot, replacing any not yet written.
    pub fn submit(&self, snapshot: PersistedSnapshot) {
        self.sender.send_replace(Some(snapshot));
    }

    /// Flush the newest snapshot and stop the writer.
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.handle.await {
            error!("Snapshot writer failed: {}", e);
        }
    }
}

async fn write_loop(
    file: Arc<SnapshotFile>,
    mut receiver: watch::Receiver<Option<PersistedSnapshot>>,
    debounce: Duration,
) {
    let mut written: Option<PersistedSnapshot> = None;

    loop {
        let mut closed = receiver.changed().await.is_err();
        if !closed {
            closed = settle(&mut receiver, debounce).await;
        }

        let latest = receiver.borrow_and_update().clone();
        if let Some(snapshot) = latest {
            if written.as_ref() == Some(&snapshot) {
                debug!("Snapshot unchanged, skipping write");
            } else {
                let target = Arc::clone(&file);
                let pending = snapshot.clone();
                match tokio::task::spawn_blocking(move || target.save(&pending)).await {
                    Ok(Ok(())) => written = Some(snapshot),
                    Ok(Err(e)) => error!("Failed to persist snapshot: {}", e),
                    Err(e) => error!("Snapshot write task failed: {}", e),
                }
            }
        }

        if closed {
            break;
        }
    }
}

/// Wait out the debounce window, absorbing newer submissions.
///
/// Returns early with `true` once the sender is gone.
async fn settle(
    receiver: &mut watch::Receiver<Option<PersistedSnapshot>>,
    debounce: Duration,
) -> bool {
    let deadline = tokio::time::sleep(debounce);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => return false,
            changed = receiver.changed() => {
                if changed.is_err() {
                    return true;
                }
            }
        }
    }
}
