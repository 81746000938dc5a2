//! "Directory changed" signal for whoever displays the folders.
//!
//! Fire-and-forget: a sink that has gone away (dropped receiver) is ignored,
//! and no sink at all makes `notify` a no-op.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use tracing::debug;

/// One directory whose contents changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub directory: PathBuf,
    pub affected: Vec<PathBuf>,
}

/// Receiver side of change events.
pub trait ChangeSink: Send + Sync {
    fn changed(&self, event: ChangeEvent);
}

impl ChangeSink for Sender<ChangeEvent> {
    fn changed(&self, event: ChangeEvent) {
        self.send(event).ok();
    }
}

/// Logs each event at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ChangeSink for TracingSink {
    fn changed(&self, event: ChangeEvent) {
        debug!(
            directory = %event.directory.display(),
            affected = event.affected.len(),
            "directory changed"
        );
    }
}

#[derive(Clone, Default)]
pub struct ChangeNotifier {
    sink: Option<Arc<dyn ChangeSink>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new(sink: Arc<dyn ChangeSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// A notifier that drops every event.
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn notify(&self, directory: &Path, affected: &[PathBuf]) {
        if let Some(sink) = &self.sink {
            sink.changed(ChangeEvent {
                directory: directory.to_path_buf(),
                affected: affected.to_vec(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn sender_receives_event() {
        let (tx, rx) = mpsc::channel();
        let n = ChangeNotifier::new(Arc::new(tx));
        n.notify(Path::new("/docs"), &[PathBuf::from("/docs/a.pdf")]);
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.directory, Path::new("/docs"));
        assert_eq!(ev.affected, [PathBuf::from("/docs/a.pdf")]);
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        ChangeNotifier::new(Arc::new(tx)).notify(Path::new("/docs"), &[]);
    }

    #[test]
    fn silent_is_noop() {
        ChangeNotifier::silent().notify(Path::new("/docs"), &[]);
    }
}
