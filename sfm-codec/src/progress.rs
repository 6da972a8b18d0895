//! Progress reporting, cooperative cancellation and pausing.

use crate::config::CodecConfig;
use crate::error::ImportError;
use crate::import::{import_with, ImportReport};
use crate::markup::Dialect;
use crate::model::Scripture;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Receives progress from a pass. Every method has a no-op default.
pub trait ProgressSink {
    /// One unit of work (a section or chapter) is done.
    fn step(&self, _amount: u64) {}

    fn message(&self, _text: &str) {}

    fn is_cancelled(&self) -> bool {
        false
    }

    /// Blocks while the host has paused the pass.
    fn wait_if_paused(&self) {}
}

/// Ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {}

impl<T: ProgressSink + ?Sized> ProgressSink for Arc<T> {
    fn step(&self, amount: u64) {
        (**self).step(amount)
    }

    fn message(&self, text: &str) {
        (**self).message(text)
    }

    fn is_cancelled(&self) -> bool {
        (**self).is_cancelled()
    }

    fn wait_if_paused(&self) {
        (**self).wait_if_paused()
    }
}

/// Cancel flag plus a reusable pause gate, shared between a host and a
/// worker.
#[derive(Debug, Default)]
pub struct ImportControl {
    cancelled: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
}

impl ImportControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // a paused worker must wake up to notice
        self.resume();
    }

    pub fn pause(&self) {
        *self.paused.lock() = true;
    }

    pub fn resume(&self) {
        let mut paused = self.paused.lock();
        *paused = false;
        self.resumed.notify_all();
    }

    pub fn is_paused(&self) -> bool {
        *self.paused.lock()
    }
}

impl ProgressSink for ImportControl {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn wait_if_paused(&self) {
        let mut paused = self.paused.lock();
        while *paused {
            self.resumed.wait(&mut paused);
        }
    }
}

/// Runs an import on a dedicated worker thread into a fresh [`Scripture`].
pub fn spawn_import<P>(
    source: String,
    file_name: String,
    config: CodecConfig,
    dialect: Dialect,
    progress: P,
) -> JoinHandle<Result<(Scripture, ImportReport), ImportError>>
where
    P: ProgressSink + Send + 'static,
{
    thread::spawn(move || {
        let mut doc = Scripture::default();
        let mut map = config.marker_map();
        let report = import_with(
            &source, &file_name, &mut doc, &config, dialect, &mut map, &progress,
        )?;
        Ok((doc, report))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_cancel_flag() {
        let control = ImportControl::new();
        assert!(!control.is_cancelled());
        control.cancel();
        assert!(control.is_cancelled());
    }

    #[test]
    fn test_pause_gate_releases_worker() {
        let control = Arc::new(ImportControl::new());
        control.pause();
        assert!(control.is_paused());

        let worker = {
            let control = Arc::clone(&control);
            thread::spawn(move || {
                control.wait_if_paused();
                true
            })
        };
        thread::sleep(Duration::from_millis(20));
        control.resume();
        assert!(worker.join().unwrap());
        assert!(!control.is_paused());
    }

    #[test]
    fn test_spawned_import_runs_to_completion() {
        let handle = spawn_import(
            "\\id MRK\n\\c 1\n\\p\n\\v 1 text\n".to_string(),
            "mrk.sfm".to_string(),
            CodecConfig::default(),
            Dialect::Inline,
            NoProgress,
        );
        let (doc, report) = handle.join().unwrap().unwrap();
        assert_eq!(doc.books.len(), 1);
        assert_eq!(report.committed().count(), 1);
    }
}
