//! Failure recovery tracker.
//!
//! Indexes failed filenames to their original payloads so they can be
//! resubmitted individually or as a sub-batch without the user re-selecting
//! files from disk. Identically-named failures overwrite the prior entry.
//!
//! Backed by a [`DashMap`] so the session task and presentation code can
//! share one tracker through an `Arc` without a lock around the whole map.

use bytes::Bytes;
use dashmap::DashMap;

use crate::queue::QueuedFile;

/// Outcome of a resolve call: payloads still resident, and the filenames
/// whose payloads are gone. Callers surface the latter as "file no longer
/// available, re-upload manually" rather than failing silently.
#[derive(Debug, Default)]
pub struct Resolution {
    pub resolved: Vec<QueuedFile>,
    pub missing: Vec<String>,
}

#[derive(Debug, Default)]
pub struct RecoveryTracker {
    entries: DashMap<String, (Bytes, &'static str)>,
}

impl RecoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite-insert an entry for a failed file.
    pub fn record(&self, filename: &str, payload: Bytes, mime: &'static str) {
        self.entries.insert(filename.to_string(), (payload, mime));
    }

    /// Resolve the requested filenames to resident payloads.
    pub fn resolve(&self, filenames: &[String]) -> Resolution {
        let mut resolution = Resolution::default();
        for name in filenames {
            match self.entries.get(name) {
                Some(entry) => {
                    let (payload, mime) = entry.value().clone();
                    resolution.resolved.push(QueuedFile {
                        name: name.clone(),
                        payload,
                        mime,
                    });
                }
                None => resolution.missing.push(name.clone()),
            }
        }
        resolution
    }

    /// Remove an entry once its retry has succeeded or the user discarded
    /// it. Idempotent: discarding an absent entry is a no-op.
    pub fn discard(&self, filename: &str) -> bool {
        self.entries.remove(filename).is_some()
    }

    /// Drop every entry whose filename is not in `keep`. A new full-batch
    /// report supersedes the previous one, and a file that no longer appears
    /// in it as failed must not stay retryable.
    pub fn retain_named(&self, keep: &[String]) {
        self.entries.retain(|name, _| keep.iter().any(|k| k == name));
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.contains_key(filename)
    }

    /// All tracked filenames, sorted for deterministic display.
    pub fn tracked_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(text: &'static str) -> Bytes {
        Bytes::from_static(text.as_bytes())
    }

    #[test]
    fn record_and_resolve() {
        let tracker = RecoveryTracker::new();
        tracker.record("a.pdf", payload("aaa"), "application/pdf");

        let resolution = tracker.resolve(&["a.pdf".to_string(), "gone.pdf".to_string()]);
        assert_eq!(resolution.resolved.len(), 1);
        assert_eq!(resolution.resolved[0].name, "a.pdf");
        assert_eq!(resolution.resolved[0].mime, "application/pdf");
        assert_eq!(resolution.missing, vec!["gone.pdf"]);
    }

    #[test]
    fn record_overwrites_same_name() {
        let tracker = RecoveryTracker::new();
        tracker.record("a.pdf", payload("old"), "application/pdf");
        tracker.record("a.pdf", payload("new"), "application/pdf");
        assert_eq!(tracker.len(), 1);

        let resolution = tracker.resolve(&["a.pdf".to_string()]);
        assert_eq!(resolution.resolved[0].payload, payload("new"));
    }

    #[test]
    fn discard_is_idempotent() {
        let tracker = RecoveryTracker::new();
        tracker.record("a.pdf", payload("aaa"), "application/pdf");
        assert!(tracker.discard("a.pdf"));
        assert!(!tracker.discard("a.pdf"));
        assert!(tracker.is_empty());
    }

    #[test]
    fn retain_named_drops_everything_else() {
        let tracker = RecoveryTracker::new();
        tracker.record("a.pdf", payload("a"), "application/pdf");
        tracker.record("b.docx", payload("b"), "application/msword");
        tracker.retain_named(&["b.docx".to_string()]);
        assert!(!tracker.contains("a.pdf"));
        assert!(tracker.contains("b.docx"));

        tracker.retain_named(&[]);
        assert!(tracker.is_empty());
    }

    #[test]
    fn tracked_names_are_sorted() {
        let tracker = RecoveryTracker::new();
        tracker.record("b.docx", payload("b"), "application/msword");
        tracker.record("a.pdf", payload("a"), "application/pdf");
        assert_eq!(tracker.tracked_names(), vec!["a.pdf", "b.docx"]);
    }
}
