//! The pre-submission upload queue.
//!
//! Holds client-selected files in memory until they are submitted. The
//! 10-file batch ceiling is enforced at insertion: a call that would exceed
//! it is rejected whole, with no partial admission.

use bytes::Bytes;
use intake_parser::UploadPart;
use thiserror::Error;

use crate::filetype;
use crate::MAX_BATCH_FILES;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueueError {
    #[error(
        "adding {incoming} file(s) would exceed the {max}-file batch limit ({queued} already queued)"
    )]
    CapacityExceeded {
        queued: usize,
        incoming: usize,
        max: usize,
    },
}

/// A file offered for admission: name, payload and whatever MIME type the
/// selection source declared for it.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub payload: Bytes,
    pub declared_mime: Option<String>,
}

/// A queued file. The payload is a [`Bytes`] handle so the queue, an
/// in-flight snapshot, and the failure recovery tracker share a single
/// allocation; it is released when the last holder drops.
#[derive(Debug, Clone)]
pub struct QueuedFile {
    pub name: String,
    pub payload: Bytes,
    pub mime: &'static str,
}

impl QueuedFile {
    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn to_part(&self) -> UploadPart {
        UploadPart {
            filename: self.name.clone(),
            payload: self.payload.clone(),
            mime: self.mime,
        }
    }
}

/// A file turned away at admission, with the reason shown to the user.
#[derive(Debug, Clone)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

/// Outcome of one `add` call: which names were admitted and which were
/// rejected per-file. Type rejections are reported explicitly rather than
/// silently dropped, so capacity and type failures stay distinguishable.
#[derive(Debug, Clone, Default)]
pub struct Admission {
    pub admitted: Vec<String>,
    pub rejected: Vec<RejectedFile>,
}

#[derive(Debug, Default)]
pub struct UploadQueue {
    files: Vec<QueuedFile>,
}

impl UploadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a set of files.
    ///
    /// Capacity is checked against the full incoming count before any type
    /// filtering: if `len + incoming > MAX_BATCH_FILES` the whole call is
    /// rejected and the queue is left unchanged. Otherwise files not on the
    /// type allow-list are rejected individually and the rest are appended.
    pub fn add(
        &mut self,
        incoming: impl IntoIterator<Item = IncomingFile>,
    ) -> Result<Admission, QueueError> {
        let incoming: Vec<IncomingFile> = incoming.into_iter().collect();

        if self.files.len() + incoming.len() > MAX_BATCH_FILES {
            return Err(QueueError::CapacityExceeded {
                queued: self.files.len(),
                incoming: incoming.len(),
                max: MAX_BATCH_FILES,
            });
        }

        let mut admission = Admission::default();
        for file in incoming {
            match filetype::accepted_mime(&file.name, file.declared_mime.as_deref()) {
                Some(mime) => {
                    admission.admitted.push(file.name.clone());
                    self.files.push(QueuedFile {
                        name: file.name,
                        payload: file.payload,
                        mime,
                    });
                }
                None => {
                    log::info!("rejected {} (unsupported file type)", file.name);
                    admission.rejected.push(RejectedFile {
                        name: file.name,
                        reason: "unsupported file type".to_string(),
                    });
                }
            }
        }
        Ok(admission)
    }

    /// Remove exactly one file by position. Out of bounds is a no-op
    /// returning `None`.
    pub fn remove(&mut self, index: usize) -> Option<QueuedFile> {
        if index >= self.files.len() {
            return None;
        }
        Some(self.files.remove(index))
    }

    /// Truncate the queue to its first `target` entries (always drops from
    /// the tail). A target at or above the current length is a no-op.
    pub fn reduce_to(&mut self, target: usize) {
        self.files.truncate(target);
    }

    /// Remove the first file with the given name. Returns whether one was
    /// removed.
    pub fn evict(&mut self, name: &str) -> bool {
        match self.files.iter().position(|f| f.name == name) {
            Some(index) => {
                self.files.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&QueuedFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// Copy of the current contents. Later queue mutations do not affect a
    /// snapshot; payload bytes are shared, not duplicated.
    pub fn snapshot(&self) -> Vec<QueuedFile> {
        self.files.clone()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueuedFile> {
        self.files.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn incoming(name: &str) -> IncomingFile {
        IncomingFile {
            name: name.to_string(),
            payload: Bytes::from_static(b"%PDF-1.4 stub"),
            declared_mime: None,
        }
    }

    #[test]
    fn admits_valid_rejects_invalid() {
        let mut queue = UploadQueue::new();
        let admission = queue
            .add(vec![incoming("a.pdf"), incoming("b.exe")])
            .unwrap();
        assert_eq!(admission.admitted, vec!["a.pdf"]);
        assert_eq!(admission.rejected.len(), 1);
        assert_eq!(admission.rejected[0].name, "b.exe");
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn capacity_rejection_is_all_or_nothing() {
        let mut queue = UploadQueue::new();
        let eight: Vec<IncomingFile> = (0..8).map(|i| incoming(&format!("f{i}.pdf"))).collect();
        queue.add(eight).unwrap();
        assert_eq!(queue.len(), 8);

        let three: Vec<IncomingFile> = (0..3).map(|i| incoming(&format!("g{i}.pdf"))).collect();
        let err = queue.add(three).unwrap_err();
        assert_eq!(
            err,
            QueueError::CapacityExceeded {
                queued: 8,
                incoming: 3,
                max: MAX_BATCH_FILES,
            }
        );
        // The rejected call must leave the queue untouched.
        assert_eq!(queue.len(), 8);
    }

    #[test]
    fn capacity_counts_incoming_before_type_filtering() {
        let mut queue = UploadQueue::new();
        let nine: Vec<IncomingFile> = (0..9).map(|i| incoming(&format!("f{i}.pdf"))).collect();
        queue.add(nine).unwrap();

        // Two incoming files exceed capacity even though one of them would
        // be rejected on type grounds anyway.
        let err = queue.add(vec![incoming("x.pdf"), incoming("y.exe")]);
        assert!(err.is_err());
        assert_eq!(queue.len(), 9);
    }

    #[test]
    fn fills_to_exactly_the_ceiling() {
        let mut queue = UploadQueue::new();
        let ten: Vec<IncomingFile> = (0..10).map(|i| incoming(&format!("f{i}.pdf"))).collect();
        queue.add(ten).unwrap();
        assert_eq!(queue.len(), MAX_BATCH_FILES);
        assert!(queue.add(vec![incoming("one-more.pdf")]).is_err());
    }

    #[test]
    fn remove_out_of_bounds_is_noop() {
        let mut queue = UploadQueue::new();
        queue.add(vec![incoming("a.pdf")]).unwrap();
        assert!(queue.remove(5).is_none());
        assert_eq!(queue.len(), 1);
        let removed = queue.remove(0).unwrap();
        assert_eq!(removed.name, "a.pdf");
        assert!(queue.is_empty());
    }

    #[test]
    fn reduce_to_drops_from_the_tail() {
        let mut queue = UploadQueue::new();
        queue
            .add(vec![incoming("a.pdf"), incoming("b.pdf"), incoming("c.pdf")])
            .unwrap();
        queue.reduce_to(2);
        let names: Vec<&str> = queue.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);

        queue.reduce_to(10);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn evict_removes_by_name() {
        let mut queue = UploadQueue::new();
        queue
            .add(vec![incoming("a.pdf"), incoming("b.pdf")])
            .unwrap();
        assert!(queue.evict("a.pdf"));
        assert!(!queue.evict("a.pdf"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn snapshot_is_isolated_from_later_mutations() {
        let mut queue = UploadQueue::new();
        queue.add(vec![incoming("a.pdf")]).unwrap();
        let snapshot = queue.snapshot();
        queue.reduce_to(0);
        assert!(queue.is_empty());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].name, "a.pdf");
    }
}
