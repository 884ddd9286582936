//! Ambient subject - the "current content item" made explicit
//!
//! Binding sources and included fragments read the current subject implicitly.
//! Instead of a process-wide global, every render threads a [`SubjectContext`]
//! handle through its calls. Switching the subject goes through a
//! [`SubjectGuard`] so the previous subject comes back on every exit path,
//! including `?` returns and panics.
//!
//! ```text
//! ambient: A
//!   enter(B)          → ambient: B
//!     enter(C)        → ambient: C
//!     drop guard(C)   → ambient: B
//!   drop guard(B)     → ambient: A
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::host::Host;

/// A content item (post, page, custom type) as seen by templates and sources
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: u64,

    #[serde(default)]
    pub post_type: String,

    #[serde(default)]
    pub slug: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub content: String,

    /// Custom fields, read by `core/post-meta`
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Subject {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            post_type: "post".to_string(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

/// Shared slot holding the ambient subject of one request
///
/// Cloning yields another handle to the same slot, so nested renders and
/// template functions of a request all observe the same switches.
#[derive(Debug, Clone, Default)]
pub struct SubjectContext {
    slot: Arc<Mutex<Option<Subject>>>,
}

impl SubjectContext {
    pub fn new(initial: Option<Subject>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(initial)),
        }
    }

    /// Snapshot of the current subject
    pub fn current(&self) -> Option<Subject> {
        self.slot.lock().clone()
    }

    pub fn current_id(&self) -> Option<u64> {
        self.slot.lock().as_ref().map(|s| s.id)
    }

    /// Make `subject` ambient until the returned guard is dropped
    #[must_use = "the previous subject is restored as soon as the guard is dropped"]
    pub fn enter(&self, subject: Subject) -> SubjectGuard<'_> {
        let previous = std::mem::replace(&mut *self.slot.lock(), Some(subject));
        SubjectGuard {
            ctx: self,
            previous: Some(previous),
        }
    }

    /// Run `f` with subject `id` made ambient
    ///
    /// `None`, or an id the host cannot resolve, runs `f` with the ambient
    /// subject unchanged.
    pub fn with_subject<T>(&self, host: &dyn Host, id: Option<u64>, f: impl FnOnce() -> T) -> T {
        let Some(id) = id else {
            return f();
        };

        match host.subject(id) {
            Some(subject) => {
                let _guard = self.enter(subject);
                f()
            }
            None => {
                debug!(subject_id = id, "subject not found, keeping ambient subject");
                f()
            }
        }
    }
}

/// Restores the captured subject on drop
#[derive(Debug)]
pub struct SubjectGuard<'a> {
    ctx: &'a SubjectContext,
    previous: Option<Option<Subject>>,
}

impl Drop for SubjectGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            *self.ctx.slot.lock() = previous;
        }
    }
}
