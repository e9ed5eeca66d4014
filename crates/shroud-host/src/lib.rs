//! Isolation host for untrusted documents.
//!
//! An [`IsolationHost`] owns one host element on the page. Attaching a
//! sanitized [`shroud_dom::Dom`] mounts it under the host's shadow root,
//! replacing whatever was mounted before. Consumers reach the mounted tree
//! through a [`ShadowRoot`] snapshot; long-running work keeps
//! [`NodeHandle`]s, which silently stop writing once a newer document has
//! been attached.
//!
//! Timers that belong to one attachment go through its [`Scheduler`] and are
//! cancelled when the attachment is superseded.

mod host;
mod root;
mod scheduler;

pub use host::{HostElement, IsolationHost};
pub use root::{ClickOutcome, NodeHandle, ShadowRoot};
pub use scheduler::Scheduler;

/// Isolation host error.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HostError {
    /// Nothing has been attached yet (or the host was detached).
    #[error("no document is attached")]
    NotAttached,
    /// The snapshot belongs to an attachment that has been replaced.
    #[error("attachment {generation} was superseded")]
    Superseded {
        /// Generation of the stale snapshot.
        generation: u64,
    },
}
