//! Timers scoped to one attachment.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures::future::{AbortHandle, Abortable};

/// Pending timers of one attachment.
#[derive(Debug, Default)]
pub(crate) struct Attachment {
    cancelled: Cell<bool>,
    next_timer: Cell<u64>,
    pending: RefCell<HashMap<u64, AbortHandle>>,
}

impl Attachment {
    /// Abort every pending timer and refuse new ones.
    pub(crate) fn cancel(&self) {
        self.cancelled.set(true);
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "Cancelled scheduled callbacks");
        }
        for handle in pending.into_values() {
            handle.abort();
        }
    }

    fn register(self: &Rc<Self>, handle: AbortHandle) -> PendingTimer {
        let id = self.next_timer.get();
        self.next_timer.set(id + 1);
        self.pending.borrow_mut().insert(id, handle);
        PendingTimer {
            attachment: Rc::clone(self),
            id,
        }
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Unregisters a timer once it fires or its future is dropped.
struct PendingTimer {
    attachment: Rc<Attachment>,
    id: u64,
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        self.attachment.pending.borrow_mut().remove(&self.id);
    }
}

/// Runs delayed callbacks for one attachment.
///
/// Cheap to clone; clones share the attachment.
#[derive(Debug, Clone)]
pub struct Scheduler {
    attachment: Rc<Attachment>,
}

impl Scheduler {
    pub(crate) fn new(attachment: Rc<Attachment>) -> Self {
        Self { attachment }
    }

    /// Run `f` after `delay`.
    ///
    /// Resolves to `None` without calling `f` when the attachment is
    /// superseded before the delay elapses.
    pub async fn after<R>(&self, delay: Duration, f: impl FnOnce() -> R) -> Option<R> {
        if self.is_cancelled() {
            return None;
        }
        let (handle, registration) = AbortHandle::new_pair();
        let timer = self.attachment.register(handle);

        let elapsed = Abortable::new(tokio::time::sleep(delay), registration).await;
        drop(timer);
        elapsed.ok()?;
        Some(f())
    }

    /// Whether the owning attachment has been superseded.
    pub fn is_cancelled(&self) -> bool {
        self.attachment.cancelled.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_runs_after_delay() {
        let scheduler = Scheduler::new(Rc::new(Attachment::default()));
        let value = scheduler.after(Duration::from_millis(200), || 7).await;
        assert_eq!(value, Some(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_timers_are_released() {
        let attachment = Rc::new(Attachment::default());
        let scheduler = Scheduler::new(Rc::clone(&attachment));

        for delay in [10, 20, 30] {
            scheduler.after(Duration::from_millis(delay), || ()).await;
        }
        assert_eq!(attachment.pending_count(), 0);

        let pending = scheduler.after(Duration::from_millis(200), || ());
        let observe = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            attachment.pending_count()
        };
        let (_, while_pending) = futures::join!(pending, observe);
        assert_eq!(while_pending, 1);
        assert_eq!(attachment.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_timer_is_released() {
        let attachment = Rc::new(Attachment::default());
        let scheduler = Scheduler::new(Rc::clone(&attachment));

        let mut pending = Box::pin(scheduler.after(Duration::from_secs(1), || ()));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        assert_eq!(attachment.pending_count(), 1);

        drop(pending);
        assert_eq!(attachment.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_aborts_pending() {
        let attachment = Rc::new(Attachment::default());
        let scheduler = Scheduler::new(Rc::clone(&attachment));
        let fired = Rc::new(Cell::new(false));
        let fired_in_callback = Rc::clone(&fired);

        let pending = scheduler.after(Duration::from_millis(200), move || {
            fired_in_callback.set(true);
        });
        let cancel = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            attachment.cancel();
        };
        let (result, ()) = futures::join!(pending, cancel);

        assert_eq!(result, None);
        assert!(!fired.get());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_scheduler_refuses_new_timers() {
        let attachment = Rc::new(Attachment::default());
        attachment.cancel();
        let scheduler = Scheduler::new(attachment);

        assert!(scheduler.is_cancelled());
        assert_eq!(scheduler.after(Duration::ZERO, || ()).await, None);
    }
}
