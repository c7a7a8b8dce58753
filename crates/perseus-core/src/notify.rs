//! Synchronous change notification with explicit unregister handles
//!
//! Everything in the UI core runs on a single event loop, so listeners are
//! plain callbacks held behind `Rc` and delivered in subscription order on
//! the emitting thread. A [`Subscription`] only keeps a weak reference to its
//! source: dropping the source silences every handle, dropping a handle
//! removes its listener.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::trace;

type Listener<T> = Rc<dyn Fn(&T)>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

impl<T> Listeners<T> {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// Event source delivering `&T` to every live listener.
pub struct Notifier<T> {
    listeners: Rc<RefCell<Listeners<T>>>,
}

/// Parameter-less change stream.
pub type ChangeNotifier = Notifier<()>;

impl<T: 'static> Notifier<T> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a listener. It stays registered until the returned handle is
    /// unsubscribed or dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + 'static,
    {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Rc::new(listener)));
            id
        };

        let source: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.listeners);
        Subscription {
            release: Some(Box::new(move || {
                if let Some(listeners) = source.upgrade() {
                    listeners
                        .borrow_mut()
                        .entries
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Deliver `value` to every listener in subscription order.
    ///
    /// Listeners may subscribe or unsubscribe while the emission is running.
    /// A listener removed by an earlier one in the same pass is skipped.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<(u64, Listener<T>)> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(id, listener)| (*id, Rc::clone(listener)))
            .collect();

        trace!(listeners = snapshot.len(), "emitting notification");

        for (id, listener) in snapshot {
            if self.listeners.borrow().contains(id) {
                listener(value);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl ChangeNotifier {
    /// Signal a change with no payload.
    pub fn notify(&self) {
        self.emit(&());
    }
}

impl<T: 'static> Default for Notifier<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Notifier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

/// Unregister handle returned by [`Notifier::subscribe`].
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Remove the listener from its source. Calling this twice is a no-op.
    pub fn unsubscribe(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }

    pub fn is_active(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Work queued to run after the current pass has finished.
///
/// Stands in for "next tick" scheduling: callers `defer` reads that must see
/// settled state and the host drains the queue once its own pass is done.
#[derive(Clone, Default)]
pub struct TickQueue {
    pending: Rc<RefCell<VecDeque<Box<dyn FnOnce()>>>>,
}

impl TickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce() + 'static,
    {
        self.pending.borrow_mut().push_back(Box::new(task));
    }

    /// Run queued tasks in FIFO order, including tasks deferred while
    /// draining. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        loop {
            let next = self.pending.borrow_mut().pop_front();
            match next {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => break,
            }
        }
        ran
    }

    pub fn len(&self) -> usize {
        self.pending.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_empty()
    }
}

impl fmt::Debug for TickQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_emit_reaches_listeners_in_order() {
        let notifier: Notifier<u32> = Notifier::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let _a = notifier.subscribe(move |v| first.borrow_mut().push(("a", *v)));
        let second = Rc::clone(&seen);
        let _b = notifier.subscribe(move |v| second.borrow_mut().push(("b", *v)));

        notifier.emit(&1);
        notifier.emit(&2);

        assert_eq!(*seen.borrow(), vec![("a", 1), ("b", 1), ("a", 2), ("b", 2)]);
    }

    #[test]
    fn test_unsubscribe_and_drop_release_listener() {
        let notifier = ChangeNotifier::new();
        let hits = Rc::new(Cell::new(0));

        let counter = Rc::clone(&hits);
        let mut sub = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        assert_eq!(notifier.listener_count(), 1);

        notifier.notify();
        sub.unsubscribe();
        sub.unsubscribe();
        notifier.notify();

        assert_eq!(hits.get(), 1);
        assert!(!sub.is_active());
        assert_eq!(notifier.listener_count(), 0);

        let counter = Rc::clone(&hits);
        let dropped = notifier.subscribe(move |_| counter.set(counter.get() + 1));
        drop(dropped);
        notifier.notify();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_source_is_inert() {
        let notifier = ChangeNotifier::new();
        let mut sub = notifier.subscribe(|_| {});
        drop(notifier);
        sub.unsubscribe();
        assert!(!sub.is_active());
    }

    #[test]
    fn test_listener_removed_mid_emission_is_skipped() {
        let notifier = Rc::new(ChangeNotifier::new());
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let victim_hits = Rc::new(Cell::new(0));

        let slot = Rc::clone(&victim);
        let _killer = notifier.subscribe(move |_| {
            if let Some(mut sub) = slot.borrow_mut().take() {
                sub.unsubscribe();
            }
        });
        let counter = Rc::clone(&victim_hits);
        *victim.borrow_mut() = Some(notifier.subscribe(move |_| counter.set(counter.get() + 1)));

        notifier.notify();
        assert_eq!(victim_hits.get(), 0);
        assert_eq!(notifier.listener_count(), 1);
    }

    #[test]
    fn test_tick_queue_runs_nested_work_fifo() {
        let queue = TickQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let inner_queue = queue.clone();
        let outer_log = Rc::clone(&log);
        queue.defer(move || {
            outer_log.borrow_mut().push(1);
            let nested_log = Rc::clone(&outer_log);
            inner_queue.defer(move || nested_log.borrow_mut().push(3));
        });
        let second_log = Rc::clone(&log);
        queue.defer(move || second_log.borrow_mut().push(2));

        assert_eq!(queue.len(), 2);
        assert_eq!(queue.run_pending(), 3);
        assert!(queue.is_empty());
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }
}
