use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::observer::Observer;
use crate::stream::Stream;
use crate::subscription::Subscription;

struct Slot<T> {
    id: u64,
    observer: Observer<T>,
    active: Cell<bool>,
}

struct Inner<T> {
    slots: RefCell<Vec<Rc<Slot<T>>>>,
    next_id: Cell<u64>,
    completed: Cell<bool>,
}

/// Hot multicast source with a manual injection point.
///
/// `emit` delivers synchronously to every live observer in subscription
/// order. The observer list is snapshotted per emission, so observers may
/// subscribe, unsubscribe or emit again while being notified. An observer
/// released mid-emission is skipped for the rest of that emission.
pub struct Subject<T> {
    inner: Rc<Inner<T>>,
}

impl<T: Clone + 'static> Subject<T> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(Inner {
                slots: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                completed: Cell::new(false),
            }),
        }
    }

    pub fn emit(&self, value: T) {
        if self.inner.completed.get() {
            tracing::warn!("emit on completed subject ignored");
            return;
        }

        let snapshot: Vec<Rc<Slot<T>>> = self.inner.slots.borrow().clone();
        for slot in snapshot {
            if slot.active.get() {
                slot.observer.next(value.clone());
            }
        }
    }

    pub fn subscribe(&self, observer: Observer<T>) -> Subscription {
        if self.inner.completed.get() {
            observer.complete();
            return Subscription::empty();
        }

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id.wrapping_add(1));

        let slot = Rc::new(Slot {
            id,
            observer,
            active: Cell::new(true),
        });
        self.inner.slots.borrow_mut().push(Rc::clone(&slot));

        let weak: Weak<Inner<T>> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            slot.active.set(false);
            if let Some(inner) = weak.upgrade() {
                inner.slots.borrow_mut().retain(|s| s.id != id);
            }
        })
    }

    /// Notifies completion observers once and drops every observer.
    pub fn complete(&self) {
        if self.inner.completed.replace(true) {
            return;
        }
        let slots = std::mem::take(&mut *self.inner.slots.borrow_mut());
        for slot in slots {
            if slot.active.replace(false) {
                slot.observer.complete();
            }
        }
    }

    pub fn is_completed(&self) -> bool {
        self.inner.completed.get()
    }

    pub fn observer_count(&self) -> usize {
        self.inner
            .slots
            .borrow()
            .iter()
            .filter(|s| s.active.get())
            .count()
    }

    pub fn stream(&self) -> Stream<T> {
        let subject = self.clone();
        Stream::new(move |observer| subject.subscribe(observer))
    }
}

impl<T: Clone + 'static> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Subject<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for Subject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subject")
            .field("observers", &self.inner.slots.borrow().len())
            .field("completed", &self.inner.completed.get())
            .finish()
    }
}
