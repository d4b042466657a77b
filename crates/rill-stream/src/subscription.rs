use std::fmt;

/// Scoped handle to a live subscription.
///
/// Dropping the handle (or calling [`Subscription::unsubscribe`]) runs its
/// teardown exactly once. Use [`Subscription::detach`] to keep the observer
/// alive for as long as its source lives.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(teardown: impl FnOnce() + 'static) -> Self {
        Self {
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A handle with nothing to release (source already completed, or synchronous).
    pub fn empty() -> Self {
        Self { teardown: None }
    }

    /// Combines several handles into one that releases them in order.
    pub fn all(subscriptions: Vec<Subscription>) -> Self {
        Self::new(move || drop(subscriptions))
    }

    pub fn is_closed(&self) -> bool {
        self.teardown.is_none()
    }

    pub fn unsubscribe(mut self) {
        self.release();
    }

    /// Gives up the handle without releasing the observer.
    pub fn detach(mut self) {
        self.teardown = None;
    }

    fn release(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("closed", &self.is_closed())
            .finish()
    }
}

/// Owns a group of subscriptions and releases them together.
///
/// Used as the per-instance bag of a component: everything the instance
/// subscribed to is released when the set is cleared or dropped.
#[derive(Debug, Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, subscription: Subscription) {
        if !subscription.is_closed() {
            self.subscriptions.push(subscription);
        }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Releases every held subscription, oldest first.
    pub fn clear(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    /// Moves the held subscriptions out without releasing them.
    pub fn take(&mut self) -> Vec<Subscription> {
        std::mem::take(&mut self.subscriptions)
    }
}

impl Drop for SubscriptionSet {
    fn drop(&mut self) {
        self.clear();
    }
}
