use std::fmt;
use std::rc::Rc;

/// Receiving end of a stream: a value callback plus an optional completion callback.
///
/// Cheap to clone; clones share the same closures.
pub struct Observer<T> {
    next: Rc<dyn Fn(T)>,
    complete: Option<Rc<dyn Fn()>>,
}

impl<T> Observer<T> {
    pub fn new(next: impl Fn(T) + 'static) -> Self {
        Self {
            next: Rc::new(next),
            complete: None,
        }
    }

    pub fn with_complete(mut self, complete: impl Fn() + 'static) -> Self {
        self.complete = Some(Rc::new(complete));
        self
    }

    pub fn next(&self, value: T) {
        (self.next)(value)
    }

    pub fn complete(&self) {
        if let Some(complete) = &self.complete {
            complete()
        }
    }

    /// Builds an upstream observer that feeds `next` and forwards completion to `self`.
    pub(crate) fn relay<U: 'static>(&self, next: impl Fn(U) + 'static) -> Observer<U>
    where
        T: 'static,
    {
        let downstream = self.clone();
        Observer::new(next).with_complete(move || downstream.complete())
    }
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: Rc::clone(&self.next),
            complete: self.complete.clone(),
        }
    }
}

impl<T> fmt::Debug for Observer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("has_complete", &self.complete.is_some())
            .finish()
    }
}
