use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::observer::Observer;
use crate::subscription::Subscription;

type SubscribeFn<T> = dyn Fn(Observer<T>) -> Subscription;

/// Cold, cloneable description of a push source.
///
/// Nothing happens until [`Stream::subscribe`] is called; every subscription
/// runs the source again (a `scan` keeps one accumulator per subscription).
/// Wrap a [`crate::Subject`] with `Subject::stream` to share a hot source.
pub struct Stream<T> {
    subscribe_fn: Rc<SubscribeFn<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            subscribe_fn: Rc::clone(&self.subscribe_fn),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream").finish_non_exhaustive()
    }
}

impl<T: 'static> Stream<T> {
    pub fn new(subscribe: impl Fn(Observer<T>) -> Subscription + 'static) -> Self {
        Self {
            subscribe_fn: Rc::new(subscribe),
        }
    }

    pub fn subscribe_with(&self, observer: Observer<T>) -> Subscription {
        (self.subscribe_fn)(observer)
    }

    pub fn subscribe(&self, next: impl Fn(T) + 'static) -> Subscription {
        self.subscribe_with(Observer::new(next))
    }

    /// Completes immediately without emitting.
    pub fn empty() -> Self {
        Stream::new(|observer| {
            observer.complete();
            Subscription::empty()
        })
    }

    /// Never emits and never completes.
    pub fn never() -> Self {
        Stream::new(|_| Subscription::empty())
    }

    /// Emits one value, then completes.
    pub fn just(value: T) -> Self
    where
        T: Clone,
    {
        Stream::new(move |observer| {
            observer.next(value.clone());
            observer.complete();
            Subscription::empty()
        })
    }

    pub fn from_iter<I>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Clone,
    {
        let values: Vec<T> = values.into_iter().collect();
        Stream::new(move |observer| {
            for value in &values {
                observer.next(value.clone());
            }
            observer.complete();
            Subscription::empty()
        })
    }

    pub fn map<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            let downstream = observer.clone();
            source.subscribe_with(observer.relay(move |value| downstream.next(f(value))))
        })
    }

    pub fn filter(&self, predicate: impl Fn(&T) -> bool + 'static) -> Stream<T> {
        let source = self.clone();
        let predicate = Rc::new(predicate);
        Stream::new(move |observer: Observer<T>| {
            let predicate = Rc::clone(&predicate);
            let downstream = observer.clone();
            source.subscribe_with(observer.relay(move |value| {
                if predicate(&value) {
                    downstream.next(value);
                }
            }))
        })
    }

    pub fn filter_map<U: 'static>(&self, f: impl Fn(T) -> Option<U> + 'static) -> Stream<U> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<U>| {
            let f = Rc::clone(&f);
            let downstream = observer.clone();
            source.subscribe_with(observer.relay(move |value| {
                if let Some(mapped) = f(value) {
                    downstream.next(mapped);
                }
            }))
        })
    }

    /// Runs a side effect for every value and passes it through unchanged.
    pub fn tap(&self, f: impl Fn(&T) + 'static) -> Stream<T> {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<T>| {
            let f = Rc::clone(&f);
            let downstream = observer.clone();
            source.subscribe_with(observer.relay(move |value| {
                f(&value);
                downstream.next(value);
            }))
        })
    }

    /// Interleaves both sources in real-time order; completes when both have.
    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        Stream::merge_all([self.clone(), other.clone()])
    }

    pub fn merge_all<I>(sources: I) -> Stream<T>
    where
        I: IntoIterator<Item = Stream<T>>,
    {
        let sources: Vec<Stream<T>> = sources.into_iter().collect();
        Stream::new(move |observer: Observer<T>| {
            if sources.is_empty() {
                observer.complete();
                return Subscription::empty();
            }
            let remaining = Rc::new(Cell::new(sources.len()));
            let subscriptions = sources
                .iter()
                .map(|source| {
                    let downstream = observer.clone();
                    let done = observer.clone();
                    let remaining = Rc::clone(&remaining);
                    let forward = Observer::new(move |value| downstream.next(value));
                    source.subscribe_with(forward.with_complete(move || {
                        let left = remaining.get().saturating_sub(1);
                        remaining.set(left);
                        if left == 0 {
                            done.complete();
                        }
                    }))
                })
                .collect();
            Subscription::all(subscriptions)
        })
    }

    /// Emits everything from `self`, then (once `self` completes) everything from `next`.
    pub fn concat(&self, next: &Stream<T>) -> Stream<T> {
        let first = self.clone();
        let second = next.clone();
        Stream::new(move |observer: Observer<T>| {
            let closed = Rc::new(Cell::new(false));
            let second_slot: Rc<RefCell<Option<Subscription>>> = Rc::default();

            let first_sub = {
                let downstream = observer.clone();
                let closed = Rc::clone(&closed);
                let second = second.clone();
                let slot = Rc::clone(&second_slot);
                let observer = observer.clone();
                let forward = Observer::new(move |value| downstream.next(value));
                first.subscribe_with(forward.with_complete(move || {
                    if closed.get() {
                        return;
                    }
                    let sub = second.subscribe_with(observer.clone());
                    *slot.borrow_mut() = Some(sub);
                }))
            };

            Subscription::new(move || {
                closed.set(true);
                drop(first_sub);
                let second_sub = second_slot.borrow_mut().take();
                drop(second_sub);
            })
        })
    }

    /// Prepends `value` to the stream.
    pub fn start_with(&self, value: T) -> Stream<T>
    where
        T: Clone,
    {
        Stream::just(value).concat(self)
    }

    /// Stateful left fold. Emits the new accumulator after every input;
    /// the seed itself is not emitted. Each subscription folds independently.
    pub fn scan<A>(&self, seed: A, f: impl Fn(&A, T) -> A + 'static) -> Stream<A>
    where
        A: Clone + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::new(move |observer: Observer<A>| {
            let state = Rc::new(RefCell::new(seed.clone()));
            let f = Rc::clone(&f);
            let downstream = observer.clone();
            source.subscribe_with(observer.relay(move |value| {
                // Clone out so a re-entrant emission can fold on top of this one.
                let current = state.borrow().clone();
                let next = f(&current, value);
                *state.borrow_mut() = next.clone();
                downstream.next(next);
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::Subject;

    fn record<T: 'static>(
        stream: &Stream<T>,
    ) -> (Rc<RefCell<Vec<T>>>, Rc<Cell<bool>>, Subscription) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let done = Rc::new(Cell::new(false));
        let sink = seen.clone();
        let flag = done.clone();
        let sub = stream.subscribe_with(
            Observer::new(move |v| sink.borrow_mut().push(v)).with_complete(move || flag.set(true)),
        );
        (seen, done, sub)
    }

    #[test]
    fn just_emits_then_completes() {
        let (seen, done, _sub) = record(&Stream::just(5));
        assert_eq!(*seen.borrow(), vec![5]);
        assert!(done.get());
    }

    #[test]
    fn empty_and_never() {
        let (seen, done, _sub) = record(&Stream::<u8>::empty());
        assert!(seen.borrow().is_empty());
        assert!(done.get());

        let (seen, done, _sub) = record(&Stream::<u8>::never());
        assert!(seen.borrow().is_empty());
        assert!(!done.get());
    }

    #[test]
    fn map_filter_chain() {
        let stream = Stream::from_iter(1..=6)
            .filter(|v| v % 2 == 0)
            .map(|v| v * 10);
        let (seen, done, _sub) = record(&stream);
        assert_eq!(*seen.borrow(), vec![20, 40, 60]);
        assert!(done.get());
    }

    #[test]
    fn filter_map_drops_none() {
        let stream = Stream::from_iter(["1", "x", "3"]).filter_map(|s| s.parse::<i32>().ok());
        let (seen, _, _sub) = record(&stream);
        assert_eq!(*seen.borrow(), vec![1, 3]);
    }

    #[test]
    fn tap_sees_values_without_changing_them() {
        let tapped = Rc::new(RefCell::new(Vec::new()));
        let sink = tapped.clone();
        let stream = Stream::from_iter([1, 2]).tap(move |v| sink.borrow_mut().push(*v));
        let (seen, _, _sub) = record(&stream);
        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert_eq!(*tapped.borrow(), vec![1, 2]);
    }

    #[test]
    fn merge_interleaves_hot_sources_in_emission_order() {
        let a = Subject::new();
        let b = Subject::new();
        let (seen, _, _sub) = record(&a.stream().merge(&b.stream()));

        a.emit("a1");
        b.emit("b1");
        a.emit("a2");

        assert_eq!(*seen.borrow(), vec!["a1", "b1", "a2"]);
    }

    #[test]
    fn merge_completes_after_all_sources() {
        let a: Subject<u8> = Subject::new();
        let (_, done, _sub) = record(&a.stream().merge(&Stream::empty()));
        assert!(!done.get());
        a.complete();
        assert!(done.get());
    }

    #[test]
    fn concat_waits_for_first_to_complete() {
        let first = Subject::new();
        let second = Subject::new();
        let (seen, done, _sub) = record(&first.stream().concat(&second.stream()));

        second.emit(0);
        first.emit(1);
        first.complete();
        second.emit(2);
        second.complete();

        assert_eq!(*seen.borrow(), vec![1, 2]);
        assert!(done.get());
    }

    #[test]
    fn concat_teardown_releases_second_source() {
        let second: Subject<u8> = Subject::new();
        let sub = Stream::just(1).concat(&second.stream()).subscribe(|_| {});
        assert_eq!(second.observer_count(), 1);
        drop(sub);
        assert_eq!(second.observer_count(), 0);
    }

    #[test]
    fn start_with_prepends() {
        let subject = Subject::new();
        let (seen, _, _sub) = record(&subject.stream().start_with(0));
        subject.emit(1);
        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn scan_folds_and_does_not_emit_seed() {
        let subject = Subject::new();
        let (seen, _, _sub) = record(&subject.stream().scan(0, |acc, v: i32| acc + v));
        subject.emit(1);
        subject.emit(2);
        subject.emit(3);
        assert_eq!(*seen.borrow(), vec![1, 3, 6]);
    }

    #[test]
    fn scan_state_is_per_subscription() {
        let subject = Subject::new();
        let sums = subject.stream().scan(0, |acc, v: i32| acc + v);
        let (first, _, _a) = record(&sums);
        subject.emit(5);
        let (second, _, _b) = record(&sums);
        subject.emit(1);
        assert_eq!(*first.borrow(), vec![5, 6]);
        assert_eq!(*second.borrow(), vec![1]);
    }

    #[test]
    fn scan_tolerates_reentrant_emission() {
        let subject: Subject<i32> = Subject::new();
        let sums = subject.stream().scan(0, |acc, v| acc + v);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let feedback = subject.clone();
        let _sub = sums.subscribe(move |total| {
            sink.borrow_mut().push(total);
            if total == 1 {
                feedback.emit(10);
            }
        });

        subject.emit(1);

        assert_eq!(*seen.borrow(), vec![1, 11]);
    }

    #[test]
    fn dropping_derived_subscription_releases_subject_observer() {
        let subject: Subject<i32> = Subject::new();
        let sub = subject.stream().map(|v| v + 1).filter(|_| true).subscribe(|_| {});
        assert_eq!(subject.observer_count(), 1);
        drop(sub);
        assert_eq!(subject.observer_count(), 0);
    }
}
