//! Push-based streams for a single-threaded UI core.
//!
//! Everything here runs synchronously on the caller's stack:
//!
//! - **Subject**: hot multicast source you emit into by hand
//! - **Stream**: cold, cloneable description of a source plus combinators
//!   (`map`, `filter`, `merge`, `concat`, `scan`, ...)
//! - **Subscription**: scoped handle; dropping it releases the observer
//!
//! ```text
//! Subject::emit(v) --> observer 1 --> map --> scan --> sink
//!                 \--> observer 2 (snapshot order, re-entrant safe)
//! ```
//!
//! Nested emissions (an observer emitting while it is being notified) are
//! delivered completely before the outer emission continues.

mod observer;
mod stream;
mod subject;
mod subscription;

pub use observer::Observer;
pub use stream::Stream;
pub use subject::Subject;
pub use subscription::{Subscription, SubscriptionSet};
