//! Cross-thread event inbox.
//!
//! The event core is single-threaded. Background work reports back by sending
//! records through an [`InboxSender`]; the UI thread drains the [`Inbox`] into
//! a program with [`Program::drain_inbox`](crate::Program::drain_inbox).

use tokio::sync::mpsc::{self, error::TryRecvError};

use crate::error::{Result, RillError};
use crate::event::EventRecord;
use crate::kind::EventKind;

pub fn inbox() -> (InboxSender, Inbox) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboxSender { tx }, Inbox { rx })
}

#[derive(Debug, Clone)]
pub struct InboxSender {
    tx: mpsc::UnboundedSender<EventRecord>,
}

impl InboxSender {
    pub fn send(&self, record: EventRecord) -> Result<()> {
        self.tx.send(record).map_err(|_| RillError::InboxClosed)
    }

    pub fn send_kind<K: EventKind>(&self, kind: K) -> Result<()> {
        self.send(kind.into_record()?)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

#[derive(Debug)]
pub struct Inbox {
    rx: mpsc::UnboundedReceiver<EventRecord>,
}

impl Inbox {
    /// Next queued record, without waiting.
    pub fn try_next(&mut self) -> Option<EventRecord> {
        match self.rx.try_recv() {
            Ok(record) => Some(record),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Waits for the next record; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<EventRecord> {
        self.rx.recv().await
    }

    pub fn close(&mut self) {
        self.rx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventType;
    use std::thread;

    #[test]
    fn records_cross_threads_in_order() {
        let (tx, mut inbox) = inbox();
        let worker = thread::spawn(move || {
            for i in 0..5 {
                tx.send(EventType::from("progress").record(i)).unwrap();
            }
        });
        worker.join().unwrap();

        let drained: Vec<i64> = std::iter::from_fn(|| inbox.try_next())
            .filter_map(|r| r.payload().as_i64())
            .collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn closed_inbox_rejects_sends() {
        let (tx, mut inbox) = inbox();
        inbox.close();
        assert!(tx.is_closed());
        assert!(matches!(
            tx.send(EventType::from("late").signal()),
            Err(RillError::InboxClosed)
        ));
    }

    #[tokio::test]
    async fn recv_waits_for_async_senders() {
        let (tx, mut inbox) = inbox();
        tokio::spawn(async move {
            tx.send(EventType::from("loaded").record("done")).unwrap();
        });
        let record = inbox.recv().await.unwrap();
        assert!(record.is("loaded"));
        assert!(inbox.recv().await.is_none());
    }
}
