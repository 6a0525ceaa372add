use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use super::message::LogRecord;

struct Inner {
    sender: mpsc::SyncSender<LogRecord>,
    receiver: Mutex<Option<mpsc::Receiver<LogRecord>>>,
}

/// Owns the single channel every logger created from the same [`Factory`](super::Factory)
/// pushes records into. A `std::sync::mpsc::sync_channel` rather than an async
/// one: probe unit tests write through a [`Logger`](super::Logger) with no
/// Tokio runtime in scope, and `Logger::write` blocks on a full channel the
/// same way from either a sync or an async caller. Cloning shares the
/// channel; the receiving half can be taken exactly once, by whichever
/// `Cluster` is going to drain it.
#[derive(Clone)]
pub struct ChannelProvider {
    inner: Arc<Inner>,
}

impl ChannelProvider {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        Self {
            inner: Arc::new(Inner {
                sender,
                receiver: Mutex::new(Some(receiver)),
            }),
        }
    }

    pub(crate) fn sender(&self) -> mpsc::SyncSender<LogRecord> {
        self.inner.sender.clone()
    }

    /// Takes ownership of the receiving half. Returns `None` on every call
    /// after the first.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<LogRecord>> {
        self.inner.receiver.lock().expect("channel provider mutex poisoned").take()
    }
}
