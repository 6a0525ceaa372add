use std::sync::Arc;

use crate::future::{Future, WaitGroup};
use crate::probe::Probe;

/// A consumer method receives the probe it is dispatched against and a future
/// to report its outcome on.
pub type ConsumerMethod = Arc<dyn Fn(&mut dyn Probe, Future) + Send + Sync>;

/// A reusable invocation strategy for a probe operation: either synchronous
/// (runs on the worker's own loop, blocking it until done) or asynchronous
/// (runs on a spawned task, letting the worker loop move on to its next item).
///
/// Both variants carry a list of external wait-groups that are incremented
/// before dispatch and decremented after completion, letting a pool fan-out
/// await every dispatch it triggered regardless of which variant was used.
#[derive(Clone)]
pub struct Consumer {
    method: ConsumerMethod,
    sync: bool,
    notifiers: Vec<WaitGroup>,
}

impl Consumer {
    pub fn sync(method: impl Fn(&mut dyn Probe, Future) + Send + Sync + 'static) -> Self {
        Self {
            method: Arc::new(method),
            sync: true,
            notifiers: Vec::new(),
        }
    }

    pub fn asynchronous(method: impl Fn(&mut dyn Probe, Future) + Send + Sync + 'static) -> Self {
        Self {
            method: Arc::new(method),
            sync: false,
            notifiers: Vec::new(),
        }
    }

    /// Registers an additional wait-group to track dispatches of this consumer.
    pub fn notify(mut self, wait_group: WaitGroup) -> Self {
        self.notifiers.push(wait_group);
        self
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    pub(crate) fn method(&self) -> ConsumerMethod {
        self.method.clone()
    }

    pub(crate) fn notifiers(&self) -> &[WaitGroup] {
        &self.notifiers
    }
}
