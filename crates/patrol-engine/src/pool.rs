use std::time::Duration;

use crate::consumer::Consumer;
use crate::error::{Error, Result};
use crate::future::{Future, WaitGroup};
use crate::heartbeat::Heartbeat;
use crate::probe::Probe;
use crate::result::ResultSnapshot;
use crate::worker::Worker;

struct Entry {
    name: String,
    heartbeat: Heartbeat,
    worker: Worker,
}

/// Captures the futures and wait-group of one `for_each` fan-out so callers
/// can await completion and then inspect the first error, if any.
pub struct Barrier {
    wait_group: WaitGroup,
    futures: Vec<Future>,
}

impl Barrier {
    pub async fn wait(&self) {
        self.wait_group.wait().await;
    }

    pub fn first_error(&self) -> Option<crate::error::Error> {
        self.futures
            .iter()
            .find_map(|future| match future.is_completed() {
                (true, Some(error)) => Some(error),
                _ => None,
            })
    }
}

/// The ordered collection of heartbeats: fan-out, gated start/stop, and
/// drained shutdown.
#[derive(Default)]
pub struct Pool {
    entries: Vec<Entry>,
}

impl Pool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a worker for `probe`, wraps it in an idle heartbeat on `period`
    /// driven by `consumer`, and inserts it into the pool.
    pub fn start_worker(&mut self, name: impl Into<String>, probe: Box<dyn Probe>, period: Duration, consumer: Consumer) {
        let worker = Worker::spawn(probe);
        let heartbeat = Heartbeat::new(&worker, period, consumer);
        self.entries.push(Entry {
            name: name.into(),
            heartbeat,
            worker,
        });
    }

    pub async fn start_heartbeats(&self) {
        for entry in &self.entries {
            entry.heartbeat.start().await;
        }
    }

    pub async fn apply_whitelist(&self, whitelisted: &[String]) {
        for entry in &self.entries {
            let is_whitelisted = whitelisted.iter().any(|name| name == &entry.name);
            if is_whitelisted {
                entry.heartbeat.start().await;
            } else {
                entry.heartbeat.stop().await;
            }
        }
    }

    pub async fn apply_blacklist(&self, blacklisted: &[String]) {
        for entry in &self.entries {
            let is_blacklisted = blacklisted.iter().any(|name| name == &entry.name);
            if is_blacklisted {
                entry.heartbeat.stop().await;
            } else {
                entry.heartbeat.start().await;
            }
        }
    }

    /// Posts `consumer` to every worker's queue, returning a barrier the
    /// caller can `wait()` on and then query `first_error()`.
    pub async fn for_each(&self, consumer: Consumer) -> Result<Barrier> {
        let wait_group = WaitGroup::new();
        let consumer = consumer.notify(wait_group.clone());
        let mut futures = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let future = entry
                .worker
                .controller_channel()
                .post(consumer.clone())
                .await
                .map_err(|_| Error::Internal("worker queue closed during fan-out".into()))?;
            futures.push(future);
        }
        Ok(Barrier { wait_group, futures })
    }

    pub fn beating_hearts(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.heartbeat.is_beating())
            .map(|entry| entry.name.clone())
            .collect()
    }

    pub async fn snapshots(&self) -> Result<Vec<(String, ResultSnapshot)>> {
        let mut out = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            out.push((entry.name.clone(), entry.worker.snapshot().await?));
        }
        Ok(out)
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// For each heartbeat: wait on its worker's inflight counter, close its
    /// queue, then stop the heartbeat. Order matters — closing the queue
    /// first would terminate the worker loop before pending async consumers
    /// observed their input.
    pub async fn shutdown(self) {
        for entry in &self.entries {
            entry.worker.controller_channel().wait_inflight().await;
            entry.worker.controller_channel().close().await;
            entry.heartbeat.stop().await;
        }
        for entry in self.entries {
            entry.worker.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::configuration::Configuration;
    use crate::logger::{ChannelProvider, Factory};

    struct NoopProbe {
        base: Base,
    }

    impl Probe for NoopProbe {
        fn execute(&mut self) -> crate::error::Result<()> {
            Ok(())
        }
        fn base(&self) -> &Base {
            &self.base
        }
        fn base_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    fn probe(name: &str) -> Box<dyn Probe> {
        let provider = ChannelProvider::new(10);
        let factory = Factory::new(provider);
        Box::new(NoopProbe {
            base: Base::new(factory.new_logger(name), Configuration::flat(name, 0).unwrap()),
        })
    }

    #[tokio::test]
    async fn whitelist_then_blacklist_gating() {
        let mut pool = Pool::new();
        for name in ["a", "b", "c"] {
            pool.start_worker(name, probe(name), Duration::from_secs(60), Consumer::sync(|_, f| f.complete(None)));
        }
        pool.start_heartbeats().await;
        let mut hearts = pool.beating_hearts();
        hearts.sort();
        assert_eq!(hearts, vec!["a", "b", "c"]);

        pool.apply_whitelist(&["a".to_string()]).await;
        assert_eq!(pool.beating_hearts(), vec!["a".to_string()]);

        pool.apply_whitelist(&["b".to_string(), "c".to_string()]).await;
        let mut hearts = pool.beating_hearts();
        hearts.sort();
        assert_eq!(hearts, vec!["b", "c"]);

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn snapshots_are_collected_via_the_worker_queue() {
        let mut pool = Pool::new();
        pool.start_worker("a", probe("a"), Duration::from_secs(60), Consumer::sync(|_, f| f.complete(None)));
        pool.start_worker("b", probe("b"), Duration::from_secs(60), Consumer::sync(|_, f| f.complete(None)));

        pool.for_each(Consumer::sync(|probe, future| {
            probe.base_mut().record_successful_run();
            future.complete(None);
        }))
        .await
        .unwrap()
        .wait()
        .await;

        let snapshots = pool.snapshots().await.unwrap();
        assert_eq!(snapshots.len(), 2);
        for (_, snapshot) in &snapshots {
            assert_eq!(snapshot.successful, 1);
        }

        pool.shutdown().await;
    }

    #[tokio::test]
    async fn for_each_fans_out_and_reports_first_error() {
        let mut pool = Pool::new();
        pool.start_worker("a", probe("a"), Duration::from_secs(60), Consumer::sync(|_, f| f.complete(None)));
        pool.start_worker("b", probe("b"), Duration::from_secs(60), Consumer::sync(|_, f| f.complete(None)));

        let barrier = pool
            .for_each(Consumer::sync(|probe, future| {
                if probe.base().configuration().name() == "b" {
                    future.complete(Some(crate::error::Error::ProbeDomain("boom".into())));
                } else {
                    future.complete(None);
                }
            }))
            .await
            .unwrap();
        barrier.wait().await;
        assert!(matches!(barrier.first_error(), Some(crate::error::Error::ProbeDomain(_))));

        pool.shutdown().await;
    }
}
