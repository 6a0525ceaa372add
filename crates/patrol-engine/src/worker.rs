use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::consumer::Consumer;
use crate::future::{Future, WaitGroup};
use crate::probe::Probe;
use crate::result::ResultSnapshot;

struct Job {
    consumer: Consumer,
    future: Future,
}

/// The queue plus inflight counter a [`Worker`] exposes to callers that post
/// work against it. Every dispatch, sync or async, is tracked by `inflight`
/// so a pool shutdown can drain outstanding work before closing the queue.
struct ControllerChannelInner {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    inflight: WaitGroup,
}

/// A handle callers use to post [`Consumer`]s against a worker without owning
/// the worker itself.
#[derive(Clone)]
pub struct ControllerChannel {
    inner: Arc<ControllerChannelInner>,
}

impl ControllerChannel {
    /// Posts `consumer` to the worker's queue, returning a fresh [`Future`]
    /// that will carry this particular dispatch's outcome.
    pub async fn post(&self, consumer: Consumer) -> crate::error::Result<Future> {
        let guard = self.inner.sender.lock().await;
        let sender = guard
            .as_ref()
            .ok_or_else(|| crate::error::Error::Internal("worker queue closed".into()))?;
        let future = Future::new();
        let job = Job {
            consumer,
            future: future.clone(),
        };
        sender
            .send(job)
            .await
            .map_err(|_| crate::error::Error::Internal("worker queue closed".into()))?;
        Ok(future)
    }

    /// Closes the queue. Already-enqueued jobs still run; no new job is accepted.
    pub async fn close(&self) {
        self.inner.sender.lock().await.take();
    }

    /// Awaits every dispatch posted so far (including ones still running async).
    pub async fn wait_inflight(&self) {
        self.inner.inflight.wait().await;
    }
}

/// A single-consumer loop owning one probe. It reads [`Consumer`]s from its
/// [`ControllerChannel`] and invokes each against the probe it owns — the
/// probe is never shared outside the worker except through this channel.
pub struct Worker {
    probe: Arc<Mutex<Box<dyn Probe>>>,
    channel: ControllerChannel,
    join: JoinHandle<()>,
}

impl Worker {
    /// Spawns the worker loop and takes ownership of `probe`.
    pub fn spawn(probe: Box<dyn Probe>) -> Self {
        let probe = Arc::new(Mutex::new(probe));
        let (sender, receiver) = mpsc::channel(32);
        let inflight = WaitGroup::new();
        let channel = ControllerChannel {
            inner: Arc::new(ControllerChannelInner {
                sender: Mutex::new(Some(sender)),
                inflight: inflight.clone(),
            }),
        };

        let loop_probe = probe.clone();
        let join = tokio::spawn(run_worker_loop(loop_probe, receiver, inflight));

        Self {
            probe,
            channel,
            join,
        }
    }

    pub fn controller_channel(&self) -> ControllerChannel {
        self.channel.clone()
    }

    /// Takes a snapshot of the owned probe by posting a [`Consumer`] through
    /// the worker's own queue rather than locking `self.probe` directly — the
    /// worker loop is the only code path allowed to hold that lock from
    /// outside a dispatch.
    pub async fn snapshot(&self) -> crate::error::Result<ResultSnapshot> {
        let (reply, receiver) = tokio::sync::oneshot::channel();
        let reply = std::sync::Mutex::new(Some(reply));
        let consumer = Consumer::sync(move |probe, future| {
            if let Some(reply) = reply.lock().expect("snapshot reply mutex poisoned").take() {
                let _ = reply.send(probe.base().snapshot());
            }
            future.complete(None);
        });
        self.channel.post(consumer).await?;
        receiver
            .await
            .map_err(|_| crate::error::Error::Internal("snapshot reply dropped before the dispatch ran".into()))
    }

    /// Closes the queue and joins the loop task. Callers are expected to have
    /// already awaited `wait_inflight` on the controller channel.
    pub async fn shutdown(self) {
        self.channel.close().await;
        let _ = self.join.await;
    }
}

async fn run_worker_loop(
    probe: Arc<Mutex<Box<dyn Probe>>>,
    mut receiver: mpsc::Receiver<Job>,
    inflight: WaitGroup,
) {
    while let Some(job) = receiver.recv().await {
        inflight.add(1);
        for notifier in job.consumer.notifiers() {
            notifier.add(1);
        }

        if job.consumer.is_sync() {
            dispatch(&probe, &job).await;
            inflight.done();
            for notifier in job.consumer.notifiers() {
                notifier.done();
            }
        } else {
            let probe = probe.clone();
            let inflight = inflight.clone();
            let notifiers = job.consumer.notifiers().to_vec();
            let method = job.consumer.method();
            let future = job.future;
            tokio::spawn(async move {
                let mut guard = probe.lock().await;
                method(guard.as_mut(), future);
                drop(guard);
                inflight.done();
                for notifier in notifiers {
                    notifier.done();
                }
            });
        }
    }
}

async fn dispatch(probe: &Arc<Mutex<Box<dyn Probe>>>, job: &Job) {
    let mut guard = probe.lock().await;
    let method = job.consumer.method();
    method(guard.as_mut(), job.future.clone());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::configuration::Configuration;
    use crate::logger::{ChannelProvider, Factory};

    struct CountingProbe {
        base: Base,
        calls: std::sync::Arc<std::sync::atomic::AtomicU64>,
    }

    impl Probe for CountingProbe {
        fn execute(&mut self) -> crate::error::Result<()> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        }

        fn base(&self) -> &Base {
            &self.base
        }

        fn base_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    fn counting_probe() -> (Box<dyn Probe>, std::sync::Arc<std::sync::atomic::AtomicU64>) {
        let provider = ChannelProvider::new(10);
        let factory = Factory::new(provider);
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU64::new(0));
        let base = Base::new(factory.new_logger("counting"), Configuration::flat("counting", 0).unwrap());
        (
            Box::new(CountingProbe {
                base,
                calls: calls.clone(),
            }),
            calls,
        )
    }

    #[tokio::test]
    async fn sync_consumer_runs_before_next_is_posted() {
        let (probe, calls) = counting_probe();
        let worker = Worker::spawn(probe);
        let channel = worker.controller_channel();

        let consumer = Consumer::sync(|probe, future| {
            future.complete(probe.execute().err());
        });

        let future = channel.post(consumer).await.unwrap();
        // Poll until the dispatch completes; sync dispatch should be immediate
        // relative to the tiny amount of work the probe performs.
        for _ in 0..100 {
            if future.is_completed().0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert!(future.is_completed().0);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_consumer_eventually_completes() {
        let (probe, calls) = counting_probe();
        let worker = Worker::spawn(probe);
        let channel = worker.controller_channel();

        let consumer = Consumer::asynchronous(|probe, future| {
            future.complete(probe.execute().err());
        });
        let future = channel.post(consumer).await.unwrap();
        channel.wait_inflight().await;
        assert!(future.is_completed().0);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn closed_queue_rejects_further_posts() {
        let (probe, _calls) = counting_probe();
        let worker = Worker::spawn(probe);
        let channel = worker.controller_channel();
        channel.close().await;
        let consumer = Consumer::sync(|_, future| future.complete(None));
        assert!(channel.post(consumer).await.is_err());
        worker.shutdown().await;
    }
}
