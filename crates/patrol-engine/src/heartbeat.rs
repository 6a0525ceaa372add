use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::consumer::Consumer;
use crate::worker::{ControllerChannel, Worker};

/// Wraps a worker with a periodic ticker and a consumer describing what to do
/// on every tick. State is `{idle, beating}`; re-entry is idempotent.
pub struct Heartbeat {
    channel: ControllerChannel,
    period: Duration,
    consumer: Consumer,
    beating: Arc<AtomicBool>,
    cancel: Mutex<Option<watch::Sender<()>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Heartbeat {
    pub fn new(worker: &Worker, period: Duration, consumer: Consumer) -> Self {
        Self {
            channel: worker.controller_channel(),
            period,
            consumer,
            beating: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(None),
            task: Mutex::new(None),
        }
    }

    pub fn is_beating(&self) -> bool {
        self.beating.load(Ordering::SeqCst)
    }

    /// Starts beating: delivers the consumer once immediately, then again on
    /// every tick, until `stop` fires. A no-op if already beating.
    pub async fn start(&self) {
        if self.beating.swap(true, Ordering::SeqCst) {
            return;
        }

        let (cancel_tx, mut cancel_rx) = watch::channel(());
        *self.cancel.lock().await = Some(cancel_tx);

        let channel = self.channel.clone();
        let consumer = self.consumer.clone();
        let period = self.period;
        let task = tokio::spawn(async move {
            let _ = channel.post(consumer.clone()).await;

            let mut interval = tokio::time::interval(period);
            interval.tick().await; // first tick fires immediately; already delivered above

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let _ = channel.post(consumer.clone()).await;
                    }
                    _ = cancel_rx.changed() => {
                        return;
                    }
                }
            }
        });

        *self.task.lock().await = Some(task);
    }

    /// Stops beating: fires the cancellation signal. A no-op if already idle.
    pub async fn stop(&self) {
        if !self.beating.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(cancel) = self.cancel.lock().await.take() {
            let _ = cancel.send(());
        }
        self.task.lock().await.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::Base;
    use crate::configuration::Configuration;
    use crate::error::Result;
    use crate::future::Future;
    use crate::logger::{ChannelProvider, Factory};
    use crate::probe::Probe;
    use std::sync::atomic::AtomicU64;

    struct CountingProbe {
        base: Base,
        calls: Arc<AtomicU64>,
    }

    impl Probe for CountingProbe {
        fn execute(&mut self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
        fn base(&self) -> &Base {
            &self.base
        }
        fn base_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    #[tokio::test(start_paused = true)]
    async fn heartbeat_count_bounded_by_period() {
        let provider = ChannelProvider::new(10);
        let factory = Factory::new(provider);
        let calls = Arc::new(AtomicU64::new(0));
        let base = Base::new(factory.new_logger("probe"), Configuration::flat("probe", 0).unwrap());
        let probe: Box<dyn Probe> = Box::new(CountingProbe {
            base,
            calls: calls.clone(),
        });
        let worker = Worker::spawn(probe);

        let consumer = Consumer::sync(|probe, future: Future| {
            future.complete(probe.execute().err());
        });
        let heartbeat = Heartbeat::new(&worker, Duration::from_millis(10), consumer);

        heartbeat.start().await;
        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        heartbeat.stop().await;

        let count = calls.load(Ordering::SeqCst);
        assert!((90..=110).contains(&count), "unexpected heartbeat count: {count}");
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let provider = ChannelProvider::new(10);
        let factory = Factory::new(provider);
        let base = Base::new(factory.new_logger("probe"), Configuration::flat("probe", 0).unwrap());
        let probe: Box<dyn Probe> = Box::new(CountingProbe {
            base,
            calls: Arc::new(AtomicU64::new(0)),
        });
        let worker = Worker::spawn(probe);
        let consumer = Consumer::sync(|probe, future| future.complete(probe.execute().err()));
        let heartbeat = Heartbeat::new(&worker, Duration::from_millis(10), consumer);

        heartbeat.stop().await; // idle -> stop is a no-op
        assert!(!heartbeat.is_beating());
        heartbeat.start().await;
        heartbeat.start().await; // beating -> start is a no-op
        assert!(heartbeat.is_beating());
        heartbeat.stop().await;
        assert!(!heartbeat.is_beating());
    }
}
