use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::channel::ChannelProvider;
use super::message::LogRecord;
use super::pipeline::SplitPipeline;

/// Batches records arriving on a [`ChannelProvider`]'s channel and flushes
/// them to a [`SplitPipeline`] either on a time window or the moment a
/// second record from the same logger would overwrite the first — whichever
/// comes first. A `HashSet<usize>` of logger ids already in the current
/// batch stands in for the per-batch "is this logger cached" check. The
/// window only starts ticking once the first record of a batch arrives: an
/// idle gap before that shouldn't make the next record an instant flush.
pub struct Cluster {
    receiver: Mutex<Option<std::sync::mpsc::Receiver<LogRecord>>>,
    pipeline: SplitPipeline,
    flush_interval: Duration,
}

impl Cluster {
    pub fn new(channel_provider: &ChannelProvider, pipeline: SplitPipeline, flush_interval: Duration) -> Self {
        let receiver = channel_provider
            .take_receiver()
            .expect("cluster must own the channel provider's only receiver");
        Self {
            receiver: Mutex::new(Some(receiver)),
            pipeline,
            flush_interval,
        }
    }

    /// Drains the channel until it closes, flushing batches to the pipeline
    /// as it goes, then flushes whatever remains. Blocks the calling thread;
    /// callers on a Tokio runtime should run this via `spawn_blocking`.
    pub fn start_listening(&self) {
        let receiver = self.receiver.lock().expect("cluster receiver mutex poisoned").take().expect("start_listening called twice");
        let mut cache: Vec<LogRecord> = Vec::new();
        let mut seen: HashSet<usize> = HashSet::new();
        let mut next_flush: Option<Instant> = None;

        while let Ok(record) = receiver.recv() {
            let timed_flush_needed = next_flush.is_some_and(|deadline| Instant::now() >= deadline);

            if timed_flush_needed {
                flush(&self.pipeline, &mut cache, &mut seen);
                next_flush = Some(Instant::now() + self.flush_interval);
            } else {
                if next_flush.is_none() {
                    next_flush = Some(Instant::now() + self.flush_interval);
                }
                if seen.contains(&record.logger_id) {
                    flush(&self.pipeline, &mut cache, &mut seen);
                    next_flush = Some(Instant::now() + self.flush_interval);
                }
            }

            seen.insert(record.logger_id);
            cache.push(record);
        }

        flush(&self.pipeline, &mut cache, &mut seen);
    }
}

fn flush(pipeline: &SplitPipeline, cache: &mut Vec<LogRecord>, seen: &mut HashSet<usize>) {
    if cache.is_empty() {
        return;
    }
    pipeline.write(std::mem::take(cache));
    seen.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::pipeline::SplitPipelineConfig;
    use crate::logger::LogLevel;
    use std::sync::{Arc, Mutex as StdMutex};

    #[test]
    fn same_logger_within_window_flushes_twice() {
        let provider = ChannelProvider::new(8);
        let pipeline = SplitPipeline::new(SplitPipelineConfig::new(false, 80, vec![0]), Box::new(Vec::new()));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        pipeline.observe(Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string())));

        let cluster = Cluster::new(&provider, pipeline, Duration::from_secs(60));

        let sender = provider.sender();
        sender.send(LogRecord::new(0, "probe".into(), b"one".to_vec(), LogLevel::Info)).unwrap();
        sender.send(LogRecord::new(0, "probe".into(), b"two".to_vec(), LogLevel::Info)).unwrap();
        drop(sender);

        cluster.start_listening();

        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn distinct_loggers_batch_together_within_window() {
        let provider = ChannelProvider::new(8);
        let pipeline = SplitPipeline::new(SplitPipelineConfig::new(false, 80, vec![0, 0]), Box::new(Vec::new()));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        pipeline.observe(Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string())));

        let cluster = Cluster::new(&provider, pipeline, Duration::from_secs(60));

        let sender = provider.sender();
        sender.send(LogRecord::new(0, "a".into(), b"one".to_vec(), LogLevel::Info)).unwrap();
        sender.send(LogRecord::new(1, "b".into(), b"two".to_vec(), LogLevel::Info)).unwrap();
        drop(sender);

        cluster.start_listening();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn idle_gap_before_first_record_does_not_trigger_an_instant_flush() {
        let provider = ChannelProvider::new(8);
        let pipeline = SplitPipeline::new(SplitPipelineConfig::new(false, 80, vec![0, 0]), Box::new(Vec::new()));
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = seen.clone();
        pipeline.observe(Arc::new(move |line: &str| sink.lock().unwrap().push(line.to_string())));

        let cluster = Cluster::new(&provider, pipeline, Duration::from_millis(50));

        let sender = provider.sender();
        std::thread::sleep(Duration::from_millis(100));
        sender.send(LogRecord::new(0, "a".into(), b"one".to_vec(), LogLevel::Info)).unwrap();
        sender.send(LogRecord::new(1, "b".into(), b"two".to_vec(), LogLevel::Info)).unwrap();
        drop(sender);

        cluster.start_listening();

        assert_eq!(seen.lock().unwrap().len(), 1);
    }
}
