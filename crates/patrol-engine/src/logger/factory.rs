use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::channel::ChannelProvider;
use super::message::{LogLevel, LogRecord};

/// A handle probes and the orchestrator write through. Every write is pushed
/// onto the shared channel as a [`LogRecord`]; the logger itself never
/// formats or renders — that's the cluster and pipeline's job downstream.
#[derive(Clone)]
pub struct Logger {
    channel_provider: ChannelProvider,
    name: Arc<str>,
    id: usize,
}

impl Logger {
    pub fn channel_provider(&self) -> ChannelProvider {
        self.channel_provider.clone()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Pushes `bytes` onto the channel at `level`, blocking the caller while
    /// the channel is full. No drop policy: the only way a record is lost is
    /// a closed channel, which means nothing is listening to drop it to.
    pub fn write(&self, bytes: &[u8], level: LogLevel) {
        let record = LogRecord::new(self.id, self.name.to_string(), bytes.to_vec(), level);
        if self.channel_provider.sender().send(record).is_err() {
            eprintln!("[{}] dropped log record, channel closed", self.name);
        }
    }

    pub fn write_string(&self, s: &str, level: LogLevel) {
        self.write(s.as_bytes(), level);
    }

    /// Wraps this logger in an [`io::Write`] adapter that forwards every
    /// write at `level`.
    pub fn reporting_to(&self, level: LogLevel) -> ReportingWriter {
        ReportingWriter {
            logger: self.clone(),
            level,
            reviewer: None,
        }
    }
}

/// An `io::Write` adapter over a [`Logger`]. An optional reviewer callback
/// inspects each chunk before it's forwarded, letting a caller veto a write
/// (e.g. filter or gate a log stream piped in from subprocess output) by
/// returning an error instead of mirroring it through the channel.
pub struct ReportingWriter {
    logger: Logger,
    level: LogLevel,
    reviewer: Option<Arc<dyn Fn(&[u8]) -> crate::error::Result<()> + Send + Sync>>,
}

impl ReportingWriter {
    pub fn with_reviewer(mut self, reviewer: impl Fn(&[u8]) -> crate::error::Result<()> + Send + Sync + 'static) -> Self {
        self.reviewer = Some(Arc::new(reviewer));
        self
    }
}

impl io::Write for ReportingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Some(reviewer) = &self.reviewer {
            if let Err(e) = reviewer(buf) {
                return Err(io::Error::new(io::ErrorKind::Other, e));
            }
        }
        self.logger.write(buf, self.level);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Mints loggers against a shared [`ChannelProvider`], assigning each one a
/// dense, monotonically increasing id used as the arena key by [`super::group`].
pub struct Factory {
    channel_provider: ChannelProvider,
    counter: AtomicUsize,
}

impl Factory {
    pub fn new(channel_provider: ChannelProvider) -> Self {
        Self {
            channel_provider,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn new_logger(&self, name: impl Into<String>) -> Logger {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        Logger {
            channel_provider: self.channel_provider.clone(),
            name: Arc::from(name.into()),
            id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_ids_are_dense_and_increasing() {
        let factory = Factory::new(ChannelProvider::new(4));
        let a = factory.new_logger("a");
        let b = factory.new_logger("b");
        assert_eq!(a.id(), 0);
        assert_eq!(b.id(), 1);
    }

    #[test]
    fn write_does_not_panic_when_channel_closed() {
        let provider = ChannelProvider::new(1);
        let factory = Factory::new(provider.clone());
        let logger = factory.new_logger("probe");
        drop(provider.take_receiver());
        logger.write_string("hello", LogLevel::Info);
    }

    #[test]
    fn reviewer_veto_drops_the_write_and_returns_its_error() {
        let provider = ChannelProvider::new(4);
        let factory = Factory::new(provider.clone());
        let logger = factory.new_logger("probe");
        let mut receiver = provider.take_receiver().unwrap();

        let mut writer = logger
            .reporting_to(LogLevel::Info)
            .with_reviewer(|_| Err(crate::error::Error::Logging("rejected".into())));

        let err = std::io::Write::write(&mut writer, b"hello").unwrap_err();
        assert_eq!(err.to_string(), "log reviewer rejected write: rejected");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn reviewer_approval_forwards_the_write() {
        let provider = ChannelProvider::new(4);
        let factory = Factory::new(provider.clone());
        let logger = factory.new_logger("probe");
        let mut receiver = provider.take_receiver().unwrap();

        let mut writer = logger.reporting_to(LogLevel::Info).with_reviewer(|_| Ok(()));

        std::io::Write::write(&mut writer, b"hello").unwrap();
        let record = receiver.try_recv().expect("reviewed write should be forwarded");
        assert_eq!(record.as_string(), "hello");
    }
}
