use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use patrol_engine::logger::{LogLevel, Logger};
use patrol_engine::ShutdownEvent;

/// Counts ctrl-c presses so a second one can escalate `Graceful` to
/// `Immediate` without waiting on the orchestrator to notice the first.
#[derive(Debug, Default)]
pub struct ShutdownController {
    forced: AtomicU8,
}

impl ShutdownController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bump_forced(&self) -> u8 {
        self.forced.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Feeds `funnel` from ctrl-c, narrating the escalation through `logger`: the
/// first press asks probes to drain and the test environment to tear down
/// before exiting; a second press while that is still in flight gives up on
/// waiting for it.
pub fn spawn_ctrl_c_handler(
    shutdown: Arc<ShutdownController>,
    funnel_sender: tokio::sync::mpsc::UnboundedSender<ShutdownEvent>,
    logger: Logger,
) {
    tokio::spawn(async move {
        loop {
            if tokio::signal::ctrl_c().await.is_err() {
                return;
            }
            let n = shutdown.bump_forced();
            if n == 1 {
                logger.write_string(
                    "ctrl-c received, draining in-flight probes and tearing down the test environment before exit",
                    LogLevel::Info,
                );
                let _ = funnel_sender.send(ShutdownEvent::Graceful);
            } else {
                logger.write_string(
                    "second ctrl-c received, forcing immediate shutdown without waiting for teardown",
                    LogLevel::Error,
                );
                let _ = funnel_sender.send(ShutdownEvent::Immediate);
                return;
            }
        }
    });
}
