#![forbid(unsafe_code)]
#![deny(unreachable_pub)]

//! Core of the platform-availability probing engine: the measurement scheduler,
//! the log aggregation pipeline, and the task orchestrator that sequences them.

mod base;
mod configuration;
mod consumer;
mod error;
mod future;
mod heartbeat;
pub mod logger;
mod orchestrator;
mod platform;
mod pool;
mod probe;
pub mod probes;
mod result;
mod worker;

pub use base::Base;
pub use configuration::Configuration;
pub use consumer::{Consumer, ConsumerMethod};
pub use error::{Error, Result};
pub use future::{Future, WaitGroup};
pub use heartbeat::Heartbeat;
pub use orchestrator::{AssetExporter, ExitReason, Orchestrator, OrchestratorOutcome, ShutdownEvent, ShutdownFunnel};
pub use platform::{CommandPromise, PlatformCli, PlatformClient, PlatformTask};
pub use pool::{Barrier, Pool};
pub use probe::Probe;
pub use result::ResultSnapshot;
pub use worker::{ControllerChannel, Worker};
