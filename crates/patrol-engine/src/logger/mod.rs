//! The log aggregation pipeline: loggers write records onto a shared channel,
//! a cluster batches them by time window and collision, and a split pipeline
//! renders the batches into a multi-column text stream.

mod channel;
mod cluster;
mod factory;
mod group;
mod message;
mod pipeline;

pub use channel::ChannelProvider;
pub use cluster::Cluster;
pub use factory::{Factory, Logger, ReportingWriter};
pub use group::{Group, GroupContainer};
pub use message::{LogLevel, LogRecord};
pub use pipeline::{chunk_message, PipelineObserver, SplitPipeline, SplitPipelineConfig, PIPELINE_SEPARATOR};
