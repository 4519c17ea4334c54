//! Batch scheduling of session processing.
//!
//! One batch of sessions is processed at a time. The scheduler admits a
//! batch, derives its concurrency budget from the machine's CPU count, and
//! drives a manager loop that keeps a bounded number of session workers
//! running until the batch drains.

mod config;
mod runner;
mod types;

pub use config::SchedulerConfig;
pub use runner::BatchScheduler;
pub use types::{BatchReceipt, BatchSnapshot, SchedulerError};
