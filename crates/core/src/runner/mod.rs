//! Job and session execution.
//!
//! [`JobExecutor`] runs one job with its lifecycle recorded in the tracker.
//! [`SessionRunner`] runs all requested jobs of one session, sequentially,
//! continuing past individual failures and returning a single verdict.

mod executor;
mod session;
mod types;

pub use executor::JobExecutor;
pub use session::SessionRunner;
pub use types::{EmptyRequestPolicy, JobRequest, RunnerError};
