//! fab_runtime: the thread harness around `fab_core`.
//!
//! One worker thread per processing module, synchronized to the supervisor's
//! clock through a tick barrier. The power bus and telemetry writer are the
//! only shared mutable resources; jobs move between threads as arena handles
//! over channels.

mod barrier;
mod supervisor;
mod worker;

pub use barrier::TickBarrier;
pub use supervisor::{run, RunConfig, RunSummary};
pub use worker::{spawn_worker, WorkerHandle};
