//! simenv runtime - trigger registration and the polling executor

pub mod callback;
pub mod executor;
pub mod registry;

pub use callback::{callback_fn, Callback, FnCallback, TriggerContext};
pub use executor::{PollingExecutor, RunReport, WorkerOutcome, WorkerReport};
pub use registry::{Trigger, TriggerRegistry};
pub use tokio_util::sync::CancellationToken;
