//! Encode submission and correlation coordinator.
//!
//! Consumes upload messages from the queue and, for each one:
//! 1. Registers the uploaded blob as an engine asset tagged with the
//!    correlation id
//! 2. Ensures the named notification endpoint exists (get-or-create)
//! 3. Deletes the source blob
//! 4. Assembles and submits a single-task encode job with a
//!    final-states-only callback subscription
//! 5. Upserts the processing state record the webhook stage joins on

pub mod config;
pub mod coordinator;
pub mod error;
pub mod executor;
pub mod logging;


pub use config::CoordinatorConfig;
pub use coordinator::{StageCoordinator, SubmissionReceipt};
pub use error::{CoordinatorError, CoordinatorResult};
pub use executor::{DynCoordinator, MessageExecutor};
pub use logging::StageLogger;
