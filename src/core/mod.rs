//! Per-Core Execution Model
//!
//! One logical worker per CPU core, each a single-threaded loop over its
//! own inbound queue. Cross-core communication is exclusively asynchronous
//! message passing; a message carries full ownership of its payload, so no
//! shared mutable memory crosses a core boundary and no locks exist on the
//! data path.
//!
//! ```text
//!  connection task                    core workers
//! ┌────────────────┐   CoreRequest   ┌────────────┐
//! │  dispatcher    │ ──────────────> │  Core 0    │
//! │                │                 │ Store+Stats│
//! │  completion rx │ <────────────── └────────────┘
//! │  (per request) │   Completion    ┌────────────┐
//! │                │ ──────────────> │  Core 1    │
//! └────────────────┘                 └────────────┘
//! ```
//!
//! ## Modules
//!
//! - `message`: the owned request/completion types crossing core queues
//! - `router`: explicit execution context, core count and key ownership
//! - `worker`: the per-core executor loop

pub mod message;
pub mod router;
pub mod worker;

// Re-export commonly used types
pub use message::{Completion, CoreRequest, OpOutcome, StorageOp};
pub use router::CoreRouter;
pub use worker::{spawn_cores, INBOX_DEPTH};
