//! Request Correlation and Response Assembly
//!
//! One client command fans out into zero, one, or many storage
//! sub-operations that complete asynchronously on other cores. This module
//! correlates those completions back into exactly one protocol-correct
//! response:
//!
//! ```text
//!  Command ──> dispatch ──> N StorageOps to owning cores
//!                 │
//!                 ▼
//!           RequestTracker  <── Completions (any order)
//!                 │  completed == started
//!                 ▼
//!           render (consumes the tracker) ──> reply bytes
//! ```
//!
//! The tracker stores results by dispatch-order slot, so a multi-key `get`
//! renders values in key order even when cores answer out of order. The
//! client sees nothing until the whole request is complete.
//!
//! ## Modules
//!
//! - `tracker`: started/completed accounting, slot-indexed results
//! - `dispatch`: op construction, core addressing, fan-out, fan-in
//! - `response`: per-kind reply rendering

pub mod dispatch;
pub mod response;
pub mod tracker;

// Re-export commonly used types
pub use dispatch::execute_command;
pub use response::{render, MAX_INLINE_REPLY};
pub use tracker::{RequestKind, RequestTracker};
