//! Per-Core Storage Module
//!
//! Each core worker owns exactly one [`Store`]. Unlike a globally shared
//! engine, the store has no locks at all: mutual exclusion is structural,
//! because only the owning worker task ever touches it. Keys are routed to
//! their owning core by the dispatcher, so two cores never hold the same
//! key.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │   Core 0     │   │   Core 1     │   │   Core N     │
//! │  ┌────────┐  │   │  ┌────────┐  │   │  ┌────────┐  │
//! │  │ Store  │  │   │  │ Store  │  │   │  │ Store  │  │
//! │  │(no lock)│ │   │  │(no lock)│ │   │  │(no lock)│ │
//! │  └────────┘  │   │  └────────┘  │   │  └────────┘  │
//! └──────────────┘   └──────────────┘   └──────────────┘
//! ```

pub mod store;

// Re-export commonly used types
pub use store::{Store, StoredValue};
