//! Connection Module
//!
//! Owns the client socket, the receive buffer, and the parser session for
//! one connection, and drives commands through dispatch to a reply.
//!
//! ## Connection Lifecycle
//!
//! ```text
//! 1. Client connects (TCP handshake)
//!        │
//!        ▼
//! 2. ConnectionHandler task spawned
//!        │
//!        ▼
//! 3. ┌──────────────────────────────────┐
//!    │           Main Loop              │
//!    │                                  │
//!    │  step parser until NeedMore ──┐  │
//!    │   │ (commands, error replies) │  │
//!    │   ▼                           │  │
//!    │  dispatch / await tracker     │  │
//!    │   │                           │  │
//!    │   ▼                           │  │
//!    │  write reply                  │  │
//!    │   │                           │  │
//!    │   ▼                           │  │
//!    │  read more bytes  <───────────┘  │
//!    └──────────────────────────────────┘
//!        │
//!        ▼
//! 4. quit / shutdown / disconnect / error
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionOutcome};
