//! Memcached Text Protocol Implementation
//!
//! This module implements the memcached ASCII protocol front end: a
//! line-oriented command language interleaved with raw binary payloads of
//! client-declared length.
//!
//! ## Overview
//!
//! Commands arrive as CRLF-terminated lines. Storage commands
//! (`set`/`add`/`replace`/...) declare a byte count on the command line and
//! are immediately followed by that many raw bytes plus a trailing CRLF.
//! Because TCP delivers a byte stream, any of this can arrive split
//! arbitrarily across reads, so every entry point in this module is
//! incremental and reports "need more data" without consuming anything when
//! a unit is incomplete.
//!
//! ## Modules
//!
//! - `tokenizer`: extracts complete lines and fixed-length payloads
//! - `command`: typed command descriptors and command-line parsing
//! - `session`: the per-connection parser state machine
//!
//! ## Example
//!
//! ```
//! use shardcache::protocol::{ParseSession, ParseStep};
//! use bytes::BytesMut;
//!
//! let mut session = ParseSession::new();
//! let mut buffer = BytesMut::from(&b"get name\r\n"[..]);
//!
//! match session.step(&mut buffer) {
//!     ParseStep::Dispatch(cmd) => println!("parsed: {:?}", cmd),
//!     other => println!("no command yet: {:?}", other),
//! }
//! ```

pub mod command;
pub mod session;
pub mod tokenizer;

// Re-export commonly used types for convenience
pub use command::{
    Command, CounterKind, PendingStore, StoreKind, WriteKind, MAX_OPS_PER_REQUEST,
    MAX_PAYLOAD_BYTES,
};
pub use session::{ParseSession, ParseStep, BAD_CHUNK_REPLY, ERROR_REPLY, UNSUPPORTED_REPLY};
pub use tokenizer::{read_payload, tokenize_line, LineStatus, PayloadStatus, CRLF};
