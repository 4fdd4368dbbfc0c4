//! # ShardCache - A Sharded In-Memory Memcached Server
//!
//! ShardCache is a memcached-compatible, in-memory key-value server written
//! in Rust. It demonstrates systems programming concepts like shared-nothing
//! sharding, incremental protocol parsing, and message-passing concurrency.
//!
//! ## Features
//!
//! - **Memcached-Compatible**: Speaks the memcached ASCII protocol
//! - **Shared-Nothing Sharding**: One store per core, no locks on the data path
//! - **Incremental Parsing**: Commands and payloads may arrive split across reads
//! - **Async I/O**: Built on Tokio for handling thousands of concurrent connections
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            ShardCache                               │
//! │                                                                     │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐              │
//! │  │ TCP Server  │───>│ Connection  │───>│   Parse     │              │
//! │  │ (Listener)  │    │  Handler    │    │   Session   │              │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘              │
//! │                                               │                     │
//! │                                               ▼                     │
//! │  ┌──────────────┐   ┌──────────────────────────────────────────┐    │
//! │  │  Request     │<──│              Dispatcher                  │    │
//! │  │  Tracker     │   │    key ──hash──> owning core's inbox     │    │
//! │  └──────┬───────┘   └──────┬───────────┬───────────┬──────────┘    │
//! │         │                  ▼           ▼           ▼               │
//! │         │           ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │         │           │ Core 0  │ │ Core 1  │ │ Core N  │           │
//! │         │           │ Store + │ │ Store + │ │ Store + │           │
//! │         │           │Counters │ │Counters │ │Counters │           │
//! │         │           └────┬────┘ └────┬────┘ └────┬────┘           │
//! │         │                └───────────┴───────────┘                 │
//! │         ▼                    completions                           │
//! │  ┌──────────────┐                                                  │
//! │  │  Response    │──────> reply bytes to client                     │
//! │  │  Builder     │                                                  │
//! │  └──────────────┘                                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use shardcache::connection::handle_connection;
//! use shardcache::core::worker::spawn_cores;
//! use tokio::net::TcpListener;
//! use tokio::sync::watch;
//!
//! #[tokio::main]
//! async fn main() {
//!     // One storage core per CPU
//!     let router = spawn_cores(num_cpus());
//!     let (shutdown_tx, _shutdown_rx) = watch::channel(false);
//!
//!     let listener = TcpListener::bind("127.0.0.1:11211").await.unwrap();
//!
//!     loop {
//!         let (stream, addr) = listener.accept().await.unwrap();
//!         let router = router.clone();
//!         let shutdown = shutdown_tx.clone();
//!
//!         tokio::spawn(handle_connection(stream, addr, router, shutdown));
//!     }
//! }
//! # fn num_cpus() -> usize { 4 }
//! ```
//!
//! ## Supported Commands
//!
//! ### Storage Commands
//! - `set key flags exptime bytes [noreply]`
//! - `add key flags exptime bytes [noreply]`
//! - `replace key flags exptime bytes [noreply]`
//!
//! ### Retrieval Commands
//! - `get key [key ...]`
//!
//! ### Mutation Commands
//! - `delete key [noreply]`
//! - `incr key delta [noreply]` / `decr key delta [noreply]`
//!
//! ### Server Commands
//! - `stats`
//! - `quit`
//! - `shutdown`
//!
//! `gets`, `cas`, `append`, and `prepend` are recognized but answered with
//! `SERVER_ERROR functionality not supported`.
//!
//! ## Module Overview
//!
//! - [`protocol`]: tokenizer, command parser, and per-connection parse session
//! - [`core`]: per-core workers, the router, and cross-core messages
//! - [`storage`]: the unsynchronized per-core store
//! - [`request`]: request tracker, dispatcher, and response builder
//! - [`stats`]: per-core counters and merged snapshots
//! - [`connection`]: client connection management
//!
//! ## Design Highlights
//!
//! ### Shared-Nothing Storage
//!
//! Every key hashes to exactly one core, and only that core's task ever
//! touches the key's shard. There are no locks and no atomics on the data
//! path; concurrency is message passing over per-core inboxes.
//!
//! ### Zero-Copy Parsing
//!
//! Keys and payloads are carved out of the receive buffer as `bytes::Bytes`
//! handles and travel to the owning core without being copied.
//!
//! ### Slot-Ordered Fan-In
//!
//! A multi-key `get` fans out to several cores at once. Completions arrive
//! in whatever order cores answer, but each carries its dispatch-order slot,
//! so the reply always lists values in the order the client asked for them.

pub mod connection;
pub mod core;
pub mod protocol;
pub mod request;
pub mod stats;
pub mod storage;

// Re-export commonly used types for convenience
pub use connection::{handle_connection, ConnectionError, ConnectionOutcome};
pub use crate::core::router::CoreRouter;
pub use crate::core::worker::spawn_cores;
pub use protocol::{Command, ParseSession, ParseStep};
pub use request::execute_command;
pub use storage::{Store, StoredValue};

/// The default port ShardCache listens on (same as memcached)
pub const DEFAULT_PORT: u16 = 11211;

/// The default host ShardCache binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of ShardCache
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
