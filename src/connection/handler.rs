//! Connection Handler
//!
//! Each client gets its own handler task that runs in a loop: read bytes,
//! step the parser until it needs more data, dispatch each complete
//! command, and write the assembled reply.
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol: a read may deliver a fraction of a command
//! or several pipelined commands at once. Incoming bytes accumulate in a
//! `BytesMut`; the parser session consumes exactly the bytes of each
//! interpreted unit and leaves partial units untouched for the next read.

use bytes::BytesMut;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, trace, warn};

use crate::core::router::CoreRouter;
use crate::protocol::session::{ParseSession, ParseStep};
use crate::request::dispatch::execute_command;

/// Maximum size of the receive buffer. A connection holding more
/// unconsumed bytes than this is closed. Large enough for a full-size
/// payload (see `MAX_PAYLOAD_BYTES`) plus pipelined commands.
pub const MAX_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Initial receive buffer capacity.
pub const INITIAL_BUFFER_SIZE: usize = 4096;

/// How a connection ended, as seen by the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionOutcome {
    /// Peer closed the socket (or sent `quit`).
    Closed,
    /// Peer sent `shutdown`: the whole server should stop.
    Shutdown,
}

/// Errors that can occur while handling a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Client disconnected mid-command
    #[error("unexpected end of stream")]
    UnexpectedEof,

    /// Receive buffer size limit exceeded
    #[error("buffer size limit exceeded")]
    BufferFull,
}

/// Handles a single client connection.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Parser state surviving across partial reads
    session: ParseSession,

    /// Routes sub-operations to their owning cores
    router: CoreRouter,
}

impl ConnectionHandler {
    pub fn new(stream: TcpStream, addr: SocketAddr, router: CoreRouter) -> Self {
        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            session: ParseSession::new(),
            router,
        }
    }

    /// Runs the connection to completion.
    pub async fn run(mut self) -> Result<ConnectionOutcome, ConnectionError> {
        info!(client = %self.addr, "client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(ConnectionOutcome::Closed) => {
                debug!(client = %self.addr, "client disconnected")
            }
            Ok(ConnectionOutcome::Shutdown) => {
                info!(client = %self.addr, "shutdown requested by client")
            }
            Err(ConnectionError::IoError(e))
                if e.kind() == std::io::ErrorKind::ConnectionReset =>
            {
                debug!(client = %self.addr, "connection reset by client")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "connection error"),
        }

        result
    }

    /// The read / parse / dispatch / respond loop.
    async fn main_loop(&mut self) -> Result<ConnectionOutcome, ConnectionError> {
        loop {
            // Drain every complete unit already buffered before reading
            // again, so pipelined commands are answered in arrival order.
            loop {
                match self.session.step(&mut self.buffer) {
                    ParseStep::NeedMore => break,
                    ParseStep::Reply(reply) => {
                        self.send_reply(reply).await?;
                    }
                    ParseStep::Dispatch(cmd) => {
                        trace!(client = %self.addr, ?cmd, "dispatching command");
                        match execute_command(cmd, &self.router).await {
                            Some(reply) if !reply.is_empty() => {
                                self.send_reply(&reply).await?;
                            }
                            // Silent request: zero bytes rendered.
                            Some(_) => {}
                            // A sub-operation can never complete; the
                            // request is dropped without a reply.
                            None => {
                                warn!(client = %self.addr, "request abandoned");
                            }
                        }
                    }
                    ParseStep::Quit => return Ok(ConnectionOutcome::Closed),
                    ParseStep::Shutdown => return Ok(ConnectionOutcome::Shutdown),
                }
            }

            if !self.read_more_data().await? {
                return Ok(ConnectionOutcome::Closed);
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    ///
    /// Returns `false` on a clean end of stream.
    async fn read_more_data(&mut self) -> Result<bool, ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            warn!(
                client = %self.addr,
                size = self.buffer.len(),
                "buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let n = self.stream.get_mut().read_buf(&mut self.buffer).await?;

        if n == 0 {
            if self.buffer.is_empty() && !self.session.loading_data() {
                return Ok(false);
            }
            // Partial command in buffer
            return Err(ConnectionError::UnexpectedEof);
        }

        trace!(client = %self.addr, bytes = n, "read data");
        Ok(true)
    }

    /// Writes one reply and flushes it to the client.
    async fn send_reply(&mut self, reply: &[u8]) -> Result<(), ConnectionError> {
        self.stream.write_all(reply).await?;
        self.stream.flush().await?;
        trace!(client = %self.addr, bytes = reply.len(), "sent reply");
        Ok(())
    }
}

/// Handles a client connection to completion.
///
/// Convenience wrapper for the accept loop; maps the outcome onto the
/// shared shutdown signal.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    router: CoreRouter,
    shutdown: tokio::sync::watch::Sender<bool>,
) {
    let handler = ConnectionHandler::new(stream, addr, router);
    match handler.run().await {
        Ok(ConnectionOutcome::Shutdown) => {
            let _ = shutdown.send(true);
        }
        Ok(ConnectionOutcome::Closed) => {}
        Err(_) => {
            // Already logged in run()
        }
    }
}
