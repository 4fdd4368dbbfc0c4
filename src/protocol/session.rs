//! Per-Connection Parser Session
//!
//! The state machine that drives parsing across partial network reads. A
//! `ParseSession` is owned by its connection and survives between reads:
//! the only persisted state is the pending storage command whose declared
//! binary payload has not fully arrived yet (`loading_data`).
//!
//! ## Stepping
//!
//! `step` makes at most one unit of progress against the receive buffer:
//!
//! - returns [`ParseStep::NeedMore`] (consuming nothing) when the next
//!   line or payload is incomplete,
//! - consumes exactly the bytes of one interpreted unit otherwise.
//!
//! The connection handler calls `step` in a loop until `NeedMore`, which
//! drains any number of pipelined commands from one read without
//! recursion. A storage command line and an already-buffered payload are
//! handled in consecutive loop iterations of the same wake-up, so a fully
//! pipelined `set k 0 0 3\r\nabc\r\n` dispatches in one pass.

use bytes::{Buf, Bytes, BytesMut};

use crate::protocol::command::{parse_line, Command, ParsedLine, PendingStore};
use crate::protocol::tokenizer::{read_payload, tokenize_line, LineStatus, PayloadStatus};

/// Reply for protocol malformation (bad tokens, bad terminators).
pub const ERROR_REPLY: &[u8] = b"ERROR\r\n";

/// Reply for recognized but unimplemented functionality.
pub const UNSUPPORTED_REPLY: &[u8] = b"SERVER_ERROR functionality not supported\r\n";

/// Reply when a declared payload is not followed by CRLF.
pub const BAD_CHUNK_REPLY: &[u8] = b"CLIENT_ERROR bad data chunk\r\n";

/// One unit of parser progress.
#[derive(Debug, PartialEq, Eq)]
pub enum ParseStep {
    /// The buffer holds no complete unit; nothing was consumed. Re-invoke
    /// after the next read.
    NeedMore,

    /// A complete command was parsed and its bytes consumed.
    Dispatch(Command),

    /// A protocol-level reply to send immediately; no storage work.
    Reply(&'static [u8]),

    /// Client asked to close the connection.
    Quit,

    /// Client asked to terminate the server.
    Shutdown,
}

/// Parser state for one connection.
#[derive(Debug, Default)]
pub struct ParseSession {
    /// The storage command whose payload is still arriving. `Some` is the
    /// `loading_data` state: the payload reader runs instead of the line
    /// tokenizer.
    pending: Option<PendingStore>,
}

impl ParseSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// True while a declared-length payload is still being received.
    pub fn loading_data(&self) -> bool {
        self.pending.is_some()
    }

    /// Attempts one unit of progress against the receive buffer.
    pub fn step(&mut self, buf: &mut BytesMut) -> ParseStep {
        // A storage header and its payload are two iterations of this
        // loop; everything else resolves in one.
        loop {
            if let Some(header) = self.pending.take() {
                return self.step_payload(header, buf);
            }

            match tokenize_line(buf) {
                LineStatus::Incomplete => return ParseStep::NeedMore,
                LineStatus::Malformed { consumed } => {
                    buf.advance(consumed);
                    return ParseStep::Reply(ERROR_REPLY);
                }
                LineStatus::Line { line, total } => {
                    let parsed = parse_line(line);
                    match parsed {
                        ParsedLine::Command(cmd) => {
                            buf.advance(total);
                            return ParseStep::Dispatch(cmd);
                        }
                        ParsedLine::StoreHeader(header) => {
                            buf.advance(total);
                            self.pending = Some(header);
                            // Loop: the payload may already be buffered.
                        }
                        ParsedLine::Quit => {
                            buf.clear();
                            return ParseStep::Quit;
                        }
                        ParsedLine::Shutdown => {
                            buf.clear();
                            return ParseStep::Shutdown;
                        }
                        ParsedLine::Malformed => {
                            buf.advance(total);
                            return ParseStep::Reply(ERROR_REPLY);
                        }
                        ParsedLine::Unsupported => {
                            buf.advance(total);
                            return ParseStep::Reply(UNSUPPORTED_REPLY);
                        }
                    }
                }
            }
        }
    }

    fn step_payload(&mut self, header: PendingStore, buf: &mut BytesMut) -> ParseStep {
        match read_payload(buf, header.bytes) {
            PayloadStatus::Incomplete => {
                // Still loading: the header survives until the payload
                // arrives.
                self.pending = Some(header);
                ParseStep::NeedMore
            }
            PayloadStatus::BadChunk { consumed } => {
                // The pending command is aborted; the connection stays
                // usable for the next line.
                buf.advance(consumed);
                ParseStep::Reply(BAD_CHUNK_REPLY)
            }
            PayloadStatus::Payload { data, consumed } => {
                let Some(kind) = header.kind.write_kind() else {
                    buf.advance(consumed);
                    return ParseStep::Reply(UNSUPPORTED_REPLY);
                };
                let data = Bytes::copy_from_slice(data);
                buf.advance(consumed);
                ParseStep::Dispatch(Command::Store {
                    kind,
                    key: header.key,
                    flags: header.flags,
                    exptime: header.exptime,
                    data,
                    noreply: header.noreply,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::WriteKind;

    fn buf(bytes: &[u8]) -> BytesMut {
        BytesMut::from(bytes)
    }

    #[test]
    fn test_empty_buffer_needs_more() {
        let mut session = ParseSession::new();
        let mut b = buf(b"");
        assert_eq!(session.step(&mut b), ParseStep::NeedMore);
    }

    #[test]
    fn test_get_dispatches_and_consumes() {
        let mut session = ParseSession::new();
        let mut b = buf(b"get name\r\n");
        match session.step(&mut b) {
            ParseStep::Dispatch(Command::Get { keys }) => {
                assert_eq!(keys, vec![Bytes::from_static(b"name")]);
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
        assert!(b.is_empty());
    }

    #[test]
    fn test_set_with_full_payload_in_one_pass() {
        let mut session = ParseSession::new();
        let mut b = buf(b"set k 0 0 5\r\nhello\r\n");
        match session.step(&mut b) {
            ParseStep::Dispatch(Command::Store {
                kind, key, data, ..
            }) => {
                assert_eq!(kind, WriteKind::Set);
                assert_eq!(key, Bytes::from_static(b"k"));
                assert_eq!(data, Bytes::from_static(b"hello"));
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
        assert!(b.is_empty());
        assert!(!session.loading_data());
    }

    #[test]
    fn test_set_payload_split_across_reads() {
        let mut session = ParseSession::new();
        let mut b = buf(b"set k 0 0 5\r\nhel");
        assert_eq!(session.step(&mut b), ParseStep::NeedMore);
        assert!(session.loading_data());

        b.extend_from_slice(b"lo\r\n");
        match session.step(&mut b) {
            ParseStep::Dispatch(Command::Store { data, .. }) => {
                assert_eq!(data, Bytes::from_static(b"hello"));
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
        assert!(!session.loading_data());
    }

    #[test]
    fn test_byte_by_byte_delivery_matches_one_shot() {
        // Partial delivery of a complete line must yield the identical
        // outcome to delivering it in one call.
        let input = b"set key 3 0 2\r\nhi\r\n";

        let mut one_shot = ParseSession::new();
        let mut whole = buf(input);
        let expected = one_shot.step(&mut whole);

        let mut trickle = ParseSession::new();
        let mut b = BytesMut::new();
        let mut last = ParseStep::NeedMore;
        for &byte in input.iter() {
            b.extend_from_slice(&[byte]);
            last = trickle.step(&mut b);
            if !matches!(last, ParseStep::NeedMore) {
                break;
            }
        }
        assert_eq!(last, expected);
    }

    #[test]
    fn test_huge_declared_length_is_rejected_up_front() {
        let mut session = ParseSession::new();
        let mut b = buf(b"set k 0 0 18446744073709551615\r\nX");

        // The oversized header is refused as malformed; the session never
        // enters the loading state
        assert_eq!(session.step(&mut b), ParseStep::Reply(ERROR_REPLY));
        assert!(!session.loading_data());
        assert_eq!(session.step(&mut b), ParseStep::NeedMore);

        // Whatever the client sends next is parsed as ordinary lines
        b.extend_from_slice(b"\r\nget a\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Reply(ERROR_REPLY));
        assert!(matches!(
            session.step(&mut b),
            ParseStep::Dispatch(Command::Get { .. })
        ));
    }

    #[test]
    fn test_bad_chunk_aborts_pending_command() {
        let mut session = ParseSession::new();
        let mut b = buf(b"set k 0 0 5\r\nhelloXXget a\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Reply(BAD_CHUNK_REPLY));
        assert!(!session.loading_data());

        // The connection remains usable for the next command
        match session.step(&mut b) {
            ParseStep::Dispatch(Command::Get { keys }) => {
                assert_eq!(keys, vec![Bytes::from_static(b"a")]);
            }
            other => panic!("expected dispatch, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_store_kind_after_payload() {
        let mut session = ParseSession::new();
        let mut b = buf(b"append k 0 0 3\r\nabc\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Reply(UNSUPPORTED_REPLY));
        assert!(b.is_empty());
    }

    #[test]
    fn test_malformed_line_consumes_and_recovers() {
        let mut session = ParseSession::new();
        let mut b = buf(b"bogus cmd\r\nget a\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Reply(ERROR_REPLY));
        assert!(matches!(
            session.step(&mut b),
            ParseStep::Dispatch(Command::Get { .. })
        ));
    }

    #[test]
    fn test_bare_newline_yields_error() {
        let mut session = ParseSession::new();
        let mut b = buf(b"get a\nget b\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Reply(ERROR_REPLY));
        assert!(matches!(
            session.step(&mut b),
            ParseStep::Dispatch(Command::Get { .. })
        ));
    }

    #[test]
    fn test_quit_consumes_remaining_buffer() {
        let mut session = ParseSession::new();
        let mut b = buf(b"quit\r\nget leftover\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Quit);
        assert!(b.is_empty());
    }

    #[test]
    fn test_shutdown() {
        let mut session = ParseSession::new();
        let mut b = buf(b"shutdown\r\n");
        assert_eq!(session.step(&mut b), ParseStep::Shutdown);
    }

    #[test]
    fn test_pipelined_commands_drain_in_a_loop() {
        let mut session = ParseSession::new();
        let mut b = buf(b"set a 0 0 1\r\nx\r\nget a\r\nstats\r\n");

        assert!(matches!(
            session.step(&mut b),
            ParseStep::Dispatch(Command::Store { .. })
        ));
        assert!(matches!(
            session.step(&mut b),
            ParseStep::Dispatch(Command::Get { .. })
        ));
        assert_eq!(session.step(&mut b), ParseStep::Dispatch(Command::Stats));
        assert_eq!(session.step(&mut b), ParseStep::NeedMore);
    }
}
