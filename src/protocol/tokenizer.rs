//! Line and Payload Tokenizers
//!
//! The lowest layer of the protocol: given the raw bytes currently sitting
//! in a connection's receive buffer, decide whether one complete unit (a
//! CRLF-terminated line, or a binary payload of declared length) is
//! available, without consuming anything on its own.
//!
//! ## Consumption contract
//!
//! Both tokenizers borrow the buffer and return byte counts; the caller
//! owns the buffer and advances it. This keeps the buffer reusable for
//! argument parsing after a line has been recognized, and guarantees that
//! an incomplete unit leaves the buffer untouched for the next read.
//!
//! - `Incomplete`: no complete unit yet; consume nothing, await more data
//! - `Malformed` / `BadChunk`: the unit is broken; the returned `consumed`
//!   count discards exactly the offending bytes
//! - `Line` / `Payload`: a complete unit; `total` / `consumed` covers the
//!   unit including its terminators

/// The CRLF terminator used throughout the memcached text protocol.
pub const CRLF: &[u8] = b"\r\n";

/// Outcome of scanning the buffer for one complete command line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineStatus<'a> {
    /// No line terminator found yet; nothing may be consumed.
    Incomplete,

    /// A terminated line that is empty or whose `\n` is not preceded by
    /// `\r`. `consumed` covers the bad line including its terminator.
    Malformed { consumed: usize },

    /// A complete line. `line` excludes the CRLF; `total` is the full
    /// length including it. The caller consumes `total` once the line has
    /// been fully interpreted.
    Line { line: &'a [u8], total: usize },
}

/// Finds the first complete line in `buf`.
///
/// A well-formed line is at least one byte of content followed by `\r\n`.
/// A bare `\n`, or a `\r\n` with nothing before it, is malformed: the
/// protocol requires the offending bytes to be discarded and `ERROR\r\n`
/// sent, with the connection left usable.
pub fn tokenize_line(buf: &[u8]) -> LineStatus<'_> {
    let Some(nl) = buf.iter().position(|&b| b == b'\n') else {
        return LineStatus::Incomplete;
    };

    // `\n` with no preceding `\r`, or an empty `\r\n` line.
    if nl < 2 || buf[nl - 1] != b'\r' {
        return LineStatus::Malformed { consumed: nl + 1 };
    }

    LineStatus::Line {
        line: &buf[..nl - 1],
        total: nl + 1,
    }
}

/// Outcome of reading a declared-length binary payload.
#[derive(Debug, PartialEq, Eq)]
pub enum PayloadStatus<'a> {
    /// Fewer than `declared + 2` bytes available; consume nothing.
    Incomplete,

    /// The two bytes after the payload are not `\r\n`. The pending storage
    /// command must be aborted; `consumed` discards the payload and the
    /// two bad bytes.
    BadChunk { consumed: usize },

    /// The full payload plus trailing CRLF. `data` excludes the CRLF;
    /// `consumed` includes it.
    Payload { data: &'a [u8], consumed: usize },
}

/// Reads a payload of exactly `declared` bytes plus its trailing CRLF.
///
/// Called while the parser session is in its `loading_data` state, after a
/// storage command line declared the byte count.
pub fn read_payload(buf: &[u8], declared: usize) -> PayloadStatus<'_> {
    // A declared length near usize::MAX can never be satisfied; treat it
    // as a unit that has not fully arrived rather than overflow.
    let Some(total) = declared.checked_add(CRLF.len()) else {
        return PayloadStatus::Incomplete;
    };
    if buf.len() < total {
        return PayloadStatus::Incomplete;
    }

    if &buf[declared..total] != CRLF {
        return PayloadStatus::BadChunk { consumed: total };
    }

    PayloadStatus::Payload {
        data: &buf[..declared],
        consumed: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_incomplete() {
        assert_eq!(tokenize_line(b""), LineStatus::Incomplete);
        assert_eq!(tokenize_line(b"get name"), LineStatus::Incomplete);
        assert_eq!(tokenize_line(b"get name\r"), LineStatus::Incomplete);
    }

    #[test]
    fn test_line_complete() {
        assert_eq!(
            tokenize_line(b"get name\r\n"),
            LineStatus::Line {
                line: b"get name",
                total: 10
            }
        );
    }

    #[test]
    fn test_line_leaves_trailing_bytes() {
        // Pipelined input: only the first line is recognized
        assert_eq!(
            tokenize_line(b"stats\r\nget a\r\n"),
            LineStatus::Line {
                line: b"stats",
                total: 7
            }
        );
    }

    #[test]
    fn test_line_bare_newline_is_malformed() {
        assert_eq!(tokenize_line(b"\n"), LineStatus::Malformed { consumed: 1 });
        assert_eq!(
            tokenize_line(b"get name\nmore"),
            LineStatus::Malformed { consumed: 9 }
        );
    }

    #[test]
    fn test_line_empty_is_malformed() {
        assert_eq!(
            tokenize_line(b"\r\n"),
            LineStatus::Malformed { consumed: 2 }
        );
    }

    #[test]
    fn test_payload_incomplete() {
        assert_eq!(read_payload(b"hel", 5), PayloadStatus::Incomplete);
        // Payload present but CRLF not yet arrived
        assert_eq!(read_payload(b"hello", 5), PayloadStatus::Incomplete);
        assert_eq!(read_payload(b"hello\r", 5), PayloadStatus::Incomplete);
    }

    #[test]
    fn test_payload_complete() {
        assert_eq!(
            read_payload(b"hello\r\n", 5),
            PayloadStatus::Payload {
                data: b"hello",
                consumed: 7
            }
        );
    }

    #[test]
    fn test_payload_binary_safe() {
        assert_eq!(
            read_payload(b"he\x00lo\r\nnext", 5),
            PayloadStatus::Payload {
                data: b"he\x00lo",
                consumed: 7
            }
        );
    }

    #[test]
    fn test_payload_bad_chunk() {
        // Declared 5 bytes but the terminator is wrong
        assert_eq!(
            read_payload(b"helloXX", 5),
            PayloadStatus::BadChunk { consumed: 7 }
        );
        // A payload that itself contains CRLF early is still a framing error
        assert_eq!(
            read_payload(b"he\r\nlo!", 5),
            PayloadStatus::BadChunk { consumed: 7 }
        );
    }

    #[test]
    fn test_payload_huge_declared_length_stays_incomplete() {
        // Lengths whose terminator position cannot be represented must not
        // panic; they simply never complete
        assert_eq!(read_payload(b"X", usize::MAX), PayloadStatus::Incomplete);
        assert_eq!(
            read_payload(b"X", usize::MAX - 1),
            PayloadStatus::Incomplete
        );
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(
            read_payload(b"\r\n", 0),
            PayloadStatus::Payload {
                data: b"",
                consumed: 2
            }
        );
    }
}
