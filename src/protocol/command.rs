//! Command Descriptors and Command-Line Parsing
//!
//! Turns one complete command line into a typed descriptor. Tokenization is
//! non-destructive: the line is split into borrowed subslices and any bytes
//! that outlive the parse (keys, payloads) are copied into refcounted
//! `Bytes` handles.
//!
//! ## Validation rules
//!
//! - Tokens are separated by spaces and tabs; empty tokens are skipped.
//! - Numeric fields are strict base-10: any non-digit character anywhere in
//!   the token makes the whole line malformed (counter deltas may carry a
//!   leading sign).
//! - A wrong argument count is malformed, never "best effort".
//!
//! Malformed lines render `ERROR\r\n`; recognized-but-unsupported forms
//! (`gets`, a numeric delete delay) render
//! `SERVER_ERROR functionality not supported\r\n`.

use bytes::Bytes;

/// Maximum number of sub-operations dispatched for one client request.
///
/// A multi-key `get` listing more keys than this silently drops the excess
/// keys from the request; each key up to the cap is still answered. This
/// bounds worst-case fan-out from a single command.
pub const MAX_OPS_PER_REQUEST: usize = 32;

/// Maximum declared payload length for a storage command, in bytes.
///
/// A line declaring more than this is malformed and rejected before any
/// payload bytes are read, so the payload reader never waits on a length
/// the receive buffer could not hold.
pub const MAX_PAYLOAD_BYTES: usize = 1024 * 1024;

/// The storage-command family declared on a `set`-shaped line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Set,
    Add,
    Replace,
    Append,
    Prepend,
    Cas,
}

impl StoreKind {
    /// `append`/`prepend`/`cas` parse and load their payload but are
    /// answered with a server error instead of an engine call.
    pub fn is_supported(self) -> bool {
        self.write_kind().is_some()
    }

    /// Narrows to the write family the engine actually implements.
    pub fn write_kind(self) -> Option<WriteKind> {
        match self {
            StoreKind::Set => Some(WriteKind::Set),
            StoreKind::Add => Some(WriteKind::Add),
            StoreKind::Replace => Some(WriteKind::Replace),
            StoreKind::Append | StoreKind::Prepend | StoreKind::Cas => None,
        }
    }
}

/// The write operations the storage engine implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteKind {
    /// Unconditional store.
    Set,
    /// Store only if the key is absent.
    Add,
    /// Store only if the key is present.
    Replace,
}

/// Counter direction for `incr`/`decr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterKind {
    Incr,
    Decr,
}

/// The fields of a storage command line, held in session state while the
/// declared binary payload is still arriving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingStore {
    pub kind: StoreKind,
    pub key: Bytes,
    /// Opaque client flags, stored and returned verbatim by the engine.
    pub flags: u32,
    /// Expiration in seconds (0 = never).
    pub exptime: u32,
    /// Declared payload length in bytes.
    pub bytes: usize,
    /// CAS token, present only for `cas`.
    pub cas: Option<u64>,
    pub noreply: bool,
}

/// An immutable, fully parsed client command, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `get` with one or more keys (already capped at
    /// [`MAX_OPS_PER_REQUEST`]).
    Get { keys: Vec<Bytes> },

    /// A storage command whose payload has fully arrived.
    Store {
        kind: WriteKind,
        key: Bytes,
        flags: u32,
        exptime: u32,
        data: Bytes,
        noreply: bool,
    },

    /// `delete <key> [noreply]`
    Delete { key: Bytes, noreply: bool },

    /// `incr`/`decr <key> <delta> [noreply]`
    Counter {
        kind: CounterKind,
        key: Bytes,
        delta: i64,
        noreply: bool,
    },

    /// `stats`: one snapshot per active core.
    Stats,
}

/// Result of interpreting one command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// A complete command, ready to dispatch.
    Command(Command),

    /// A storage command header; the binary payload follows on the wire.
    StoreHeader(PendingStore),

    /// `quit`: close this connection.
    Quit,

    /// `shutdown`: terminate the server.
    Shutdown,

    /// Protocol malformation, answered with `ERROR\r\n`.
    Malformed,

    /// Recognized but not implemented, answered with a server error.
    Unsupported,
}

/// Parses one command line (terminators already stripped).
pub fn parse_line(line: &[u8]) -> ParsedLine {
    let mut tokens = line
        .split(|&b| b == b' ' || b == b'\t')
        .filter(|t| !t.is_empty());

    let Some(keyword) = tokens.next() else {
        return ParsedLine::Malformed;
    };
    let args: Vec<&[u8]> = tokens.collect();

    match keyword {
        b"quit" | b"shutdown" => {
            if !args.is_empty() {
                return ParsedLine::Malformed;
            }
            if keyword == b"quit" {
                ParsedLine::Quit
            } else {
                ParsedLine::Shutdown
            }
        }

        b"stats" => {
            if !args.is_empty() {
                return ParsedLine::Malformed;
            }
            ParsedLine::Command(Command::Stats)
        }

        b"set" => parse_store(StoreKind::Set, &args),
        b"add" => parse_store(StoreKind::Add, &args),
        b"replace" => parse_store(StoreKind::Replace, &args),
        b"append" => parse_store(StoreKind::Append, &args),
        b"prepend" => parse_store(StoreKind::Prepend, &args),
        b"cas" => parse_store(StoreKind::Cas, &args),

        b"get" => {
            if args.is_empty() {
                return ParsedLine::Malformed;
            }
            let keys = args
                .iter()
                .take(MAX_OPS_PER_REQUEST)
                .map(|k| Bytes::copy_from_slice(k))
                .collect();
            ParsedLine::Command(Command::Get { keys })
        }

        // CAS-aware retrieval is not implemented.
        b"gets" => ParsedLine::Unsupported,

        b"delete" => parse_delete(&args),

        b"incr" => parse_counter(CounterKind::Incr, &args),
        b"decr" => parse_counter(CounterKind::Decr, &args),

        _ => ParsedLine::Malformed,
    }
}

/// `<cmd> <key> <flags> <exptime> <bytes> [cas] [noreply]`
fn parse_store(kind: StoreKind, args: &[&[u8]]) -> ParsedLine {
    let fixed = if kind == StoreKind::Cas { 5 } else { 4 };

    let noreply = match args.len() {
        n if n == fixed => false,
        n if n == fixed + 1 && args[fixed] == b"noreply" => true,
        _ => return ParsedLine::Malformed,
    };

    let (Some(flags), Some(exptime), Some(bytes)) = (
        parse_decimal::<u32>(args[1]),
        parse_decimal::<u32>(args[2]),
        parse_decimal::<usize>(args[3]),
    ) else {
        return ParsedLine::Malformed;
    };

    if bytes > MAX_PAYLOAD_BYTES {
        return ParsedLine::Malformed;
    }

    let cas = if kind == StoreKind::Cas {
        match parse_decimal::<u64>(args[4]) {
            Some(token) => Some(token),
            None => return ParsedLine::Malformed,
        }
    } else {
        None
    };

    ParsedLine::StoreHeader(PendingStore {
        kind,
        key: Bytes::copy_from_slice(args[0]),
        flags,
        exptime,
        bytes,
        cas,
        noreply,
    })
}

/// `delete <key> [<time>|noreply] [noreply]`
///
/// The legacy numeric delay form is not implemented; a second token other
/// than `noreply` is answered with a server error.
fn parse_delete(args: &[&[u8]]) -> ParsedLine {
    match args {
        [key] => ParsedLine::Command(Command::Delete {
            key: Bytes::copy_from_slice(key),
            noreply: false,
        }),
        [key, b"noreply"] => ParsedLine::Command(Command::Delete {
            key: Bytes::copy_from_slice(key),
            noreply: true,
        }),
        [_, _] => ParsedLine::Unsupported,
        [_, _, b"noreply"] => ParsedLine::Unsupported,
        _ => ParsedLine::Malformed,
    }
}

/// `incr|decr <key> <delta> [noreply]`
fn parse_counter(kind: CounterKind, args: &[&[u8]]) -> ParsedLine {
    let noreply = match args.len() {
        2 => false,
        3 if args[2] == b"noreply" => true,
        _ => return ParsedLine::Malformed,
    };

    let Some(delta) = parse_signed(args[1]) else {
        return ParsedLine::Malformed;
    };

    ParsedLine::Command(Command::Counter {
        kind,
        key: Bytes::copy_from_slice(args[0]),
        delta,
        noreply,
    })
}

/// Strict non-negative base-10 parse: every byte must be an ASCII digit.
///
/// `str::parse` alone would accept a leading `+`, which the protocol
/// treats as malformed.
fn parse_decimal<T: std::str::FromStr>(token: &[u8]) -> Option<T> {
    if token.is_empty() || !token.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}

/// Signed 64-bit parse for counter deltas (optional leading `-`).
fn parse_signed(token: &[u8]) -> Option<i64> {
    let digits = token.strip_prefix(b"-").unwrap_or(token);
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(token).ok()?.parse().ok()
}
