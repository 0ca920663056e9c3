//! Error categories surfaced by the core (spec §7).

/// Errors surfaced by the parser, negotiation layer, reader, writer, and
/// waiter. Recoverable protocol errors are logged via `tracing` and
/// swallowed at the point they occur; the variants here are the ones that
/// propagate to a caller.
#[derive(Debug, thiserror::Error)]
pub enum TelnetError {
    /// Malformed IAC or SB sequence. Non-fatal: the parser has already
    /// reset itself to the `Data` state by the time this is observed.
    #[error("protocol warning: {0}")]
    ProtocolWarning(String),

    /// Text encode/decode failed under the `strict` error policy.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// EOF was reached before the requested terminator; carries the bytes
    /// that had already been buffered.
    #[error("incomplete read: {0} bytes buffered before eof")]
    IncompleteRead(Vec<u8>),

    /// Buffered bytes exceeded the configured limit before the terminator
    /// appeared; carries the number of bytes consumed.
    #[error("limit overrun: {0} bytes consumed before limit")]
    LimitOverrun(usize),

    /// A suspending operation (`wait_for`, connect-time negotiation)
    /// exceeded its allotted budget.
    #[error("timed out waiting for: {0}")]
    Timeout(String),

    /// A transport `write`/`drain` failed. The connection must be
    /// considered closed once this is observed.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// An unknown option name was used in a `wait_for` predicate or
    /// configuration entry.
    #[error("unknown option name: {0}")]
    NameError(String),
}

pub type Result<T> = std::result::Result<T, TelnetError>;
