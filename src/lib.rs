//! Asynchronous Telnet protocol engine: option negotiation (RFC 854/855),
//! sub-negotiation codecs (RFC 1073/1091/1096/1372/1408/1572/2066/2217),
//! LINEMODE/SLC editing (RFC 1184), and the Tokio codec tying them
//! together.
#![forbid(unsafe_code)]

// RFC 854 `<https://tools.ietf.org/html/rfc854>`

/// Various byte or byte sequences used in the Telnet protocol.
pub mod constants;
/// Codec and IO errors that may occur while processing Telnet events.
pub mod error;
/// Top-level Telnet events produced by the parser.
pub mod event;
/// Telnet options such as Echo, GoAhead, and SuppressGoAhead.
pub mod option;
/// Telnet subnegotiation payloads.
pub mod subnegotiation;

/// Runtime configuration: terminal identity, buffering limits, and the
/// option defaults a connection offers on startup.
pub mod config;
/// Per-connection state: parser, negotiator, reader, writer, and waiter
/// wired together, plus the client/server default option offers.
pub mod connection;
/// Tokio codec bridging the connection to a framed transport.
pub mod codec;
/// NEW-ENVIRON (RFC 1572) variable operations.
pub mod env;
/// LINEMODE (RFC 1184) MODE byte, SLC table, and FORWARDMASK.
pub mod linemode;
/// RFC 1143 Q-method option negotiation state machine.
pub mod negotiation;
/// Byte-at-a-time input parser.
pub mod parser;
/// Buffered reader with high/low-water flow control.
pub mod reader;
/// Negotiation condition waiter built on `tokio::sync::Notify`.
pub mod waiter;
/// IAC-escaping writer.
pub mod writer;
