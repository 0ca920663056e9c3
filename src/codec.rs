//! Tokio codec bridging the parser, negotiator, and writer into a single
//! `Decoder`/`Encoder` pair (spec §2's component table puts the codec at
//! the boundary between the connection and the transport). The codec
//! owns one `Connection` for the lifetime of a transport; bytes the
//! connection needs written back out (negotiation replies, TTYPE
//! re-solicitation, the initial offer) are queued and drained with
//! `take_pending_writes` after every decode call.

use std::collections::VecDeque;

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::config::Config;
use crate::connection::{AppEvent, Connection, Role};
use crate::error::TelnetError;

pub struct TelnetCodec {
    connection: Connection,
    pending_events: VecDeque<AppEvent>,
    pending_writes: Vec<u8>,
}

impl TelnetCodec {
    pub fn new(role: Role, config: &Config) -> Self {
        let (connection, initial_offer) = Connection::new(role, config);
        TelnetCodec { connection, pending_events: VecDeque::new(), pending_writes: initial_offer }
    }

    /// Drains bytes the connection needs written back to the transport.
    /// Transport ownership itself stays out of scope (spec §1); the
    /// caller is responsible for actually writing these out.
    pub fn take_pending_writes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending_writes)
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.connection
    }
}

impl Decoder for TelnetCodec {
    type Item = AppEvent;
    type Error = TelnetError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(event) = self.pending_events.pop_front() {
            return Ok(Some(event));
        }

        if src.is_empty() {
            return Ok(None);
        }

        let chunk = src.split_to(src.len());
        let result = self.connection.feed(&chunk);
        self.pending_writes.extend(result.wire);
        self.pending_events.extend(result.events);

        Ok(self.pending_events.pop_front())
    }
}

/// Outbound payloads are pre-encoded by `Writer` before reaching the
/// codec; the encoder only ever needs to copy those bytes onto the
/// transport buffer.
impl Encoder<Vec<u8>> for TelnetCodec {
    type Error = TelnetError;

    fn encode(&mut self, wire: Vec<u8>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&wire);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_codec_queues_the_initial_offer_for_the_transport() {
        let mut codec = TelnetCodec::new(Role::Server, &Config::default());
        let offer = codec.take_pending_writes();
        assert!(!offer.is_empty());
        assert!(codec.take_pending_writes().is_empty());
    }

    #[test]
    fn decode_surfaces_one_event_per_call_and_queues_writes() {
        let mut codec = TelnetCodec::new(Role::Server, &Config::default());
        codec.take_pending_writes();

        let mut src = BytesMut::from(&b"hi"[..]);
        let first = codec.decode(&mut src).unwrap();
        assert_eq!(first, Some(AppEvent::Data(vec![b'h', b'i'])));
        assert_eq!(codec.decode(&mut src).unwrap(), None);
    }
}
