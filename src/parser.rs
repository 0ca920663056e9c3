//! Byte-at-a-time input parser separating in-band data from IAC/SB
//! control sequences (spec §4.1). The same state machine runs on both
//! client and server connections.

use tracing::{trace, warn};

use crate::constants::{
    AO, AYT, BRK, DM, DO, DONT, EC, EL, EOR, GA, IAC, IP, NOP, SB, SE, WILL, WONT,
};
use crate::event::{EditingEvent, TelnetEvent};
use crate::option::TelnetOption;
use crate::subnegotiation;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Will,
    Wont,
    Do,
    Dont,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Data,
    IacCmd,
    IacOpt(Verb),
    IacSbOpt,
    SbData,
    SbIac,
}

/// The parser's own buffering state (§5: "the parser, both option-state
/// maps, the reader buffer, the SB buffer" are all owned by the single
/// connection task).
pub struct Parser {
    state: State,
    sb_option: Option<TelnetOption>,
    sb_buffer: Vec<u8>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Parser { state: State::Data, sb_option: None, sb_buffer: Vec::new() }
    }

    /// Feeds a single byte through the state machine, returning zero or
    /// more events. Never suspends (spec §5: "feeding a byte into the
    /// parser is synchronous").
    pub fn feed_byte(&mut self, byte: u8) -> Vec<TelnetEvent> {
        match self.state {
            State::Data => self.on_data(byte),
            State::IacCmd => self.on_iac_cmd(byte),
            State::IacOpt(verb) => self.on_iac_opt(verb, byte),
            State::IacSbOpt => self.on_iac_sb_opt(byte),
            State::SbData => self.on_sb_data(byte),
            State::SbIac => self.on_sb_iac(byte),
        }
    }

    /// Feeds an entire chunk of transport bytes, in order.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<TelnetEvent> {
        let mut events = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            events.extend(self.feed_byte(byte));
        }
        events
    }

    fn on_data(&mut self, byte: u8) -> Vec<TelnetEvent> {
        if byte == IAC {
            self.state = State::IacCmd;
            Vec::new()
        } else {
            vec![TelnetEvent::Character(byte)]
        }
    }

    fn on_iac_cmd(&mut self, byte: u8) -> Vec<TelnetEvent> {
        match byte {
            IAC => {
                self.state = State::Data;
                vec![TelnetEvent::Character(IAC)]
            }
            NOP => {
                self.state = State::Data;
                trace!("IAC NOP");
                vec![TelnetEvent::Nop]
            }
            DM => {
                self.state = State::Data;
                vec![TelnetEvent::DataMark]
            }
            BRK => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::Break)]
            }
            IP => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::InterruptProcess)]
            }
            AO => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::AbortOutput)]
            }
            AYT => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::AreYouThere)]
            }
            EC => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::EraseCharacter)]
            }
            EL => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::EraseLine)]
            }
            GA => {
                self.state = State::Data;
                vec![TelnetEvent::GoAhead]
            }
            EOR => {
                self.state = State::Data;
                vec![TelnetEvent::Editing(EditingEvent::EndOfRecord)]
            }
            WILL => {
                self.state = State::IacOpt(Verb::Will);
                Vec::new()
            }
            WONT => {
                self.state = State::IacOpt(Verb::Wont);
                Vec::new()
            }
            DO => {
                self.state = State::IacOpt(Verb::Do);
                Vec::new()
            }
            DONT => {
                self.state = State::IacOpt(Verb::Dont);
                Vec::new()
            }
            SB => {
                self.state = State::IacSbOpt;
                Vec::new()
            }
            SE => {
                self.state = State::Data;
                warn!("unsolicited IAC SE outside sub-negotiation");
                Vec::new()
            }
            other => {
                self.state = State::Data;
                warn!(byte = other, "illegal two-byte IAC command");
                Vec::new()
            }
        }
    }

    fn on_iac_opt(&mut self, verb: Verb, byte: u8) -> Vec<TelnetEvent> {
        self.state = State::Data;
        let option = TelnetOption::from(byte);
        let event = match verb {
            Verb::Will => TelnetEvent::Will(option),
            Verb::Wont => TelnetEvent::Wont(option),
            Verb::Do => TelnetEvent::Do(option),
            Verb::Dont => TelnetEvent::Dont(option),
        };
        vec![event]
    }

    fn on_iac_sb_opt(&mut self, byte: u8) -> Vec<TelnetEvent> {
        self.sb_option = Some(TelnetOption::from(byte));
        self.sb_buffer.clear();
        self.state = State::SbData;
        Vec::new()
    }

    fn on_sb_data(&mut self, byte: u8) -> Vec<TelnetEvent> {
        if byte == IAC {
            self.state = State::SbIac;
        } else {
            self.sb_buffer.push(byte);
        }
        Vec::new()
    }

    fn on_sb_iac(&mut self, byte: u8) -> Vec<TelnetEvent> {
        match byte {
            IAC => {
                self.sb_buffer.push(IAC);
                self.state = State::SbData;
                Vec::new()
            }
            SE => {
                self.state = State::Data;
                let option = self.sb_option.take().unwrap_or(TelnetOption::Unknown(0));
                let body = std::mem::take(&mut self.sb_buffer);
                vec![TelnetEvent::Subnegotiate(subnegotiation::decode(option, &body))]
            }
            other => {
                // SB interruption (spec §4.1): a stray control command
                // arrived mid sub-negotiation. Discard the buffer and
                // replay `IAC other` at the top level so e.g. an inner
                // `IAC TM` still terminates cleanly.
                warn!(byte = other, "sub-negotiation interrupted by IAC command");
                self.sb_option = None;
                self.sb_buffer.clear();
                self.state = State::Data;
                let mut events = self.feed_byte(IAC);
                events.extend(self.feed_byte(other));
                events
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_data_passes_through_as_characters() {
        let mut parser = Parser::new();
        let events = parser.feed(b"hi");
        assert_eq!(events, vec![TelnetEvent::Character(b'h'), TelnetEvent::Character(b'i')]);
    }

    #[test]
    fn iac_iac_escapes_a_literal_0xff() {
        let mut parser = Parser::new();
        let events = parser.feed(&[IAC, IAC]);
        assert_eq!(events, vec![TelnetEvent::Character(0xFF)]);
    }

    #[test]
    fn iac_iac_iac_leaves_parser_mid_command() {
        // Boundary behavior from spec §8: "IAC IAC IAC ... produces one
        // 0xFF byte of data and leaves the parser in IAC_CMD".
        let mut parser = Parser::new();
        let events = parser.feed(&[IAC, IAC, IAC]);
        assert_eq!(events, vec![TelnetEvent::Character(0xFF)]);
        assert_eq!(parser.state, State::IacCmd);
    }

    #[test]
    fn do_unknown_option_is_surfaced_for_the_negotiator_to_refuse() {
        let mut parser = Parser::new();
        let events = parser.feed(&[IAC, DO, 0x63]);
        assert_eq!(events, vec![TelnetEvent::Do(TelnetOption::Unknown(0x63))]);
    }

    #[test]
    fn unsolicited_se_resets_to_data_and_next_byte_is_data() {
        // spec §8 S6.
        let mut parser = Parser::new();
        let events = parser.feed(&[IAC, SE, 0x41]);
        assert_eq!(events, vec![TelnetEvent::Character(b'A')]);
    }

    #[test]
    fn naws_subnegotiation_decodes_window_size() {
        let mut parser = Parser::new();
        let wire = [IAC, SB, 31, 0x00, 0x84, 0x00, 0x2b, IAC, SE];
        let events = parser.feed(&wire);
        assert_eq!(
            events,
            vec![TelnetEvent::Subnegotiate(
                crate::subnegotiation::SubnegotiationType::WindowSize(132, 43)
            )]
        );
    }

    #[test]
    fn sb_interruption_by_timing_mark_still_terminates_cleanly() {
        let mut parser = Parser::new();
        // IAC SB TTYPE <partial> IAC DM  (stray two-byte command inside SB)
        let wire = [IAC, SB, 24, b'x', IAC, DM];
        let events = parser.feed(&wire);
        assert_eq!(events, vec![TelnetEvent::DataMark]);
        assert_eq!(parser.state, State::Data);
    }
}
