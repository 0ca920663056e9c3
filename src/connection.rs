//! Per-connection state owner (spec §5 concurrency model) and the
//! client/server policy asymmetry (spec §4.9). A `Connection` is the
//! single point through which the parser, negotiator, reader, writer,
//! and waiter are driven; nothing here may be shared across connections
//! or touched from more than one task.

use bytes::Bytes;

use crate::config::Config;
use crate::constants::TTYPE_MAX_CYCLES;
use crate::env::EnvironmentOperation;
use crate::event::{EditingEvent, TelnetEvent};
use crate::linemode::{SlcFunction, SlcTable};
use crate::negotiation::{Negotiator, OptionPolicy};
use crate::option::TelnetOption;
use crate::parser::Parser;
use crate::reader::{FlowControl, Reader};
use crate::subnegotiation::{LineModeOption, SubnegotiationType};
use crate::waiter::Waiter;
use crate::writer::Writer;

/// Which side of the connection this crate is driving; only the default
/// option offers and accept policy differ (spec §4.9).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// The line-discipline the reader should segment on, computed on
/// demand rather than cached (spec §9 "Line-mode mode is derived").
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LineMode {
    Local,
    Remote,
    Kludge,
}

/// Events the application actually cares about, as opposed to the raw
/// `TelnetEvent`s the parser/negotiator exchange internally (spec §9
/// "Callbacks vs. events").
#[derive(Debug, PartialEq)]
pub enum AppEvent {
    Data(Vec<u8>),
    Editing(EditingEvent),
    OptionChanged { option: TelnetOption, local: bool, enabled: bool },
    WindowSize(u16, u16),
    TerminalType { name: Bytes, is_final: bool },
    TerminalSpeed(u32, u32),
    XDisplayLocation(Bytes),
    SendLocation(Bytes),
    Environment(EnvironmentOperation),
    CharsetAccepted(Bytes),
    CharsetRejected,
}

#[derive(Default)]
struct TtypeCycle {
    cycles: usize,
    last: Option<Bytes>,
    finished: bool,
}

/// Tracks the EDIT bit most recently observed from each side's LINEMODE
/// MODE byte (spec §4.5, §9). `None` until a MODE subnegotiation has
/// actually been seen in that direction.
#[derive(Default)]
struct LineModeBits {
    local_edit: Option<bool>,
    remote_edit: Option<bool>,
}

pub struct Connection {
    pub parser: Parser,
    pub negotiator: Negotiator,
    pub reader: Reader,
    pub writer: Writer,
    pub waiter: Waiter,
    role: Role,
    ttype: TtypeCycle,
    linemode_bits: LineModeBits,
    slc_table: SlcTable,
    charset_preference: Option<Bytes>,
}

/// Result of feeding a chunk of transport bytes through a connection:
/// bytes to write back immediately, and events for the application.
pub struct FeedResult {
    pub wire: Vec<u8>,
    pub events: Vec<AppEvent>,
    pub flow: FlowControl,
}

impl Connection {
    /// Builds a connection and the initial negotiation offer to send
    /// immediately after accept/connect (spec §4.9).
    pub fn new(role: Role, config: &Config) -> (Self, Vec<u8>) {
        let charset_preference = match &config.encoding {
            crate::config::Encoding::Named(name) => Some(Bytes::from(name.clone().into_bytes())),
            crate::config::Encoding::Raw(_) => None,
        };

        let mut conn = Connection {
            parser: Parser::new(),
            negotiator: Negotiator::new(OptionPolicy::default()),
            reader: Reader::new(config.limit),
            writer: Writer::from_config(config),
            waiter: Waiter::new(),
            role,
            ttype: TtypeCycle::default(),
            linemode_bits: LineModeBits::default(),
            slc_table: SlcTable::bsd_defaults(),
            charset_preference,
        };

        let offer = conn.initial_offer(config);
        (conn, offer)
    }

    fn initial_offer(&mut self, config: &Config) -> Vec<u8> {
        let mut wire = Vec::new();

        let (will_options, do_options): (Vec<TelnetOption>, Vec<TelnetOption>) = match self.role {
            Role::Server => (
                vec![TelnetOption::Echo, TelnetOption::SuppressGoAhead, TelnetOption::Binary],
                vec![
                    TelnetOption::TerminalType,
                    TelnetOption::Naws,
                    TelnetOption::NewEnviron,
                    TelnetOption::Charset,
                    TelnetOption::Linemode,
                    TelnetOption::TerminalSpeed,
                    TelnetOption::XDisplayLocation,
                ],
            ),
            Role::Client => (
                vec![
                    TelnetOption::TerminalType,
                    TelnetOption::Naws,
                    TelnetOption::NewEnviron,
                    TelnetOption::TerminalSpeed,
                    TelnetOption::XDisplayLocation,
                ],
                vec![],
            ),
        };

        for option in will_options {
            if let Some(event) = self.negotiator.request_will(option) {
                wire.extend(self.writer.encode_command(&event));
            }
        }
        for option in do_options {
            if let Some(event) = self.negotiator.request_do(option) {
                wire.extend(self.writer.encode_command(&event));
            }
        }

        for name in &config.always_will {
            if let Some(option) = TelnetOption::by_name(name) {
                if let Some(event) = self.negotiator.request_will(option) {
                    wire.extend(self.writer.encode_command(&event));
                }
            }
        }
        for name in &config.always_do {
            if let Some(option) = TelnetOption::by_name(name) {
                if let Some(event) = self.negotiator.request_do(option) {
                    wire.extend(self.writer.encode_command(&event));
                }
            }
        }

        if config.force_binary {
            if let Some(event) = self.negotiator.request_will(TelnetOption::Binary) {
                wire.extend(self.writer.encode_command(&event));
            }
            if let Some(event) = self.negotiator.request_do(TelnetOption::Binary) {
                wire.extend(self.writer.encode_command(&event));
            }
        }

        wire
    }

    /// The line discipline in effect right now (spec §3, §4.5, §9).
    pub fn line_mode(&self) -> LineMode {
        let linemode_active = self.negotiator.local_enabled(TelnetOption::Linemode)
            || self.negotiator.remote_enabled(TelnetOption::Linemode);

        if !linemode_active {
            return LineMode::Kludge;
        }

        match (self.linemode_bits.remote_edit, self.linemode_bits.local_edit) {
            (Some(true), _) => LineMode::Remote,
            (_, Some(true)) => LineMode::Local,
            _ => LineMode::Kludge,
        }
    }

    /// Explicitly starts a TTYPE cycle (spec §4.4/§8 S3): emits
    /// `IAC SB TTYPE SEND IAC SE`.
    pub fn request_terminal_type(&mut self) -> Vec<u8> {
        self.writer.encode_subnegotiation(
            TelnetOption::TerminalType,
            &SubnegotiationType::TerminalTypeSend,
        )
    }

    /// Feeds a chunk of transport bytes through the parser, negotiator,
    /// and kludge-mode SLC simulation, returning both the bytes that
    /// must be written back and the events the application should see.
    pub fn feed(&mut self, bytes: &[u8]) -> FeedResult {
        let events = self.parser.feed(bytes);
        let mut wire = Vec::new();
        let mut app_events = Vec::new();
        let mut data_run: Vec<u8> = Vec::new();
        let mut flow = FlowControl::Unchanged;

        fn flush_data(run: &mut Vec<u8>, app_events: &mut Vec<AppEvent>) {
            if !run.is_empty() {
                app_events.push(AppEvent::Data(std::mem::take(run)));
            }
        }

        for event in events {
            match event {
                TelnetEvent::Character(byte) => {
                    if self.line_mode() == LineMode::Kludge {
                        if let Some(editing) = self.kludge_slc_event(byte) {
                            app_events.push(AppEvent::Editing(editing));
                        }
                    }
                    data_run.push(byte);
                    let f = self.reader.push(&[byte]);
                    if f != FlowControl::Unchanged {
                        flow = f;
                    }
                }
                TelnetEvent::Do(option) | TelnetEvent::Dont(option) => {
                    flush_data(&mut data_run, &mut app_events);
                    let enabled_before = self.negotiator.local_enabled(option);
                    if let Some(reply) = self.negotiator.handle(&event) {
                        wire.extend(self.writer.encode_command(&reply));
                    }
                    self.waiter.signal();
                    let enabled_after = self.negotiator.local_enabled(option);
                    if enabled_after != enabled_before {
                        app_events.push(AppEvent::OptionChanged {
                            option,
                            local: true,
                            enabled: enabled_after,
                        });
                    }
                }
                TelnetEvent::Will(option) | TelnetEvent::Wont(option) => {
                    flush_data(&mut data_run, &mut app_events);
                    let enabled_before = self.negotiator.remote_enabled(option);
                    if let Some(reply) = self.negotiator.handle(&event) {
                        wire.extend(self.writer.encode_command(&reply));
                    }
                    self.waiter.signal();
                    let enabled_after = self.negotiator.remote_enabled(option);
                    if enabled_after != enabled_before {
                        app_events.push(AppEvent::OptionChanged {
                            option,
                            local: false,
                            enabled: enabled_after,
                        });
                    }
                    if option == TelnetOption::TerminalType
                        && enabled_after
                        && self.role == Role::Server
                    {
                        wire.extend(self.request_terminal_type());
                    }
                }
                TelnetEvent::Subnegotiate(sub) => {
                    flush_data(&mut data_run, &mut app_events);
                    self.handle_subnegotiation(sub, &mut wire, &mut app_events);
                }
                TelnetEvent::GoAhead | TelnetEvent::Nop | TelnetEvent::DataMark => {
                    flush_data(&mut data_run, &mut app_events);
                }
                TelnetEvent::Editing(editing) => {
                    flush_data(&mut data_run, &mut app_events);
                    app_events.push(AppEvent::Editing(editing));
                }
                TelnetEvent::Data(_) => {
                    // The byte-at-a-time parser never emits this variant
                    // directly; it is assembled here instead.
                }
            }
        }

        flush_data(&mut data_run, &mut app_events);

        FeedResult { wire, events: app_events, flow }
    }

    fn kludge_slc_event(&self, byte: u8) -> Option<EditingEvent> {
        let entry = self
            .slc_table
            .entries
            .iter()
            .find(|e| e.value == byte && e.value != crate::constants::SLC_DISABLED)?;

        match entry.function {
            SlcFunction::Ip => Some(EditingEvent::InterruptProcess),
            SlcFunction::Ao => Some(EditingEvent::AbortOutput),
            SlcFunction::Ayt => Some(EditingEvent::AreYouThere),
            SlcFunction::Ec => Some(EditingEvent::EraseCharacter),
            SlcFunction::El => Some(EditingEvent::EraseLine),
            SlcFunction::Brk => Some(EditingEvent::Break),
            SlcFunction::Eof => Some(EditingEvent::EndOfFile),
            SlcFunction::Abort => Some(EditingEvent::Abort),
            SlcFunction::Susp => Some(EditingEvent::Suspend),
            SlcFunction::Ew => Some(EditingEvent::EraseWord),
            SlcFunction::Rp => Some(EditingEvent::ReprintLine),
            SlcFunction::Lnext => Some(EditingEvent::LiteralNext),
            SlcFunction::Xon => Some(EditingEvent::ResumeOutput),
            SlcFunction::Xoff => Some(EditingEvent::PauseOutput),
            _ => None,
        }
    }

    fn handle_subnegotiation(
        &mut self,
        sub: SubnegotiationType,
        wire: &mut Vec<u8>,
        app_events: &mut Vec<AppEvent>,
    ) {
        match sub {
            SubnegotiationType::WindowSize(cols, rows) => {
                app_events.push(AppEvent::WindowSize(cols, rows));
            }
            SubnegotiationType::TerminalTypeSend => {
                // We were asked for our terminal type; nothing to offer
                // without an application-supplied name, so this is
                // surfaced as an option-changed-style no-op the caller
                // can react to by calling `request_terminal_type`-style
                // writer helpers with its own name.
            }
            SubnegotiationType::TerminalTypeIs(name) => {
                let is_final = self.ttype.finished
                    || self.ttype.last.as_ref() == Some(&name)
                    || self.ttype.cycles + 1 >= TTYPE_MAX_CYCLES;

                self.ttype.cycles += 1;
                self.ttype.last = Some(name.clone());

                if is_final {
                    self.ttype.finished = true;
                } else {
                    wire.extend(self.request_terminal_type());
                }

                app_events.push(AppEvent::TerminalType { name, is_final });
            }
            SubnegotiationType::TerminalSpeedIs(tx, rx) => {
                app_events.push(AppEvent::TerminalSpeed(tx, rx));
            }
            SubnegotiationType::TerminalSpeedSend => {}
            SubnegotiationType::XDisplayLocationIs(display) => {
                app_events.push(AppEvent::XDisplayLocation(display));
            }
            SubnegotiationType::XDisplayLocationSend => {}
            SubnegotiationType::SendLocationIs(location) => {
                app_events.push(AppEvent::SendLocation(location));
            }
            SubnegotiationType::RemoteFlowControl(_) => {}
            SubnegotiationType::CharsetRequest(offered) => {
                let preference = self.charset_preference.as_deref();
                match crate::subnegotiation::select_charset(&offered, preference) {
                    Some(chosen) => {
                        wire.extend(self.writer.encode_subnegotiation(
                            TelnetOption::Charset,
                            &SubnegotiationType::CharsetAccepted(chosen.clone()),
                        ));
                        app_events.push(AppEvent::CharsetAccepted(chosen));
                    }
                    None => {
                        wire.extend(self.writer.encode_subnegotiation(
                            TelnetOption::Charset,
                            &SubnegotiationType::CharsetRejected,
                        ));
                        app_events.push(AppEvent::CharsetRejected);
                    }
                }
            }
            SubnegotiationType::CharsetAccepted(charset) => {
                app_events.push(AppEvent::CharsetAccepted(charset));
            }
            SubnegotiationType::CharsetRejected => {
                app_events.push(AppEvent::CharsetRejected);
            }
            SubnegotiationType::CharsetTTableRejected => {}
            SubnegotiationType::LineMode(option) => {
                if let LineModeOption::Mode(mode) = option {
                    let edit = mode & crate::constants::LINEMODE_MODE_EDIT != 0;
                    match self.role {
                        Role::Server => self.linemode_bits.remote_edit = Some(edit),
                        Role::Client => self.linemode_bits.local_edit = Some(edit),
                    }
                }
            }
            SubnegotiationType::Environment(op) => {
                app_events.push(AppEvent::Environment(op));
            }
            SubnegotiationType::Unknown(_, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_offers_echo_sga_binary_and_solicits_ttype_naws() {
        let config = Config::default();
        let (_conn, offer) = Connection::new(Role::Server, &config);
        assert!(offer.windows(3).any(|w| w == [crate::constants::IAC, crate::constants::WILL, crate::constants::ECHO]));
        assert!(offer.windows(3).any(|w| w == [crate::constants::IAC, crate::constants::DO, crate::constants::TTYPE]));
    }

    #[test]
    fn client_offers_will_ttype_and_naws_only() {
        let config = Config::default();
        let (_conn, offer) = Connection::new(Role::Client, &config);
        assert!(offer.windows(3).any(|w| w == [crate::constants::IAC, crate::constants::WILL, crate::constants::TTYPE]));
        assert!(!offer.windows(3).any(|w| w[1] == crate::constants::DO));
    }

    #[test]
    fn kludge_mode_interrupt_delivers_data_and_editing_event() {
        let config = Config::default();
        let (mut conn, _offer) = Connection::new(Role::Server, &config);
        let result = conn.feed(&[0x03]);
        assert_eq!(result.events, vec![
            AppEvent::Editing(EditingEvent::InterruptProcess),
            AppEvent::Data(vec![0x03]),
        ]);
    }

    #[test]
    fn unsolicited_se_produces_no_app_events_and_resets_parser() {
        let config = Config::default();
        let (mut conn, _offer) = Connection::new(Role::Server, &config);
        let result = conn.feed(&[crate::constants::IAC, crate::constants::SE, b'A']);
        assert_eq!(result.events, vec![AppEvent::Data(vec![b'A'])]);
    }

    #[test]
    fn kludge_mode_eof_delivers_data_and_editing_event() {
        let config = Config::default();
        let (mut conn, _offer) = Connection::new(Role::Server, &config);
        let result = conn.feed(&[0x04]);
        assert_eq!(result.events, vec![
            AppEvent::Editing(EditingEvent::EndOfFile),
            AppEvent::Data(vec![0x04]),
        ]);
    }

    #[test]
    fn charset_request_accepts_the_configured_preference_when_offered() {
        let mut config = Config::default();
        config.encoding = crate::config::Encoding::Named("iso-8859-1".to_string());
        let (mut conn, _offer) = Connection::new(Role::Server, &config);

        let mut wire = vec![crate::constants::IAC, crate::constants::SB, crate::constants::CHARSET];
        wire.push(crate::constants::CHARSET_REQUEST);
        wire.extend_from_slice(b";ASCII;ISO-8859-1");
        wire.extend_from_slice(&[crate::constants::IAC, crate::constants::SE]);

        let result = conn.feed(&wire);
        assert_eq!(
            result.events,
            vec![AppEvent::CharsetAccepted(Bytes::from_static(b"ISO-8859-1"))]
        );
        assert!(result.wire.windows(2).any(|w| w == [crate::constants::CHARSET_ACCEPTED, b'I']));
    }

    #[test]
    fn charset_request_rejects_when_nothing_offered_is_decodable() {
        let config = Config::default();
        let (mut conn, _offer) = Connection::new(Role::Server, &config);

        let mut wire = vec![crate::constants::IAC, crate::constants::SB, crate::constants::CHARSET];
        wire.push(crate::constants::CHARSET_REQUEST);
        wire.extend_from_slice(b";KOI8-R");
        wire.extend_from_slice(&[crate::constants::IAC, crate::constants::SE]);

        let result = conn.feed(&wire);
        assert_eq!(result.events, vec![AppEvent::CharsetRejected]);
        assert!(result.wire.contains(&crate::constants::CHARSET_REJECTED));
    }

    #[test]
    fn ttype_cycle_terminates_when_value_repeats() {
        let config = Config::default();
        let (mut conn, _offer) = Connection::new(Role::Server, &config);

        let wire = [
            crate::constants::IAC,
            crate::constants::SB,
            crate::constants::TTYPE,
            0,
        ]
        .iter()
        .chain(b"xterm")
        .chain(&[crate::constants::IAC, crate::constants::SE])
        .copied()
        .collect::<Vec<u8>>();

        let first = conn.feed(&wire);
        assert_eq!(
            first.events,
            vec![AppEvent::TerminalType { name: Bytes::from_static(b"xterm"), is_final: false }]
        );
        assert!(!first.wire.is_empty()); // repeats the SEND

        let second = conn.feed(&wire);
        assert_eq!(
            second.events,
            vec![AppEvent::TerminalType { name: Bytes::from_static(b"xterm"), is_final: true }]
        );
    }
}
