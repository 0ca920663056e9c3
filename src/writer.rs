//! IAC-escaping writer (spec §4.6). The writer never owns a transport —
//! transport acquisition is explicitly out of scope (spec §1) — it only
//! turns application writes and negotiation replies into wire bytes.

use bytes::{BufMut, BytesMut};

use crate::config::{Config, Encoding, EncodingErrors};
use crate::constants::{CR, EOR, GA, IAC, LF, SB, SE};
use crate::error::{Result, TelnetError};
use crate::event::{EditingEvent, TelnetEvent};
use crate::option::TelnetOption;
use crate::subnegotiation::SubnegotiationType;

/// Per-connection writer state: the negotiated environ encoding, the
/// `xon_any` flag affecting LFLOW behavior, and the charset/error
/// policy driving `write_text` (spec §3 "Writer state", §4.6, §7
/// `ENCODING_ERROR`).
pub struct Writer {
    pub environ_encoding: &'static str,
    pub xon_any: bool,
    pub encoding: Encoding,
    pub encoding_errors: EncodingErrors,
}

impl Default for Writer {
    fn default() -> Self {
        Writer {
            environ_encoding: "ascii",
            xon_any: false,
            encoding: Encoding::default(),
            encoding_errors: EncodingErrors::default(),
        }
    }
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a writer whose charset/error policy starts from the
    /// connection's configuration (spec §4.6 "the startup default").
    pub fn from_config(config: &Config) -> Self {
        Writer {
            encoding: config.encoding.clone(),
            encoding_errors: config.encoding_errors,
            ..Self::default()
        }
    }

    /// Escapes a literal 0xFF as two consecutive 0xFF bytes (spec §6
    /// "Wire format"). Used for both raw-byte and text writes.
    pub fn escape(data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len());
        for &b in data {
            out.push(b);
            if b == IAC {
                out.push(IAC);
            }
        }
        out
    }

    /// Encodes a `write(data)` call. In text mode (`binary == false`) a
    /// lone `\n` becomes `\r\n` and a lone `\r` becomes `\r\0`, per RFC
    /// 854's NVT end-of-line convention; BINARY negotiated outbound
    /// disables both translations.
    pub fn write(&self, data: &[u8], binary: bool) -> Vec<u8> {
        if binary {
            return Self::escape(data);
        }

        let mut translated = Vec::with_capacity(data.len());
        let mut iter = data.iter().peekable();
        while let Some(&b) = iter.next() {
            match b {
                LF => {
                    translated.push(CR);
                    translated.push(LF);
                }
                CR if iter.peek() != Some(&&LF) => {
                    translated.push(CR);
                    translated.push(0);
                }
                _ => translated.push(b),
            }
        }

        Self::escape(&translated)
    }

    /// Encodes application text through the negotiated/startup charset
    /// (spec §4.6 "text mode encoding is charset ... or the startup
    /// default") and the configured error policy (spec §7
    /// `ENCODING_ERROR`), then runs it through `write` for NVT
    /// translation and IAC escaping.
    pub fn write_text(&self, text: &str, binary: bool) -> Result<Vec<u8>> {
        let encoded = self.encode_charset(text)?;
        Ok(self.write(&encoded, binary))
    }

    /// Transcodes `text` into bytes under `self.encoding`, applying
    /// `self.encoding_errors` to characters the charset cannot
    /// represent. UTF-8 (and an explicit `Encoding::Raw`) always
    /// succeeds; every other named charset is treated as a
    /// single-byte, ASCII-range encoding, matching the `term`/`charset`
    /// identifiers this crate actually negotiates (spec §4.4 CHARSET).
    fn encode_charset(&self, text: &str) -> Result<Vec<u8>> {
        match &self.encoding {
            Encoding::Raw(_) => Ok(text.as_bytes().to_vec()),
            Encoding::Named(name) => {
                let normalized = crate::subnegotiation::normalize_charset_name(name.as_bytes());
                if normalized == b"utf-8" || normalized == b"utf8" {
                    return Ok(text.as_bytes().to_vec());
                }

                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    if (ch as u32) < 0x80 {
                        out.push(ch as u8);
                        continue;
                    }

                    match self.encoding_errors {
                        EncodingErrors::Strict => {
                            return Err(TelnetError::Encoding(format!(
                                "character {ch:?} is not representable in {name}"
                            )));
                        }
                        EncodingErrors::Replace => out.push(b'?'),
                        EncodingErrors::Ignore => {}
                    }
                }
                Ok(out)
            }
        }
    }

    /// `echo(data)`: an alias for `write` suppressed by the caller when
    /// ECHO is locally enabled (meaning "we echo", so the peer already
    /// sees its own keystrokes).
    pub fn echo(&self, data: &[u8], binary: bool, local_echo_enabled: bool) -> Vec<u8> {
        if local_echo_enabled {
            Vec::new()
        } else {
            self.write(data, binary)
        }
    }

    /// Encodes a negotiation reply or fixed-byte command event as wire
    /// bytes. Redundancy suppression itself happens one layer up, in the
    /// negotiation state machine (spec §4.2) — by the time an event
    /// reaches here it is always meant to be sent. `Data`, `Character`
    /// and `Subnegotiate` events are not valid input; use `write` and
    /// `encode_subnegotiation` for those instead.
    pub fn encode_command(&self, event: &TelnetEvent) -> Vec<u8> {
        match event {
            TelnetEvent::Will(opt) => vec![IAC, crate::constants::WILL, (*opt).into()],
            TelnetEvent::Wont(opt) => vec![IAC, crate::constants::WONT, (*opt).into()],
            TelnetEvent::Do(opt) => vec![IAC, crate::constants::DO, (*opt).into()],
            TelnetEvent::Dont(opt) => vec![IAC, crate::constants::DONT, (*opt).into()],
            TelnetEvent::GoAhead => vec![IAC, GA],
            TelnetEvent::Nop => vec![IAC, crate::constants::NOP],
            TelnetEvent::DataMark => vec![IAC, crate::constants::DM],
            TelnetEvent::Editing(
                editing @ (EditingEvent::InterruptProcess
                | EditingEvent::AbortOutput
                | EditingEvent::AreYouThere
                | EditingEvent::EraseCharacter
                | EditingEvent::EraseLine
                | EditingEvent::Break
                | EditingEvent::EndOfRecord),
            ) => vec![IAC, u8::from(TelnetEvent::Editing(*editing))],
            // Kludge-only SLC events (EOF, ABORT, SUSP, EW, RP, LNEXT,
            // XON, XOFF) have no standalone two-byte IAC form; they are
            // only ever delivered as the in-band byte that triggered
            // them.
            TelnetEvent::Editing(_)
            | TelnetEvent::Data(_)
            | TelnetEvent::Character(_)
            | TelnetEvent::Subnegotiate(_) => Vec::new(),
        }
    }

    /// `send_sb(opt, payload)`: emits `IAC SB opt <payload-escaped> IAC SE`.
    pub fn send_sb(&self, option: TelnetOption, payload: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(payload.len() + 5);
        buf.put_u8(IAC);
        buf.put_u8(SB);
        buf.put_u8(option.into());
        buf.extend_from_slice(&Self::escape(payload));
        buf.put_u8(IAC);
        buf.put_u8(SE);
        buf.to_vec()
    }

    pub fn encode_subnegotiation(&self, option: TelnetOption, sub: &SubnegotiationType) -> Vec<u8> {
        let payload = encode_subnegotiation_body(sub);
        self.send_sb(option, &payload)
    }

    /// `send_ga()`: emits `IAC GA` iff SGA has not been negotiated;
    /// returns `None` when suppressed.
    pub fn send_ga(&self, sga_negotiated: bool) -> Option<Vec<u8>> {
        if sga_negotiated {
            None
        } else {
            Some(vec![IAC, GA])
        }
    }

    /// `send_eor()`: emits `IAC EOR` if EOR is locally enabled. Spec §9
    /// open question: the source sends EOR even if only one side has
    /// agreed; this crate preserves that behavior rather than requiring
    /// both sides.
    pub fn send_eor(&self, eor_enabled_locally: bool) -> Option<Vec<u8>> {
        if eor_enabled_locally {
            Some(vec![IAC, EOR])
        } else {
            None
        }
    }
}

fn encode_subnegotiation_body(sub: &SubnegotiationType) -> Vec<u8> {
    match sub {
        SubnegotiationType::WindowSize(cols, rows) => {
            let mut body = Vec::with_capacity(4);
            body.extend_from_slice(&cols.to_be_bytes());
            body.extend_from_slice(&rows.to_be_bytes());
            body
        }
        SubnegotiationType::TerminalTypeIs(name) => {
            let mut body = vec![crate::constants::TTYPE_IS];
            body.extend_from_slice(name);
            body
        }
        SubnegotiationType::TerminalTypeSend => vec![crate::constants::TTYPE_SEND],
        SubnegotiationType::TerminalSpeedIs(tx, rx) => {
            let mut body = vec![crate::constants::TSPEED_IS];
            body.extend_from_slice(format!("{tx},{rx}").as_bytes());
            body
        }
        SubnegotiationType::TerminalSpeedSend => vec![crate::constants::TSPEED_SEND],
        SubnegotiationType::XDisplayLocationIs(display) => {
            let mut body = vec![crate::constants::XDISPLOC_IS];
            body.extend_from_slice(display);
            body
        }
        SubnegotiationType::XDisplayLocationSend => vec![crate::constants::XDISPLOC_SEND],
        SubnegotiationType::SendLocationIs(location) => {
            let mut body = vec![crate::constants::SNDLOC_IS];
            body.extend_from_slice(location);
            body
        }
        SubnegotiationType::RemoteFlowControl(mode) => vec![(*mode).into()],
        SubnegotiationType::CharsetRequest(names) => {
            let mut body = vec![crate::constants::CHARSET_REQUEST, b';'];
            for (i, name) in names.iter().enumerate() {
                if i > 0 {
                    body.push(b';');
                }
                body.extend_from_slice(name);
            }
            body
        }
        SubnegotiationType::CharsetAccepted(name) => {
            let mut body = vec![crate::constants::CHARSET_ACCEPTED];
            body.extend_from_slice(name);
            body
        }
        SubnegotiationType::CharsetRejected => vec![crate::constants::CHARSET_REJECTED],
        SubnegotiationType::CharsetTTableRejected => {
            vec![crate::constants::CHARSET_TTABLE_REJECTED]
        }
        SubnegotiationType::LineMode(option) => encode_linemode(option),
        SubnegotiationType::Environment(op) => {
            let mut buf = bytes::BytesMut::new();
            crate::env::encode_env_op(op.clone(), &mut buf);
            buf.to_vec()
        }
        SubnegotiationType::Unknown(_, data) => data.to_vec(),
    }
}

fn encode_linemode(option: &crate::subnegotiation::LineModeOption) -> Vec<u8> {
    use crate::subnegotiation::LineModeOption;

    match option {
        LineModeOption::Mode(mode) => vec![crate::constants::MODE, *mode],
        LineModeOption::SLC(triples) => {
            let mut body = vec![crate::constants::LINEMODE_SLC];
            for (dispatch, value) in triples {
                let (function, modifiers): (u8, u8) = (*dispatch).into();
                body.push(function);
                body.push(modifiers);
                body.push(*value as u8);
            }
            body
        }
        LineModeOption::ForwardMask(crate::linemode::ForwardMaskOption::Do(mask)) => {
            let mut body = vec![crate::constants::LINEMODE_FORWARD_MASK, 1];
            body.extend_from_slice(&mask.mask);
            body
        }
        LineModeOption::ForwardMask(crate::linemode::ForwardMaskOption::Will(mask)) => {
            let mut body = vec![crate::constants::LINEMODE_FORWARD_MASK, 0];
            body.extend_from_slice(&mask.mask);
            body
        }
        LineModeOption::ForwardMask(crate::linemode::ForwardMaskOption::Unknown(sub)) => {
            vec![crate::constants::LINEMODE_FORWARD_MASK, *sub]
        }
        LineModeOption::Unknown(sub, data) => {
            let mut body = vec![*sub];
            body.extend_from_slice(data);
            body
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_doubles_a_literal_iac_byte() {
        assert_eq!(Writer::escape(&[0x01, IAC, 0x02]), vec![0x01, IAC, IAC, 0x02]);
    }

    #[test]
    fn text_write_translates_lone_newline_to_crlf() {
        let writer = Writer::new();
        assert_eq!(writer.write(b"hi\n", false), b"hi\r\n".to_vec());
    }

    #[test]
    fn text_write_translates_lone_cr_to_cr_nul() {
        let writer = Writer::new();
        assert_eq!(writer.write(&[b'a', CR, b'b'], false), vec![b'a', CR, 0, b'b']);
    }

    #[test]
    fn binary_write_skips_newline_translation() {
        let writer = Writer::new();
        assert_eq!(writer.write(b"hi\n", true), b"hi\n".to_vec());
    }

    #[test]
    fn send_ga_suppressed_once_sga_negotiated() {
        let writer = Writer::new();
        assert_eq!(writer.send_ga(false), Some(vec![IAC, GA]));
        assert_eq!(writer.send_ga(true), None);
    }

    #[test]
    fn naws_roundtrips_0xff_doubled_on_the_wire() {
        let writer = Writer::new();
        let wire = writer.encode_subnegotiation(
            TelnetOption::Naws,
            &SubnegotiationType::WindowSize(255, 255),
        );
        assert_eq!(wire, vec![IAC, SB, 31, 0x00, IAC, IAC, 0x00, IAC, IAC, IAC, SE]);
    }

    #[test]
    fn editing_commands_never_sent_for_kludge_only_slc_events() {
        let writer = Writer::new();
        assert_eq!(
            writer.encode_command(&TelnetEvent::Editing(EditingEvent::EndOfFile)),
            Vec::<u8>::new()
        );
        assert_eq!(
            writer.encode_command(&TelnetEvent::Editing(EditingEvent::InterruptProcess)),
            vec![IAC, crate::constants::IP]
        );
    }

    #[test]
    fn write_text_under_utf8_passes_non_ascii_through() {
        let mut writer = Writer::new();
        writer.encoding = Encoding::Named("utf-8".to_string());
        assert_eq!(writer.write_text("héllo", true).unwrap(), "héllo".as_bytes().to_vec());
    }

    #[test]
    fn write_text_under_strict_ascii_rejects_non_ascii() {
        let mut writer = Writer::new();
        writer.encoding = Encoding::Named("ascii".to_string());
        writer.encoding_errors = EncodingErrors::Strict;
        match writer.write_text("héllo", true) {
            Err(TelnetError::Encoding(_)) => {}
            other => panic!("expected Encoding error, got {other:?}"),
        }
    }

    #[test]
    fn write_text_under_replace_ascii_substitutes_a_question_mark() {
        let mut writer = Writer::new();
        writer.encoding = Encoding::Named("ascii".to_string());
        writer.encoding_errors = EncodingErrors::Replace;
        assert_eq!(writer.write_text("a\u{e9}b", true).unwrap(), b"a?b".to_vec());
    }

    #[test]
    fn write_text_under_ignore_ascii_drops_the_character() {
        let mut writer = Writer::new();
        writer.encoding = Encoding::Named("ascii".to_string());
        writer.encoding_errors = EncodingErrors::Ignore;
        assert_eq!(writer.write_text("a\u{e9}b", true).unwrap(), b"ab".to_vec());
    }
}
