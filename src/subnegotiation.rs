use bytes::Bytes;

use crate::constants::{LINEMODE_FORWARD_MASK, LINEMODE_SLC, MODE};
use crate::env::EnvironmentOperation;
use crate::linemode::{Dispatch, ForwardMaskOption};
use crate::option::TelnetOption;

/// All Telnet sub-negotiation payloads this crate decodes or encodes
/// (spec §4.4, §4.5).
#[derive(Debug, PartialEq, Eq)]
pub enum SubnegotiationType {
    /// NAWS (RFC 1073): `(columns, rows)` in characters.
    WindowSize(u16, u16),
    /// TTYPE (RFC 1091) `IS <name>`: the peer's terminal type name for
    /// this cycle. A server cycles through `SEND` requests until the
    /// name repeats or the eight-cycle cap (spec §4.4) is reached.
    TerminalTypeIs(Bytes),
    /// TTYPE `SEND`: a request for the next terminal type name.
    TerminalTypeSend,
    /// TSPEED (RFC 1079) `IS <tx>,<rx>`.
    TerminalSpeedIs(u32, u32),
    /// TSPEED `SEND`.
    TerminalSpeedSend,
    /// XDISPLOC (RFC 1096) `IS <display>`.
    XDisplayLocationIs(Bytes),
    /// XDISPLOC `SEND`.
    XDisplayLocationSend,
    /// SNDLOC (MUD extension, modeled on TTYPE/TSPEED) `IS <location>`.
    SendLocationIs(Bytes),
    /// LFLOW (RFC 1372): the remote flow control mode being set.
    RemoteFlowControl(LflowMode),
    /// Indicates an intent to begin CHARSET subnegotiation. This can only be
    /// sent after receiving a DO CHARSET after sending a WILL CHARSET (in any
    /// order).
    CharsetRequest(Vec<Bytes>),
    /// Indicates that the receiver has accepted the charset request.
    CharsetAccepted(Bytes),
    /// Indicates that the receiver acknowledges the charset request, but will
    /// not use any of the requested characters.
    CharsetRejected,
    /// Indicates that the receiver acknowledges a TTABLE-IS message, but is
    /// unable to handle it. This will terminate subnegotiation.
    CharsetTTableRejected,
    LineMode(LineModeOption),
    /// NEW-ENVIRON (RFC 1572).
    Environment(EnvironmentOperation),
    /// A subnegotiation for an unknown option.
    Unknown(TelnetOption, Bytes),
}

/// RFC 1372 flow-control modes carried in an LFLOW sub-negotiation.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum LflowMode {
    Off,
    On,
    RestartAny,
    RestartXon,
}

impl From<u8> for LflowMode {
    fn from(value: u8) -> Self {
        match value {
            crate::constants::LFLOW_OFF => LflowMode::Off,
            crate::constants::LFLOW_RESTART_ANY => LflowMode::RestartAny,
            crate::constants::LFLOW_RESTART_XON => LflowMode::RestartXon,
            _ => LflowMode::On,
        }
    }
}

impl From<LflowMode> for u8 {
    fn from(mode: LflowMode) -> Self {
        match mode {
            LflowMode::Off => crate::constants::LFLOW_OFF,
            LflowMode::On => crate::constants::LFLOW_ON,
            LflowMode::RestartAny => crate::constants::LFLOW_RESTART_ANY,
            LflowMode::RestartXon => crate::constants::LFLOW_RESTART_XON,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum LineModeOption {
    Mode(u8),
    SLC(Vec<(Dispatch, char)>),
    ForwardMask(ForwardMaskOption),
    Unknown(u8, Bytes),
}

impl From<u8> for LineModeOption {
    fn from(value: u8) -> Self {
        match value {
            MODE => LineModeOption::Mode(0),
            LINEMODE_SLC => LineModeOption::SLC(Vec::new()),
            LINEMODE_FORWARD_MASK => LineModeOption::ForwardMask(ForwardMaskOption::Unknown(0)),
            _ => LineModeOption::Unknown(value, Bytes::new()),
        }
    }
}

impl SubnegotiationType {
    /// Returns the length (in bytes) of the subnegotiation data.
    /// This _does not_ include the IAC SB and IAC SE bytes, _nor_ the single
    /// byte that represents the option.
    pub fn len(&self) -> usize {
        match self {
            SubnegotiationType::WindowSize(_, _) => 4,
            SubnegotiationType::TerminalTypeIs(name) => name.len() + 1,
            SubnegotiationType::TerminalTypeSend => 1,
            SubnegotiationType::TerminalSpeedIs(_, _) => 1, // variable-width ASCII; exact len computed by the codec
            SubnegotiationType::TerminalSpeedSend => 1,
            SubnegotiationType::XDisplayLocationIs(display) => display.len() + 1,
            SubnegotiationType::XDisplayLocationSend => 1,
            SubnegotiationType::SendLocationIs(location) => location.len() + 1,
            SubnegotiationType::RemoteFlowControl(_) => 1,
            SubnegotiationType::CharsetRequest(vec) => {
                // 1 separator per charset, as the list starts with one.
                let mut len = vec.len();

                for bytes in vec {
                    len += bytes.len();
                }
                // add one more for the subnegotation sub-option (i.e.
                // CHARSET_REQUEST)
                len + 1
            }
            SubnegotiationType::CharsetAccepted(charset) => {
                // add one more for the subnegotation sub-option (i.e.
                // CHARSET_ACCEPTED)
                charset.len() + 1
            }
            SubnegotiationType::CharsetRejected => 1,
            SubnegotiationType::CharsetTTableRejected => 1,
            SubnegotiationType::LineMode(mode) => {
                match mode {
                    LineModeOption::SLC(triples) => {
                        // Mode byte plus length of triples
                        triples.len() * 3 + 1
                    }
                    LineModeOption::Mode(_) => 2,
                    LineModeOption::ForwardMask(ForwardMaskOption::Do(mask)) => 2 + mask.mask.len(),
                    LineModeOption::ForwardMask(ForwardMaskOption::Will(mask)) => 2 + mask.mask.len(),
                    LineModeOption::ForwardMask(ForwardMaskOption::Unknown(_)) => 2,
                    LineModeOption::Unknown(_, data) => 1 + data.len(),
                }
            }
            SubnegotiationType::Environment(op) => {
                let mut buffer = bytes::BytesMut::new();
                crate::env::encode_env_op(op.clone(), &mut buffer);
                buffer.len()
            }
            SubnegotiationType::Unknown(_, bytes) => bytes.len(),
        }
    }

    /// Returns true if the subnegotiation data has a length (in bytes) of 0.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Normalizes a charset name for comparison (spec §9 "Character set
/// normalization"): lowercase, with any trailing zero-padding inside a
/// hyphenated numeric suffix collapsed, so `ISO-8859-02` and `iso-8859-2`
/// compare equal.
pub fn normalize_charset_name(name: &[u8]) -> Vec<u8> {
    let lowered: Vec<u8> = name.iter().map(|b| b.to_ascii_lowercase()).collect();
    let text = String::from_utf8_lossy(&lowered);
    let parts: Vec<&str> = text.split('-').collect();
    let normalized: Vec<String> = parts
        .into_iter()
        .map(|part| match part.parse::<u32>() {
            Ok(n) => n.to_string(),
            Err(_) => part.to_string(),
        })
        .collect();
    normalized.join("-").into_bytes()
}

/// Charset names this crate can actually transcode text with, in their
/// normalized form (spec §4.4 "the first offered charset that the
/// runtime can decode"). Kept small and explicit rather than backed by
/// a full codec registry, since general text transcoding is out of
/// scope; `Writer::write_text` treats UTF-8 as a pass-through and every
/// other name here as a single-byte ASCII-range encoding.
const DECODABLE_CHARSETS: &[&str] = &[
    "ascii",
    "us-ascii",
    "utf-8",
    "iso-8859-1",
    "iso-8859-2",
    "iso-8859-3",
    "iso-8859-4",
    "iso-8859-5",
    "iso-8859-6",
    "iso-8859-7",
    "iso-8859-8",
    "iso-8859-9",
    "iso-8859-10",
    "iso-8859-11",
    "iso-8859-13",
    "iso-8859-14",
    "iso-8859-15",
    "iso-8859-16",
];

fn is_decodable(normalized: &[u8]) -> bool {
    DECODABLE_CHARSETS.contains(&String::from_utf8_lossy(normalized).as_ref())
}

/// Picks the charset CHARSET negotiation should accept (spec §4.4):
/// the first offered name the runtime can decode, unless `preferred`
/// matches one of the offered names, in which case it wins outright.
/// Returns `None` when nothing offered is decodable, meaning the
/// caller should reply REJECTED.
pub fn select_charset(offered: &[Bytes], preferred: Option<&[u8]>) -> Option<Bytes> {
    let preferred_normalized = preferred.map(normalize_charset_name);
    let mut fallback: Option<Bytes> = None;

    for name in offered {
        let normalized = normalize_charset_name(name);
        if !is_decodable(&normalized) {
            continue;
        }
        if preferred_normalized.as_deref() == Some(normalized.as_slice()) {
            return Some(name.clone());
        }
        if fallback.is_none() {
            fallback = Some(name.clone());
        }
    }

    fallback
}

/// Decodes a fully-unescaped sub-negotiation body (spec §4.4: "All SB
/// payloads are IAC-unescaped by the parser before delivery") against
/// the option it arrived under.
pub fn decode(option: TelnetOption, body: &[u8]) -> SubnegotiationType {
    use crate::constants::{
        CHARSET_ACCEPTED, CHARSET_REJECTED, CHARSET_REQUEST, CHARSET_TTABLE_REJECTED, TSPEED_IS,
        TSPEED_SEND, TTYPE_IS, TTYPE_SEND, XDISPLOC_IS, XDISPLOC_SEND,
    };

    match option {
        TelnetOption::Naws if body.len() >= 4 => SubnegotiationType::WindowSize(
            u16::from_be_bytes([body[0], body[1]]),
            u16::from_be_bytes([body[2], body[3]]),
        ),
        TelnetOption::TerminalType => match body.first() {
            Some(&TTYPE_SEND) => SubnegotiationType::TerminalTypeSend,
            Some(&TTYPE_IS) => SubnegotiationType::TerminalTypeIs(Bytes::copy_from_slice(&body[1..])),
            _ => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
        },
        TelnetOption::TerminalSpeed => match body.first() {
            Some(&TSPEED_SEND) => SubnegotiationType::TerminalSpeedSend,
            Some(&TSPEED_IS) => {
                let text = String::from_utf8_lossy(&body[1..]);
                let mut parts = text.splitn(2, ',');
                let tx = parts.next().and_then(|s| s.parse().ok()).unwrap_or(0);
                let rx = parts.next().and_then(|s| s.parse().ok()).unwrap_or(tx);
                SubnegotiationType::TerminalSpeedIs(tx, rx)
            }
            _ => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
        },
        TelnetOption::XDisplayLocation => match body.first() {
            Some(&XDISPLOC_SEND) => SubnegotiationType::XDisplayLocationSend,
            Some(&XDISPLOC_IS) => {
                SubnegotiationType::XDisplayLocationIs(Bytes::copy_from_slice(&body[1..]))
            }
            _ => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
        },
        TelnetOption::SendLocation => {
            SubnegotiationType::SendLocationIs(Bytes::copy_from_slice(body.get(1..).unwrap_or(&[])))
        }
        TelnetOption::RemoteFlowControl => {
            SubnegotiationType::RemoteFlowControl(body.first().copied().unwrap_or(0).into())
        }
        TelnetOption::Charset => match body.first() {
            Some(&CHARSET_REQUEST) => {
                let sep = body.get(1).copied().unwrap_or(b';');
                let names = body[2..]
                    .split(|&b| b == sep)
                    .filter(|s| !s.is_empty())
                    .map(Bytes::copy_from_slice)
                    .collect();
                SubnegotiationType::CharsetRequest(names)
            }
            Some(&CHARSET_ACCEPTED) => {
                SubnegotiationType::CharsetAccepted(Bytes::copy_from_slice(&body[1..]))
            }
            Some(&CHARSET_REJECTED) => SubnegotiationType::CharsetRejected,
            Some(&CHARSET_TTABLE_REJECTED) => SubnegotiationType::CharsetTTableRejected,
            _ => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
        },
        TelnetOption::NewEnviron => match crate::env::decode_environment(body) {
            Some(op) => SubnegotiationType::Environment(op),
            None => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
        },
        TelnetOption::Linemode => {
            let sub = body.first().copied().unwrap_or(0);
            let option_kind = LineModeOption::from(sub);
            let decoded = match option_kind {
                LineModeOption::Mode(_) => {
                    LineModeOption::Mode(body.get(1).copied().unwrap_or(0))
                }
                LineModeOption::SLC(_) => {
                    let triples = body[1..]
                        .chunks_exact(3)
                        .map(|chunk| (Dispatch::from((chunk[0], chunk[1])), chunk[2] as char))
                        .collect();
                    LineModeOption::SLC(triples)
                }
                LineModeOption::ForwardMask(_) => {
                    let mask = body.get(2..).unwrap_or(&[]).to_vec();
                    let forward_mask = crate::linemode::ForwardMask::new(mask);
                    if body.get(1).is_some() {
                        LineModeOption::ForwardMask(ForwardMaskOption::Do(forward_mask))
                    } else {
                        LineModeOption::ForwardMask(ForwardMaskOption::Unknown(sub))
                    }
                }
                LineModeOption::Unknown(_, _) => {
                    LineModeOption::Unknown(sub, Bytes::copy_from_slice(body.get(1..).unwrap_or(&[])))
                }
            };
            SubnegotiationType::LineMode(decoded)
        }
        _ => SubnegotiationType::Unknown(option, Bytes::copy_from_slice(body)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_names_normalize_equal_ignoring_zero_padding_and_case() {
        assert_eq!(
            normalize_charset_name(b"ISO-8859-02"),
            normalize_charset_name(b"iso-8859-2")
        );
    }

    #[test]
    fn select_charset_prefers_the_configured_charset_over_the_first_offered() {
        let offered = vec![Bytes::from_static(b"ASCII"), Bytes::from_static(b"UTF-8")];
        let chosen = select_charset(&offered, Some(b"utf-8"));
        assert_eq!(chosen, Some(Bytes::from_static(b"UTF-8")));
    }

    #[test]
    fn select_charset_falls_back_to_first_decodable_offer_without_a_preference() {
        let offered = vec![Bytes::from_static(b"KOI8-R"), Bytes::from_static(b"ASCII")];
        let chosen = select_charset(&offered, None);
        assert_eq!(chosen, Some(Bytes::from_static(b"ASCII")));
    }

    #[test]
    fn select_charset_rejects_when_nothing_offered_is_decodable() {
        let offered = vec![Bytes::from_static(b"KOI8-R")];
        assert_eq!(select_charset(&offered, None), None);
    }

    #[test]
    fn lflow_mode_round_trips() {
        for mode in [
            LflowMode::Off,
            LflowMode::On,
            LflowMode::RestartAny,
            LflowMode::RestartXon,
        ] {
            let byte: u8 = mode.into();
            assert_eq!(LflowMode::from(byte), mode);
        }
    }

    #[test]
    fn terminal_type_is_len_includes_the_sub_option_byte() {
        let sub = SubnegotiationType::TerminalTypeIs(Bytes::from_static(b"ansi"));
        assert_eq!(sub.len(), 5);
    }

    #[test]
    fn decodes_naws_window_132x43() {
        let body = [0x00, 0x84, 0x00, 0x2b];
        assert_eq!(
            decode(TelnetOption::Naws, &body),
            SubnegotiationType::WindowSize(132, 43)
        );
    }

    #[test]
    fn decodes_ttype_is_xterm() {
        let mut body = vec![0u8];
        body.extend_from_slice(b"xterm");
        assert_eq!(
            decode(TelnetOption::TerminalType, &body),
            SubnegotiationType::TerminalTypeIs(Bytes::from_static(b"xterm"))
        );
    }

    #[test]
    fn decodes_ttype_send() {
        assert_eq!(
            decode(TelnetOption::TerminalType, &[1]),
            SubnegotiationType::TerminalTypeSend
        );
    }

    #[test]
    fn decodes_charset_request_with_semicolon_separator() {
        let mut body = vec![1u8, b';'];
        body.extend_from_slice(b"utf-8;ascii");
        let decoded = decode(TelnetOption::Charset, &body);
        assert_eq!(
            decoded,
            SubnegotiationType::CharsetRequest(vec![
                Bytes::from_static(b"utf-8"),
                Bytes::from_static(b"ascii"),
            ])
        );
    }
}
