use crate::constants::{
    BINARY, CHARSET, ECHO, ENVIRON, GMCP, LINEMODE, MCCP2, MSP, MSSP, MXP, NAWS,
    REMOTE_FLOW_CONTROL, SGA, SNDLOC, STATUS, TELOPT_EOR, TIMING_MARK, TSPEED, TTYPE, XDISPLOC,
};

/// Represents all Telnet options this crate negotiates or recognizes by
/// name. Unrecognized option bytes round-trip through `Unknown` so the
/// negotiation layer can still refuse them by code (spec §4.2: "An
/// unknown/unsupported option MUST be refused").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TelnetOption {
    /// RFC 856 — Binary Transmission.
    Binary,
    /// Echo a message back to the other side.
    Echo,
    /// RFC 858 — Suppress Go Ahead. Must be set on both sides independently.
    ///
    /// This is used in half-duplex connections, where the sender and
    /// receiver cannot send data at the same time; enabling it on both
    /// sides turns off the half-duplex line-turnaround signal (the `GA`
    /// command, which is not itself a negotiable option).
    SuppressGoAhead,
    /// RFC 859 — Status.
    Status,
    /// RFC 860 — Timing Mark.
    TimingMark,
    /// RFC 1091 — Terminal Type.
    TerminalType,
    /// Indicates how EOR (End Of Record) is handled between a sender and
    /// receiver. Like SuppressGoAhead, this must be set on both sides
    /// independently.
    EndOfRecord,
    /// RFC 1073 — Negotiate About Window Size.
    Naws,
    /// RFC 1079 — Terminal Speed.
    TerminalSpeed,
    /// RFC 1372 — Remote Flow Control.
    RemoteFlowControl,
    /// RFC 1184 — Line Mode.
    Linemode,
    /// RFC 1096 — X Display Location.
    XDisplayLocation,
    /// MUD extension — Send Location.
    SendLocation,
    /// RFC 1572 — New Environment.
    NewEnviron,
    /// RFC 2066 — Charset.
    Charset,
    MCCP2,
    GMCP,
    MSSP,
    MSP,
    MXP,
    /// A generic marker for options this crate does not negotiate by name.
    /// The negotiation policy refuses these by default (spec §4.2).
    Unknown(u8),
}

impl From<u8> for TelnetOption {
    fn from(byte: u8) -> Self {
        match byte {
            BINARY => TelnetOption::Binary,
            ECHO => TelnetOption::Echo,
            SGA => TelnetOption::SuppressGoAhead,
            STATUS => TelnetOption::Status,
            TIMING_MARK => TelnetOption::TimingMark,
            TTYPE => TelnetOption::TerminalType,
            TELOPT_EOR => TelnetOption::EndOfRecord,
            NAWS => TelnetOption::Naws,
            TSPEED => TelnetOption::TerminalSpeed,
            REMOTE_FLOW_CONTROL => TelnetOption::RemoteFlowControl,
            LINEMODE => TelnetOption::Linemode,
            XDISPLOC => TelnetOption::XDisplayLocation,
            SNDLOC => TelnetOption::SendLocation,
            ENVIRON => TelnetOption::NewEnviron,
            CHARSET => TelnetOption::Charset,
            MCCP2 => TelnetOption::MCCP2,
            GMCP => TelnetOption::GMCP,
            MSSP => TelnetOption::MSSP,
            MSP => TelnetOption::MSP,
            MXP => TelnetOption::MXP,
            _ => TelnetOption::Unknown(byte),
        }
    }
}

impl From<TelnetOption> for u8 {
    fn from(option: TelnetOption) -> Self {
        match option {
            TelnetOption::Binary => BINARY,
            TelnetOption::Echo => ECHO,
            TelnetOption::SuppressGoAhead => SGA,
            TelnetOption::Status => STATUS,
            TelnetOption::TimingMark => TIMING_MARK,
            TelnetOption::TerminalType => TTYPE,
            TelnetOption::EndOfRecord => TELOPT_EOR,
            TelnetOption::Naws => NAWS,
            TelnetOption::TerminalSpeed => TSPEED,
            TelnetOption::RemoteFlowControl => REMOTE_FLOW_CONTROL,
            TelnetOption::Linemode => LINEMODE,
            TelnetOption::XDisplayLocation => XDISPLOC,
            TelnetOption::SendLocation => SNDLOC,
            TelnetOption::NewEnviron => ENVIRON,
            TelnetOption::Charset => CHARSET,
            TelnetOption::MCCP2 => MCCP2,
            TelnetOption::GMCP => GMCP,
            TelnetOption::MSSP => MSSP,
            TelnetOption::MSP => MSP,
            TelnetOption::MXP => MXP,
            TelnetOption::Unknown(byte) => byte,
        }
    }
}

impl TelnetOption {
    /// Case-insensitive lookup by symbolic name (spec §6 "Exposed option
    /// names"), used by `wait_for` predicates and configuration.
    pub fn by_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_uppercase().as_str() {
            "BINARY" => TelnetOption::Binary,
            "ECHO" => TelnetOption::Echo,
            "SGA" => TelnetOption::SuppressGoAhead,
            "STATUS" => TelnetOption::Status,
            "TM" => TelnetOption::TimingMark,
            "EOR" => TelnetOption::EndOfRecord,
            "TTYPE" => TelnetOption::TerminalType,
            "TSPEED" => TelnetOption::TerminalSpeed,
            "LFLOW" => TelnetOption::RemoteFlowControl,
            "XDISPLOC" => TelnetOption::XDisplayLocation,
            "NAWS" => TelnetOption::Naws,
            "NEW_ENVIRON" => TelnetOption::NewEnviron,
            "CHARSET" => TelnetOption::Charset,
            "LINEMODE" => TelnetOption::Linemode,
            "SNDLOC" => TelnetOption::SendLocation,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_known_options() {
        for opt in [
            TelnetOption::Binary,
            TelnetOption::Echo,
            TelnetOption::SuppressGoAhead,
            TelnetOption::TerminalType,
            TelnetOption::Naws,
            TelnetOption::Linemode,
            TelnetOption::Charset,
        ] {
            let byte: u8 = opt.into();
            assert_eq!(TelnetOption::from(byte), opt);
        }
    }

    #[test]
    fn unknown_option_round_trips_by_code() {
        assert_eq!(TelnetOption::from(0x63), TelnetOption::Unknown(0x63));
        assert_eq!(u8::from(TelnetOption::Unknown(0x63)), 0x63);
    }

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(TelnetOption::by_name("naws"), Some(TelnetOption::Naws));
        assert_eq!(TelnetOption::by_name("NAWS"), Some(TelnetOption::Naws));
        assert_eq!(TelnetOption::by_name("bogus"), None);
    }
}
