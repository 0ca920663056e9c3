use crate::{
    constants::{AO, AYT, BRK, DM, DO, DONT, EC, EL, EOR, GA, IP, NOP, SB, WILL, WONT},
    option::TelnetOption,
    subnegotiation::SubnegotiationType,
};

/// Editing/signal events raised by the two-byte IAC commands of spec §4.3,
/// and by their in-band SLC equivalents while kludge line mode is active.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EditingEvent {
    /// Interrupt Process (`IAC IP`, or the SLC `IP` character in kludge mode).
    InterruptProcess,
    /// Abort Output (`IAC AO`, or the SLC `AO` character in kludge mode).
    AbortOutput,
    /// Are You There (`IAC AYT`, or the SLC `AYT` character in kludge mode).
    AreYouThere,
    /// Erase Character (`IAC EC`, or the SLC `EC` character in kludge mode).
    EraseCharacter,
    /// Erase Line (`IAC EL`, or the SLC `EL` character in kludge mode).
    EraseLine,
    /// Break (`IAC BRK`, or the SLC `BRK` character in kludge mode).
    Break,
    /// End of Record (`IAC EOR`), delivered only once TELOPT_EOR is
    /// enabled on both sides (spec §4.3).
    EndOfRecord,
    /// SLC `EOF` character (`^D` by default), kludge mode only. Spec
    /// §4.3's kludge MUST-list; no two-byte IAC form exists for this.
    EndOfFile,
    /// SLC `ABORT` character (`^\` by default), kludge mode only.
    Abort,
    /// SLC `SUSP` character (`^Z` by default), kludge mode only.
    Suspend,
    /// SLC `EW` (erase word) character (`^W` by default), kludge mode only.
    EraseWord,
    /// SLC `RP` (reprint line) character (`^R` by default), kludge mode only.
    ReprintLine,
    /// SLC `LNEXT` (literal next) character (`^V` by default), kludge
    /// mode only.
    LiteralNext,
    /// SLC `XON` character (`^Q` by default), kludge mode only.
    ResumeOutput,
    /// SLC `XOFF` character (`^S` by default), kludge mode only.
    PauseOutput,
}

/// All Telnet events produced by the input parser and negotiation layer
/// (spec §2 data flow).
#[derive(Debug, PartialEq)]
pub enum TelnetEvent {
    /// In-band application data.
    Data(Vec<u8>),
    /// A single raw byte of in-band data, used by the codec while
    /// accumulating a `Data` event one byte at a time.
    Character(u8),
    Do(TelnetOption),
    Will(TelnetOption),
    Dont(TelnetOption),
    Wont(TelnetOption),
    Subnegotiate(SubnegotiationType),
    /// `IAC GA`. Only observed while SGA is not enabled on the sending
    /// side; once both sides enable SGA it is never sent (spec §4.3).
    GoAhead,
    /// `IAC NOP`. Logged at `trace` and otherwise ignored.
    Nop,
    /// `IAC DM`. The Synch data-mark; this crate does not implement
    /// urgent-data Synch processing, so it is surfaced and discarded
    /// (spec §9 Open Questions).
    DataMark,
    /// A two-byte IAC editing/signal command, or its in-band SLC
    /// equivalent while kludge line mode is active.
    Editing(EditingEvent),
}

impl TelnetEvent {
    /// Byte length of this event's payload, excluding the leading `IAC`
    /// framing byte (matches `SubnegotiationType::len`'s convention).
    pub fn len(&self) -> usize {
        match self {
            TelnetEvent::Data(bytes) => bytes.len(),
            TelnetEvent::Character(_) => 1,
            TelnetEvent::Do(_) | TelnetEvent::Will(_) | TelnetEvent::Dont(_) | TelnetEvent::Wont(_) => 2,
            TelnetEvent::Subnegotiate(sb) => sb.len() + 2,
            TelnetEvent::GoAhead | TelnetEvent::Nop | TelnetEvent::DataMark => 1,
            TelnetEvent::Editing(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<TelnetEvent> for u8 {
    fn from(event: TelnetEvent) -> Self {
        match event {
            TelnetEvent::Data(_) | TelnetEvent::Character(_) => 0x00,
            TelnetEvent::Do(_) => DO,
            TelnetEvent::Will(_) => WILL,
            TelnetEvent::Dont(_) => DONT,
            TelnetEvent::Wont(_) => WONT,
            TelnetEvent::Subnegotiate(_) => SB,
            TelnetEvent::GoAhead => GA,
            TelnetEvent::Nop => NOP,
            TelnetEvent::DataMark => DM,
            TelnetEvent::Editing(EditingEvent::InterruptProcess) => IP,
            TelnetEvent::Editing(EditingEvent::AbortOutput) => AO,
            TelnetEvent::Editing(EditingEvent::AreYouThere) => AYT,
            TelnetEvent::Editing(EditingEvent::EraseCharacter) => EC,
            TelnetEvent::Editing(EditingEvent::EraseLine) => EL,
            TelnetEvent::Editing(EditingEvent::Break) => BRK,
            TelnetEvent::Editing(EditingEvent::EndOfRecord) => EOR,
            // Kludge-only SLC events never arrive via the two-byte IAC
            // path (the parser only constructs the seven variants
            // above), so there is no wire byte to report; use the same
            // sentinel as the raw-data variants.
            TelnetEvent::Editing(
                EditingEvent::EndOfFile
                | EditingEvent::Abort
                | EditingEvent::Suspend
                | EditingEvent::EraseWord
                | EditingEvent::ReprintLine
                | EditingEvent::LiteralNext
                | EditingEvent::ResumeOutput
                | EditingEvent::PauseOutput,
            ) => 0x00,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_bytes_round_trip_into_u8() {
        assert_eq!(u8::from(TelnetEvent::GoAhead), GA);
        assert_eq!(u8::from(TelnetEvent::Nop), NOP);
        assert_eq!(u8::from(TelnetEvent::DataMark), DM);
        assert_eq!(
            u8::from(TelnetEvent::Editing(EditingEvent::InterruptProcess)),
            IP
        );
        assert_eq!(u8::from(TelnetEvent::Editing(EditingEvent::Break)), BRK);
        assert_eq!(
            u8::from(TelnetEvent::Editing(EditingEvent::EndOfRecord)),
            EOR
        );
    }

    #[test]
    fn negotiation_events_are_two_bytes() {
        assert_eq!(TelnetEvent::Will(TelnetOption::Echo).len(), 2);
        assert_eq!(TelnetEvent::Dont(TelnetOption::Naws).len(), 2);
    }

    #[test]
    fn data_event_len_matches_buffer() {
        assert_eq!(TelnetEvent::Data(vec![1, 2, 3]).len(), 3);
        assert!(TelnetEvent::Data(Vec::new()).is_empty());
    }
}
