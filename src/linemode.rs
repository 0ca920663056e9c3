use crate::constants::{
    SLC_ABORT, SLC_ABORTC, SLC_ACK, SLC_AO, SLC_AYT, SLC_BRK, SLC_BRKC, SLC_DISABLED, SLC_DSUSPC,
    SLC_EC, SLC_EL, SLC_EOF, SLC_EOFCHAR, SLC_EOR, SLC_EORC, SLC_EW, SLC_EXIT, SLC_FLUSHIN,
    SLC_FLUSHOUT, SLC_FORW1, SLC_FORW2, SLC_IP, SLC_LEVELBITS, SLC_LNEXT, SLC_LP, SLC_MCL,
    SLC_MCR, SLC_MCUB, SLC_MCUF, SLC_MCWL, SLC_MCWR, SLC_REPRINT, SLC_RP, SLC_SUSP, SLC_SUSPC,
    SLC_SUSPCHAR, SLC_SYNCH, SLC_XOFF, SLC_XOFFC, SLC_XON, SLC_XONC,
};

/// Represents the support level of Telnet's Special Linemode Characters (SLC).
/// This enum categorizes the possible states or capabilities associated with
/// a specific SLC function, reflecting its configurability and support status.
#[derive(Debug, PartialEq, Copy, Clone, Eq)]
pub enum Level {
    /// Indicates that the Telnet client or server does not support the specific SLC function.
    /// This level is used for SLC functions that are unrecognized or cannot be implemented.
    NoSupport,

    /// Signifies that the SLC function's current setting or value cannot be changed.
    /// This is typically used for essential SLC functions or those where changeability
    /// might result in undesired behavior or operation inconsistencies.
    CantChange,

    /// Denotes that the SLC function has a specific, assignable value that is not the default.
    /// This level is employed when a particular SLC function is set to a custom value,
    /// distinct from its standard or default setting.
    Value,

    /// Represents the default state or action for an SLC function, implying standard behavior.
    /// This level is selected when an SLC function is intended to operate according to
    /// its predefined or most common configuration.
    Default,
}

impl From<u8> for Level {
    fn from(value: u8) -> Self {
        match value & SLC_LEVELBITS {
            0 => Level::NoSupport,
            1 => Level::CantChange,
            2 => Level::Value,
            3 => Level::Default,
            _ => unreachable!("Level value out of range"), // Since we're masking with SLC_LEVELBITS, this should never happen
        }
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        match level {
            Level::NoSupport => 0,
            Level::CantChange => 1,
            Level::Value => 2,
            Level::Default => 3,
        }
    }
}

/// Represents a mapping between a Telnet Special Linemode Character (SLC) function
/// and its associated modifiers. This struct is used to define the behavior and
/// properties of specific SLC functions within a Telnet session, enabling detailed
/// control over their implementation and usage.
#[derive(Debug, PartialEq, Copy, Clone, Eq)]
pub struct Dispatch {
    /// The SLC function being dispatched.
    pub function: SlcFunction,

    /// The set of modifiers associated with the SLC function.
    pub modifiers: Modifiers,
}

impl From<(u8, u8)> for Dispatch {
    fn from((function, modifiers): (u8, u8)) -> Self {
        Self {
            function: function.into(),
            modifiers: modifiers.into(),
        }
    }
}

impl From<Dispatch> for (u8, u8) {
    fn from(dispatch: Dispatch) -> Self {
        (dispatch.function.into(), dispatch.modifiers.into())
    }
}

/// Encapsulates the modifiers associated with a Telnet SLC function, including its
/// support level and additional operational flags.
#[derive(Debug, PartialEq, Copy, Clone, Eq)]
pub struct Modifiers {
    pub level: Level,
    pub ack: bool,
    pub flush_in: bool,
    pub flush_out: bool,
}

impl From<u8> for Modifiers {
    fn from(value: u8) -> Self {
        Modifiers {
            level: Level::from(value),
            ack: value & SLC_ACK != 0,
            flush_in: value & SLC_FLUSHIN != 0,
            flush_out: value & SLC_FLUSHOUT != 0,
        }
    }
}

impl From<Modifiers> for u8 {
    fn from(modifiers: Modifiers) -> Self {
        let mut value: u8 = modifiers.level.into();
        if modifiers.ack {
            value |= SLC_ACK;
        }
        if modifiers.flush_in {
            value |= SLC_FLUSHIN;
        }
        if modifiers.flush_out {
            value |= SLC_FLUSHOUT;
        }
        value
    }
}

impl Modifiers {
    pub fn no_support() -> Self {
        Modifiers {
            level: Level::NoSupport,
            ack: false,
            flush_in: false,
            flush_out: false,
        }
    }
}

/// Represents the Special Line Mode (SLC) functions in the Telnet protocol.
/// Each variant of this enum corresponds to a specific control function that
/// can be used within a Telnet session to control aspects like data flow, signal
/// transmission, and other auxiliary functions.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SlcFunction {
    /// Synchronization: Used to indicate an urgent data stream in Telnet communications.
    Synch,
    /// Break: Indicates a break or interruption in the data stream.
    Brk,
    /// Interrupt Process: Allows the user to interrupt the process at the other end.
    Ip,
    /// Abort Output: Used to clear the data remaining in the output buffer.
    Ao,
    /// Are You There: Sends a signal to check if the system at the other end is still responsive.
    Ayt,
    /// End of Record: Marks the end of a record in the data stream.
    Eor,
    /// Abort: Used to signal an abort action.
    Abort,
    /// End of File: Indicates the end of a file transmission.
    Eof,
    /// Suspend: Temporarily suspends the process at the other end.
    Susp,
    /// Erase Character: Used to erase the last character in the current line.
    Ec,
    /// Erase Line: Clears the entire current line.
    El,
    /// Erase Word: Erases the last word in the current line.
    Ew,
    /// Reprint Line: Reprints the current line.
    Rp,
    /// Literal Next: Indicates the next character should be treated as literal input.
    Lnext,
    /// Resume Transmission: Signals to resume the data transmission if it was paused.
    Xon,
    /// Pause Transmission: Instructs to pause the data transmission.
    Xoff,
    /// Forward Character: the first of two FORWARDMASK-gated forwarding functions.
    Forw1,
    /// Forward Line: the second of two FORWARDMASK-gated forwarding functions.
    Forw2,
    Mcl,
    Mcr,
    Mcwl,
    Mcwr,
    Mcub,
    Mcuf,
    /// Local Print: Triggers the local print function.
    Lp,
    /// XON Character: The character used to resume transmission.
    Xonc,
    /// XOFF Character: The character used to pause transmission.
    Xoffc,
    /// Exit: Used to signal an exit action.
    Exit,
    /// Suspend Current: Suspends the current process.
    Suspc,
    /// Delayed Suspend: Suspends the current process with a delay.
    Dsuspc,
    /// Reprint: Reprints the entire current line.
    Reprint,
    /// Abort Current: Aborts the current process.
    Abortc,
    /// EOF Character: The character signifying the end of a file.
    Eofchar,
    /// Suspend Character: The character used to signal a suspend action.
    Suspchar,
    /// Break Character: The character used to signal a break condition.
    Brkc,
    /// EOR Character: The character indicating the end of a record.
    Eorc,
    /// Any SLC function code not predefined in this enum.
    Unknown(u8),
}

impl From<u8> for SlcFunction {
    fn from(value: u8) -> Self {
        match value {
            SLC_SYNCH => SlcFunction::Synch,
            SLC_BRK => SlcFunction::Brk,
            SLC_IP => SlcFunction::Ip,
            SLC_AO => SlcFunction::Ao,
            SLC_AYT => SlcFunction::Ayt,
            SLC_EOR => SlcFunction::Eor,
            SLC_ABORT => SlcFunction::Abort,
            SLC_EOF => SlcFunction::Eof,
            SLC_SUSP => SlcFunction::Susp,
            SLC_EC => SlcFunction::Ec,
            SLC_EL => SlcFunction::El,
            SLC_EW => SlcFunction::Ew,
            SLC_RP => SlcFunction::Rp,
            SLC_LNEXT => SlcFunction::Lnext,
            SLC_XON => SlcFunction::Xon,
            SLC_XOFF => SlcFunction::Xoff,
            SLC_FORW1 => SlcFunction::Forw1,
            SLC_FORW2 => SlcFunction::Forw2,
            SLC_MCL => SlcFunction::Mcl,
            SLC_MCR => SlcFunction::Mcr,
            SLC_MCWL => SlcFunction::Mcwl,
            SLC_MCWR => SlcFunction::Mcwr,
            SLC_MCUB => SlcFunction::Mcub,
            SLC_MCUF => SlcFunction::Mcuf,
            SLC_LP => SlcFunction::Lp,
            SLC_XONC => SlcFunction::Xonc,
            SLC_XOFFC => SlcFunction::Xoffc,
            SLC_EXIT => SlcFunction::Exit,
            SLC_SUSPC => SlcFunction::Suspc,
            SLC_DSUSPC => SlcFunction::Dsuspc,
            SLC_REPRINT => SlcFunction::Reprint,
            SLC_ABORTC => SlcFunction::Abortc,
            SLC_EOFCHAR => SlcFunction::Eofchar,
            SLC_SUSPCHAR => SlcFunction::Suspchar,
            SLC_BRKC => SlcFunction::Brkc,
            SLC_EORC => SlcFunction::Eorc,
            _ => SlcFunction::Unknown(value),
        }
    }
}

impl From<SlcFunction> for u8 {
    fn from(function: SlcFunction) -> Self {
        match function {
            SlcFunction::Synch => SLC_SYNCH,
            SlcFunction::Brk => SLC_BRK,
            SlcFunction::Ip => SLC_IP,
            SlcFunction::Ao => SLC_AO,
            SlcFunction::Ayt => SLC_AYT,
            SlcFunction::Eor => SLC_EOR,
            SlcFunction::Abort => SLC_ABORT,
            SlcFunction::Eof => SLC_EOF,
            SlcFunction::Susp => SLC_SUSP,
            SlcFunction::Ec => SLC_EC,
            SlcFunction::El => SLC_EL,
            SlcFunction::Ew => SLC_EW,
            SlcFunction::Rp => SLC_RP,
            SlcFunction::Lnext => SLC_LNEXT,
            SlcFunction::Xon => SLC_XON,
            SlcFunction::Xoff => SLC_XOFF,
            SlcFunction::Forw1 => SLC_FORW1,
            SlcFunction::Forw2 => SLC_FORW2,
            SlcFunction::Mcl => SLC_MCL,
            SlcFunction::Mcr => SLC_MCR,
            SlcFunction::Mcwl => SLC_MCWL,
            SlcFunction::Mcwr => SLC_MCWR,
            SlcFunction::Mcub => SLC_MCUB,
            SlcFunction::Mcuf => SLC_MCUF,
            SlcFunction::Lp => SLC_LP,
            SlcFunction::Xonc => SLC_XONC,
            SlcFunction::Xoffc => SLC_XOFFC,
            SlcFunction::Exit => SLC_EXIT,
            SlcFunction::Suspc => SLC_SUSPC,
            SlcFunction::Dsuspc => SLC_DSUSPC,
            SlcFunction::Reprint => SLC_REPRINT,
            SlcFunction::Abortc => SLC_ABORTC,
            SlcFunction::Eofchar => SLC_EOFCHAR,
            SlcFunction::Suspchar => SLC_SUSPCHAR,
            SlcFunction::Brkc => SLC_BRKC,
            SlcFunction::Eorc => SLC_EORC,
            SlcFunction::Unknown(value) => value,
        }
    }
}

/// A single SLC negotiation triple: function, modifiers/level, and the
/// character value bound to it (spec §3 "SLC entry").
#[derive(Debug, PartialEq, Copy, Clone, Eq)]
pub struct SlcEntry {
    pub function: SlcFunction,
    pub modifiers: Modifiers,
    pub value: u8,
}

impl SlcEntry {
    fn new(function: SlcFunction, level: Level, value: u8) -> Self {
        SlcEntry {
            function,
            modifiers: Modifiers {
                level,
                ack: false,
                flush_in: false,
                flush_out: false,
            },
            value: if level == Level::NoSupport { 0 } else { value },
        }
    }

    fn with_flags(function: SlcFunction, value: u8, flush_in: bool, flush_out: bool) -> Self {
        SlcEntry {
            function,
            modifiers: Modifiers {
                level: Level::Value,
                ack: false,
                flush_in,
                flush_out,
            },
            value,
        }
    }
}

/// The set of SLC entries offered or acknowledged in a LINEMODE SLC
/// sub-negotiation (spec §4.5). Two named presets are grounded on
/// telnetlib3's `slc.py`: `solicit_all` mirrors `DEFAULT_SLC_TAB` (every
/// function marked DEFAULT, soliciting values from the peer), and
/// `bsd_defaults` mirrors `BSD_SLC_TAB` (the usual BSD tty bindings).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlcTable {
    pub entries: Vec<SlcEntry>,
}

impl SlcTable {
    /// Every negotiable function set to `Default`, soliciting the peer's
    /// preferred binding. FORW1/FORW2 remain unsupported and disabled,
    /// matching `DEFAULT_SLC_TAB` in the original implementation.
    pub fn solicit_all() -> Self {
        let defaultable = [
            SlcFunction::Eof,
            SlcFunction::Ec,
            SlcFunction::El,
            SlcFunction::Ip,
            SlcFunction::Abort,
            SlcFunction::Xon,
            SlcFunction::Xoff,
            SlcFunction::Ew,
            SlcFunction::Rp,
            SlcFunction::Lnext,
            SlcFunction::Ao,
            SlcFunction::Susp,
            SlcFunction::Ayt,
            SlcFunction::Brk,
            SlcFunction::Synch,
            SlcFunction::Eor,
        ];

        let mut entries: Vec<SlcEntry> = defaultable
            .into_iter()
            .map(|function| SlcEntry::new(function, Level::Default, 0))
            .collect();

        entries.push(SlcEntry::new(SlcFunction::Forw1, Level::NoSupport, SLC_DISABLED));
        entries.push(SlcEntry::new(SlcFunction::Forw2, Level::NoSupport, SLC_DISABLED));

        SlcTable { entries }
    }

    /// The classic BSD `ttydefaults.h` bindings, matching `BSD_SLC_TAB`:
    /// `^D` EOF, `^?` erase, `^U` kill, `^C` intr (flush both ways), `^\`
    /// quit (flush both ways), `^Q`/`^S` flow control, `^W` erase-word,
    /// `^R` reprint, `^V` literal-next, `^O` discard (flush output), `^Z`
    /// suspend (flush input), `^T` status. BRK/SYNCH/EOR are left at their
    /// solicited defaults, as in the original.
    pub fn bsd_defaults() -> Self {
        let mut entries = vec![
            SlcEntry::with_flags(SlcFunction::Eof, 0x04, false, false),
            SlcEntry::with_flags(SlcFunction::Ec, 0x7f, false, false),
            SlcEntry::with_flags(SlcFunction::El, 0x15, false, false),
            SlcEntry::with_flags(SlcFunction::Ip, 0x03, true, true),
            SlcEntry::with_flags(SlcFunction::Abort, 0x1c, true, true),
            SlcEntry::with_flags(SlcFunction::Xon, 0x11, false, false),
            SlcEntry::with_flags(SlcFunction::Xoff, 0x13, false, false),
            SlcEntry::with_flags(SlcFunction::Ew, 0x17, false, false),
            SlcEntry::with_flags(SlcFunction::Rp, 0x12, false, false),
            SlcEntry::with_flags(SlcFunction::Lnext, 0x16, false, false),
            SlcEntry::with_flags(SlcFunction::Ao, 0x0f, false, true),
            SlcEntry::with_flags(SlcFunction::Susp, 0x1a, true, false),
            SlcEntry::new(SlcFunction::Ayt, Level::Value, 0x14),
            SlcEntry::new(SlcFunction::Brk, Level::Default, 0),
            SlcEntry::new(SlcFunction::Synch, Level::Default, 0),
            SlcEntry::new(SlcFunction::Eor, Level::Default, 0),
        ];

        entries.push(SlcEntry::new(SlcFunction::Forw1, Level::NoSupport, SLC_DISABLED));
        entries.push(SlcEntry::new(SlcFunction::Forw2, Level::NoSupport, SLC_DISABLED));

        SlcTable { entries }
    }

    pub fn get(&self, function: SlcFunction) -> Option<&SlcEntry> {
        self.entries.iter().find(|entry| entry.function == function)
    }

    /// Encodes the table as the flat byte sequence of a LINEMODE SLC
    /// sub-negotiation body (three bytes per entry: function, modifiers,
    /// value).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.entries.len() * 3);
        for entry in &self.entries {
            out.push(entry.function.into());
            out.push(entry.modifiers.into());
            out.push(entry.value);
        }
        out
    }
}

impl Default for SlcTable {
    fn default() -> Self {
        SlcTable { entries: unsupported_table() }
    }
}

fn unsupported_table() -> Vec<SlcEntry> {
    SLC_FUNCTION_UNIVERSE
        .iter()
        .map(|&function| SlcEntry::new(function, Level::NoSupport, 0))
        .collect()
}

const SLC_FUNCTION_UNIVERSE: [SlcFunction; 34] = [
    SlcFunction::Synch,
    SlcFunction::Brk,
    SlcFunction::Ip,
    SlcFunction::Ao,
    SlcFunction::Ayt,
    SlcFunction::Eor,
    SlcFunction::Abort,
    SlcFunction::Eof,
    SlcFunction::Susp,
    SlcFunction::Ec,
    SlcFunction::El,
    SlcFunction::Ew,
    SlcFunction::Rp,
    SlcFunction::Lnext,
    SlcFunction::Xon,
    SlcFunction::Xoff,
    SlcFunction::Forw1,
    SlcFunction::Forw2,
    SlcFunction::Mcl,
    SlcFunction::Mcr,
    SlcFunction::Mcwl,
    SlcFunction::Mcwr,
    SlcFunction::Mcub,
    SlcFunction::Mcuf,
    SlcFunction::Lp,
    SlcFunction::Xonc,
    SlcFunction::Xoffc,
    SlcFunction::Exit,
    SlcFunction::Suspc,
    SlcFunction::Dsuspc,
    SlcFunction::Reprint,
    SlcFunction::Abortc,
    SlcFunction::Eofchar,
    SlcFunction::Suspchar,
];

/// A LINEMODE FORWARDMASK: a 16- or 32-byte bitset naming which control
/// characters the remote side should forward immediately rather than
/// buffer for local editing (spec §4.5, RFC 1184 §3.2.3). Bit `k` lives
/// at byte `k / 8`, bit position `7 - (k % 8)` (MSB first).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ForwardMask {
    pub mask: Vec<u8>,
}

impl ForwardMask {
    pub fn new(mask: Vec<u8>) -> Self {
        ForwardMask { mask }
    }

    /// All bits clear: nothing is forwarded.
    pub fn empty(len: usize) -> Self {
        ForwardMask { mask: vec![0u8; len] }
    }

    pub fn contains(&self, code: u8) -> bool {
        let byte = code as usize / 8;
        let bit = 7 - (code as usize % 8);
        self.mask
            .get(byte)
            .map(|b| b & (1 << bit) != 0)
            .unwrap_or(false)
    }

    pub fn set(&mut self, code: u8) {
        let byte = code as usize / 8;
        let bit = 7 - (code as usize % 8);
        if byte < self.mask.len() {
            self.mask[byte] |= 1 << bit;
        }
    }
}

/// The LINEMODE FORWARDMASK sub-negotiation payload (spec §4.5).
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ForwardMaskOption {
    /// `DO FORWARDMASK <mask>` — the sender requires the receiver to
    /// adopt this exact mask.
    Do(ForwardMask),
    /// `WILL FORWARDMASK <mask>` — the sender is announcing the mask it
    /// will itself use.
    Will(ForwardMask),
    /// A FORWARDMASK sub-option byte this crate does not assign meaning
    /// to; `u8` is the sub-option byte observed.
    Unknown(u8),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{SLC_ACK, SLC_FLUSHIN};

    #[test]
    fn test_parse_slc_function() {
        let input = SLC_SYNCH;
        let expected = SlcFunction::Synch;
        let result = SlcFunction::from(input);
        assert_eq!(result, expected, "Failed to parse SLC_SYNCH into SlcFunction::Synch");
    }

    #[test]
    fn test_modifiers_from_byte() {
        let input = SLC_ACK | SLC_FLUSHIN;
        let result = Modifiers::from(input);
        assert!(result.ack && result.flush_in, "Modifiers did not correctly interpret ACK and FLUSHIN flags");
    }

    #[test]
    fn solicit_all_defaults_every_function_but_forwarding() {
        let table = SlcTable::solicit_all();
        let eof = table.get(SlcFunction::Eof).unwrap();
        assert_eq!(eof.modifiers.level, Level::Default);
        let forw1 = table.get(SlcFunction::Forw1).unwrap();
        assert_eq!(forw1.modifiers.level, Level::NoSupport);
        assert_eq!(forw1.value, SLC_DISABLED);
    }

    #[test]
    fn bsd_defaults_bind_interrupt_to_ctrl_c_with_flush_flags() {
        let table = SlcTable::bsd_defaults();
        let ip = table.get(SlcFunction::Ip).unwrap();
        assert_eq!(ip.value, 0x03);
        assert!(ip.modifiers.flush_in && ip.modifiers.flush_out);
    }

    #[test]
    fn forward_mask_bit_addressing_is_msb_first() {
        let mut mask = ForwardMask::empty(16);
        mask.set(0x03); // ^C
        assert!(mask.contains(0x03));
        assert!(!mask.contains(0x04));
        assert_eq!(mask.mask[0], 0b0001_0000);
    }

    #[test]
    fn slc_table_to_bytes_is_three_bytes_per_entry() {
        let table = SlcTable::bsd_defaults();
        assert_eq!(table.to_bytes().len(), table.entries.len() * 3);
    }
}
