//! RFC 1143 Q-method option-negotiation state machine, plus the policy
//! layer that decides how each option is answered (spec §4.2).

use std::collections::HashMap;

use tracing::debug;

use crate::event::TelnetEvent;
use crate::option::TelnetOption;

/// One option's negotiation state for a single direction (either "do we
/// assert this option ourselves" or "do we want the peer to assert it").
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum QState {
    No,
    Yes,
    WantNo,
    WantYes,
}

/// The one-bit queue RFC 1143 uses to remember a second request that
/// arrived while the first was still outstanding.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Queue {
    Empty,
    Opposite,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Side {
    pub state: QState,
    pub queue: Queue,
}

impl Default for Side {
    fn default() -> Self {
        Side { state: QState::No, queue: Queue::Empty }
    }
}

impl Side {
    pub fn is_enabled(&self) -> bool {
        self.state == QState::Yes
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, QState::No | QState::Yes)
    }
}

/// Per-option negotiation record: `us` tracks whether *we* assert the
/// option (toggled by WILL/WONT we send, confirmed by DO/DONT from the
/// peer); `him` tracks whether the *peer* asserts it (toggled by DO/DONT
/// we send, confirmed by WILL/WONT from the peer). These are
/// independent per spec §4.2 ("enabling BINARY outbound does not imply
/// BINARY inbound").
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct OptionNegotiation {
    pub us: Side,
    pub him: Side,
}

/// Reply to send back to the peer as a result of processing one
/// negotiation event, if any.
pub type Reply = Option<TelnetEvent>;

impl OptionNegotiation {
    /// Peer sent `DO option` — they want us to enable it.
    pub fn recv_do(&mut self, option: TelnetOption, accept: bool) -> Reply {
        let side = &mut self.us;
        match side.state {
            QState::No => {
                if accept {
                    side.state = QState::Yes;
                    Some(TelnetEvent::Will(option))
                } else {
                    Some(TelnetEvent::Wont(option))
                }
            }
            QState::Yes => None,
            QState::WantNo => {
                match side.queue {
                    Queue::Empty => {
                        // Peer answered our WONT with DO: contradictory, treat
                        // as an error and resynchronize to disabled.
                        side.state = QState::No;
                        None
                    }
                    Queue::Opposite => {
                        side.state = QState::Yes;
                        side.queue = Queue::Empty;
                        None
                    }
                }
            }
            QState::WantYes => match side.queue {
                Queue::Empty => {
                    side.state = QState::Yes;
                    None
                }
                Queue::Opposite => {
                    side.state = QState::WantNo;
                    side.queue = Queue::Empty;
                    Some(TelnetEvent::Wont(option))
                }
            },
        }
    }

    /// Peer sent `DONT option` — they want us to disable it.
    pub fn recv_dont(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.us;
        match side.state {
            QState::No => None,
            QState::Yes => {
                side.state = QState::No;
                Some(TelnetEvent::Wont(option))
            }
            QState::WantNo => match side.queue {
                Queue::Empty => {
                    side.state = QState::No;
                    None
                }
                Queue::Opposite => {
                    side.state = QState::WantYes;
                    side.queue = Queue::Empty;
                    Some(TelnetEvent::Will(option))
                }
            },
            QState::WantYes => {
                side.state = QState::No;
                side.queue = Queue::Empty;
                None
            }
        }
    }

    /// Peer sent `WILL option` — they are announcing they will do it.
    pub fn recv_will(&mut self, option: TelnetOption, accept: bool) -> Reply {
        let side = &mut self.him;
        match side.state {
            QState::No => {
                if accept {
                    side.state = QState::Yes;
                    Some(TelnetEvent::Do(option))
                } else {
                    Some(TelnetEvent::Dont(option))
                }
            }
            QState::Yes => None,
            QState::WantNo => match side.queue {
                Queue::Empty => {
                    side.state = QState::No;
                    None
                }
                Queue::Opposite => {
                    side.state = QState::Yes;
                    side.queue = Queue::Empty;
                    None
                }
            },
            QState::WantYes => match side.queue {
                Queue::Empty => {
                    side.state = QState::Yes;
                    None
                }
                Queue::Opposite => {
                    side.state = QState::WantNo;
                    side.queue = Queue::Empty;
                    Some(TelnetEvent::Dont(option))
                }
            },
        }
    }

    /// Peer sent `WONT option` — they refuse or disable it.
    pub fn recv_wont(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.him;
        match side.state {
            QState::No => None,
            QState::Yes => {
                side.state = QState::No;
                Some(TelnetEvent::Dont(option))
            }
            QState::WantNo => match side.queue {
                Queue::Empty => {
                    side.state = QState::No;
                    None
                }
                Queue::Opposite => {
                    side.state = QState::WantYes;
                    side.queue = Queue::Empty;
                    Some(TelnetEvent::Do(option))
                }
            },
            QState::WantYes => {
                side.state = QState::No;
                side.queue = Queue::Empty;
                None
            }
        }
    }

    /// We decide to start asserting the option ourselves: emits WILL if
    /// not already in flight.
    pub fn start_will(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.us;
        match side.state {
            QState::No => {
                side.state = QState::WantYes;
                Some(TelnetEvent::Will(option))
            }
            QState::WantNo if side.queue == Queue::Empty => {
                side.queue = Queue::Opposite;
                None
            }
            _ => None,
        }
    }

    /// We decide to stop asserting the option ourselves: emits WONT if
    /// not already in flight.
    pub fn start_wont(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.us;
        match side.state {
            QState::Yes => {
                side.state = QState::WantNo;
                Some(TelnetEvent::Wont(option))
            }
            QState::WantYes if side.queue == Queue::Empty => {
                side.queue = Queue::Opposite;
                None
            }
            _ => None,
        }
    }

    /// We decide to request the peer enable the option: emits DO if not
    /// already in flight.
    pub fn start_do(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.him;
        match side.state {
            QState::No => {
                side.state = QState::WantYes;
                Some(TelnetEvent::Do(option))
            }
            QState::WantNo if side.queue == Queue::Empty => {
                side.queue = Queue::Opposite;
                None
            }
            _ => None,
        }
    }

    /// We decide to request the peer disable the option: emits DONT if
    /// not already in flight.
    pub fn start_dont(&mut self, option: TelnetOption) -> Reply {
        let side = &mut self.him;
        match side.state {
            QState::Yes => {
                side.state = QState::WantNo;
                Some(TelnetEvent::Dont(option))
            }
            QState::WantYes if side.queue == Queue::Empty => {
                side.queue = Queue::Opposite;
                None
            }
            _ => None,
        }
    }
}

/// Per-option policy predicates (spec §4.2 "Policy layer" and §9
/// "Option tables as data, not inheritance"). A 256-entry table keyed by
/// option byte would work just as well; a `HashMap` keyed by
/// `TelnetOption` is the more idiomatic Rust shape and costs nothing at
/// the scale of a single connection's option set.
pub struct OptionPolicy {
    pub will_accept: fn(TelnetOption) -> bool,
    pub do_accept: fn(TelnetOption) -> bool,
}

impl Default for OptionPolicy {
    fn default() -> Self {
        OptionPolicy {
            will_accept: |opt| !matches!(opt, TelnetOption::Unknown(_)),
            do_accept: |opt| !matches!(opt, TelnetOption::Unknown(_)),
        }
    }
}

/// Owns every option's Q-method state for one connection and applies the
/// policy layer. This is the piece spec §5 calls out as owned
/// exclusively by the connection task.
pub struct Negotiator {
    options: HashMap<TelnetOption, OptionNegotiation>,
    policy: OptionPolicy,
}

impl Negotiator {
    pub fn new(policy: OptionPolicy) -> Self {
        Negotiator { options: HashMap::new(), policy }
    }

    fn entry(&mut self, option: TelnetOption) -> &mut OptionNegotiation {
        self.options.entry(option).or_default()
    }

    pub fn local_enabled(&self, option: TelnetOption) -> bool {
        self.options.get(&option).map(|o| o.us.is_enabled()).unwrap_or(false)
    }

    pub fn remote_enabled(&self, option: TelnetOption) -> bool {
        self.options.get(&option).map(|o| o.him.is_enabled()).unwrap_or(false)
    }

    pub fn pending(&self, option: TelnetOption) -> bool {
        self.options
            .get(&option)
            .map(|o| !o.us.is_settled() || !o.him.is_settled())
            .unwrap_or(false)
    }

    pub fn handle(&mut self, event: &TelnetEvent) -> Reply {
        let reply = match *event {
            TelnetEvent::Do(option) => {
                let accept = (self.policy.will_accept)(option);
                self.entry(option).recv_do(option, accept)
            }
            TelnetEvent::Dont(option) => self.entry(option).recv_dont(option),
            TelnetEvent::Will(option) => {
                let accept = (self.policy.do_accept)(option);
                self.entry(option).recv_will(option, accept)
            }
            TelnetEvent::Wont(option) => self.entry(option).recv_wont(option),
            _ => None,
        };

        if let Some(reply) = &reply {
            debug!(?event, ?reply, "option state transition");
        }

        reply
    }

    pub fn request_will(&mut self, option: TelnetOption) -> Reply {
        self.entry(option).start_will(option)
    }

    pub fn request_wont(&mut self, option: TelnetOption) -> Reply {
        self.entry(option).start_wont(option)
    }

    pub fn request_do(&mut self, option: TelnetOption) -> Reply {
        self.entry(option).start_do(option)
    }

    pub fn request_dont(&mut self, option: TelnetOption) -> Reply {
        self.entry(option).start_dont(option)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_option_do_is_refused() {
        let mut neg = Negotiator::new(OptionPolicy::default());
        let reply = neg.handle(&TelnetEvent::Do(TelnetOption::Unknown(0x63)));
        assert_eq!(reply, Some(TelnetEvent::Wont(TelnetOption::Unknown(0x63))));
    }

    #[test]
    fn repeated_do_after_enable_produces_no_reply() {
        let mut neg = Negotiator::new(OptionPolicy::default());
        neg.handle(&TelnetEvent::Do(TelnetOption::Echo));
        assert!(neg.local_enabled(TelnetOption::Echo));
        let reply = neg.handle(&TelnetEvent::Do(TelnetOption::Echo));
        assert_eq!(reply, None);
    }

    #[test]
    fn we_initiate_will_then_peer_confirms_with_do() {
        let mut neg = Negotiator::new(OptionPolicy::default());
        let offer = neg.request_will(TelnetOption::Naws);
        assert_eq!(offer, Some(TelnetEvent::Will(TelnetOption::Naws)));
        assert!(!neg.local_enabled(TelnetOption::Naws));

        let reply = neg.handle(&TelnetEvent::Do(TelnetOption::Naws));
        assert_eq!(reply, None);
        assert!(neg.local_enabled(TelnetOption::Naws));
    }

    #[test]
    fn simultaneous_will_both_sides_converges_without_loop() {
        // Both sides spontaneously offer WILL BINARY at the same time.
        let mut server = Negotiator::new(OptionPolicy::default());
        server.request_will(TelnetOption::Binary);
        // The peer's WILL arrives after we've already gone WANTYES.
        let reply = server.handle(&TelnetEvent::Do(TelnetOption::Binary));
        assert_eq!(reply, None);
        assert!(server.local_enabled(TelnetOption::Binary));
    }
}
