//! Voice commands and the router that maps them to outbound actions.
//!
//! The speech recogniser (outside this crate) hands the control loop at
//! most one [`CommandToken`] per tick.  [`CommandRouter::route`] turns the
//! phone-side tokens into an [`Action`]; `sos` never reaches the router
//! because the Scheduler handles it on the high-priority SOS path.

use core::str::FromStr;

/// Tokens the recogniser can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandToken {
    None = 0,
    Call = 1,
    Message = 2,
    Navigation = 3,
    Sos = 4,
}

impl CommandToken {
    /// Decode the wire/mailbox representation.  Unknown codes map to `None`.
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Call,
            2 => Self::Message,
            3 => Self::Navigation,
            4 => Self::Sos,
            _ => Self::None,
        }
    }

    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Parse recogniser text; anything unrecognised yields `None`.
    pub fn parse(text: &str) -> Self {
        text.parse().unwrap_or(Self::None)
    }
}

/// Error returned when recogniser text is not a known command word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownCommand;

impl FromStr for CommandToken {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let word = s.trim();
        if word.eq_ignore_ascii_case("call") {
            Ok(Self::Call)
        } else if word.eq_ignore_ascii_case("message") {
            Ok(Self::Message)
        } else if word.eq_ignore_ascii_case("navigation") {
            Ok(Self::Navigation)
        } else if word.eq_ignore_ascii_case("sos") {
            Ok(Self::Sos)
        } else if word.is_empty() || word.eq_ignore_ascii_case("none") {
            Ok(Self::None)
        } else {
            Err(UnknownCommand)
        }
    }
}

/// Actions forwarded to the paired phone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    InitiateCall,
    SendMessage,
    StartNavigation,
}

impl Action {
    /// Wire name used in the `{"command": …}` message.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InitiateCall => "initiate_call",
            Self::SendMessage => "send_message",
            Self::StartNavigation => "start_navigation",
        }
    }
}

impl serde::Serialize for Action {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Stateless token → action mapping.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRouter;

impl CommandRouter {
    pub const fn new() -> Self {
        Self
    }

    /// `sos` and `none` produce no action.
    pub fn route(&self, token: CommandToken) -> Option<Action> {
        match token {
            CommandToken::Call => Some(Action::InitiateCall),
            CommandToken::Message => Some(Action::SendMessage),
            CommandToken::Navigation => Some(Action::StartNavigation),
            CommandToken::Sos | CommandToken::None => None,
        }
    }
}
