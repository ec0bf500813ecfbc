//! Voice-command mailbox.
//!
//! The recogniser runs in its own task and posts its result here; the
//! control loop takes at most one token per tick.  A newer result
//! overwrites one that has not been consumed yet.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::app::commands::CommandToken;

/// Single-slot, lock-free hand-off between the recogniser and the loop.
pub struct CommandMailbox {
    slot: AtomicU8,
}

impl Default for CommandMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandMailbox {
    pub const fn new() -> Self {
        Self {
            slot: AtomicU8::new(CommandToken::None.as_u8()),
        }
    }

    pub fn post(&self, token: CommandToken) {
        self.slot.store(token.as_u8(), Ordering::Release);
    }

    /// Post recogniser text.  Unknown words are ignored.
    pub fn post_text(&self, text: &str) {
        match CommandToken::parse(text) {
            CommandToken::None => {}
            token => self.post(token),
        }
    }

    /// Take the pending token, leaving the slot empty.
    pub fn take(&self) -> Option<CommandToken> {
        match CommandToken::from_u8(self.slot.swap(CommandToken::None.as_u8(), Ordering::AcqRel)) {
            CommandToken::None => None,
            token => Some(token),
        }
    }
}
