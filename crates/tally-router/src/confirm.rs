//! Two-key confirmation for destructive commands.
//!
//! The first press arms the gate and returns a ticket; the host schedules a
//! timeout message carrying the ticket's token. A second matching press
//! before the deadline confirms. Whichever of the second press or the timeout
//! arrives first settles the gate; a timeout for an older arming is ignored.

use std::time::{Duration, Instant};

use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfirmState<A> {
    Idle,
    Armed {
        action: A,
        /// Stable key of the item the action targets.
        target: String,
        deadline: Instant,
        token: u64,
    },
}

/// Armed/idle debounce. Tokens keep increasing across armings so a timeout
/// scheduled for an earlier arming can never disarm a later one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmGate<A> {
    state: ConfirmState<A>,
    issued: u64,
}

impl<A> Default for ConfirmGate<A> {
    fn default() -> Self {
        Self {
            state: ConfirmState::Idle,
            issued: 0,
        }
    }
}

/// What to schedule after arming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArmTicket {
    pub token: u64,
    pub after: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Press {
    Confirmed,
    Armed(ArmTicket),
}

impl<A: PartialEq> ConfirmGate<A> {
    pub const WINDOW: Duration = Duration::from_secs(3);

    pub fn state(&self) -> &ConfirmState<A> {
        &self.state
    }

    pub fn is_armed(&self) -> bool {
        matches!(self.state, ConfirmState::Armed { .. })
    }

    /// Whether the gate is armed for exactly this action and target.
    pub fn is_armed_for(&self, action: &A, target: &str) -> bool {
        matches!(&self.state, ConfirmState::Armed { action: a, target: t, .. } if a == action && t == target)
    }

    /// Press the confirmation key for `action` on `target`.
    ///
    /// Confirms if armed for the same action and target and `now` is within
    /// the window; otherwise (re)arms with a fresh token.
    pub fn press(&mut self, action: A, target: &str, now: Instant) -> Press {
        if let ConfirmState::Armed {
            action: armed,
            target: armed_target,
            deadline,
            ..
        } = &self.state
            && *armed == action
            && armed_target == target
            && now <= *deadline
        {
            self.state = ConfirmState::Idle;
            debug!(item = target, "confirmation accepted");
            return Press::Confirmed;
        }

        self.issued = self.issued.wrapping_add(1);
        self.state = ConfirmState::Armed {
            action,
            target: target.to_string(),
            deadline: now + Self::WINDOW,
            token: self.issued,
        };
        debug!(item = target, token = self.issued, "confirmation armed");
        Press::Armed(ArmTicket {
            token: self.issued,
            after: Self::WINDOW,
        })
    }

    /// Handle a timeout message. Returns true if it disarmed the gate.
    pub fn expire(&mut self, token: u64) -> bool {
        match self.state {
            ConfirmState::Armed { token: armed, .. } if armed == token => {
                self.state = ConfirmState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Drop any pending confirmation, e.g. when the user moves away.
    pub fn reset(&mut self) {
        self.state = ConfirmState::Idle;
    }
}
