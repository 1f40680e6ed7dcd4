use crate::error::CommandError;

/// Result of running a command or an overlay handler.
///
/// The state snapshot always comes back, even on error, so the caller can
/// keep going. Handlers are expected to fail before they mutate anything.
#[derive(Debug)]
pub struct Outcome<S, E> {
    pub state: S,
    pub effect: Option<E>,
    pub error: Option<CommandError>,
}

impl<S, E> Outcome<S, E> {
    pub fn ok(state: S) -> Self {
        Self {
            state,
            effect: None,
            error: None,
        }
    }

    pub fn with_effect(state: S, effect: E) -> Self {
        Self {
            state,
            effect: Some(effect),
            error: None,
        }
    }

    pub fn failed(state: S, error: CommandError) -> Self {
        Self {
            state,
            effect: None,
            error: Some(error),
        }
    }

    /// Shorthand for a command body reporting its own failure.
    pub fn fail(state: S, message: impl Into<String>) -> Self {
        Self::failed(state, CommandError::Failed(message.into()))
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
