//! tally_router - modal key routing for the Tally terminal UI.
//!
//! The router owns four tables, all built at startup and replaced only
//! wholesale:
//! - [`KeyRegistry`]: scoped key -> [`Binding`] index with a `global` fallback.
//! - [`CommandRegistry`]: searchable, conditionally enabled commands.
//! - [`ContractTable`] / [`TextInputTable`]: per-scope footer hints and
//!   text-entry behavior.
//! - [`OverlayTable`]: ordered (guard, scope, handler) entries deciding which
//!   modal layer is in the foreground.
//!
//! [`Router`] composes them. It is generic over the host's state snapshot `S`
//! and effect type `E`; state is passed by value into every handler and a new
//! value comes back in an [`Outcome`].

pub mod action;
pub mod commands;
pub mod confirm;
pub mod contract;
pub mod error;
pub mod keys;
pub mod outcome;
pub mod overlay;
pub mod router;
pub mod text;

pub use action::{Action, Direction};
pub use commands::{Availability, Command, CommandMatch, CommandRegistry, generated_id};
pub use confirm::{ArmTicket, ConfirmGate, ConfirmState, Press};
pub use contract::{ContractTable, DisplayKind, FooterHint, Hint, Intent, InteractionContract};
pub use error::{CommandError, ConfigError, KeyError, TableError};
pub use keys::{
    Binding, GLOBAL, KeyOverride, KeyRegistry, KeybindingConfig, LoadReport, Registration,
    SEARCH_TRIGGER, display_key, load_or_regenerate, normalize_key, parse_key,
};
pub use outcome::Outcome;
pub use overlay::{HandlerCtx, OverlayEntry, OverlayTable, ScopePurpose};
pub use router::{Dispatch, Route, Router};
pub use text::{KeyInput, TextEditing, TextField, TextInputBehavior, TextInputTable, classify};
