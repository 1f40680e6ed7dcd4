//! Scoped keybindings.
//!
//! - `name`: key-name normalization (`Control+R` -> `ctrl+r`).
//! - `registry`: the scope -> key -> binding index.
//! - `config`: the user's keybinding file, legacy migration and templates.

mod config;
mod name;
mod registry;

pub use config::{CURRENT_VERSION, KeyOverride, KeybindingConfig, LoadReport, load_or_regenerate};
pub use name::{display_key, normalize_key, parse_key, single_char};
pub use registry::{Binding, GLOBAL, KeyRegistry, Registration, SEARCH_TRIGGER};
