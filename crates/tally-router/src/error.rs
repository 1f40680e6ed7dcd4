//! Error types for the router.
//!
//! None of these are fatal: configuration errors leave the previous key
//! table live, command errors become status messages.

use thiserror::Error;

/// A key name that could not be parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("empty key")]
    Empty,

    #[error("empty modifier segment in '{0}'")]
    EmptyModifier(String),

    #[error("unknown modifier '{modifier}' in '{key}'")]
    UnknownModifier { key: String, modifier: String },

    #[error("duplicate modifier '{modifier}' in '{key}'")]
    DuplicateModifier { key: String, modifier: String },

    #[error("missing key after modifiers in '{0}'")]
    MissingKey(String),
}

/// Errors from loading or applying a keybinding configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse keybindings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write keybindings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Refusing to read keybindings: file too large ({size} bytes, max {max})")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported keybindings version {0}")]
    UnsupportedVersion(u32),

    #[error("Unknown scope '{0}'")]
    UnknownScope(String),

    #[error("Unknown action '{action}' in scope '{scope}'")]
    UnknownAction { scope: String, action: String },

    #[error("Action '{action}' is not bound in scope '{scope}'")]
    ActionNotInScope { scope: String, action: String },

    #[error("Duplicate entry for action '{action}' in scope '{scope}'")]
    DuplicateEntry { scope: String, action: String },

    #[error("No keys given for action '{action}' in scope '{scope}'")]
    EmptyKeys { scope: String, action: String },

    #[error("Invalid key '{key}' for action '{action}' in scope '{scope}': {source}")]
    InvalidKey {
        scope: String,
        action: String,
        key: String,
        #[source]
        source: KeyError,
    },

    #[error("Key '{key}' in scope '{scope}' is bound to more than one action: {}", actions.join(", "))]
    Collision {
        scope: String,
        key: String,
        actions: Vec<String>,
    },
}

/// Errors surfaced when running or registering a command.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Command '{id}' is not available in {scope}")]
    ScopeMismatch { id: String, scope: String },

    #[error("{reason}")]
    Disabled { id: String, reason: String },

    #[error("Duplicate command id: {0}")]
    DuplicateId(String),

    #[error("{0}")]
    Failed(String),
}

/// Errors building the static routing tables.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Duplicate overlay: {0}")]
    DuplicateOverlay(String),

    #[error("Scope '{0}' already has an interaction contract")]
    DuplicateContract(String),
}
