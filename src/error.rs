//! Error types for the Tally application

use thiserror::Error;

/// Errors that can occur while setting up or running Tally
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Keybindings(#[from] tally_router::ConfigError),

    #[error("Invalid routing table: {0}")]
    Table(#[from] tally_router::TableError),

    #[error("Invalid command table: {0}")]
    Command(#[from] tally_router::CommandError),

    #[error("Failed to read saved filters: {0}")]
    Filters(#[from] toml::de::Error),

    #[error("Failed to write saved filters: {0}")]
    FiltersWrite(#[from] toml::ser::Error),

    #[error("Could not start logging: {0}")]
    Logging(String),

    #[error("No home directory found; pass --keybindings <path>")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, TallyError>;
