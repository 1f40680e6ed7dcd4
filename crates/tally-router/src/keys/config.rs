//! Persisted keybinding file.
//!
//! ```toml
//! version = 2
//!
//! [scopes.transactions]
//! search = ["/", "ctrl+f"]
//! down = ["j", "down"]
//! ```
//!
//! Files without a version (or `version = 1`) use the legacy layout with one
//! key string per action (`search = "/"`). They are accepted and rewritten in
//! the current layout.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::registry::KeyRegistry;
use crate::error::ConfigError;

pub const CURRENT_VERSION: u32 = 2;

const MAX_KEYBINDINGS_FILE_BYTES: u64 = 1_048_576; // 1 MiB

const TEMPLATE_HEADER: &str = "\
# Tally keybindings.
#
# Each [scopes.<name>] table maps an action to the keys that trigger it.
# Delete this file to regenerate it from the built-in defaults.
";

/// One (scope, action) -> keys entry from a keybinding file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyOverride {
    pub scope: String,
    /// Action name as written; aliases are resolved when applied.
    pub action: String,
    pub keys: Vec<String>,
}

/// A whole keybinding file, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeybindingConfig {
    pub overrides: Vec<KeyOverride>,
    /// Set when the file used the legacy single-key layout.
    pub migrated: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFile {
    version: Option<u32>,
    #[serde(default)]
    scopes: BTreeMap<String, BTreeMap<String, RawKeys>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawKeys {
    One(String),
    Many(Vec<String>),
}

#[derive(Serialize)]
struct FileOut<'a> {
    version: u32,
    scopes: BTreeMap<&'a str, BTreeMap<&'a str, &'a [String]>>,
}

impl KeybindingConfig {
    pub fn from_overrides(overrides: Vec<KeyOverride>) -> Self {
        Self {
            overrides,
            migrated: false,
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawFile = toml::from_str(content)?;
        let version = raw.version.unwrap_or(1);
        if version > CURRENT_VERSION || version == 0 {
            return Err(ConfigError::UnsupportedVersion(version));
        }

        let mut migrated = version < CURRENT_VERSION;
        let mut overrides = Vec::new();
        for (scope, actions) in raw.scopes {
            for (action, keys) in actions {
                let keys = match keys {
                    RawKeys::One(key) => {
                        migrated = true;
                        vec![key]
                    }
                    RawKeys::Many(keys) => keys,
                };
                overrides.push(KeyOverride {
                    scope: scope.clone(),
                    action,
                    keys,
                });
            }
        }
        Ok(Self {
            overrides,
            migrated,
        })
    }

    /// Render in the current layout. Later entries for the same
    /// (scope, action) overwrite earlier ones.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let mut scopes: BTreeMap<&str, BTreeMap<&str, &[String]>> = BTreeMap::new();
        for entry in &self.overrides {
            scopes
                .entry(entry.scope.as_str())
                .or_default()
                .insert(entry.action.as_str(), entry.keys.as_slice());
        }
        let body = toml::to_string_pretty(&FileOut {
            version: CURRENT_VERSION,
            scopes,
        })?;
        Ok(format!("{TEMPLATE_HEADER}\n{body}"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let size = fs::metadata(path)?.len();
        if size > MAX_KEYBINDINGS_FILE_BYTES {
            return Err(ConfigError::TooLarge {
                size,
                max: MAX_KEYBINDINGS_FILE_BYTES,
            });
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_toml()?)?;
        Ok(())
    }
}

/// What [`load_or_regenerate`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadReport {
    /// No file existed; a template was written from the defaults.
    Created,
    Loaded,
    /// A legacy file was applied and rewritten in the current layout.
    Migrated,
    /// The file was rejected, moved aside, and replaced with a template.
    Regenerated {
        reason: String,
        backup: Option<PathBuf>,
    },
}

/// Load the user's keybinding file into `keys` (which holds the defaults).
///
/// Files are validated wholesale. A malformed or conflicting file is never
/// partially applied: it is moved to `<file>.bak`, the defaults stay live,
/// and a fresh template is written in its place.
pub fn load_or_regenerate(path: &Path, keys: &mut KeyRegistry) -> Result<LoadReport, ConfigError> {
    if !path.exists() {
        keys.export().save(path)?;
        info!(path = %path.display(), "wrote keybinding template");
        return Ok(LoadReport::Created);
    }

    let applied = KeybindingConfig::load(path).and_then(|config| {
        keys.apply_config(&config)?;
        Ok(config)
    });

    match applied {
        Ok(config) if config.migrated => {
            keys.export().save(path)?;
            info!(path = %path.display(), "migrated legacy keybinding file");
            Ok(LoadReport::Migrated)
        }
        Ok(_) => {
            info!(path = %path.display(), "loaded keybindings");
            Ok(LoadReport::Loaded)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "rejected keybinding file");
            let backup = backup_path(path);
            let backup = match fs::rename(path, &backup) {
                Ok(()) => Some(backup),
                Err(rename_err) => {
                    warn!(error = %rename_err, "could not move rejected keybinding file aside");
                    None
                }
            };
            keys.export().save(path)?;
            Ok(LoadReport::Regenerated {
                reason: err.to_string(),
                backup,
            })
        }
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "keybindings.toml".into());
    name.push(".bak");
    path.with_file_name(name)
}
