//! Keybindings for the terminal front end.
//!
//! - `defaults`: the built-in key table, registered in precedence order.
//! - [`key_name`]: crossterm events to the key names the router uses.

mod defaults;

pub use defaults::default_keys;

use std::path::{Path, PathBuf};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::ProjectDirs;
use tally_router::{ConfigError, KeyRegistry, LoadReport, load_or_regenerate, normalize_key};

/// Name of a key event, e.g. `j`, `G`, `ctrl+p`, `shift+tab`.
///
/// Shift is folded into printable characters (`G`, `?`), so it only shows up
/// as a modifier on named keys.
pub fn key_name(key: KeyEvent) -> Option<String> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    let (base, shift_applies) = match key.code {
        KeyCode::Char(' ') => ("space".to_string(), false),
        KeyCode::Char(c) if ctrl || alt => (c.to_lowercase().to_string(), false),
        KeyCode::Char(c) => return Some(c.to_string()),
        KeyCode::Enter => ("enter".to_string(), true),
        KeyCode::Esc => ("esc".to_string(), true),
        KeyCode::Backspace => ("backspace".to_string(), true),
        KeyCode::Delete => ("del".to_string(), true),
        KeyCode::Insert => ("insert".to_string(), true),
        KeyCode::Tab => ("tab".to_string(), true),
        KeyCode::BackTab => return Some("shift+tab".to_string()),
        KeyCode::Up => ("up".to_string(), true),
        KeyCode::Down => ("down".to_string(), true),
        KeyCode::Left => ("left".to_string(), true),
        KeyCode::Right => ("right".to_string(), true),
        KeyCode::Home => ("home".to_string(), true),
        KeyCode::End => ("end".to_string(), true),
        KeyCode::PageUp => ("pgup".to_string(), true),
        KeyCode::PageDown => ("pgdown".to_string(), true),
        KeyCode::F(n) => (format!("f{n}"), true),
        _ => return None,
    };

    let mut name = String::new();
    if ctrl {
        name.push_str("ctrl+");
    }
    if alt {
        name.push_str("alt+");
    }
    if shift && shift_applies {
        name.push_str("shift+");
    }
    name.push_str(&base);
    Some(normalize_key(&name))
}

pub fn default_keybindings_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tally")?;
    Some(proj.config_dir().join("keybindings.toml"))
}

pub fn default_data_dir() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "tally")?;
    Some(proj.data_dir().to_path_buf())
}

/// Defaults with the user's file applied (or regenerated).
pub fn load(path: &Path) -> Result<(KeyRegistry, LoadReport), ConfigError> {
    let mut keys = default_keys();
    let report = load_or_regenerate(path, &mut keys)?;
    Ok((keys, report))
}
