//! Key-name normalization.
//!
//! Keys are identified by strings such as `j`, `G`, `enter`, `ctrl+r` or
//! `shift+tab`. Every name is normalized before it is stored or looked up so
//! that `Control+R`, `ctrl+r` and `CTRL+r` all meet in one place. A lone
//! character is kept verbatim: `G` and `g` are different keys.

use crate::error::KeyError;

const MODIFIER_ORDER: [&str; 4] = ["ctrl", "alt", "shift", "super"];

#[derive(Default)]
struct Parts {
    mods: [bool; 4],
    key: String,
}

impl Parts {
    fn render(&self) -> String {
        let mut out = String::new();
        for (idx, name) in MODIFIER_ORDER.iter().enumerate() {
            if self.mods[idx] {
                out.push_str(name);
                out.push('+');
            }
        }
        out.push_str(&self.key);
        out
    }
}

/// Normalize a key name for storage and lookup.
///
/// Unparseable input is case-folded and returned as-is, so lookups of odd
/// names simply miss instead of failing. Use [`parse_key`] where the name
/// comes from a user and should be rejected instead.
pub fn normalize_key(raw: &str) -> String {
    match parse_parts(raw) {
        Ok(parts) => parts.render(),
        Err(_) => raw.trim().to_lowercase(),
    }
}

/// Strictly parse and normalize a user-supplied key name.
pub fn parse_key(raw: &str) -> Result<String, KeyError> {
    parse_parts(raw).map(|parts| parts.render())
}

/// The character of a one-character key name (`j`, `G`, `/`).
pub fn single_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let ch = chars.next()?;
    if chars.next().is_none() {
        Some(ch)
    } else {
        None
    }
}

/// Human-facing label for a normalized key name, e.g. `Ctrl+R` or `Enter`.
pub fn display_key(key: &str) -> String {
    if single_char(key).is_some() {
        return key.to_string();
    }
    let (mods, base) = match key.rfind('+') {
        Some(idx) if idx + 1 < key.len() => (&key[..idx], &key[idx + 1..]),
        Some(idx) => (&key[..idx.saturating_sub(1)], "+"),
        None => ("", key),
    };
    let base = match base {
        "up" => "↑".to_string(),
        "down" => "↓".to_string(),
        "left" => "←".to_string(),
        "right" => "→".to_string(),
        "pgup" => "PgUp".to_string(),
        "pgdown" => "PgDn".to_string(),
        other if single_char(other).is_some() && !mods.is_empty() => other.to_uppercase(),
        other => capitalize(other),
    };
    let mut parts: Vec<String> = mods
        .split('+')
        .filter(|m| !m.is_empty())
        .map(capitalize)
        .collect();
    parts.push(base);
    parts.join("+")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_parts(raw: &str) -> Result<Parts, KeyError> {
    if raw == " " {
        return Ok(Parts {
            key: "space".to_string(),
            ..Parts::default()
        });
    }
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(KeyError::Empty);
    }
    if let Some(ch) = single_char(trimmed) {
        return Ok(Parts {
            key: ch.to_string(),
            ..Parts::default()
        });
    }

    let lower = trimmed.to_lowercase();
    let (mod_str, key_part) = if let Some(prefix) = lower.strip_suffix("++") {
        (Some(prefix), "+")
    } else if let Some(idx) = lower.rfind('+') {
        (Some(&lower[..idx]), &lower[idx + 1..])
    } else {
        (None, lower.as_str())
    };

    let mut parts = Parts::default();
    if let Some(mod_str) = mod_str {
        if key_part.trim().is_empty() {
            return Err(KeyError::MissingKey(trimmed.to_string()));
        }
        parse_modifiers(mod_str, trimmed, &mut parts.mods)?;
    }

    let key = match key_part.trim() {
        "return" => "enter",
        "escape" => "esc",
        "spacebar" | "spc" | "" => "space",
        "delete" => "del",
        "pageup" | "page_up" => "pgup",
        "pagedown" | "page_down" | "pgdn" => "pgdown",
        "backtab" => {
            parts.mods[2] = true;
            "tab"
        }
        other => other,
    };
    parts.key = key.to_string();
    Ok(parts)
}

fn parse_modifiers(input: &str, full: &str, mods: &mut [bool; 4]) -> Result<(), KeyError> {
    for segment in input.split('+') {
        let raw = segment.trim();
        if raw.is_empty() {
            return Err(KeyError::EmptyModifier(full.to_string()));
        }
        let idx = match raw {
            "ctrl" | "control" | "ctl" => 0,
            "alt" | "meta" | "option" | "opt" => 1,
            "shift" => 2,
            "super" | "cmd" | "command" | "win" => 3,
            _ => {
                return Err(KeyError::UnknownModifier {
                    key: full.to_string(),
                    modifier: raw.to_string(),
                });
            }
        };
        if mods[idx] {
            return Err(KeyError::DuplicateModifier {
                key: full.to_string(),
                modifier: raw.to_string(),
            });
        }
        mods[idx] = true;
    }
    Ok(())
}
