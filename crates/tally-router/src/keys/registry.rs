use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use super::config::{KeyOverride, KeybindingConfig};
use super::name::{normalize_key, parse_key, single_char};
use crate::action::Action;
use crate::error::ConfigError;

/// Fallback scope consulted when a scope-specific lookup misses.
pub const GLOBAL: &str = "global";

/// Literal key that always opens search, whatever the user's overrides say.
pub const SEARCH_TRIGGER: &str = "/";

/// A set of keys bound to one action in one scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub action: Action,
    /// Command run when one of the keys is pressed outside an overlay.
    pub command_id: Option<String>,
    pub keys: Vec<String>,
    pub help: String,
    pub scope: String,
}

impl Binding {
    pub fn new(scope: impl Into<String>, action: Action, keys: &[&str], help: impl Into<String>) -> Self {
        Self {
            action,
            command_id: None,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            help: help.into(),
            scope: scope.into(),
        }
    }

    pub fn global(action: Action, keys: &[&str], help: impl Into<String>) -> Self {
        Self::new(GLOBAL, action, keys, help)
    }

    pub fn command(mut self, id: impl Into<String>) -> Self {
        self.command_id = Some(id.into());
        self
    }
}

/// What [`KeyRegistry::register`] did with a binding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The scope already owns `key`; the whole binding was dropped.
    Skipped { key: String },
    /// The binding had no usable keys.
    Empty,
}

/// Scoped key -> binding index.
///
/// Registration is first-wins: once a key is bound in a scope, any later
/// binding that mentions that key in the same scope is skipped entirely.
/// Callers therefore register the most specific bindings first. User
/// changes go through [`KeyRegistry::apply_config`], which replaces keys in
/// place instead of registering new bindings.
#[derive(Clone, Debug, Default)]
pub struct KeyRegistry {
    bindings: Vec<Binding>,
    index: HashMap<String, HashMap<String, usize>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, mut binding: Binding) -> Registration {
        let mut keys: Vec<String> = Vec::with_capacity(binding.keys.len());
        for raw in &binding.keys {
            let key = normalize_key(raw);
            if !key.is_empty() && !keys.contains(&key) {
                keys.push(key);
            }
        }
        if keys.is_empty() {
            return Registration::Empty;
        }

        if let Some(scope_index) = self.index.get(&binding.scope)
            && let Some(taken) = keys.iter().find(|key| scope_index.contains_key(*key))
        {
            debug!(
                scope = %binding.scope,
                action = %binding.action,
                key = %taken,
                "skipping binding: key already bound in scope"
            );
            return Registration::Skipped { key: taken.clone() };
        }

        binding.keys = keys;
        let idx = self.bindings.len();
        let scope_index = self.index.entry(binding.scope.clone()).or_default();
        for key in &binding.keys {
            scope_index.insert(key.clone(), idx);
        }
        self.bindings.push(binding);
        Registration::Added
    }

    /// Register several bindings in order, returning how many were added.
    pub fn register_all(&mut self, bindings: impl IntoIterator<Item = Binding>) -> usize {
        let mut added = 0;
        for binding in bindings {
            if self.register(binding) == Registration::Added {
                added += 1;
            }
        }
        added
    }

    /// Resolve a key in a scope.
    ///
    /// Tries the scope itself, then the opposite case of a single ASCII letter
    /// (terminals disagree about shift and caps lock), then [`GLOBAL`].
    pub fn lookup(&self, key: &str, scope: &str) -> Option<&Binding> {
        let key = normalize_key(key);
        self.lookup_in(&key, scope).or_else(|| {
            if scope == GLOBAL {
                None
            } else {
                self.lookup_in(&key, GLOBAL)
            }
        })
    }

    fn lookup_in(&self, key: &str, scope: &str) -> Option<&Binding> {
        let scope_index = self.index.get(scope)?;
        if let Some(&idx) = scope_index.get(key) {
            return self.bindings.get(idx);
        }
        let ch = single_char(key).filter(|c| c.is_ascii_alphabetic())?;
        let flipped = if ch.is_ascii_uppercase() {
            ch.to_ascii_lowercase()
        } else {
            ch.to_ascii_uppercase()
        };
        let mut buf = [0u8; 4];
        scope_index
            .get(&*flipped.encode_utf8(&mut buf))
            .and_then(|&idx| self.bindings.get(idx))
    }

    /// First key that triggers `action` when pressed in `scope`.
    ///
    /// Global bindings count, but only when the scope does not shadow the
    /// key with a different action.
    pub fn key_for(&self, scope: &str, action: Action) -> Option<&str> {
        let scopes: &[&str] = if scope == GLOBAL {
            &[GLOBAL]
        } else {
            &[scope, GLOBAL]
        };
        scopes.iter().find_map(|owner| {
            self.bindings
                .iter()
                .filter(|b| b.scope == *owner && b.action == action)
                .flat_map(|b| b.keys.iter())
                .find(|key| self.lookup(key, scope).map(|hit| hit.action) == Some(action))
                .map(String::as_str)
        })
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.index.contains_key(scope)
    }

    /// All scopes with at least one binding, sorted.
    pub fn scopes(&self) -> Vec<&str> {
        let mut scopes: Vec<&str> = self.index.keys().map(String::as_str).collect();
        scopes.sort_unstable();
        scopes
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn bindings_in<'a>(&'a self, scope: &'a str) -> impl Iterator<Item = &'a Binding> + 'a {
        self.bindings.iter().filter(move |b| b.scope == scope)
    }

    /// Apply user overrides atomically.
    ///
    /// Every entry must name a known scope and an action already bound there;
    /// a (scope, action) pair may appear once. Keys replace the binding's keys.
    /// If anything is invalid, or the result binds one key to two actions in
    /// a scope, nothing changes.
    pub fn apply_config(&mut self, config: &KeybindingConfig) -> Result<(), ConfigError> {
        let mut working = self.bindings.clone();
        let mut seen: HashSet<(&str, Action)> = HashSet::new();

        for entry in &config.overrides {
            let action = self.validate_entry(entry, &mut seen)?;
            let mut keys = parse_override_keys(entry)?;

            if action == Action::Search
                && !keys.iter().any(|k| k == SEARCH_TRIGGER)
                && self
                    .bindings_in(&entry.scope)
                    .any(|b| b.action == Action::Search && b.keys.iter().any(|k| k == SEARCH_TRIGGER))
            {
                keys.push(SEARCH_TRIGGER.to_string());
            }

            for binding in working
                .iter_mut()
                .filter(|b| b.scope == entry.scope && b.action == action)
            {
                binding.keys = keys.clone();
            }
        }

        check_collisions(&working)?;
        self.index = build_index(&working);
        self.bindings = working;
        info!(overrides = config.overrides.len(), "applied keybinding overrides");
        Ok(())
    }

    fn validate_entry<'a>(
        &self,
        entry: &'a KeyOverride,
        seen: &mut HashSet<(&'a str, Action)>,
    ) -> Result<Action, ConfigError> {
        if !self.has_scope(&entry.scope) {
            return Err(ConfigError::UnknownScope(entry.scope.clone()));
        }
        let action = Action::parse(&entry.action).ok_or_else(|| ConfigError::UnknownAction {
            scope: entry.scope.clone(),
            action: entry.action.clone(),
        })?;
        if !self.bindings_in(&entry.scope).any(|b| b.action == action) {
            return Err(ConfigError::ActionNotInScope {
                scope: entry.scope.clone(),
                action: action.name().to_string(),
            });
        }
        if !seen.insert((entry.scope.as_str(), action)) {
            return Err(ConfigError::DuplicateEntry {
                scope: entry.scope.clone(),
                action: action.name().to_string(),
            });
        }
        Ok(action)
    }

    /// Deterministic dump of every binding, sorted by (scope, action).
    pub fn export(&self) -> KeybindingConfig {
        let mut grouped: BTreeMap<(&str, &str), Vec<String>> = BTreeMap::new();
        for binding in &self.bindings {
            let keys = grouped
                .entry((binding.scope.as_str(), binding.action.name()))
                .or_default();
            for key in &binding.keys {
                if !keys.contains(key) {
                    keys.push(key.clone());
                }
            }
        }
        KeybindingConfig {
            overrides: grouped
                .into_iter()
                .map(|((scope, action), keys)| KeyOverride {
                    scope: scope.to_string(),
                    action: action.to_string(),
                    keys,
                })
                .collect(),
            migrated: false,
        }
    }
}

fn parse_override_keys(entry: &KeyOverride) -> Result<Vec<String>, ConfigError> {
    let mut keys: Vec<String> = Vec::with_capacity(entry.keys.len());
    for raw in &entry.keys {
        let key = parse_key(raw).map_err(|source| ConfigError::InvalidKey {
            scope: entry.scope.clone(),
            action: entry.action.clone(),
            key: raw.clone(),
            source,
        })?;
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    if keys.is_empty() {
        return Err(ConfigError::EmptyKeys {
            scope: entry.scope.clone(),
            action: entry.action.clone(),
        });
    }
    Ok(keys)
}

fn build_index(bindings: &[Binding]) -> HashMap<String, HashMap<String, usize>> {
    let mut index: HashMap<String, HashMap<String, usize>> = HashMap::new();
    for (idx, binding) in bindings.iter().enumerate() {
        let scope_index = index.entry(binding.scope.clone()).or_default();
        for key in &binding.keys {
            scope_index.entry(key.clone()).or_insert(idx);
        }
    }
    index
}

fn check_collisions(bindings: &[Binding]) -> Result<(), ConfigError> {
    let mut owners: BTreeMap<(&str, &str), BTreeSet<&str>> = BTreeMap::new();
    for binding in bindings {
        for key in &binding.keys {
            owners
                .entry((binding.scope.as_str(), key.as_str()))
                .or_default()
                .insert(binding.action.name());
        }
    }
    match owners.into_iter().find(|(_, actions)| actions.len() > 1) {
        Some(((scope, key), actions)) => Err(ConfigError::Collision {
            scope: scope.to_string(),
            key: key.to_string(),
            actions: actions.into_iter().map(str::to_string).collect(),
        }),
        None => Ok(()),
    }
}
