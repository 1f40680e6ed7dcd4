//! Command registry.
//!
//! Commands are named operations with an availability predicate and an
//! `execute` body taking the state snapshot by value. The registry holds the
//! static commands registered at startup plus groups of generated commands
//! (one per saved filter, say) that are rebuilt from entity snapshots.

mod fuzzy;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::error::CommandError;
use crate::keys::GLOBAL;
use crate::outcome::Outcome;
use fuzzy::FuzzyQuery;

static SLUG_INVALID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("slug regex"));

/// Whether a command can run right now.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Enabled,
    /// Not runnable; the reason is shown to the user.
    Disabled(String),
}

impl Availability {
    /// `Enabled` if `ok`, otherwise `Disabled(reason)`.
    pub fn when(ok: bool, reason: impl Into<String>) -> Self {
        if ok {
            Availability::Enabled
        } else {
            Availability::Disabled(reason.into())
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Availability::Enabled)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Availability::Enabled => None,
            Availability::Disabled(reason) => Some(reason),
        }
    }
}

type EnabledFn<S> = Arc<dyn Fn(&S) -> Availability>;
type ExecuteFn<S, E> = Arc<dyn Fn(S) -> Outcome<S, E>>;

/// A searchable, conditionally enabled operation.
pub struct Command<S, E> {
    pub id: String,
    pub label: String,
    pub description: String,
    pub category: String,
    /// Hidden commands run by id but never show up in search.
    pub hidden: bool,
    /// Scopes the command is offered in. Empty, or containing [`GLOBAL`],
    /// means everywhere.
    pub scopes: Vec<String>,
    group: Option<String>,
    enabled: EnabledFn<S>,
    execute: ExecuteFn<S, E>,
}

impl<S, E> Clone for Command<S, E> {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            label: self.label.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            hidden: self.hidden,
            scopes: self.scopes.clone(),
            group: self.group.clone(),
            enabled: Arc::clone(&self.enabled),
            execute: Arc::clone(&self.execute),
        }
    }
}

impl<S, E> fmt::Debug for Command<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("category", &self.category)
            .field("hidden", &self.hidden)
            .field("scopes", &self.scopes)
            .field("group", &self.group)
            .finish_non_exhaustive()
    }
}

impl<S: 'static, E: 'static> Command<S, E> {
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        execute: impl Fn(S) -> Outcome<S, E> + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            category: String::new(),
            hidden: false,
            scopes: Vec::new(),
            group: None,
            enabled: Arc::new(|_| Availability::Enabled),
            execute: Arc::new(execute),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn scopes(mut self, scopes: &[&str]) -> Self {
        self.scopes = scopes.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Always visible, whatever the caller's scope.
    pub fn global(mut self) -> Self {
        self.scopes = vec![GLOBAL.to_string()];
        self
    }

    pub fn enabled_when(mut self, predicate: impl Fn(&S) -> Availability + 'static) -> Self {
        self.enabled = Arc::new(predicate);
        self
    }
}

impl<S, E> Command<S, E> {
    pub fn availability(&self, state: &S) -> Availability {
        (self.enabled)(state)
    }

    pub fn visible_in(&self, scope: &str) -> bool {
        self.scopes.is_empty() || self.scopes.iter().any(|s| s == GLOBAL || s == scope)
    }

    /// Group name for generated commands.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    fn run(&self, state: S) -> Outcome<S, E> {
        (self.execute)(state)
    }
}

/// One search hit.
#[derive(Debug)]
pub struct CommandMatch<'a, S, E> {
    pub command: &'a Command<S, E>,
    pub score: u32,
    pub enabled: bool,
    pub reason: Option<String>,
}

/// Id for a generated command: `prefix:slug(key)`.
pub fn generated_id(prefix: &str, key: &str) -> String {
    let lower = key.trim().to_lowercase();
    let slug = SLUG_INVALID.replace_all(&lower, "-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("{prefix}:item")
    } else {
        format!("{prefix}:{slug}")
    }
}

pub struct CommandRegistry<S, E> {
    commands: Vec<Command<S, E>>,
    by_id: HashMap<String, usize>,
}

impl<S, E> Default for CommandRegistry<S, E> {
    fn default() -> Self {
        Self {
            commands: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<S, E> Clone for CommandRegistry<S, E> {
    fn clone(&self) -> Self {
        Self {
            commands: self.commands.clone(),
            by_id: self.by_id.clone(),
        }
    }
}

impl<S, E> CommandRegistry<S, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, command: Command<S, E>) -> Result<(), CommandError> {
        if self.by_id.contains_key(&command.id) {
            return Err(CommandError::DuplicateId(command.id));
        }
        self.by_id.insert(command.id.clone(), self.commands.len());
        self.commands.push(command);
        Ok(())
    }

    /// Replace every command generated for `group` with `commands`.
    ///
    /// Ids that collide with an existing command get a `-2`, `-3`, ...
    /// suffix. Returns the ids actually assigned, in order.
    pub fn replace_generated(&mut self, group: &str, commands: Vec<Command<S, E>>) -> Vec<String> {
        self.commands.retain(|cmd| cmd.group.as_deref() != Some(group));
        self.reindex();

        let mut assigned = Vec::with_capacity(commands.len());
        for mut command in commands {
            let base = command.id.clone();
            let mut n = 2;
            while self.by_id.contains_key(&command.id) {
                command.id = format!("{base}-{n}");
                n += 1;
            }
            command.group = Some(group.to_string());
            assigned.push(command.id.clone());
            self.by_id.insert(command.id.clone(), self.commands.len());
            self.commands.push(command);
        }
        debug!(group, count = assigned.len(), "rebuilt generated commands");
        assigned
    }

    fn reindex(&mut self) {
        self.by_id = self
            .commands
            .iter()
            .enumerate()
            .map(|(idx, cmd)| (cmd.id.clone(), idx))
            .collect();
    }

    pub fn get(&self, id: &str) -> Option<&Command<S, E>> {
        self.by_id.get(id).and_then(|&idx| self.commands.get(idx))
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Command<S, E>> {
        self.commands.iter()
    }

    /// Rank commands for a palette query.
    ///
    /// Hidden and out-of-scope commands are excluded. Disabled commands stay
    /// in the list with their reason. Order: enabled first, then the
    /// most-recently-used id, then fuzzy score, then label and id.
    pub fn search(
        &self,
        query: &str,
        scope: &str,
        state: &S,
        last_used: Option<&str>,
    ) -> Vec<CommandMatch<'_, S, E>> {
        let mut fuzzy = FuzzyQuery::new(query);
        let mut matches: Vec<CommandMatch<'_, S, E>> = Vec::new();

        for command in &self.commands {
            if command.hidden || !command.visible_in(scope) {
                continue;
            }
            let score = match fuzzy.as_mut() {
                None => 0,
                Some(fuzzy) => {
                    match fuzzy.best(&[
                        command.label.as_str(),
                        command.id.as_str(),
                        command.description.as_str(),
                    ]) {
                        Some(score) => score,
                        None => continue,
                    }
                }
            };
            let availability = command.availability(state);
            matches.push(CommandMatch {
                command,
                score,
                enabled: availability.is_enabled(),
                reason: availability.reason().map(str::to_string),
            });
        }

        let is_mru = |m: &CommandMatch<'_, S, E>| last_used == Some(m.command.id.as_str());
        matches.sort_by_key(|m| {
            (
                Reverse(m.enabled),
                Reverse(is_mru(m)),
                Reverse(m.score),
                m.command.label.clone(),
                m.command.id.clone(),
            )
        });
        matches
    }

    /// Run a command by id on behalf of `scope`.
    ///
    /// Unknown ids, commands not offered in `scope` and disabled commands
    /// fail without calling `execute`. Otherwise the command's own outcome
    /// is returned as-is.
    pub fn execute_by_id(&self, id: &str, scope: &str, state: S) -> Outcome<S, E> {
        let Some(command) = self.get(id) else {
            return Outcome::failed(state, CommandError::Unknown(id.to_string()));
        };
        if !command.visible_in(scope) {
            return Outcome::failed(
                state,
                CommandError::ScopeMismatch {
                    id: id.to_string(),
                    scope: scope.to_string(),
                },
            );
        }
        if let Availability::Disabled(reason) = command.availability(&state) {
            return Outcome::failed(
                state,
                CommandError::Disabled {
                    id: id.to_string(),
                    reason,
                },
            );
        }
        debug!(id, scope, "executing command");
        command.run(state)
    }
}
