//! Per-scope interaction contracts and the footer they produce.
//!
//! A contract lists the hints a scope wants in its footer. The keys come
//! from the live [`KeyRegistry`] at render time, so a hint whose action lost
//! its key to a user override silently disappears.

use std::collections::HashMap;

use crate::action::Action;
use crate::error::TableError;
use crate::keys::{KeyRegistry, display_key};

/// Coarse hint category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Intent {
    Move,
    Select,
    Toggle,
    Edit,
    Confirm,
    Save,
    Cancel,
    Delete,
    Apply,
}

impl Intent {
    /// Action used when a hint does not pin one.
    pub fn default_action(self) -> Action {
        match self {
            Intent::Move => Action::Down,
            Intent::Select => Action::Confirm,
            Intent::Toggle => Action::Toggle,
            Intent::Edit => Action::Edit,
            Intent::Confirm => Action::Confirm,
            Intent::Save => Action::Save,
            Intent::Cancel => Action::Cancel,
            Intent::Delete => Action::Delete,
            Intent::Apply => Action::Apply,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayKind {
    List,
    Form,
    Dialog,
    TextEntry,
    Palette,
    Document,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Hint {
    pub intent: Intent,
    pub action: Option<Action>,
    pub label: Option<String>,
    /// Declared for completeness but never rendered.
    pub omit: bool,
}

impl Hint {
    pub fn new(intent: Intent, label: impl Into<String>) -> Self {
        Self {
            intent,
            action: None,
            label: Some(label.into()),
            omit: false,
        }
    }

    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    pub fn omitted(mut self) -> Self {
        self.omit = true;
        self
    }

    pub fn resolved_action(&self) -> Action {
        self.action.unwrap_or_else(|| self.intent.default_action())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionContract {
    pub scope: String,
    pub kind: DisplayKind,
    pub hints: Vec<Hint>,
}

impl InteractionContract {
    pub fn new(scope: impl Into<String>, kind: DisplayKind, hints: Vec<Hint>) -> Self {
        Self {
            scope: scope.into(),
            kind,
            hints,
        }
    }

    /// Footer entries for this contract, in hint order.
    pub fn render_footer(&self, keys: &KeyRegistry) -> Vec<FooterHint> {
        self.hints
            .iter()
            .filter(|hint| !hint.omit)
            .filter_map(|hint| {
                let label = hint.label.as_deref()?;
                let key = keys.key_for(&self.scope, hint.resolved_action())?;
                Some(FooterHint {
                    key: display_key(key),
                    label: label.to_string(),
                })
            })
            .collect()
    }
}

/// A rendered `(key, label)` pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FooterHint {
    pub key: String,
    pub label: String,
}

#[derive(Clone, Debug, Default)]
pub struct ContractTable {
    contracts: HashMap<String, InteractionContract>,
}

impl ContractTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, contract: InteractionContract) -> Result<(), TableError> {
        if self.contracts.contains_key(&contract.scope) {
            return Err(TableError::DuplicateContract(contract.scope));
        }
        self.contracts.insert(contract.scope.clone(), contract);
        Ok(())
    }

    pub fn get(&self, scope: &str) -> Option<&InteractionContract> {
        self.contracts.get(scope)
    }

    pub fn render_footer(&self, scope: &str, keys: &KeyRegistry) -> Vec<FooterHint> {
        self.get(scope)
            .map(|contract| contract.render_footer(keys))
            .unwrap_or_default()
    }

    /// `(scope, intent)` pairs whose labeled hints currently have no key.
    pub fn audit(&self, keys: &KeyRegistry) -> Vec<(String, Intent)> {
        let mut missing: Vec<(String, Intent)> = self
            .contracts
            .values()
            .flat_map(|contract| {
                contract
                    .hints
                    .iter()
                    .filter(|hint| !hint.omit && hint.label.is_some())
                    .filter(|hint| keys.key_for(&contract.scope, hint.resolved_action()).is_none())
                    .map(|hint| (contract.scope.clone(), hint.intent))
            })
            .collect();
        missing.sort_by(|a, b| a.0.cmp(&b.0));
        missing
    }
}
