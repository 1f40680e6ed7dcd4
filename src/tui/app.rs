//! Application state.
//!
//! `AppState` is a plain value. Every key, timeout or task result takes the
//! current value and produces the next one; nothing else holds a reference
//! to it.

use tally_router::{ArmTicket, ConfirmGate, TextEditing, TextField};

use crate::ledger::Ledger;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Dashboard,
    Transactions,
    Budget,
    Rules,
    Settings,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Dashboard, Tab::Transactions, Tab::Budget, Tab::Rules, Tab::Settings];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Dashboard => "Dashboard",
            Tab::Transactions => "Transactions",
            Tab::Budget => "Budget",
            Tab::Rules => "Rules",
            Tab::Settings => "Settings",
        }
    }

    /// Whether the tab can be switched to.
    pub fn available(self) -> bool {
        self != Tab::Budget
    }

    fn index(self) -> usize {
        Tab::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    /// Next available tab, wrapping.
    pub fn cycle(self, forward: bool) -> Tab {
        let len = Tab::ALL.len();
        let mut idx = self.index();
        for _ in 0..len {
            idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
            if Tab::ALL[idx].available() {
                return Tab::ALL[idx];
            }
        }
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsPane {
    General,
    Keybindings,
}

impl SettingsPane {
    pub fn name(self) -> &'static str {
        match self {
            SettingsPane::General => "general",
            SettingsPane::Keybindings => "keybindings",
        }
    }

    pub fn next(self) -> Self {
        match self {
            SettingsPane::General => SettingsPane::Keybindings,
            SettingsPane::Keybindings => SettingsPane::General,
        }
    }
}

/// Destructive operations guarded by a second key press.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pending {
    DeleteTransaction,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub error: bool,
}

/// A full-screen message that must be acknowledged.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub lines: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaletteState {
    pub query: TextField,
    pub selected: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchState {
    pub query: TextField,
    /// Filter to restore if the search is cancelled.
    pub previous: Option<String>,
}

/// Host effects requested by commands and overlays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Quit,
    ReloadKeybindings,
    /// Saved filters changed: rebuild their commands and persist them.
    FiltersChanged,
    /// Schedule the timeout for a two-key confirmation.
    ArmConfirm(ArmTicket),
}

#[derive(Clone, Debug)]
pub struct AppState {
    pub ledger: Ledger,
    pub tab: Tab,
    pub settings_pane: SettingsPane,
    /// Row in the filtered transaction list.
    pub selected: usize,
    pub rule_selected: usize,
    pub active_filter: Option<String>,
    pub status: Option<Status>,
    pub last_command: Option<String>,
    pub confirm: ConfirmGate<Pending>,
    pub keybindings_path: String,

    pub notice: Option<Notice>,
    pub help: bool,
    pub help_scroll: usize,
    pub palette: Option<PaletteState>,
    pub command_line: Option<TextField>,
    /// Id of the transaction shown in the detail view.
    pub detail: Option<u32>,
    pub search: Option<SearchState>,
    pub filter_name: Option<TextField>,
}

impl AppState {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger,
            tab: Tab::Dashboard,
            settings_pane: SettingsPane::General,
            selected: 0,
            rule_selected: 0,
            active_filter: None,
            status: None,
            last_command: None,
            confirm: ConfirmGate::default(),
            keybindings_path: String::new(),
            notice: None,
            help: false,
            help_scroll: 0,
            palette: None,
            command_line: None,
            detail: None,
            search: None,
            filter_name: None,
        }
    }

    /// Scope of the base view: the tab, plus the active pane for settings.
    pub fn tab_scope(&self) -> String {
        match self.tab {
            Tab::Dashboard => "dashboard".to_string(),
            Tab::Transactions => "transactions".to_string(),
            Tab::Budget => "budget".to_string(),
            Tab::Rules => "rules".to_string(),
            Tab::Settings => format!("settings.{}", self.settings_pane.name()),
        }
    }

    pub fn visible_ids(&self) -> Vec<u32> {
        self.ledger
            .filtered(self.active_filter.as_deref())
            .map(|t| t.id)
            .collect()
    }

    pub fn selected_id(&self) -> Option<u32> {
        self.visible_ids().get(self.selected).copied()
    }

    /// Keep the selection inside the filtered list.
    pub fn clamp_selection(&mut self) {
        let len = self.visible_ids().len();
        self.selected = self.selected.min(len.saturating_sub(1));
    }

    pub fn set_filter(&mut self, query: Option<String>) {
        self.active_filter = query.filter(|q| !q.trim().is_empty());
        self.selected = 0;
        self.confirm.reset();
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: false,
        });
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            error: true,
        });
    }

    pub fn open_palette(&mut self) {
        self.palette = Some(PaletteState {
            query: TextField::new(TextEditing::CaretAware),
            selected: 0,
        });
    }

    pub fn open_command_line(&mut self) {
        self.command_line = Some(TextField::new(TextEditing::CaretAware));
    }

    pub fn open_search(&mut self) {
        let previous = self.active_filter.clone();
        let query = TextField::with_text(TextEditing::CaretAware, previous.as_deref().unwrap_or(""));
        self.search = Some(SearchState { query, previous });
    }
}
