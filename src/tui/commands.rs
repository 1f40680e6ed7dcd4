//! Commands offered by the palette, the command line and command-bound keys.

use std::time::Instant;

use tally_router::{
    Availability, Command, CommandRegistry, Outcome, Press, TextEditing, TextField, generated_id,
};

use super::app::{AppState, Effect, Pending, Tab};
use crate::error::Result;
use crate::ledger::SavedFilter;

pub type AppCommand = Command<AppState, Effect>;
pub type AppOutcome = Outcome<AppState, Effect>;

/// Group name for the per-filter commands.
pub const FILTER_GROUP: &str = "saved_filters";

const BUDGET_UNAVAILABLE: &str = "Budget tab is not available yet.";

pub fn build_commands(filters: &[SavedFilter]) -> Result<CommandRegistry<AppState, Effect>> {
    let mut commands = CommandRegistry::new();
    for command in static_commands() {
        commands.register(command)?;
    }
    commands.replace_generated(FILTER_GROUP, filter_commands(filters));
    Ok(commands)
}

fn goto(tab: Tab) -> impl Fn(AppState) -> AppOutcome {
    move |mut state: AppState| {
        state.tab = tab;
        state.confirm.reset();
        Outcome::ok(state)
    }
}

fn static_commands() -> Vec<AppCommand> {
    vec![
        Command::new("nav:dashboard", "Go to dashboard", goto(Tab::Dashboard))
            .category("Navigation")
            .global(),
        Command::new("nav:transactions", "Go to transactions", goto(Tab::Transactions))
            .category("Navigation")
            .global(),
        Command::new("nav:budget", "Go to budget", goto(Tab::Budget))
            .category("Navigation")
            .global()
            .enabled_when(|_| Availability::Disabled(BUDGET_UNAVAILABLE.to_string())),
        Command::new("nav:rules", "Go to rules", goto(Tab::Rules))
            .category("Navigation")
            .global(),
        Command::new("nav:settings", "Go to settings", goto(Tab::Settings))
            .category("Navigation")
            .global(),
        Command::new("app:quit", "Quit", |state| Outcome::with_effect(state, Effect::Quit))
            .category("Application")
            .description("Exit tally")
            .global(),
        Command::new("app:help", "Show keybindings", |mut state: AppState| {
            state.help = true;
            state.help_scroll = 0;
            Outcome::ok(state)
        })
        .category("Application")
        .description("List every key bound in every scope")
        .global(),
        Command::new("keys:reload", "Reload keybindings", |state| {
            Outcome::with_effect(state, Effect::ReloadKeybindings)
        })
        .category("Application")
        .description("Re-read the keybinding file")
        .global(),
        Command::new("filter:open", "Search transactions", |mut state: AppState| {
            state.open_search();
            Outcome::ok(state)
        })
        .category("Transactions")
        .scopes(&["transactions"]),
        Command::new("filter:clear", "Clear filter", |mut state: AppState| {
            state.set_filter(None);
            state.info("Filter cleared");
            Outcome::ok(state)
        })
        .category("Transactions")
        .scopes(&["transactions"])
        .enabled_when(|state: &AppState| Availability::when(state.active_filter.is_some(), "No filter is active.")),
        Command::new("filter:save", "Save current filter", |mut state: AppState| {
            state.filter_name = Some(TextField::new(TextEditing::AppendOnly));
            Outcome::ok(state)
        })
        .category("Transactions")
        .description("Name the active filter so it can be applied from the palette")
        .scopes(&["transactions"])
        .enabled_when(|state: &AppState| Availability::when(state.active_filter.is_some(), "No filter is active.")),
        Command::new("txn:delete", "Delete transaction", delete_transaction)
            .category("Transactions")
            .description("Press twice to confirm")
            .scopes(&["transactions", "detail"])
            .enabled_when(|state: &AppState| {
                Availability::when(target_transaction(state).is_some(), "No transaction selected.")
            }),
    ]
}

/// The transaction a delete applies to: the open detail view, else the
/// selected row.
fn target_transaction(state: &AppState) -> Option<u32> {
    state.detail.or_else(|| state.selected_id())
}

fn delete_transaction(mut state: AppState) -> AppOutcome {
    let Some(id) = target_transaction(&state) else {
        return Outcome::fail(state, "No transaction selected.");
    };
    let target = id.to_string();
    match state.confirm.press(Pending::DeleteTransaction, &target, Instant::now()) {
        Press::Confirmed => match state.ledger.delete(id) {
            Some(txn) => {
                state.detail = None;
                state.clamp_selection();
                state.info(format!("Deleted {} ({})", txn.payee, txn.date));
                Outcome::ok(state)
            }
            None => Outcome::fail(state, format!("Transaction {id} no longer exists")),
        },
        Press::Armed(ticket) => {
            let payee = state.ledger.get(id).map(|t| t.payee.clone()).unwrap_or_default();
            state.info(format!("Delete {payee}? Press again to confirm."));
            Outcome::with_effect(state, Effect::ArmConfirm(ticket))
        }
    }
}

/// One command per saved filter, each closing over its own copy.
pub fn filter_commands(filters: &[SavedFilter]) -> Vec<AppCommand> {
    filters
        .iter()
        .map(|filter| {
            let snapshot = filter.clone();
            Command::new(
                generated_id("filter:apply", &filter.key),
                format!("Apply filter: {}", filter.key),
                move |mut state: AppState| {
                    state.tab = Tab::Transactions;
                    state.set_filter(Some(snapshot.query.clone()));
                    state.info(format!("Filter '{}' applied", snapshot.key));
                    Outcome::ok(state)
                },
            )
            .category("Saved filters")
            .description(filter.query.clone())
            .global()
        })
        .collect()
}
