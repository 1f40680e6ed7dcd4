use tally_router::Action;

use super::app::{AppState, Tab};

/// Rows moved by a page key.
const PAGE_ROWS: usize = 10;

/// Apply an action no overlay or command claimed.
///
/// These are the tab-level gestures: moving between tabs and panes, moving
/// the list selection and opening the palette or command line.
pub fn apply_action(mut state: AppState, action: Action) -> AppState {
    match action {
        Action::NextTab | Action::PrevTab => {
            state.tab = state.tab.cycle(action == Action::NextTab);
            state.confirm.reset();
        }
        Action::NextPane if state.tab == Tab::Settings => {
            state.settings_pane = state.settings_pane.next();
        }
        Action::Palette => state.open_palette(),
        Action::CommandLine => state.open_command_line(),
        Action::Confirm if state.tab == Tab::Transactions => {
            state.detail = state.selected_id();
        }
        Action::Cancel if state.tab == Tab::Transactions && state.active_filter.is_some() => {
            state.set_filter(None);
            state.info("Filter cleared");
        }
        Action::Cancel => {
            state.status = None;
            state.confirm.reset();
        }
        Action::Up | Action::Down | Action::PageUp | Action::PageDown | Action::Top | Action::Bottom => {
            move_selection(&mut state, action);
        }
        _ => {}
    }
    state
}

fn move_selection(state: &mut AppState, action: Action) {
    let (current, len) = match state.tab {
        Tab::Transactions => (state.selected, state.visible_ids().len()),
        Tab::Rules => (state.rule_selected, state.ledger.rules.len()),
        _ => return,
    };
    let last = len.saturating_sub(1);
    let next = match action {
        Action::Up => current.saturating_sub(1),
        Action::Down => (current + 1).min(last),
        Action::PageUp => current.saturating_sub(PAGE_ROWS),
        Action::PageDown => (current + PAGE_ROWS).min(last),
        Action::Top => 0,
        Action::Bottom => last,
        _ => current,
    };
    match state.tab {
        Tab::Transactions => {
            // A pending delete belongs to the row it was armed on.
            if next != current {
                state.confirm.reset();
            }
            state.selected = next;
        }
        _ => state.rule_selected = next,
    }
}
