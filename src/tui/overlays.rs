//! Modal layers over the tabs, most-blocking first.
//!
//! The palette and command line run commands for whatever is underneath
//! them, so neither counts as a command context.

use tally_router::{Action, Direction, HandlerCtx, KeyInput, Outcome, OverlayEntry, OverlayTable};
use tracing::debug;

use super::app::{AppState, Effect};
use super::commands::AppOutcome;
use super::help::help_lines;
use crate::error::Result;

type Ctx<'a> = HandlerCtx<'a, AppState, Effect>;

const HELP_PAGE: usize = 10;

/// The overlay table.
///
/// Command context differs from footer scope for the palette and the
/// command line alike. Both are launchers: they take their own keys and
/// footer, but the commands they run belong to the view underneath, so a
/// command scoped to `transactions` runs from either one.
pub fn build_overlays() -> Result<OverlayTable<AppState, Effect>> {
    let table = OverlayTable::new(vec![
        OverlayEntry::new("notice", "notice", |s: &AppState| s.notice.is_some(), notice),
        OverlayEntry::new("help", "help", |s: &AppState| s.help, help),
        OverlayEntry::new("palette", "palette", |s: &AppState| s.palette.is_some(), palette)
            .without_command_context(),
        OverlayEntry::new("command_line", "command_line", |s: &AppState| s.command_line.is_some(), command_line)
            .without_command_context(),
        OverlayEntry::new("detail", "detail", |s: &AppState| s.detail.is_some(), detail),
        OverlayEntry::new("search", "search", |s: &AppState| s.search.is_some(), search),
        OverlayEntry::new("filter_name", "filter_name", |s: &AppState| s.filter_name.is_some(), filter_name),
    ])?;
    Ok(table)
}

/// Run a command picked from the palette or command line and remember it.
fn run_picked(state: AppState, ctx: &Ctx<'_>, id: &str) -> AppOutcome {
    let mut outcome = ctx.execute(id, state);
    if outcome.is_ok() {
        outcome.state.last_command = Some(id.to_string());
    }
    outcome
}

fn notice(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    if matches!(ctx.action(), Some(Action::Confirm | Action::Cancel)) {
        state.notice = None;
    }
    Outcome::ok(state)
}

fn help(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    let last = help_lines(ctx.keys).len().saturating_sub(1);
    match ctx.action() {
        Some(Action::Cancel) => state.help = false,
        Some(Action::Down) => state.help_scroll = (state.help_scroll + 1).min(last),
        Some(Action::Up) => state.help_scroll = state.help_scroll.saturating_sub(1),
        Some(Action::PageDown) => state.help_scroll = (state.help_scroll + HELP_PAGE).min(last),
        Some(Action::PageUp) => state.help_scroll = state.help_scroll.saturating_sub(HELP_PAGE),
        Some(Action::Top) => state.help_scroll = 0,
        Some(Action::Bottom) => state.help_scroll = last,
        _ => {}
    }
    Outcome::ok(state)
}

fn palette(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    let Some(mut palette) = state.palette.take() else {
        return Outcome::ok(state);
    };
    if palette.query.edit_key(ctx.key) {
        palette.selected = 0;
        state.palette = Some(palette);
        return Outcome::ok(state);
    }

    match ctx.classify() {
        KeyInput::Text(ch) => {
            palette.query.insert(ch);
            palette.selected = 0;
        }
        KeyInput::Caret(dir) => palette.query.move_caret(dir),
        KeyInput::Navigate(Direction::Down) => {
            let count = ctx
                .commands
                .search(palette.query.text(), ctx.context, &state, state.last_command.as_deref())
                .len();
            palette.selected = (palette.selected + 1).min(count.saturating_sub(1));
        }
        KeyInput::Navigate(Direction::Up) => palette.selected = palette.selected.saturating_sub(1),
        KeyInput::Action(Action::Confirm) => {
            let picked = ctx
                .commands
                .search(palette.query.text(), ctx.context, &state, state.last_command.as_deref())
                .get(palette.selected)
                .map(|m| m.command.id.clone());
            if let Some(id) = picked {
                debug!(command = %id, scope = ctx.context, "palette pick");
                return run_picked(state, ctx, &id);
            }
        }
        KeyInput::Action(Action::Cancel) => return Outcome::ok(state),
        _ => {}
    }
    state.palette = Some(palette);
    Outcome::ok(state)
}

fn command_line(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    let Some(mut field) = state.command_line.take() else {
        return Outcome::ok(state);
    };
    if field.edit_key(ctx.key) {
        state.command_line = Some(field);
        return Outcome::ok(state);
    }

    match ctx.classify() {
        KeyInput::Text(ch) => field.insert(ch),
        KeyInput::Caret(dir) => field.move_caret(dir),
        KeyInput::Action(Action::Confirm) => {
            let typed = field.text().trim().to_string();
            if typed.is_empty() {
                return Outcome::ok(state);
            }
            // An exact id runs as typed; anything else runs the best
            // enabled match.
            let id = if ctx.commands.get(&typed).is_some() {
                Some(typed.clone())
            } else {
                ctx.commands
                    .search(&typed, ctx.context, &state, state.last_command.as_deref())
                    .into_iter()
                    .find(|m| m.enabled)
                    .map(|m| m.command.id.clone())
            };
            return match id {
                Some(id) => run_picked(state, ctx, &id),
                None => Outcome::fail(state, format!("No command matches '{typed}'")),
            };
        }
        KeyInput::Action(Action::Cancel) => return Outcome::ok(state),
        _ => {}
    }
    state.command_line = Some(field);
    Outcome::ok(state)
}

fn detail(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    match ctx.action() {
        Some(Action::Cancel) => {
            state.detail = None;
            state.confirm.reset();
        }
        Some(Action::Delete) => return ctx.execute("txn:delete", state),
        Some(Action::Down) => step_detail(&mut state, true),
        Some(Action::Up) => step_detail(&mut state, false),
        _ => {}
    }
    Outcome::ok(state)
}

/// Show the next or previous visible transaction, keeping the list
/// selection in step.
fn step_detail(state: &mut AppState, forward: bool) {
    let ids = state.visible_ids();
    let Some(pos) = state.detail.and_then(|id| ids.iter().position(|v| *v == id)) else {
        return;
    };
    let next = if forward {
        (pos + 1).min(ids.len().saturating_sub(1))
    } else {
        pos.saturating_sub(1)
    };
    if next != pos {
        state.confirm.reset();
    }
    state.selected = next;
    state.detail = ids.get(next).copied();
}

fn search(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    let Some(mut search) = state.search.take() else {
        return Outcome::ok(state);
    };
    let edited = search.query.edit_key(ctx.key)
        || match ctx.classify() {
            KeyInput::Text(ch) => {
                search.query.insert(ch);
                true
            }
            KeyInput::Caret(dir) => {
                search.query.move_caret(dir);
                false
            }
            KeyInput::Action(Action::Confirm) => {
                let kept = state.active_filter.clone();
                match kept {
                    Some(query) => state.info(format!("Filter: {query}")),
                    None => state.info("Filter cleared"),
                }
                return Outcome::ok(state);
            }
            KeyInput::Action(Action::Cancel) => {
                state.set_filter(search.previous);
                return Outcome::ok(state);
            }
            _ => false,
        };
    if edited {
        state.set_filter(Some(search.query.text().to_string()));
    }
    state.search = Some(search);
    Outcome::ok(state)
}

fn filter_name(mut state: AppState, ctx: &Ctx<'_>) -> AppOutcome {
    let Some(mut field) = state.filter_name.take() else {
        return Outcome::ok(state);
    };
    if field.edit_key(ctx.key) {
        state.filter_name = Some(field);
        return Outcome::ok(state);
    }

    match ctx.classify() {
        KeyInput::Text(ch) => field.insert(ch),
        KeyInput::Action(Action::Confirm) => {
            let name = field.text().trim().to_string();
            let Some(query) = state.active_filter.clone() else {
                return Outcome::fail(state, "No filter is active.");
            };
            if name.is_empty() {
                state.filter_name = Some(field);
                return Outcome::fail(state, "Filter name cannot be empty");
            }
            state.ledger.save_filter(&name, &query);
            state.info(format!("Saved filter '{name}'"));
            return Outcome::with_effect(state, Effect::FiltersChanged);
        }
        KeyInput::Action(Action::Cancel) => return Outcome::ok(state),
        _ => {}
    }
    state.filter_name = Some(field);
    Outcome::ok(state)
}
