//! UI rendering

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Tabs, Wrap},
};
use tally_router::{Action, Router, TextField, display_key};

use super::app::{AppState, Effect, SettingsPane, Tab};
use super::help::help_lines;
use crate::ledger::format_cents;

pub(crate) const TABS_HEIGHT: u16 = 3;
pub(crate) const BODY_MIN_HEIGHT: u16 = 6;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const FOOTER_HEIGHT: u16 = 1;

type AppRouter = Router<AppState, Effect>;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 4] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TABS_HEIGHT),
            Constraint::Min(BODY_MIN_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2], chunks[3]]
}

/// Draw the application UI
pub fn draw(f: &mut Frame, state: &AppState, router: &AppRouter) {
    let [tabs, body, status, footer] = split_main_chunks(f.area());

    draw_tabs(f, state, tabs);
    match state.tab {
        Tab::Dashboard => draw_dashboard(f, state, body),
        Tab::Transactions => draw_transactions(f, state, body),
        Tab::Budget => draw_placeholder(f, body),
        Tab::Rules => draw_rules(f, state, body),
        Tab::Settings => draw_settings(f, state, router, body),
    }
    draw_status_bar(f, state, status);
    draw_footer(f, state, router, footer);

    for name in overlay_layers(state, router) {
        draw_overlay(f, state, router, name, body);
    }
}

/// Open overlays in paint order: least blocking first, so the layer that
/// owns the keyboard ends up on top.
fn overlay_layers<'r>(state: &AppState, router: &'r AppRouter) -> Vec<&'r str> {
    router
        .overlays()
        .entries()
        .iter()
        .rev()
        .filter(|entry| entry.is_active(state))
        .map(|entry| entry.name.as_str())
        .collect()
}

fn draw_overlay(f: &mut Frame, state: &AppState, router: &AppRouter, name: &str, body: Rect) {
    match name {
        "notice" => draw_notice(f, state),
        "help" => draw_help_modal(f, state, router),
        "palette" => draw_palette(f, state, router),
        "detail" => {
            if let Some(id) = state.detail {
                draw_detail_modal(f, state, router, id);
            }
        }
        "command_line" | "search" | "filter_name" => draw_prompt(f, state, name, body),
        _ => {}
    }
}

fn draw_tabs(f: &mut Frame, state: &AppState, area: Rect) {
    let titles: Vec<Line> = Tab::ALL
        .iter()
        .map(|tab| {
            let style = if tab.available() {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            Line::from(Span::styled(tab.title(), style))
        })
        .collect();
    let selected = Tab::ALL.iter().position(|t| *t == state.tab).unwrap_or(0);
    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(" Tally "))
        .select(selected)
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, area);
}

fn draw_dashboard(f: &mut Frame, state: &AppState, area: Rect) {
    let ledger = &state.ledger;
    let mut lines = vec![
        Line::from(vec![
            Span::styled("Balance: ", Style::default().fg(Color::Yellow)),
            Span::raw(format_cents(ledger.balance_cents())),
        ]),
        Line::from(format!("Transactions: {}", ledger.transactions.len())),
        Line::from(""),
        Line::from(Span::styled(
            "Spending by category",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )),
    ];
    for (category, total) in ledger.spending_by_category() {
        lines.push(Line::from(format!("  {:<16}{:>12}", category, format_cents(total))));
    }
    let block = Block::default().borders(Borders::ALL).title(" Dashboard ");
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_transactions(f: &mut Frame, state: &AppState, area: Rect) {
    let header = Row::new(["Date", "Payee", "Category", "Amount"])
        .style(Style::default().fg(Color::DarkGray))
        .height(1);
    let rows: Vec<Row> = state
        .ledger
        .filtered(state.active_filter.as_deref())
        .map(|txn| {
            let amount_style = if txn.amount_cents < 0 {
                Style::default().fg(Color::Red)
            } else {
                Style::default().fg(Color::Green)
            };
            Row::new(vec![
                Cell::from(txn.date.clone()),
                Cell::from(txn.payee.clone()),
                Cell::from(txn.category.clone()),
                Cell::from(format_cents(txn.amount_cents)).style(amount_style),
            ])
        })
        .collect();
    let title = match &state.active_filter {
        Some(query) => format!(" Transactions [{query}] "),
        None => " Transactions ".to_string(),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(16),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(Block::default().borders(Borders::ALL).title(title))
    .row_highlight_style(Style::default().fg(Color::Black).bg(Color::White));
    let mut table_state = TableState::default().with_selected(Some(state.selected));
    f.render_stateful_widget(table, area, &mut table_state);
}

fn draw_placeholder(f: &mut Frame, area: Rect) {
    let paragraph = Paragraph::new("Budget tab is not available yet.")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title(" Budget "));
    f.render_widget(paragraph, area);
}

fn draw_rules(f: &mut Frame, state: &AppState, area: Rect) {
    let items: Vec<ListItem> = state
        .ledger
        .rules
        .iter()
        .map(|rule| ListItem::new(format!("payee contains '{}'  ->  {}", rule.pattern, rule.category)))
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Rules "))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White));
    let mut list_state = ListState::default().with_selected(Some(state.rule_selected));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_settings(f: &mut Frame, state: &AppState, router: &AppRouter, area: Rect) {
    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let border = |pane: SettingsPane| {
        if state.settings_pane == pane {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    };

    let general = Paragraph::new(vec![
        Line::from(format!("Saved filters: {}", state.ledger.filters.len())),
        Line::from(format!("Rules: {}", state.ledger.rules.len())),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" General ")
            .border_style(border(SettingsPane::General)),
    );
    f.render_widget(general, panes[0]);

    let keys = router.keys();
    let reload = keys
        .key_for("settings.keybindings", Action::Apply)
        .map(display_key)
        .unwrap_or_else(|| "(unbound)".to_string());
    let keybindings = Paragraph::new(vec![
        Line::from(format!("File: {}", state.keybindings_path)),
        Line::from(format!("Scopes: {}", keys.scopes().len())),
        Line::from(format!("Bindings: {}", keys.bindings().len())),
        Line::from(""),
        Line::from(format!("Edit the file, then press {reload} here to reload it.")),
    ])
    .wrap(Wrap { trim: false })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Keybindings ")
            .border_style(border(SettingsPane::Keybindings)),
    );
    f.render_widget(keybindings, panes[1]);
}

fn draw_status_bar(f: &mut Frame, state: &AppState, area: Rect) {
    let (text, style) = match &state.status {
        Some(status) if status.error => (status.text.clone(), Style::default().fg(Color::Red)),
        Some(status) => (status.text.clone(), Style::default().fg(Color::Yellow)),
        None => (
            format!("{} transactions", state.visible_ids().len()),
            Style::default().fg(Color::DarkGray),
        ),
    };
    f.render_widget(Paragraph::new(Line::from(Span::styled(text, style))), area);
}

fn draw_footer(f: &mut Frame, state: &AppState, router: &AppRouter, area: Rect) {
    let mut spans = Vec::new();
    for hint in router.footer(state) {
        if !spans.is_empty() {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            hint.key,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(format!(" {}", hint.label), Style::default().fg(Color::DarkGray)));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Text with a bar at the caret.
fn with_caret(field: &TextField) -> String {
    let (before, after) = field.text().split_at(field.caret());
    format!("{before}│{after}")
}

/// One-line input box along the bottom of the body.
fn draw_prompt(f: &mut Frame, state: &AppState, name: &str, body: Rect) {
    let (title, content, color) = match name {
        "command_line" => match &state.command_line {
            Some(field) => (" Command ", format!(":{}", with_caret(field)), Color::Cyan),
            None => return,
        },
        "search" => match &state.search {
            Some(search) => (" Search ", format!("/{}", with_caret(&search.query)), Color::Yellow),
            None => return,
        },
        _ => match &state.filter_name {
            Some(field) => (" Save filter as ", with_caret(field), Color::Magenta),
            None => return,
        },
    };
    let height = 3.min(body.height);
    let area = Rect::new(body.x, body.y + body.height - height, body.width, height);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(color));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(content).block(block), area);
}

fn draw_detail_modal(f: &mut Frame, state: &AppState, router: &AppRouter, id: u32) {
    let area = centered_rect(60, 40, f.area());
    let Some(txn) = state.ledger.get(id) else {
        return;
    };
    let label = Style::default().fg(Color::Yellow);
    let mut lines = vec![
        Line::from(vec![Span::styled("Date      ", label), Span::raw(txn.date.clone())]),
        Line::from(vec![Span::styled("Payee     ", label), Span::raw(txn.payee.clone())]),
        Line::from(vec![Span::styled("Category  ", label), Span::raw(txn.category.clone())]),
        Line::from(vec![Span::styled("Amount    ", label), Span::raw(format_cents(txn.amount_cents))]),
    ];
    if state.confirm.is_armed() {
        let key = router
            .keys()
            .key_for("detail", Action::Delete)
            .map(display_key)
            .unwrap_or_default();
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Press {key} again to delete"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Transaction {id} "))
        .border_style(Style::default().fg(Color::Green))
        .style(Style::default().fg(Color::White).bg(Color::Black));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_palette(f: &mut Frame, state: &AppState, router: &AppRouter) {
    let Some(palette) = &state.palette else {
        return;
    };
    let area = centered_rect(70, 60, f.area());
    let modal_style = Style::default().fg(Color::White).bg(Color::Black);
    f.render_widget(Clear, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let input = Paragraph::new(format!("> {}", with_caret(&palette.query))).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Commands ")
            .border_style(Style::default().fg(Color::Cyan))
            .style(modal_style),
    );
    f.render_widget(input, chunks[0]);

    let matches = router.search(palette.query.text(), state, state.last_command.as_deref());
    let items: Vec<ListItem> = matches
        .iter()
        .map(|m| {
            let mut spans = vec![Span::raw(m.command.label.clone())];
            match (&m.reason, m.enabled) {
                (Some(reason), false) => {
                    spans.push(Span::styled(format!("  {reason}"), Style::default().fg(Color::DarkGray)));
                }
                _ => spans.push(Span::styled(
                    format!("  {}", m.command.id),
                    Style::default().fg(Color::DarkGray),
                )),
            }
            let style = if m.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM)
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).style(modal_style))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::Cyan));
    let mut list_state = ListState::default().with_selected(Some(palette.selected));
    f.render_stateful_widget(list, chunks[1], &mut list_state);
}

fn draw_help_modal(f: &mut Frame, state: &AppState, router: &AppRouter) {
    let area = centered_rect(88, 88, f.area());

    let modal_style = Style::default().fg(Color::White).bg(Color::Black);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Keybindings ")
        .border_style(Style::default().fg(Color::Green))
        .style(modal_style);

    let lines: Vec<Line> = help_lines(router.keys())
        .into_iter()
        .map(|text| {
            let style = if text.starts_with("  ") {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            };
            Line::from(Span::styled(text, style))
        })
        .collect();

    let viewport_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let effective_scroll = state.help_scroll.min(max_scroll);
    let scroll_y = u16::try_from(effective_scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(modal_style)
        .scroll((scroll_y, 0))
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

/// Takes over everything above the footer until dismissed.
fn draw_notice(f: &mut Frame, state: &AppState) {
    let Some(notice) = &state.notice else {
        return;
    };
    let full = f.area();
    let area = Rect::new(full.x, full.y, full.width, full.height.saturating_sub(FOOTER_HEIGHT));
    let mut lines: Vec<Line> = notice.lines.iter().map(|l| Line::from(l.clone())).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Press Enter to continue",
        Style::default().fg(Color::DarkGray),
    )));
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", notice.title))
        .border_style(Style::default().fg(Color::Red));
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(lines).block(block).wrap(Wrap { trim: false }), area);
}
