mod components;

pub use components::grid_columns;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Focus, Popup};
use crate::config::ThemeConfig;
use crate::controller::LoadState;
use crate::theme::Theme;
use components::{CARD_HEIGHT, product_card, product_detail};

// Theme is fixed for the life of the process
static THEME: OnceLock<Theme> = OnceLock::new();

/// Install the configured theme. Later calls are ignored.
pub fn init_theme(config: &ThemeConfig) {
    let _ = THEME.set(Theme::from_config(config));
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn header() -> Color { theme().header }

const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(3),   // Search field
            Constraint::Length(1),   // Stats
            Constraint::Length(1),   // Info line
            Constraint::Min(CARD_HEIGHT),
            Constraint::Length(1),   // Footer
        ])
        .split(area);

    draw_search_box(f, app, chunks[0]);
    draw_stats_line(f, app, chunks[1]);
    draw_info_line(f, app, chunks[2]);
    draw_products(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::Detail => draw_detail_popup(f, app),
    }
}

fn draw_search_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.focus == Focus::Search;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Search by SKU or name ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let line = if app.input.is_empty() && !is_active {
        Line::from(Span::styled("Press / to search", Style::default().fg(text_dim())))
    } else {
        Line::from(vec![
            Span::styled("󰍉 ", Style::default().fg(accent())),
            Span::styled(app.input.as_str(), Style::default().fg(text())),
        ])
    };

    f.render_widget(Paragraph::new(line).block(block), area);

    if is_active && app.popup == Popup::None {
        // 2 for the icon, 1 for the border
        let cursor_x = area.x + 3 + app.input.chars().count() as u16;
        f.set_cursor_position((cursor_x.min(area.right().saturating_sub(2)), area.y + 1));
    }
}

fn draw_stats_line(f: &mut Frame, app: &App, area: Rect) {
    let stats = app.inventory.surface().stats;
    let mut spans = vec![
        Span::styled(
            format!("Total Products: {}", stats.total),
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ),
        Span::styled("  │  ", Style::default().fg(text_dim())),
        Span::styled(
            format!("Low Stock Items: {}", stats.low_stock),
            Style::default().fg(theme().stock_low).add_modifier(Modifier::BOLD),
        ),
    ];
    if !app.inventory.term().trim().is_empty() {
        spans.push(Span::styled("  (filtered)", Style::default().fg(text_dim())));
    }

    f.render_widget(Paragraph::new(Line::from(spans)).alignment(Alignment::Center), area);
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: error > loading > status message > ready
    let surface = app.inventory.surface();
    let line = if let Some(ref error) = surface.error {
        Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
    } else if surface.loading {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        Line::from(vec![
            Span::styled(frame, Style::default().fg(accent())),
            Span::styled(" Loading inventory...", Style::default().fg(text_dim())),
        ])
    } else if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status.as_str(), Style::default().fg(accent())))
    } else {
        Line::from(Span::styled("Ready", Style::default().fg(text_dim())))
    };

    f.render_widget(Paragraph::new(line).alignment(Alignment::Center), area);
}

fn draw_products(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.focus == Focus::Grid;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Products ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let placeholder = match app.inventory.state() {
        LoadState::Uninitialized | LoadState::Loading => Some("Loading inventory..."),
        LoadState::Error(_) => Some("Inventory unavailable"),
        LoadState::Ready if app.cards().is_empty() => {
            Some("No products found matching your search.")
        }
        LoadState::Ready => None,
    };

    if let Some(text) = placeholder {
        let msg = Paragraph::new(text)
            .style(Style::default().fg(text_dim()))
            .alignment(Alignment::Center);
        f.render_widget(msg, inner);
        return;
    }

    let columns = app.grid_columns.max(1);
    let visible_rows = usize::from((inner.height / CARD_HEIGHT).max(1));

    // Keep the selected card's row on screen
    let selected_row = app.selected / columns;
    let first_row = (selected_row + 1).saturating_sub(visible_rows);

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    let cards = app.cards();
    for (row_idx, row_area) in row_areas.iter().enumerate() {
        let start = (first_row + row_idx) * columns;
        if start >= cards.len() {
            break;
        }

        let col_areas = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, columns as u32); columns])
            .split(*row_area);

        for (offset, card) in cards[start..].iter().take(columns).enumerate() {
            let index = start + offset;
            let selected = is_active && index == app.selected;
            f.render_widget(product_card(theme(), card, selected), col_areas[offset]);
        }
    }
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = match app.focus {
        Focus::Search => vec![
            ("type", "Filter"),
            ("Enter", "Search"),
            ("Esc", "Clear"),
            ("Tab", "Results"),
            ("Ctrl-C", "Quit"),
        ],
        Focus::Grid => vec![
            ("←↓↑→", "Nav"),
            ("Enter", "Details"),
            ("/", "Search"),
            ("?", "Help"),
            ("q", "Quit"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 3 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_detail_popup(f: &mut Frame, app: &App) {
    let Some(card) = app.selected_card() else {
        return;
    };

    let area = f.area();
    let popup_area = centered_rect(if area.width < 80 { 95 } else { 60 }, 60, area);

    f.render_widget(Clear, popup_area);
    f.render_widget(product_detail(theme(), card), popup_area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 60 },
        if area.height < 30 { 95 } else { 70 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            title,
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
    };
    let binding = |keys: &'static str, action: &'static str| {
        Line::from(vec![
            Span::styled(keys, Style::default().fg(accent())),
            Span::raw(action),
        ])
    };

    let help_text = vec![
        section("═══ Search ═══"),
        binding("  type      ", "Filter by SKU or name (case-insensitive)"),
        binding("  Enter     ", "Search and jump to results"),
        binding("  Esc       ", "Clear the search"),
        Line::from(""),
        section("═══ Results ═══"),
        binding("  ←↓↑→ hjkl ", "Move between cards"),
        binding("  Enter     ", "Show card details"),
        binding("  / Tab     ", "Back to search"),
        binding("  q         ", "Quit"),
        Line::from(""),
        section("═══ Stock ═══"),
        Line::from(vec![
            Span::styled("  0 low", Style::default().fg(theme().stock_low)),
            Span::raw("  "),
            Span::styled("1-5 medium", Style::default().fg(theme().stock_medium)),
            Span::raw("  "),
            Span::styled(">5 high", Style::default().fg(theme().stock_high)),
        ]),
        Line::from(Span::styled(
            "  Low Stock Items counts products with 5 or fewer in stock",
            Style::default().fg(text_dim()),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("?", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" sheetstock Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
