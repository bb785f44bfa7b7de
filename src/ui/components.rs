//! Product card widgets shared by the grid and the detail popup

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::controller::{ImageRef, ProductCard};
use crate::theme::Theme;

/// Rows a card occupies, borders included
pub const CARD_HEIGHT: u16 = 9;
/// Narrowest a card column may get
pub const CARD_MIN_WIDTH: u16 = 30;

fn detail_row<'a>(theme: &Theme, label: &'a str, value: Span<'a>) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(theme.text_dim)),
        Span::raw(" "),
        value,
    ])
}

fn image_span<'a>(theme: &Theme, image: &'a ImageRef) -> Span<'a> {
    match image {
        ImageRef::Url(url) => Span::styled(url.as_str(), Style::default().fg(theme.text)),
        ImageRef::Placeholder(label) => Span::styled(
            format!("[{}]", label),
            Style::default().fg(theme.text_dim).add_modifier(Modifier::ITALIC),
        ),
    }
}

fn stock_span<'a>(theme: &Theme, card: &ProductCard) -> Span<'a> {
    Span::styled(
        card.current_stock.to_string(),
        Style::default()
            .fg(theme.stock_color(card.stock_level))
            .add_modifier(Modifier::BOLD),
    )
}

fn card_lines<'a>(theme: &Theme, card: &'a ProductCard) -> Vec<Line<'a>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("SKU: {}", card.sku),
            Style::default().fg(theme.text_dim),
        )),
        Line::from(Span::styled(
            card.name.as_str(),
            Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        )),
        detail_row(theme, "Image:", image_span(theme, &card.image)),
        detail_row(theme, "Current Stock:", stock_span(theme, card)),
        detail_row(
            theme,
            "Incoming Stock:",
            Span::styled(card.incoming_stock.to_string(), Style::default().fg(theme.text)),
        ),
        detail_row(
            theme,
            "Total Available:",
            Span::styled(card.total_available.to_string(), Style::default().fg(theme.text)),
        ),
    ];

    if let Some(link) = &card.link {
        lines.push(Line::from(Span::styled(
            link.as_str(),
            Style::default().fg(theme.accent).add_modifier(Modifier::UNDERLINED),
        )));
    }

    lines
}

/// Compact card for the grid
pub fn product_card<'a>(theme: &Theme, card: &'a ProductCard, selected: bool) -> Paragraph<'a> {
    let border_color = if selected { theme.accent } else { theme.inactive };
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    if selected {
        block = block.style(Style::default().bg(theme.bg_selected));
    }

    Paragraph::new(card_lines(theme, card)).block(block)
}

/// Full card for the detail popup, wraps long values
pub fn product_detail<'a>(theme: &Theme, card: &'a ProductCard) -> Paragraph<'a> {
    let mut lines = card_lines(theme, card);
    lines.push(Line::from(""));
    lines.push(detail_row(
        theme,
        "Stock level:",
        Span::styled(
            card.stock_level.as_str(),
            Style::default().fg(theme.stock_color(card.stock_level)),
        ),
    ));

    Paragraph::new(lines)
        .block(
            Block::default()
                .title(Span::styled(
                    format!(" {} ", card.sku),
                    Style::default().fg(theme.accent),
                ))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false })
}

/// How many card columns fit in `width`
pub fn grid_columns(width: u16) -> usize {
    usize::from((width / CARD_MIN_WIDTH).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::StockLevel;

    #[test]
    fn test_grid_columns() {
        assert_eq!(grid_columns(0), 1);
        assert_eq!(grid_columns(29), 1);
        assert_eq!(grid_columns(60), 2);
        assert_eq!(grid_columns(125), 4);
    }

    #[test]
    fn test_card_lines_include_link_only_when_present() {
        let theme = Theme::default();
        let mut card = ProductCard {
            sku: "SKU1".to_string(),
            name: "Widget".to_string(),
            image: ImageRef::Placeholder("No Image".to_string()),
            current_stock: 3,
            stock_level: StockLevel::Medium,
            incoming_stock: 2,
            total_available: 5,
            link: None,
        };
        assert_eq!(card_lines(&theme, &card).len(), 6);

        card.link = Some("http://x".to_string());
        let lines = card_lines(&theme, &card);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[5].to_string(), "Total Available: 5");
    }
}
