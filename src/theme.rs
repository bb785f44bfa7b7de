//! Theme colors, with optional hex overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;
use crate::inventory::StockLevel;

/// Theme colors for the UI
#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,           // Focused borders, key hints
    pub danger: Color,           // Error banner
    pub text: Color,             // Primary text
    pub text_dim: Color,         // Labels, placeholders
    pub bg_selected: Color,      // Selected card background
    pub inactive: Color,         // Unfocused borders
    pub header: Color,           // Stats and section titles
    pub stock_low: Color,
    pub stock_medium: Color,
    pub stock_high: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired
        Self {
            accent: Color::Rgb(250, 179, 135),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            bg_selected: Color::Rgb(69, 71, 90),
            inactive: Color::Rgb(88, 91, 112),
            header: Color::Rgb(137, 180, 250),
            stock_low: Color::Rgb(243, 139, 168),
            stock_medium: Color::Rgb(249, 226, 175),
            stock_high: Color::Rgb(166, 218, 149),
        }
    }
}

impl Theme {
    /// Defaults with any valid config overrides applied
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            (&config.accent, &mut theme.accent),
            (&config.text, &mut theme.text),
            (&config.text_dim, &mut theme.text_dim),
            (&config.danger, &mut theme.danger),
            (&config.stock_low, &mut theme.stock_low),
            (&config.stock_medium, &mut theme.stock_medium),
            (&config.stock_high, &mut theme.stock_high),
        ];

        for (value, slot) in overrides {
            let Some(value) = value else { continue };
            match Self::parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme color {:?}", value),
            }
        }

        theme
    }

    pub fn stock_color(&self, level: StockLevel) -> Color {
        match level {
            StockLevel::Low => self.stock_low,
            StockLevel::Medium => self.stock_medium,
            StockLevel::High => self.stock_high,
        }
    }

    /// Parse a hex color string (#RRGGBB or #RGB)
    fn parse_hex_color(s: &str) -> Option<Color> {
        let s = s.trim().trim_start_matches('#');

        if !s.is_ascii() {
            return None;
        }

        if s.len() == 6 {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        } else if s.len() == 3 {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(Theme::parse_hex_color("#FFC107"), Some(Color::Rgb(255, 193, 7)));
        assert_eq!(Theme::parse_hex_color("fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(Theme::parse_hex_color("#12"), None);
        assert_eq!(Theme::parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn test_from_config_overrides() {
        let config = ThemeConfig {
            stock_low: Some("#ff0000".to_string()),
            accent: Some("bogus".to_string()),
            ..Default::default()
        };
        let theme = Theme::from_config(&config);

        assert_eq!(theme.stock_color(StockLevel::Low), Color::Rgb(255, 0, 0));
        assert_eq!(theme.accent, Theme::default().accent);
        assert_eq!(theme.stock_color(StockLevel::High), Theme::default().stock_high);
    }
}
