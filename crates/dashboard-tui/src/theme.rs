//! Colors for each configured theme.

use dashboard_core::config::Theme;
use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Color,
    pub background: Color,
    pub accent: Color,
    pub border: Color,
    pub muted: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Default => Self {
                text: Color::Reset,
                background: Color::Reset,
                accent: Color::Cyan,
                border: Color::Gray,
                muted: Color::DarkGray,
                error: Color::Red,
            },
            Theme::Dark => Self {
                text: Color::Gray,
                background: Color::Black,
                accent: Color::LightBlue,
                border: Color::DarkGray,
                muted: Color::DarkGray,
                error: Color::LightRed,
            },
            Theme::Light => Self {
                text: Color::Black,
                background: Color::White,
                accent: Color::Blue,
                border: Color::DarkGray,
                muted: Color::Gray,
                error: Color::Red,
            },
            Theme::Green => Self {
                text: Color::Green,
                background: Color::Black,
                accent: Color::LightGreen,
                border: Color::Green,
                muted: Color::DarkGray,
                error: Color::Yellow,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.text).bg(self.background)
    }

    pub fn border(&self, active: bool) -> Style {
        if active {
            Style::default()
                .fg(self.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.border)
        }
    }

    pub fn status(&self, is_error: bool) -> Style {
        if is_error {
            Style::default().fg(self.error)
        } else {
            Style::default().fg(self.muted)
        }
    }
}
