//! Pure view/render functions for the TUI.
//!
//! Functions here take `&AppState`, draw to a ratatui Frame and never
//! mutate state or return effects.

use dashboard_core::plugin::PluginRuntime;
use dashboard_core::selection::DisplayRow;
use dashboard_core::sources::Field;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::state::AppState;
use crate::text::truncate_with_ellipsis;
use crate::theme::Palette;

const HEADER_HEIGHT: u16 = 1;
const FOOTER_HEIGHT: u16 = 1;

/// Width of the label column in field panels.
const LABEL_WIDTH: usize = 12;

const KEY_HINTS: &str =
    "q quit · tab panel · r refresh · ←/→ location · a add · x remove · ↑/↓ focus · space mark · enter dismiss · t theme";

/// Renders the entire dashboard to the frame.
pub fn render(app: &AppState, frame: &mut Frame) {
    let area = frame.area();
    let palette = Palette::for_theme(app.theme);
    frame.render_widget(Block::default().style(palette.base()), area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    render_header(app, &palette, frame, chunks[0]);
    render_panels(app, &palette, frame, chunks[1]);
    render_footer(app, &palette, frame, chunks[2]);
}

fn render_header(app: &AppState, palette: &Palette, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        " Dashboard",
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    )];
    if let Some(updated) = app.header_updated() {
        spans.push(Span::styled(
            format!("  {updated}"),
            Style::default().fg(palette.muted),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_panels(app: &AppState, palette: &Palette, frame: &mut Frame, area: Rect) {
    if app.plugins.is_empty() {
        frame.render_widget(
            Paragraph::new("No panels configured").style(Style::default().fg(palette.muted)),
            area,
        );
        return;
    }

    let count = u32::try_from(app.plugins.len()).unwrap_or(u32::MAX);
    let constraints: Vec<Constraint> = app
        .plugins
        .iter()
        .map(|_| Constraint::Ratio(1, count))
        .collect();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (index, (plugin, column)) in app.plugins.iter().zip(columns.iter()).enumerate() {
        render_panel(plugin, index == app.active, palette, frame, *column);
    }
}

fn render_panel(
    plugin: &PluginRuntime,
    active: bool,
    palette: &Palette,
    frame: &mut Frame,
    area: Rect,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(palette.border(active))
        .title(format!(" {} ", plugin.kind().title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let width = usize::from(inner.width);
    // Status pinned to the bottom line of the panel.
    let body_height = usize::from(inner.height.saturating_sub(1));
    let view = plugin.view();
    let mut lines = if view.selection.rows().is_empty() {
        field_lines(&view.fields, width, palette)
    } else {
        let focused = view.selection.focused();
        let mut lines = row_lines(view.selection.rows(), focused, width, palette);
        let offset = scroll_offset(focused, body_height).min(lines.len());
        lines.drain(..offset);
        lines
    };

    lines.truncate(body_height);
    lines.resize(body_height, Line::default());
    lines.push(Line::from(Span::styled(
        truncate_with_ellipsis(&status_text(plugin), width),
        palette.status(view.has_error()),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

/// Appends a spinner glyph while a fetch is in flight.
fn status_text(plugin: &PluginRuntime) -> String {
    let view = plugin.view();
    if view.loading && !view.status.ends_with("...") {
        format!("{} ↻", view.status)
    } else {
        view.status.clone()
    }
}

fn field_lines(fields: &[Field], width: usize, palette: &Palette) -> Vec<Line<'static>> {
    fields
        .iter()
        .map(|field| {
            let label = format!("{:<LABEL_WIDTH$} ", field.label);
            let value_width = width.saturating_sub(LABEL_WIDTH + 1);
            Line::from(vec![
                Span::styled(
                    truncate_with_ellipsis(&label, width),
                    Style::default().fg(palette.muted),
                ),
                Span::raw(truncate_with_ellipsis(&field.value, value_width)),
            ])
        })
        .collect()
}

fn row_lines(
    rows: &[DisplayRow],
    focused: Option<usize>,
    width: usize,
    palette: &Palette,
) -> Vec<Line<'static>> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| {
            let text = truncate_with_ellipsis(&row_text(row), width);
            if focused == Some(index) {
                Line::from(Span::styled(
                    text,
                    Style::default()
                        .fg(palette.accent)
                        .add_modifier(Modifier::REVERSED),
                ))
            } else {
                Line::from(text)
            }
        })
        .collect()
}

/// First row to draw so the focused row stays within `height` lines.
fn scroll_offset(focused: Option<usize>, height: usize) -> usize {
    match focused {
        Some(index) if height > 0 && index >= height => index + 1 - height,
        _ => 0,
    }
}

fn row_text(row: &DisplayRow) -> String {
    let mark = if row.marked { "[x]" } else { "[ ]" };
    format!("{mark} {}", row.text)
}

fn render_footer(app: &AppState, palette: &Palette, frame: &mut Frame, area: Rect) {
    let width = usize::from(area.width);
    let line = if let Some(prompt) = &app.prompt {
        Line::from(vec![
            Span::styled(" Add location: ", Style::default().fg(palette.accent)),
            Span::raw(format!("{prompt}_")),
        ])
    } else if let Some(flash) = &app.flash {
        Line::from(Span::styled(
            truncate_with_ellipsis(&format!(" {flash}"), width),
            Style::default().fg(palette.error),
        ))
    } else {
        Line::from(Span::styled(
            truncate_with_ellipsis(&format!(" {KEY_HINTS}"), width),
            Style::default().fg(palette.muted),
        ))
    };
    frame.render_widget(Paragraph::new(line), area);
}
