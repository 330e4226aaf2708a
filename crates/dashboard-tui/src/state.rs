//! Application state for the dashboard TUI.
//!
//! ```text
//! AppState
//! ├── plugins: Vec<PluginRuntime>  (one per panel, in display order)
//! ├── active: usize                (panel receiving keys)
//! ├── prompt: Option<String>       (inline "add location" input)
//! └── theme / time_format / flash  (header + status bar)
//! ```

use chrono::{DateTime, Local};
use dashboard_core::config::{MainWindowConfig, Theme, TimeFormat};
use dashboard_core::plugin::{PluginKind, PluginRuntime};

pub struct AppState {
    pub plugins: Vec<PluginRuntime>,
    pub active: usize,
    pub theme: Theme,
    pub time_format: TimeFormat,
    pub show_last_update: bool,
    /// Inline input for a new location; `Some` while the prompt is open.
    pub prompt: Option<String>,
    /// One-off message for the status bar (e.g. a failed theme save).
    pub flash: Option<String>,
    pub should_quit: bool,
}

impl AppState {
    pub fn new(plugins: Vec<PluginRuntime>, main_window: &MainWindowConfig) -> Self {
        Self {
            plugins,
            active: 0,
            theme: main_window.theme(),
            time_format: main_window.time_format,
            show_last_update: main_window.show_last_update_in_header,
            prompt: None,
            flash: None,
            should_quit: false,
        }
    }

    pub fn active_plugin(&self) -> Option<&PluginRuntime> {
        self.plugins.get(self.active)
    }

    pub fn active_plugin_mut(&mut self) -> Option<&mut PluginRuntime> {
        self.plugins.get_mut(self.active)
    }

    pub fn plugin_mut(&mut self, kind: PluginKind) -> Option<&mut PluginRuntime> {
        self.plugins.iter_mut().find(|p| p.kind() == kind)
    }

    pub fn focus_next_panel(&mut self) {
        if !self.plugins.is_empty() {
            self.active = (self.active + 1) % self.plugins.len();
        }
    }

    pub fn focus_previous_panel(&mut self) {
        if !self.plugins.is_empty() {
            self.active = (self.active + self.plugins.len() - 1) % self.plugins.len();
        }
    }

    /// Most recent successful refresh across all panels.
    pub fn last_updated(&self) -> Option<DateTime<Local>> {
        self.plugins
            .iter()
            .filter_map(|p| p.view().last_updated)
            .max()
    }

    /// Header text, e.g. `Updated: 14:05` or `Updated: 2:05 PM`.
    pub fn header_updated(&self) -> Option<String> {
        if !self.show_last_update {
            return None;
        }
        let text = match self.last_updated() {
            Some(at) => at.format(self.time_format.clock_format()).to_string(),
            None => "Never".to_string(),
        };
        Some(format!("Updated: {text}"))
    }

    /// Disposes every plugin. Safe to call more than once.
    pub fn dispose_all(&mut self) {
        for plugin in &mut self.plugins {
            plugin.dispose();
        }
    }
}
