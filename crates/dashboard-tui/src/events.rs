//! UI event types.
//!
//! All inputs to the dashboard (terminal, timer, plugin results) are converted
//! to `UiEvent` before being processed by the reducer.

use crossterm::event::Event as CrosstermEvent;
use dashboard_core::plugin::PluginEvent;

#[derive(Debug)]
pub enum UiEvent {
    /// Header clock repaint.
    Tick,

    /// Terminal input event (key, resize).
    Terminal(CrosstermEvent),

    /// Fetch or dismissal result from a plugin's background work.
    Plugin(PluginEvent),
}
