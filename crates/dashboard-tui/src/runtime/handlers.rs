//! Effect handlers for the TUI runtime.
//!
//! Plugin effects map onto `PluginRuntime` calls, which spawn their own
//! background work. Config writes happen synchronously here.

use dashboard_core::config::ConfigStore;
use tracing::{info, warn};

use crate::effects::UiEffect;
use crate::state::AppState;

pub fn execute_effect(app: &mut AppState, store: &ConfigStore, effect: UiEffect) {
    match effect {
        UiEffect::Quit => {
            app.dispose_all();
            app.should_quit = true;
        }
        UiEffect::Refresh { plugin } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.refresh_now();
            }
        }
        UiEffect::NextLocation { plugin } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.next_location();
            }
        }
        UiEffect::PreviousLocation { plugin } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.previous_location();
            }
        }
        UiEffect::AddLocation { plugin, location } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.add_location(&location);
            }
        }
        UiEffect::RemoveCurrentLocation { plugin } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.remove_current_location();
            }
        }
        UiEffect::Dismiss { plugin, trigger } => {
            if let Some(p) = app.plugin_mut(plugin) {
                p.dismiss(trigger);
            }
        }
        UiEffect::SaveTheme { theme } => match store.save_theme(theme) {
            Ok(()) => info!(theme = theme.as_str(), "theme saved"),
            Err(err) => {
                warn!(error = %err, "failed to save theme");
                app.flash = Some(format!("Theme not saved: {err}"));
            }
        },
    }
}
