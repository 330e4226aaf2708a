//! UI effect types.
//!
//! Effects are commands returned by the reducer that the runtime executes.
//! They cover work that spawns tasks or touches the config file. Selection
//! changes (focus, marks) are plain state and happen in the reducer.

use dashboard_core::config::Theme;
use dashboard_core::plugin::PluginKind;
use dashboard_core::selection::DismissTrigger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEffect {
    /// Dispose every plugin and leave the event loop.
    Quit,

    /// Fetch now, out of band.
    Refresh { plugin: PluginKind },

    NextLocation { plugin: PluginKind },
    PreviousLocation { plugin: PluginKind },
    AddLocation { plugin: PluginKind, location: String },
    RemoveCurrentLocation { plugin: PluginKind },

    /// Dismiss the rows picked by the selection rules, then reload.
    Dismiss {
        plugin: PluginKind,
        trigger: DismissTrigger,
    },

    /// Persist `main_window.theme`.
    SaveTheme { theme: Theme },
}
