//! TUI reducer (update function).
//!
//! All state mutations happen here. The runtime calls `update(app, event)`
//! and executes the returned effects.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use dashboard_core::selection::DismissTrigger;
use tracing::debug;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;

/// The main reducer function.
pub fn update(app: &mut AppState, event: UiEvent) -> Vec<UiEffect> {
    match event {
        UiEvent::Tick => vec![],
        UiEvent::Plugin(plugin_event) => {
            let kind = plugin_event.plugin();
            match app.plugin_mut(kind) {
                Some(plugin) => {
                    plugin.apply(plugin_event);
                }
                None => debug!(plugin = %kind, "event for unknown plugin"),
            }
            vec![]
        }
        UiEvent::Terminal(Event::Key(key)) if key.kind == KeyEventKind::Press => {
            handle_key(app, key)
        }
        UiEvent::Terminal(_) => vec![],
    }
}

fn handle_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    app.flash = None;
    if app.prompt.is_some() {
        return handle_prompt_key(app, key);
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q' | 'c') if ctrl => return vec![UiEffect::Quit],
        KeyCode::Char('q') => return vec![UiEffect::Quit],
        KeyCode::Tab => {
            app.focus_next_panel();
            return vec![];
        }
        KeyCode::BackTab => {
            app.focus_previous_panel();
            return vec![];
        }
        KeyCode::Char('t') if !ctrl => {
            app.theme = app.theme.next();
            return vec![UiEffect::SaveTheme { theme: app.theme }];
        }
        _ => {}
    }

    let Some(plugin) = app.active_plugin_mut() else {
        return vec![];
    };
    let kind = plugin.kind();
    let has_carousel = plugin.carousel().is_some();

    match key.code {
        KeyCode::Char('r' | 'R') => vec![UiEffect::Refresh { plugin: kind }],
        KeyCode::Left | KeyCode::Char('h') if has_carousel => {
            vec![UiEffect::PreviousLocation { plugin: kind }]
        }
        KeyCode::Right | KeyCode::Char('l') if has_carousel => {
            vec![UiEffect::NextLocation { plugin: kind }]
        }
        KeyCode::Char('x') if has_carousel => {
            vec![UiEffect::RemoveCurrentLocation { plugin: kind }]
        }
        KeyCode::Char('a') if has_carousel => {
            app.prompt = Some(String::new());
            vec![]
        }
        KeyCode::Up | KeyCode::Char('k') => {
            plugin.selection_mut().focus_previous();
            vec![]
        }
        KeyCode::Down | KeyCode::Char('j') => {
            plugin.selection_mut().focus_next();
            vec![]
        }
        KeyCode::Char(' ') => {
            plugin.selection_mut().toggle_focused_mark();
            vec![]
        }
        KeyCode::Esc => {
            plugin.selection_mut().clear_focus();
            vec![]
        }
        KeyCode::Enter => {
            let trigger = if plugin.selection().focused().is_some() {
                DismissTrigger::EnterOnFocused
            } else {
                DismissTrigger::EnterWithNoFocus
            };
            vec![UiEffect::Dismiss {
                plugin: kind,
                trigger,
            }]
        }
        _ => vec![],
    }
}

fn handle_prompt_key(app: &mut AppState, key: KeyEvent) -> Vec<UiEffect> {
    let Some(buffer) = app.prompt.as_mut() else {
        return vec![];
    };
    match key.code {
        KeyCode::Esc => {
            app.prompt = None;
            vec![]
        }
        KeyCode::Enter => {
            let location = app.prompt.take().unwrap_or_default();
            match app.active_plugin() {
                Some(plugin) if !location.trim().is_empty() => vec![UiEffect::AddLocation {
                    plugin: plugin.kind(),
                    location,
                }],
                _ => vec![],
            }
        }
        KeyCode::Backspace => {
            buffer.pop();
            vec![]
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            buffer.push(c);
            vec![]
        }
        _ => vec![],
    }
}

#[cfg(test)]
mod tests {
    use dashboard_core::config::Theme;
    use dashboard_core::plugin::PluginKind;
    use dashboard_core::selection::RowId;

    use super::*;
    use crate::testing::{app_with_plugins, key, key_with, settle};

    #[tokio::test(start_paused = true)]
    async fn test_quit_keys() {
        let (mut app, _rx) = app_with_plugins();
        assert_eq!(update(&mut app, key(KeyCode::Char('q'))), vec![UiEffect::Quit]);
        assert_eq!(
            update(&mut app, key_with(KeyCode::Char('q'), KeyModifiers::CONTROL)),
            vec![UiEffect::Quit]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_cycles_panels() {
        let (mut app, _rx) = app_with_plugins();
        assert_eq!(app.active_plugin().unwrap().kind(), PluginKind::Weather);
        update(&mut app, key(KeyCode::Tab));
        assert_eq!(app.active_plugin().unwrap().kind(), PluginKind::Notifications);
        update(&mut app, key(KeyCode::Tab));
        assert_eq!(app.active_plugin().unwrap().kind(), PluginKind::Weather);
        update(&mut app, key(KeyCode::BackTab));
        assert_eq!(app.active_plugin().unwrap().kind(), PluginKind::Notifications);
    }

    #[tokio::test(start_paused = true)]
    async fn test_location_keys_only_on_carousel_panel() {
        let (mut app, _rx) = app_with_plugins();
        let weather = PluginKind::Weather;
        assert_eq!(
            update(&mut app, key(KeyCode::Right)),
            vec![UiEffect::NextLocation { plugin: weather }]
        );
        assert_eq!(
            update(&mut app, key(KeyCode::Char('h'))),
            vec![UiEffect::PreviousLocation { plugin: weather }]
        );
        assert_eq!(
            update(&mut app, key(KeyCode::Char('x'))),
            vec![UiEffect::RemoveCurrentLocation { plugin: weather }]
        );

        update(&mut app, key(KeyCode::Tab));
        assert!(update(&mut app, key(KeyCode::Right)).is_empty());
        assert!(update(&mut app, key(KeyCode::Char('a'))).is_empty());
        assert!(app.prompt.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_location_prompt() {
        let (mut app, _rx) = app_with_plugins();
        update(&mut app, key(KeyCode::Char('a')));
        assert_eq!(app.prompt.as_deref(), Some(""));

        for c in "Limx".chars() {
            update(&mut app, key(KeyCode::Char(c)));
        }
        update(&mut app, key(KeyCode::Backspace));
        update(&mut app, key(KeyCode::Char('a')));
        // 'q' is text while the prompt is open
        assert!(update(&mut app, key(KeyCode::Char('q'))).is_empty());
        update(&mut app, key(KeyCode::Backspace));

        let effects = update(&mut app, key(KeyCode::Enter));
        assert_eq!(
            effects,
            vec![UiEffect::AddLocation {
                plugin: PluginKind::Weather,
                location: "Lima".to_string()
            }]
        );
        assert!(app.prompt.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompt_escape_and_blank_submit() {
        let (mut app, _rx) = app_with_plugins();
        update(&mut app, key(KeyCode::Char('a')));
        update(&mut app, key(KeyCode::Char('z')));
        update(&mut app, key(KeyCode::Esc));
        assert!(app.prompt.is_none());

        update(&mut app, key(KeyCode::Char('a')));
        update(&mut app, key(KeyCode::Char(' ')));
        assert!(update(&mut app, key(KeyCode::Enter)).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_trigger_depends_on_focus() {
        let (mut app, mut rx) = app_with_plugins();
        settle(&mut app, &mut rx).await;
        update(&mut app, key(KeyCode::Tab));
        let notifications = PluginKind::Notifications;

        assert_eq!(
            update(&mut app, key(KeyCode::Enter)),
            vec![UiEffect::Dismiss {
                plugin: notifications,
                trigger: DismissTrigger::EnterWithNoFocus
            }]
        );

        update(&mut app, key(KeyCode::Down));
        assert_eq!(
            update(&mut app, key(KeyCode::Enter)),
            vec![UiEffect::Dismiss {
                plugin: notifications,
                trigger: DismissTrigger::EnterOnFocused
            }]
        );

        update(&mut app, key(KeyCode::Esc));
        assert_eq!(app.active_plugin().unwrap().selection().focused(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_space_marks_focused_row() {
        let (mut app, mut rx) = app_with_plugins();
        settle(&mut app, &mut rx).await;
        update(&mut app, key(KeyCode::Tab));

        update(&mut app, key(KeyCode::Char('j')));
        update(&mut app, key(KeyCode::Char('j')));
        update(&mut app, key(KeyCode::Char(' ')));

        let selection = app.active_plugin().unwrap().selection();
        assert_eq!(selection.focused(), Some(1));
        assert!(selection.marked().contains(&RowId(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_theme_key_cycles_and_saves() {
        let (mut app, _rx) = app_with_plugins();
        assert_eq!(app.theme, Theme::Default);
        assert_eq!(
            update(&mut app, key(KeyCode::Char('t'))),
            vec![UiEffect::SaveTheme { theme: Theme::Dark }]
        );
        assert_eq!(app.theme, Theme::Dark);
    }

    #[tokio::test(start_paused = true)]
    async fn test_plugin_events_reach_their_panel() {
        let (mut app, mut rx) = app_with_plugins();
        settle(&mut app, &mut rx).await;

        assert!(app.plugins[0].view().last_updated.is_some());
        assert_eq!(app.plugins[1].selection().rows().len(), 2);
        assert!(app.header_updated().unwrap().starts_with("Updated: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_events_are_ignored() {
        let (mut app, _rx) = app_with_plugins();
        let mut release = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(update(&mut app, UiEvent::Terminal(Event::Key(release))).is_empty());
    }
}
