//! TUI runtime: owns the terminal, runs the event loop, executes effects.
//!
//! This is the "Elm runtime" boundary. The reducer stays pure and produces
//! effects; this module executes them.
//!
//! ## Inbox Pattern
//!
//! Every plugin sends its `PluginEvent`s to one shared inbox. The runtime
//! drains the inbox each frame and feeds the events through the reducer, so
//! view state is only ever touched on this thread.

mod handlers;

use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event;
use dashboard_core::carousel::Carousel;
use dashboard_core::config::{Config, ConfigStore};
use dashboard_core::plugin::{PluginEvent, PluginKind, PluginRuntime, PluginSpec};
use dashboard_core::selection::Disposer;
use dashboard_core::sources::{DataSource, SpoolNotificationSource, WeatherApiClient};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tracing::info;

use crate::effects::UiEffect;
use crate::events::UiEvent;
use crate::state::AppState;
use crate::{render, terminal, update};

/// Poll timeout while nothing is pending. Keeps input responsive without
/// spinning.
pub const IDLE_POLL_DURATION: Duration = Duration::from_millis(100);

/// Full-screen dashboard runtime.
///
/// Terminal state is restored on drop and on panic.
pub struct TuiRuntime {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    pub state: AppState,
    store: Arc<ConfigStore>,
    inbox_rx: mpsc::UnboundedReceiver<PluginEvent>,
    /// Header clock repaint cadence.
    tick_interval: Duration,
    last_tick: Instant,
}

impl TuiRuntime {
    /// Builds the plugins and takes over the terminal.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Fails if a plugin cannot be configured (e.g. no weather API key) or
    /// the terminal cannot be switched into TUI mode.
    pub fn new(config: &Config, store: Arc<ConfigStore>) -> Result<Self> {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let plugins = build_plugins(config, &store, &inbox_tx)?;
        let state = AppState::new(plugins, &config.main_window);

        terminal::install_panic_hook();
        let terminal = terminal::setup_terminal()?;

        Ok(Self {
            terminal,
            state,
            store,
            inbox_rx,
            tick_interval: Duration::from_secs(config.main_window.ui_refresh_interval_secs.max(1)),
            last_tick: Instant::now(),
        })
    }

    /// Runs the event loop until the user quits.
    ///
    /// # Errors
    /// Returns an error if polling the terminal or drawing fails.
    pub fn run(&mut self) -> Result<()> {
        let mut dirty = true;

        while !self.state.should_quit {
            let events = self.collect_events()?;

            for event in events {
                let effects = update::update(&mut self.state, event);
                dirty = true;
                self.execute_effects(effects);
            }

            if dirty {
                self.terminal
                    .draw(|frame| render::render(&self.state, frame))
                    .context("Failed to draw frame")?;
                dirty = false;
            }
        }

        info!("dashboard exiting");
        Ok(())
    }

    /// Collects events from the inbox and the terminal, plus a `Tick` when
    /// the header clock is due.
    fn collect_events(&mut self) -> Result<Vec<UiEvent>> {
        let mut events = Vec::new();

        while let Ok(plugin_event) = self.inbox_rx.try_recv() {
            events.push(UiEvent::Plugin(plugin_event));
        }

        let time_until_tick = self.tick_interval.saturating_sub(self.last_tick.elapsed());
        let poll_duration = if events.is_empty() {
            time_until_tick.min(IDLE_POLL_DURATION)
        } else {
            Duration::ZERO
        };

        if event::poll(poll_duration)? {
            events.push(UiEvent::Terminal(event::read()?));
            while event::poll(Duration::ZERO)? {
                events.push(UiEvent::Terminal(event::read()?));
            }
        }

        if self.last_tick.elapsed() >= self.tick_interval {
            events.push(UiEvent::Tick);
            self.last_tick = Instant::now();
        }

        Ok(events)
    }

    fn execute_effects(&mut self, effects: Vec<UiEffect>) {
        for effect in effects {
            handlers::execute_effect(&mut self.state, &self.store, effect);
        }
    }
}

impl Drop for TuiRuntime {
    fn drop(&mut self) {
        self.state.dispose_all();
        let _ = terminal::restore_terminal();
    }
}

/// Creates the weather and notifications plugins in display order.
///
/// # Errors
/// Fails when the weather client cannot be configured.
pub fn build_plugins(
    config: &Config,
    store: &Arc<ConfigStore>,
    inbox: &mpsc::UnboundedSender<PluginEvent>,
) -> Result<Vec<PluginRuntime>> {
    let weather = WeatherApiClient::from_config(&config.weather)
        .context("Weather panel is not configured")?;
    let weather = PluginRuntime::spawn(
        PluginSpec {
            kind: PluginKind::Weather,
            source: Arc::new(weather),
            disposer: None,
            carousel: Some(Carousel::from_weather_config(
                &config.weather,
                Arc::clone(store),
            )),
            interval: config.weather.refresh_interval(),
        },
        inbox.clone(),
    );

    let spool = Arc::new(SpoolNotificationSource::new(
        config.notifications.effective_spool_dir(),
        config.notifications.display_count,
    ));
    let notifications = PluginRuntime::spawn(
        PluginSpec {
            kind: PluginKind::Notifications,
            source: Arc::clone(&spool) as Arc<dyn DataSource>,
            disposer: Some(spool as Arc<dyn Disposer>),
            carousel: None,
            interval: config.notifications.refresh_interval(),
        },
        inbox.clone(),
    );

    Ok(vec![weather, notifications])
}
