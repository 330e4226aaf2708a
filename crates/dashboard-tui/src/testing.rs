//! Shared fixtures for reducer and handler tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use dashboard_core::carousel::Carousel;
use dashboard_core::config::MainWindowConfig;
use dashboard_core::error::{DisposalError, FetchError};
use dashboard_core::plugin::{PluginEvent, PluginKind, PluginRuntime, PluginSpec};
use dashboard_core::selection::{DisplayRow, Disposer, RowId};
use dashboard_core::sources::{DataSource, Field, Snapshot};
use tokio::sync::mpsc;

use crate::events::UiEvent;
use crate::state::AppState;
use crate::update::update;

pub struct EchoSource;

#[async_trait]
impl DataSource for EchoSource {
    async fn fetch_current(&self, target: Option<&str>) -> Result<Snapshot, FetchError> {
        Ok(Snapshot::Fields(vec![Field::new(
            "Location",
            target.unwrap_or("-"),
        )]))
    }
}

#[derive(Default)]
pub struct ListSource {
    pub dismissed: Mutex<Vec<RowId>>,
}

#[async_trait]
impl DataSource for ListSource {
    async fn fetch_current(&self, _target: Option<&str>) -> Result<Snapshot, FetchError> {
        let dismissed = self.dismissed.lock().unwrap().clone();
        Ok(Snapshot::Rows(
            [1, 2]
                .into_iter()
                .map(RowId)
                .filter(|id| !dismissed.contains(id))
                .map(|id| DisplayRow::new(id, format!("row {id}")))
                .collect(),
        ))
    }
}

#[async_trait]
impl Disposer for ListSource {
    async fn dispose_item(&self, id: RowId) -> Result<(), DisposalError> {
        self.dismissed.lock().unwrap().push(id);
        Ok(())
    }
}

pub fn weather_plugin(
    carousel: Carousel,
    inbox: mpsc::UnboundedSender<PluginEvent>,
) -> PluginRuntime {
    PluginRuntime::spawn(
        PluginSpec {
            kind: PluginKind::Weather,
            source: Arc::new(EchoSource),
            disposer: None,
            carousel: Some(carousel),
            interval: Duration::ZERO,
        },
        inbox,
    )
}

pub fn notifications_plugin(inbox: mpsc::UnboundedSender<PluginEvent>) -> PluginRuntime {
    let source = Arc::new(ListSource::default());
    PluginRuntime::spawn(
        PluginSpec {
            kind: PluginKind::Notifications,
            source: Arc::clone(&source) as Arc<dyn DataSource>,
            disposer: Some(source as Arc<dyn Disposer>),
            carousel: None,
            interval: Duration::ZERO,
        },
        inbox,
    )
}

/// Weather (Paris, Oslo) and notifications (rows 1, 2) panels.
pub fn app_with_plugins() -> (AppState, mpsc::UnboundedReceiver<PluginEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let carousel = Carousel::new(vec!["Paris".to_string(), "Oslo".to_string()], 0);
    let plugins = vec![
        weather_plugin(carousel, tx.clone()),
        notifications_plugin(tx),
    ];
    (AppState::new(plugins, &MainWindowConfig::default()), rx)
}

/// Applies the initial fetch of both panels.
pub async fn settle(app: &mut AppState, rx: &mut mpsc::UnboundedReceiver<PluginEvent>) {
    for _ in 0..2 {
        let event = rx.recv().await.unwrap();
        update(app, UiEvent::Plugin(event));
    }
}

pub fn key(code: KeyCode) -> UiEvent {
    key_with(code, KeyModifiers::NONE)
}

pub fn key_with(code: KeyCode, modifiers: KeyModifiers) -> UiEvent {
    UiEvent::Terminal(Event::Key(KeyEvent::new(code, modifiers)))
}
