//! Plugin runtime: one refreshing panel bound to one data source.
//!
//! A [`PluginRuntime`] owns its [`RefreshScheduler`], an optional location
//! [`Carousel`] and, for list panels, the row selection. Fetch results arrive
//! on the shared inbox as [`PluginEvent`]s and are folded into the view by
//! [`PluginRuntime::apply`] on the UI side. The active carousel target reaches
//! the fetch closure through a `watch` channel, so a result whose target is no
//! longer active is recognised and dropped.

mod view;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::carousel::Carousel;
use crate::error::{CarouselError, FetchError};
use crate::scheduler::{RefreshScheduler, RefreshTrigger};
use crate::selection::{DismissReport, DismissTrigger, Disposer, SelectionState, dispose_targets};
use crate::sources::{DataSource, Snapshot};

pub use view::PluginView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PluginKind {
    Weather,
    Notifications,
}

impl PluginKind {
    pub fn title(self) -> &'static str {
        match self {
            PluginKind::Weather => "Weather",
            PluginKind::Notifications => "Notifications",
        }
    }
}

impl fmt::Display for PluginKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Messages from background work back to the UI loop.
#[derive(Debug)]
pub enum PluginEvent {
    /// One completed fetch.
    Refreshed {
        plugin: PluginKind,
        target: Option<String>,
        result: Result<Snapshot, FetchError>,
        at: DateTime<Local>,
    },
    /// A dismissal batch finished; a reload has been requested.
    Dismissed {
        plugin: PluginKind,
        report: DismissReport,
    },
}

impl PluginEvent {
    pub fn plugin(&self) -> PluginKind {
        match self {
            PluginEvent::Refreshed { plugin, .. } | PluginEvent::Dismissed { plugin, .. } => {
                *plugin
            }
        }
    }
}

/// Everything needed to start a plugin.
pub struct PluginSpec {
    pub kind: PluginKind,
    pub source: Arc<dyn DataSource>,
    pub disposer: Option<Arc<dyn Disposer>>,
    pub carousel: Option<Carousel>,
    /// Zero means manual refresh only.
    pub interval: Duration,
}

pub struct PluginRuntime {
    kind: PluginKind,
    scheduler: RefreshScheduler<PluginEvent>,
    trigger: RefreshTrigger,
    target_tx: watch::Sender<Option<String>>,
    carousel: Option<Carousel>,
    disposer: Option<Arc<dyn Disposer>>,
    inbox: mpsc::UnboundedSender<PluginEvent>,
    lifetime: CancellationToken,
    view: PluginView,
    /// Last failed carousel save; shown in place of the location status
    /// until a save succeeds.
    save_error: Option<String>,
}

impl PluginRuntime {
    /// Creates the scheduler, starts the cadence and requests the first fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(spec: PluginSpec, inbox: mpsc::UnboundedSender<PluginEvent>) -> Self {
        let PluginSpec {
            kind,
            source,
            disposer,
            carousel,
            interval,
        } = spec;

        let initial_target = carousel
            .as_ref()
            .and_then(Carousel::current)
            .map(str::to_string);
        let (target_tx, target_rx) = watch::channel(initial_target);

        let scheduler = RefreshScheduler::new(
            kind.title(),
            move || {
                let source = Arc::clone(&source);
                let target = target_rx.borrow().clone();
                async move {
                    let result = source.fetch_current(target.as_deref()).await;
                    PluginEvent::Refreshed {
                        plugin: kind,
                        target,
                        result,
                        at: Local::now(),
                    }
                }
            },
            inbox.clone(),
        );
        scheduler.start(interval);
        scheduler.trigger_now();
        let trigger = scheduler.trigger_handle();

        info!(plugin = %kind, ?interval, "plugin started");

        Self {
            kind,
            scheduler,
            trigger,
            target_tx,
            carousel,
            disposer,
            inbox,
            lifetime: CancellationToken::new(),
            view: PluginView::loading(),
            save_error: None,
        }
    }

    pub fn kind(&self) -> PluginKind {
        self.kind
    }

    pub fn view(&self) -> &PluginView {
        &self.view
    }

    pub fn carousel(&self) -> Option<&Carousel> {
        self.carousel.as_ref()
    }

    pub fn selection(&self) -> &SelectionState {
        &self.view.selection
    }

    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.view.selection
    }

    pub fn is_disposed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    /// Requests an immediate fetch.
    pub fn refresh_now(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.view.loading = true;
        self.trigger.trigger_now();
    }

    /// Folds an inbox event into the view. Returns whether anything changed.
    pub fn apply(&mut self, event: PluginEvent) -> bool {
        if self.is_disposed() || event.plugin() != self.kind {
            return false;
        }

        match event {
            PluginEvent::Refreshed {
                target, result, at, ..
            } => {
                if self.is_stale(target.as_deref()) {
                    debug!(plugin = %self.kind, ?target, "dropping result for inactive target");
                    return false;
                }
                match result {
                    Ok(snapshot) => self.apply_snapshot(snapshot, at),
                    Err(err) => {
                        warn!(plugin = %self.kind, error = %err, "fetch failed");
                        self.view.set_error(&err);
                    }
                }
            }
            PluginEvent::Dismissed { report, .. } => {
                self.view.status = if report.failed == 0 {
                    format!("Dismissed {}", report.dismissed)
                } else {
                    format!("Dismissed {}, {} failed", report.dismissed, report.failed)
                };
            }
        }
        true
    }

    fn is_stale(&self, target: Option<&str>) -> bool {
        match &self.carousel {
            Some(carousel) => carousel.current() != target,
            None => false,
        }
    }

    fn apply_snapshot(&mut self, snapshot: Snapshot, at: DateTime<Local>) {
        self.view.loading = false;
        self.view.last_updated = Some(at);
        match snapshot {
            Snapshot::Fields(fields) => {
                self.view.fields = fields;
                self.show_location_status();
            }
            Snapshot::Rows(rows) => {
                self.view.status = match rows.len() {
                    0 => format!("No {}", self.kind.title().to_lowercase()),
                    n => format!("Showing {n} {}", self.kind.title().to_lowercase()),
                };
                self.view.selection.replace_rows(rows);
            }
        }
    }

    fn show_location_status(&mut self) {
        match &self.save_error {
            Some(message) => {
                let message = message.clone();
                self.view.set_error(message);
            }
            None => self.view.status = self.location_status(),
        }
    }

    fn location_status(&self) -> String {
        match self.carousel.as_ref().and_then(|c| Some((c.current_index()?, c.len()))) {
            Some((index, len)) if len > 1 => format!("Location {}/{len}", index + 1),
            _ => String::new(),
        }
    }

    // Carousel actions. Each publishes the new target and re-fetches; a failed
    // save only shows up in the status line.

    pub fn next_location(&mut self) {
        self.navigate(Carousel::next);
    }

    pub fn previous_location(&mut self) {
        self.navigate(Carousel::previous);
    }

    fn navigate<F, E>(&mut self, step: F)
    where
        F: FnOnce(&mut Carousel) -> Result<Option<&str>, E>,
        E: fmt::Display,
    {
        if self.is_disposed() {
            return;
        }
        let Some(carousel) = self.carousel.as_mut() else {
            return;
        };
        let before = carousel.current_index();
        let saved = step(carousel).map(|_| ()).map_err(|e| e.to_string());
        if carousel.current_index() == before {
            return;
        }
        self.retarget(saved);
    }

    pub fn add_location(&mut self, location: &str) {
        self.mutate_carousel(|c| c.add(location).map(|_| ()));
    }

    pub fn remove_location(&mut self, index: usize) {
        self.mutate_carousel(|c| c.remove(index).map(|_| ()));
    }

    pub fn remove_current_location(&mut self) {
        let Some(index) = self.carousel.as_ref().and_then(Carousel::current_index) else {
            return;
        };
        self.remove_location(index);
    }

    fn mutate_carousel<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Carousel) -> Result<(), CarouselError>,
    {
        if self.is_disposed() {
            return;
        }
        let Some(carousel) = self.carousel.as_mut() else {
            return;
        };
        match op(carousel) {
            Ok(()) => self.retarget(Ok(())),
            Err(CarouselError::Persistence(err)) => self.retarget(Err(err.to_string())),
            Err(CarouselError::Validation(err)) => self.view.set_error(err),
        }
    }

    fn retarget(&mut self, saved: Result<(), String>) {
        let target = self
            .carousel
            .as_ref()
            .and_then(Carousel::current)
            .map(str::to_string);
        debug!(plugin = %self.kind, ?target, "target changed");
        self.target_tx.send_replace(target);
        self.save_error = saved.err();
        self.show_location_status();
        self.refresh_now();
    }

    /// Dismisses the rows picked by the selection rules on a background task,
    /// then requests a reload. A [`PluginEvent::Dismissed`] reports the counts.
    pub fn dismiss(&mut self, trigger: DismissTrigger) {
        if self.is_disposed() {
            return;
        }
        let Some(disposer) = self.disposer.clone() else {
            return;
        };
        let targets = self.view.selection.resolve_dismiss_targets(trigger);
        if targets.is_empty() {
            return;
        }

        self.view.status = format!("Dismissing {}...", targets.len());
        let kind = self.kind;
        let inbox = self.inbox.clone();
        let reload = self.trigger.clone();
        let lifetime = self.lifetime.clone();
        tokio::spawn(async move {
            let report = dispose_targets(disposer.as_ref(), &targets).await;
            if lifetime.is_cancelled() {
                return;
            }
            let _ = inbox.send(PluginEvent::Dismissed {
                plugin: kind,
                report,
            });
            reload.trigger_now();
        });
    }

    /// Stops the scheduler; later events are ignored. Idempotent.
    pub fn dispose(&mut self) {
        if self.lifetime.is_cancelled() {
            return;
        }
        self.lifetime.cancel();
        self.scheduler.stop();
        info!(plugin = %self.kind, "plugin disposed");
    }
}

impl Drop for PluginRuntime {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PluginRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRuntime")
            .field("kind", &self.kind)
            .field("carousel", &self.carousel)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}
