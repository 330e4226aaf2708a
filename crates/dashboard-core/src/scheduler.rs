//! Per-plugin refresh scheduler.
//!
//! Each scheduler owns one worker task. The worker sleeps until the next
//! scheduled tick or a manual trigger, runs the fetch, and delivers the result
//! on the plugin's channel. Fetches of one scheduler never overlap:
//! - ticks that come due while a fetch is running are dropped, and the cadence
//!   stays aligned to the original start time;
//! - manual triggers that arrive while a fetch is running are coalesced into a
//!   single follow-up fetch.
//!
//! `stop()` (or dropping the handle) cancels the timer and the in-flight fetch.
//! Once `stop()` returns, nothing is delivered anymore.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

type FetchFn<O> = Box<dyn Fn() -> BoxFuture<'static, O> + Send + Sync>;
type Delivery<O> = Arc<Mutex<Option<mpsc::UnboundedSender<O>>>>;

#[derive(Debug)]
enum Control {
    Start(Duration),
    Trigger,
}

/// Next due time of the periodic cadence. `None` once the next tick lies
/// beyond what `Instant` can represent; such a cadence never fires.
#[derive(Debug, Clone, Copy)]
struct Cadence {
    period: Duration,
    next_due: Option<Instant>,
}

impl Cadence {
    fn starting_now(period: Duration) -> Self {
        Self {
            period,
            next_due: Instant::now().checked_add(period),
        }
    }

    /// Moves `next_due` past `now`, dropping every tick that was missed.
    fn skip_elapsed(&mut self, now: Instant) {
        while let Some(due) = self.next_due.filter(|due| *due <= now) {
            self.next_due = due.checked_add(self.period);
        }
    }
}

/// Handle to a plugin's refresh worker.
pub struct RefreshScheduler<O> {
    name: String,
    control: mpsc::UnboundedSender<Control>,
    delivery: Delivery<O>,
    cancel: CancellationToken,
}

impl<O: Send + 'static> RefreshScheduler<O> {
    /// Spawns the worker. Nothing is fetched until [`start`](Self::start) or
    /// [`trigger_now`](Self::trigger_now) is called.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<F, Fut>(name: impl Into<String>, fetch: F, deliver: mpsc::UnboundedSender<O>) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = O> + Send + 'static,
    {
        let name = name.into();
        let (control, control_rx) = mpsc::unbounded_channel();
        let delivery = Arc::new(Mutex::new(Some(deliver)));
        let cancel = CancellationToken::new();

        let worker = Worker {
            name: name.clone(),
            fetch: Box::new(move || fetch().boxed()),
            control_rx,
            delivery: Arc::clone(&delivery),
            cancel: cancel.clone(),
        };
        tokio::spawn(worker.run());

        Self {
            name,
            control,
            delivery,
            cancel,
        }
    }

    /// Starts the periodic cadence: the first fetch runs one `interval` from
    /// now. A zero interval means manual refresh only and is a no-op.
    pub fn start(&self, interval: Duration) {
        if interval.is_zero() {
            debug!(plugin = %self.name, "manual refresh only");
            return;
        }
        self.send(Control::Start(interval));
    }

    /// Requests an immediate fetch without shifting the periodic cadence.
    pub fn trigger_now(&self) {
        self.send(Control::Trigger);
    }

    /// Cancels the timer and any in-flight fetch. Idempotent.
    pub fn stop(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        // Taking the sender under the delivery lock means no result can be
        // sent once this returns.
        let sender = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        drop(sender);
        debug!(plugin = %self.name, "scheduler stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cloneable handle that can only request manual fetches.
    pub fn trigger_handle(&self) -> RefreshTrigger {
        RefreshTrigger {
            control: self.control.clone(),
            cancel: self.cancel.clone(),
        }
    }

    fn send(&self, msg: Control) {
        if self.cancel.is_cancelled() {
            debug!(plugin = %self.name, ?msg, "scheduler stopped, ignoring");
            return;
        }
        let _ = self.control.send(msg);
    }
}

impl<O> Drop for RefreshScheduler<O> {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
    }
}

impl<O> std::fmt::Debug for RefreshScheduler<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("name", &self.name)
            .field("stopped", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Manual-trigger handle for tasks that outlive a borrow of the scheduler.
#[derive(Debug, Clone)]
pub struct RefreshTrigger {
    control: mpsc::UnboundedSender<Control>,
    cancel: CancellationToken,
}

impl RefreshTrigger {
    /// Same as [`RefreshScheduler::trigger_now`]; a no-op once stopped.
    pub fn trigger_now(&self) {
        if !self.cancel.is_cancelled() {
            let _ = self.control.send(Control::Trigger);
        }
    }
}

struct Worker<O> {
    name: String,
    fetch: FetchFn<O>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    delivery: Delivery<O>,
    cancel: CancellationToken,
}

impl<O: Send + 'static> Worker<O> {
    async fn run(mut self) {
        let mut cadence: Option<Cadence> = None;
        let mut pending_trigger = false;

        loop {
            let reason = if pending_trigger {
                pending_trigger = false;
                "manual"
            } else {
                let due = cadence.and_then(|c| c.next_due);
                tokio::select! {
                    biased;
                    () = self.cancel.cancelled() => break,
                    msg = self.control_rx.recv() => match msg {
                        Some(Control::Trigger) => "manual",
                        Some(Control::Start(period)) => {
                            cadence = Some(Cadence::starting_now(period));
                            debug!(plugin = %self.name, ?period, "cadence started");
                            continue;
                        }
                        None => break,
                    },
                    () = wait_until(due) => "scheduled",
                }
            };

            debug!(plugin = %self.name, reason, "fetch started");
            if !self.fetch_once().await {
                break;
            }

            if let Some(cadence) = cadence.as_mut() {
                cadence.skip_elapsed(Instant::now());
            }

            while let Ok(msg) = self.control_rx.try_recv() {
                match msg {
                    Control::Trigger => pending_trigger = true,
                    Control::Start(period) => cadence = Some(Cadence::starting_now(period)),
                }
            }
        }

        debug!(plugin = %self.name, "refresh worker exited");
    }

    /// Runs one fetch to completion. Returns `false` if cancelled.
    async fn fetch_once(&self) -> bool {
        let mut task = tokio::spawn((self.fetch)());

        tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                task.abort();
                debug!(plugin = %self.name, "in-flight fetch abandoned");
                false
            }
            joined = &mut task => {
                match joined {
                    Ok(output) => self.deliver(output),
                    Err(err) if err.is_panic() => {
                        error!(plugin = %self.name, "fetch panicked");
                    }
                    Err(_) => {}
                }
                true
            }
        }
    }

    fn deliver(&self, output: O) {
        let guard = self
            .delivery
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if self.cancel.is_cancelled() {
            return;
        }
        if let Some(tx) = guard.as_ref() {
            let _ = tx.send(output);
        }
    }
}

async fn wait_until(due: Option<Instant>) {
    match due {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
