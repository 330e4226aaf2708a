//! Data sources that plugins poll.
//!
//! The runtime only sees the [`DataSource`] contract: fetch the snapshot for
//! the active target. List-backed sources also implement
//! [`Disposer`](crate::selection::Disposer).

pub mod notifications;
pub mod weather;

use async_trait::async_trait;

use crate::error::FetchError;
use crate::selection::DisplayRow;

pub use notifications::SpoolNotificationSource;
pub use weather::WeatherApiClient;

/// One label/value line of a single-value panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: String,
    pub value: String,
}

impl Field {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// One complete fetch result, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    /// Named text fields (weather).
    Fields(Vec<Field>),
    /// Selectable rows (notifications).
    Rows(Vec<DisplayRow>),
}

/// Fetches the current snapshot for a target.
///
/// `target` is the active carousel entry, or `None` for sources that have no
/// target list.
#[async_trait]
pub trait DataSource: Send + Sync {
    async fn fetch_current(&self, target: Option<&str>) -> Result<Snapshot, FetchError>;
}
