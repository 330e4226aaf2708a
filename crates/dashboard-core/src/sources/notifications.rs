//! Notification centre backed by a spool directory.
//!
//! Each notification is one `*.json` file:
//! `{ "id": 7, "app_name": "Mail", "title": "...", "body": "...", "timestamp": "<RFC 3339>" }`.
//! Dismissing a notification deletes its file.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{DataSource, Snapshot};
use crate::error::{DisposalError, FetchError};
use crate::selection::{DisplayRow, Disposer, RowId};

const BODY_PREVIEW_CHARS: usize = 50;

#[derive(Debug, Deserialize)]
struct SpoolEntry {
    id: u64,
    app_name: String,
    title: String,
    #[serde(default)]
    body: String,
    timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: u64,
    pub app_name: String,
    pub title: String,
    pub body: String,
    pub timestamp: DateTime<Local>,
}

impl Notification {
    /// Body on a single line, cut to `max_chars` with a trailing `...`.
    pub fn body_preview(&self, max_chars: usize) -> String {
        let clean = self.body.replace(['\n', '\r'], " ");
        let clean = clean.trim();
        match clean.char_indices().nth(max_chars) {
            Some((cut, _)) => format!("{}...", &clean[..cut]),
            None => clean.to_string(),
        }
    }

    /// `[age] app: title - body`
    pub fn row_text(&self, now: DateTime<Local>) -> String {
        let body = self.body_preview(BODY_PREVIEW_CHARS);
        let body = if body.is_empty() {
            String::new()
        } else {
            format!(" - {body}")
        };
        format!(
            "[{}] {}: {}{body}",
            format_age(self.timestamp, now),
            self.app_name,
            self.title
        )
    }
}

/// Relative age for recent timestamps, absolute `MM/dd HH:mm` after a week.
pub fn format_age(timestamp: DateTime<Local>, now: DateTime<Local>) -> String {
    let age = now.signed_duration_since(timestamp);
    if age.num_minutes() < 1 {
        "Just now".to_string()
    } else if age.num_minutes() < 60 {
        format!("{}m ago", age.num_minutes())
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else if age.num_days() < 7 {
        format!("{}d ago", age.num_days())
    } else {
        timestamp.format("%m/%d %H:%M").to_string()
    }
}

/// Reads the spool directory, newest first. Unreadable entries are skipped.
fn read_spool(dir: &Path) -> Result<Vec<(PathBuf, Notification)>, FetchError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!(dir = %dir.display(), "spool directory missing");
            return Ok(Vec::new());
        }
        Err(err) => {
            return Err(FetchError::Unavailable(format!(
                "cannot read {}: {err}",
                dir.display()
            )));
        }
    };

    let mut notifications = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        match read_entry(&path) {
            Ok(notification) => notifications.push((path, notification)),
            Err(err) => warn!(path = %path.display(), error = %err, "skipping notification"),
        }
    }

    notifications.sort_by(|a, b| b.1.timestamp.cmp(&a.1.timestamp).then(a.1.id.cmp(&b.1.id)));
    Ok(notifications)
}

fn read_entry(path: &Path) -> anyhow::Result<Notification> {
    let text = fs::read_to_string(path)?;
    let entry: SpoolEntry = serde_json::from_str(&text)?;
    let timestamp = DateTime::parse_from_rfc3339(&entry.timestamp)?.with_timezone(&Local);
    Ok(Notification {
        id: entry.id,
        app_name: entry.app_name,
        title: entry.title,
        body: entry.body,
        timestamp,
    })
}

/// Notifications panel source.
#[derive(Debug, Clone)]
pub struct SpoolNotificationSource {
    dir: PathBuf,
    display_count: usize,
}

impl SpoolNotificationSource {
    pub fn new(dir: impl Into<PathBuf>, display_count: usize) -> Self {
        Self {
            dir: dir.into(),
            display_count,
        }
    }

    /// Newest `display_count` notifications.
    ///
    /// # Errors
    /// Fails only when the spool directory exists but cannot be listed.
    pub async fn notifications(&self) -> Result<Vec<Notification>, FetchError> {
        let dir = self.dir.clone();
        let count = self.display_count;
        let found = tokio::task::spawn_blocking(move || read_spool(&dir))
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))??;
        Ok(found.into_iter().take(count).map(|(_, n)| n).collect())
    }
}

#[async_trait]
impl DataSource for SpoolNotificationSource {
    async fn fetch_current(&self, _target: Option<&str>) -> Result<Snapshot, FetchError> {
        let now = Local::now();
        let rows = self
            .notifications()
            .await?
            .iter()
            .map(|n| DisplayRow::new(RowId(n.id), n.row_text(now)))
            .collect();
        Ok(Snapshot::Rows(rows))
    }
}

#[async_trait]
impl Disposer for SpoolNotificationSource {
    async fn dispose_item(&self, id: RowId) -> Result<(), DisposalError> {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || remove_from_spool(&dir, id.0))
            .await
            .map_err(|e| DisposalError::Failed {
                id: id.0,
                message: e.to_string(),
            })?
    }
}

fn remove_from_spool(dir: &Path, id: u64) -> Result<(), DisposalError> {
    let found = read_spool(dir).map_err(|e| DisposalError::Failed {
        id,
        message: e.to_string(),
    })?;
    let Some((path, _)) = found.into_iter().find(|(_, n)| n.id == id) else {
        return Err(DisposalError::NotFound(id));
    };

    fs::remove_file(&path).map_err(|e| DisposalError::Failed {
        id,
        message: e.to_string(),
    })?;
    debug!(id, path = %path.display(), "notification removed");
    Ok(())
}
