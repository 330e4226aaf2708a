//! Location carousel: an ordered target list with a wrapping current index.
//!
//! Every mutation persists synchronously through [`ConfigStore`] before it
//! returns. A failed save is reported to the caller but the in-memory change
//! stays, so the caller can still re-fetch for the new target.

use std::sync::Arc;

use tracing::debug;

use crate::config::{ConfigStore, WeatherConfig};
use crate::error::{CarouselError, PersistenceError, ValidationError};

#[derive(Debug, Clone)]
struct Persistence {
    store: Arc<ConfigStore>,
    section: String,
}

#[derive(Debug, Clone)]
pub struct Carousel {
    items: Vec<String>,
    current_index: usize,
    persistence: Option<Persistence>,
}

impl Carousel {
    /// Creates an in-memory carousel. An out-of-range index is clamped.
    pub fn new(items: Vec<String>, current_index: usize) -> Self {
        let mut carousel = Self {
            items,
            current_index,
            persistence: None,
        };
        carousel.clamp();
        carousel
    }

    /// Builds the weather location carousel from config, persisting to the
    /// `[weather]` section.
    pub fn from_weather_config(config: &WeatherConfig, store: Arc<ConfigStore>) -> Self {
        Self::new(config.locations.clone(), config.current_location_index)
            .with_persistence(store, WeatherConfig::SECTION)
    }

    #[must_use]
    pub fn with_persistence(mut self, store: Arc<ConfigStore>, section: impl Into<String>) -> Self {
        self.persistence = Some(Persistence {
            store,
            section: section.into(),
        });
        self
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of the active target, or `None` when nothing is configured.
    pub fn current_index(&self) -> Option<usize> {
        if self.items.is_empty() {
            None
        } else {
            Some(self.current_index.min(self.items.len() - 1))
        }
    }

    /// The active target, or `None` when nothing is configured.
    pub fn current(&self) -> Option<&str> {
        self.current_index().map(|i| self.items[i].as_str())
    }

    /// Steps forward with wraparound and returns the new active target.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the index could not be saved; the step
    /// itself is kept.
    pub fn next(&mut self) -> Result<Option<&str>, PersistenceError> {
        self.step(1)
    }

    /// Steps backward with wraparound and returns the new active target.
    ///
    /// # Errors
    /// Returns `PersistenceError` if the index could not be saved; the step
    /// itself is kept.
    pub fn previous(&mut self) -> Result<Option<&str>, PersistenceError> {
        self.step(-1)
    }

    fn step(&mut self, delta: isize) -> Result<Option<&str>, PersistenceError> {
        let before = self.current_index;
        self.clamp();

        let len = self.items.len();
        if len > 1 {
            let len = len as isize;
            self.current_index = (self.current_index as isize + delta).rem_euclid(len) as usize;
        }

        if self.current_index != before {
            debug!(index = self.current_index, "carousel moved");
            self.persist_index()?;
        }
        Ok(self.current())
    }

    /// Appends a target and makes it active.
    ///
    /// # Errors
    /// `ValidationError::EmptyItem` for blank input (nothing changes);
    /// `PersistenceError` if the save fails (the item stays added).
    pub fn add(&mut self, item: &str) -> Result<&str, CarouselError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(ValidationError::EmptyItem.into());
        }

        self.items.push(item.to_string());
        self.current_index = self.items.len() - 1;
        debug!(item, index = self.current_index, "carousel item added");
        self.persist_all()?;
        Ok(&self.items[self.current_index])
    }

    /// Removes the target at `index`. The last remaining target cannot be
    /// removed.
    ///
    /// # Errors
    /// `ValidationError` when fewer than two targets exist or `index` is out
    /// of range (nothing changes); `PersistenceError` if the save fails (the
    /// removal is kept).
    pub fn remove(&mut self, index: usize) -> Result<Option<&str>, CarouselError> {
        let len = self.items.len();
        if len <= 1 {
            return Err(ValidationError::LastItem.into());
        }
        if index >= len {
            return Err(ValidationError::IndexOutOfRange { index, len }.into());
        }

        let removed = self.items.remove(index);
        self.clamp();
        debug!(item = %removed, index = self.current_index, "carousel item removed");
        self.persist_all()?;
        Ok(self.current())
    }

    fn clamp(&mut self) {
        if self.items.is_empty() {
            self.current_index = 0;
        } else if self.current_index >= self.items.len() {
            self.current_index = self.items.len() - 1;
        }
    }

    fn persist_index(&self) -> Result<(), PersistenceError> {
        match &self.persistence {
            Some(p) => p.store.save_location_index(&p.section, self.current_index),
            None => Ok(()),
        }
    }

    fn persist_all(&self) -> Result<(), PersistenceError> {
        match &self.persistence {
            Some(p) => p
                .store
                .save_carousel(&p.section, &self.items, self.current_index),
            None => Ok(()),
        }
    }
}
