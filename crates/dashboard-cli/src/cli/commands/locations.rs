//! Location carousel commands.
//!
//! Each command loads the carousel from `[weather]`, applies one operation
//! and persists through the same `ConfigStore` the dashboard uses.

use std::sync::Arc;

use anyhow::{Context, Result};
use dashboard_core::carousel::Carousel;
use dashboard_core::config::ConfigStore;

fn open() -> Result<Carousel> {
    let store = Arc::new(ConfigStore::open_default());
    let config = store.load().context("load config")?;
    Ok(Carousel::from_weather_config(&config.weather, store))
}

fn print_current(carousel: &Carousel) {
    match (carousel.current_index(), carousel.current()) {
        (Some(index), Some(location)) => {
            println!("Current location: {location} ({}/{})", index + 1, carousel.len());
        }
        _ => println!("No locations configured."),
    }
}

pub fn list() -> Result<()> {
    let carousel = open()?;
    if carousel.is_empty() {
        println!("No locations configured.");
        return Ok(());
    }
    let current = carousel.current_index();
    for (index, location) in carousel.items().iter().enumerate() {
        let marker = if Some(index) == current { '*' } else { ' ' };
        println!("{marker} {index}  {location}");
    }
    Ok(())
}

pub fn add(location: &str) -> Result<()> {
    let mut carousel = open()?;
    carousel.add(location)?;
    print_current(&carousel);
    Ok(())
}

pub fn remove(index: usize) -> Result<()> {
    let mut carousel = open()?;
    let removed = carousel
        .items()
        .get(index)
        .cloned()
        .unwrap_or_default();
    carousel.remove(index)?;
    println!("Removed {removed}");
    print_current(&carousel);
    Ok(())
}

pub fn next() -> Result<()> {
    let mut carousel = open()?;
    carousel.next()?;
    print_current(&carousel);
    Ok(())
}

pub fn previous() -> Result<()> {
    let mut carousel = open()?;
    carousel.previous()?;
    print_current(&carousel);
    Ok(())
}
