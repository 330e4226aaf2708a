//! Core dashboard runtime (config, scheduling, carousel, selection, plugins).

pub mod carousel;
pub mod config;
pub mod error;
pub mod plugin;
pub mod scheduler;
pub mod selection;
pub mod sources;
