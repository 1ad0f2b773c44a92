//! R-Droid Core - Shared configuration, errors and events
//!
//! This crate provides the pieces every designer component agrees on:
//! persistent settings, the IDE-wide error type and the event bus.

pub mod config;
pub mod events;
pub mod error;

pub use config::{AppConfig, GridEditorConfig, GridFlag, PreviewConfig, TieBreak};
pub use events::{Event, EventBus, EventSubscription};
pub use error::{RDroidError, Result};

/// R-Droid version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "R-Droid Designer";
