//! R-Droid Designer - GridLayout editing for Android layouts
//!
//! Design-time editing of `GridLayout` containers in layout resource files,
//! usable as a library or through the `r-droid-designer` command line.
//!
//! ## Architecture
//!
//! - `r-droid-core`: configuration, errors and the event bus
//! - `r-droid-layout`: layout documents, XML parsing and writing
//! - `r-droid-grid-editor`: grid model, drop handling, resizing and painting

#![doc(html_root_url = "https://docs.rdroid.dev/")]
#![warn(clippy::all)]

pub mod commands;

// Re-export main components for library usage
pub use r_droid_core as core;
pub use r_droid_grid_editor as grid;
pub use r_droid_layout as layout;

/// Prelude module for convenient imports
pub mod prelude {
    pub use r_droid_core::{AppConfig, Event, EventBus, GridEditorConfig, GridFlag};
    pub use r_droid_grid_editor::{
        Action, ActionContext, DragElement, DropFeedback, GridLayoutRule, GridModel,
    };
    pub use r_droid_layout::{LayoutDocument, LayoutParser, LayoutTree, LayoutWriter, NodeId, Point, Rect};
}
