//! R-Droid Grid Editor
//!
//! Design-time editing of `GridLayout` containers:
//! - Row/column model derived from the rendered children
//! - Drag-and-drop placement in grid and free-form modes
//! - Span and pixel resizing
//! - Structure, drop feedback and debug painting

pub mod drop_handler;
pub mod feedback;
pub mod metadata;
pub mod model;
pub mod painter;
pub mod preview;
pub mod resize;
pub mod rule;

pub use drop_handler::GridDropHandler;
pub use feedback::{AxisMatch, DragElement, DragError, DragState, DropFeedback, InsertionKind};
pub use metadata::FillPreference;
pub use model::{Axis, GridModel, ViewData, MAX_CELL_DIFFERENCE, MAX_GRID_LINES};
pub use painter::{DrawingStyle, GridLayoutPainter, PaintCommand, PaintSurface};
pub use preview::apply_preview;
pub use resize::{CellRange, ResizeState, SPAN_MODIFIER};
pub use rule::{Action, ActionContext, ActionOutcome, GridLayoutRule, InsertType, RuleError};
