//! Drop Feedback
//!
//! Transient state of one drag-and-drop session over a grid: what is being
//! dragged, where, and the row/column the drop would land in.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use r_droid_layout::{LayoutTree, NodeId, Point, Rect};

use crate::model::Axis;

/// Drag session state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DragState {
    #[default]
    Idle,
    Entered,
    Moving,
    Committed,
    Cancelled,
}

impl DragState {
    /// Whether a session is in progress
    pub fn is_active(&self) -> bool {
        matches!(self, DragState::Entered | DragState::Moving)
    }
}

/// Invalid drag state transitions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DragError {
    #[error("Cannot {action} while the drag is {state:?}")]
    InvalidTransition { state: DragState, action: &'static str },
}

/// How a match places the widget along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertionKind {
    /// Into the existing cell at `index`
    Cell,
    /// Into a new row/column inserted at `index`
    Insert,
}

/// Drop candidate along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisMatch {
    pub axis: Axis,
    pub index: usize,
    pub kind: InsertionKind,
    /// Pixel coordinate the widget's leading edge lands on
    pub coordinate: i32,
    /// Distance from the pointer, used to rank candidates
    pub distance: i32,
    /// Offset from the new row/column's leading boundary
    pub margin: i32,
}

impl AxisMatch {
    pub fn creates_boundary(&self) -> bool {
        self.kind == InsertionKind::Insert
    }
}

/// The widget being dragged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DragElement {
    pub tag: String,
    /// Attributes for a newly created node
    pub attributes: Vec<(String, String)>,
    /// Dragged size in pixels; 0 when unknown
    pub width: i32,
    pub height: i32,
    /// Existing node being moved, if any
    pub source: Option<NodeId>,
}

impl DragElement {
    pub fn new(tag: impl Into<String>, width: i32, height: i32) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            width: width.max(0),
            height: height.max(0),
            source: None,
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Drag an existing node, sized by its rendered bounds
    pub fn from_node<T: LayoutTree>(tree: &T, node: NodeId) -> Option<Self> {
        let tag = tree.tag(node)?;
        let bounds = tree.bounds(node).unwrap_or_default();
        let mut element = Self::new(tag, bounds.w, bounds.h);
        element.source = Some(node);
        Some(element)
    }

    /// Dragged size along an axis
    pub fn size(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Row => self.height,
            Axis::Column => self.width,
        }
    }
}

/// Feedback for one drag session
#[derive(Debug, Clone, Default)]
pub struct DropFeedback {
    state: DragState,
    layout: Option<NodeId>,
    element: Option<DragElement>,
    point: Option<Point>,
    row_match: Option<AxisMatch>,
    column_match: Option<AxisMatch>,
    /// Where the widget would end up
    pub preview: Option<Rect>,
}

impl DropFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DragState {
        self.state
    }

    pub fn layout(&self) -> Option<NodeId> {
        self.layout
    }

    pub fn element(&self) -> Option<&DragElement> {
        self.element.as_ref()
    }

    pub fn point(&self) -> Option<Point> {
        self.point
    }

    pub fn row_match(&self) -> Option<&AxisMatch> {
        self.row_match.as_ref()
    }

    pub fn column_match(&self) -> Option<&AxisMatch> {
        self.column_match.as_ref()
    }

    /// Both axes have a candidate
    pub fn has_match(&self) -> bool {
        self.row_match.is_some() && self.column_match.is_some()
    }

    pub(crate) fn set_matches(&mut self, row: Option<AxisMatch>, column: Option<AxisMatch>, preview: Option<Rect>) {
        self.row_match = row;
        self.column_match = column;
        self.preview = preview;
    }

    pub fn clear_matches(&mut self) {
        self.set_matches(None, None, None);
    }

    /// Start a session. Allowed from idle or after a finished session.
    pub fn enter(&mut self, layout: NodeId, element: DragElement) -> Result<(), DragError> {
        if self.state.is_active() {
            return Err(self.invalid("enter"));
        }
        *self = Self {
            state: DragState::Entered,
            layout: Some(layout),
            element: Some(element),
            ..Self::default()
        };
        debug!("Drag entered {:?}", layout);
        Ok(())
    }

    /// Record a pointer move
    pub fn move_to(&mut self, point: Point) -> Result<(), DragError> {
        if !self.state.is_active() {
            return Err(self.invalid("move"));
        }
        self.state = DragState::Moving;
        self.point = Some(point);
        Ok(())
    }

    /// Finish with a drop; transient state is discarded
    pub fn commit(&mut self) -> Result<(), DragError> {
        self.finish(DragState::Committed, "commit")
    }

    /// Finish without a drop
    pub fn cancel(&mut self) -> Result<(), DragError> {
        self.finish(DragState::Cancelled, "cancel")
    }

    fn finish(&mut self, state: DragState, action: &'static str) -> Result<(), DragError> {
        if !self.state.is_active() {
            return Err(self.invalid(action));
        }
        *self = Self {
            state,
            ..Self::default()
        };
        debug!("Drag {:?}", state);
        Ok(())
    }

    fn invalid(&self, action: &'static str) -> DragError {
        DragError::InvalidTransition {
            state: self.state,
            action,
        }
    }
}
