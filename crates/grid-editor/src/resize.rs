//! Resize Protocol
//!
//! A widget inside a grid is resized either in pixels (`layout_width` /
//! `layout_height`) or, with [`SPAN_MODIFIER`] held, by changing the rows
//! and columns it spans.

use serde::{Deserialize, Serialize};
use tracing::debug;

use r_droid_layout::{NodeId, Rect};

use crate::model::{Axis, GridModel};

/// Modifier bit selecting span resizing
pub const SPAN_MODIFIER: u32 = 1 << 0;

/// Cell placement of a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
}

/// An in-progress resize
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeState {
    pub node: NodeId,
    pub layout: NodeId,
    /// Bounds when the resize began
    pub original: Rect,
    /// Latest proposed bounds
    pub bounds: Rect,
    /// Modifier bits of the latest update
    pub modifiers: u32,
    /// Placement before the resize
    pub start: CellRange,
    /// Placement the span resize would produce
    pub cells: Option<CellRange>,
}

impl ResizeState {
    pub fn new(node: NodeId, layout: NodeId, original: Rect, start: CellRange, modifiers: u32) -> Self {
        Self {
            node,
            layout,
            original,
            bounds: original,
            modifiers,
            start,
            cells: None,
        }
    }

    pub fn span_mode(&self) -> bool {
        self.modifiers & SPAN_MODIFIER != 0
    }

    pub fn width_changed(&self) -> bool {
        self.bounds.x != self.original.x || self.bounds.w != self.original.w
    }

    pub fn height_changed(&self) -> bool {
        self.bounds.y != self.original.y || self.bounds.h != self.original.h
    }
}

/// Placement for `bounds` along the axes that changed. The span covers the
/// cells from the leading to the trailing edge; the start cell only moves
/// when the leading edge did.
///
/// Spans shrink from the trailing edge until no other widget is covered.
/// When even a single cell would overlap, the widget keeps its placement.
pub fn span_cells(model: &GridModel, state: &ResizeState) -> CellRange {
    let mut cells = state.start;
    let b = state.bounds;

    if state.height_changed() {
        let (row, span) = axis_cells(model, Axis::Row, b.y, b.y2(), b.y != state.original.y, state.start.row);
        cells.row = row;
        cells.row_span = span;
    }
    if state.width_changed() {
        let (column, span) = axis_cells(model, Axis::Column, b.x, b.x2(), b.x != state.original.x, state.start.column);
        cells.column = column;
        cells.column_span = span;
    }
    fit_cells(model, state, cells)
}

fn fit_cells(model: &GridModel, state: &ResizeState, mut cells: CellRange) -> CellRange {
    let blocked = |c: &CellRange| {
        model
            .blocking(c.row, c.column, c.row_span, c.column_span, Some(state.node))
            .is_some()
    };
    while blocked(&cells) {
        if state.width_changed() && cells.column_span > 1 {
            cells.column_span -= 1;
        } else if state.height_changed() && cells.row_span > 1 {
            cells.row_span -= 1;
        } else {
            debug!("Resize of {:?} would overlap another widget", state.node);
            return state.start;
        }
    }
    cells
}

fn axis_cells(model: &GridModel, axis: Axis, lo: i32, hi: i32, leading_moved: bool, start: usize) -> (usize, usize) {
    let first = if leading_moved { model.get_index(axis, lo) } else { start };
    let last = model.get_index(axis, (hi - 1).max(lo));
    let span = last.saturating_sub(first) + 1;
    (first, span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_droid_core::GridEditorConfig;
    use r_droid_layout::attributes::{ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_ROW};
    use r_droid_layout::{LayoutDocument, LayoutTree};

    /// Rows [0, 50, 100], columns [0, 60, 120]
    fn model() -> (GridModel, NodeId) {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 200, 200));
        let a = doc.add_child(root, "Button").unwrap();
        doc.set_attribute(a, ATTR_LAYOUT_ROW, 0).unwrap();
        doc.set_attribute(a, ATTR_LAYOUT_COLUMN, 0).unwrap();
        doc.set_bounds(a, Rect::new(0, 0, 60, 50));
        let b = doc.add_child(root, "Button").unwrap();
        doc.set_attribute(b, ATTR_LAYOUT_ROW, 1).unwrap();
        doc.set_attribute(b, ATTR_LAYOUT_COLUMN, 1).unwrap();
        doc.set_bounds(b, Rect::new(60, 50, 60, 50));
        (GridModel::build(&doc, root, &GridEditorConfig::default()).unwrap(), a)
    }

    fn start() -> CellRange {
        CellRange { row: 0, column: 0, row_span: 1, column_span: 1 }
    }

    #[test]
    fn test_span_from_widened_bounds() {
        let (model, a) = model();
        let mut state = ResizeState::new(a, model.layout(), Rect::new(0, 0, 60, 50), start(), SPAN_MODIFIER);
        assert!(state.span_mode());

        state.bounds = Rect::new(55, 5, 50, 40);
        let cells = span_cells(&model, &state);
        assert_eq!(cells.column, 0);
        assert_eq!(cells.column_span, 2);
        assert_eq!(cells.row, 0);
        assert_eq!(cells.row_span, 1);
    }

    #[test]
    fn test_trailing_edge_keeps_start() {
        let (model, a) = model();
        let mut state = ResizeState::new(a, model.layout(), Rect::new(0, 0, 60, 50), start(), SPAN_MODIFIER);
        state.bounds = Rect::new(0, 0, 60, 95);
        let cells = span_cells(&model, &state);
        assert_eq!((cells.row, cells.row_span), (0, 2));
        // Width did not change
        assert_eq!((cells.column, cells.column_span), (0, 1));
    }

    #[test]
    fn test_span_stops_before_other_widget() {
        let (model, a) = model();
        let mut state = ResizeState::new(a, model.layout(), Rect::new(0, 0, 60, 50), start(), SPAN_MODIFIER);
        state.bounds = Rect::new(0, 0, 120, 100);
        let cells = span_cells(&model, &state);
        assert_eq!(cells, CellRange { row: 0, column: 0, row_span: 2, column_span: 1 });
        assert!(model
            .blocking(cells.row, cells.column, cells.row_span, cells.column_span, Some(a))
            .is_none());
    }

    #[test]
    fn test_moving_onto_occupied_cell_keeps_placement() {
        let (model, a) = model();
        let mut state = ResizeState::new(a, model.layout(), Rect::new(0, 0, 60, 50), start(), SPAN_MODIFIER);
        state.bounds = Rect::new(60, 50, 60, 50);
        assert_eq!(span_cells(&model, &state), start());
    }

    #[test]
    fn test_pixel_mode_without_modifier() {
        let (model, a) = model();
        let state = ResizeState::new(a, model.layout(), Rect::new(0, 0, 60, 50), start(), 0);
        assert!(!state.span_mode());
        assert!(!state.width_changed());
    }
}
