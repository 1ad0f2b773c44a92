//! Grid Drop Handler
//!
//! Matches a drag position against the grid and commits the drop.
//!
//! In grid mode the pointer snaps to the cell under it. In free-form mode
//! every boundary within `snap_distance` proposes its cell; a new
//! row/column at the pointer (offset snapped to `grid_size`) competes as if
//! it lay exactly `snap_distance` away, and the closest candidate wins.

use std::cmp::Ordering;
use tracing::debug;

use r_droid_core::{GridEditorConfig, TieBreak};
use r_droid_layout::attributes::{ATTR_LAYOUT_MARGIN_LEFT, ATTR_LAYOUT_MARGIN_TOP};
use r_droid_layout::{Edit, EditError, LayoutTree, NodeId, Point, Rect};

use crate::feedback::{AxisMatch, DragElement, DropFeedback, InsertionKind};
use crate::model::{Axis, GridModel, MAX_CELL_DIFFERENCE};

/// Drop placement over one grid
pub struct GridDropHandler<'a> {
    model: GridModel,
    config: &'a GridEditorConfig,
}

impl<'a> GridDropHandler<'a> {
    pub fn new(model: GridModel, config: &'a GridEditorConfig) -> Self {
        Self { model, config }
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    /// Compute the row and column candidates for `point` and store them,
    /// with the resulting preview rectangle, in `feedback`
    pub fn compute_matches(&self, feedback: &mut DropFeedback, point: Point) {
        let row = self.match_axis(Axis::Row, point.y);
        let column = self.match_axis(Axis::Column, point.x);

        let preview = match (feedback.element(), &row, &column) {
            (Some(element), Some(row), Some(column)) => {
                let (y1, y2) = self.extent(row, element.size(Axis::Row));
                let (x1, x2) = self.extent(column, element.size(Axis::Column));
                Some(Rect::from_edges(x1, y1, x2, y2))
            }
            _ => None,
        };

        debug!("Drop matches at {:?}: row {:?}, column {:?}", point, row, column);
        feedback.set_matches(row, column, preview);
    }

    /// Best candidate along one axis
    pub fn match_axis(&self, axis: Axis, coordinate: i32) -> Option<AxisMatch> {
        let bounds = self.model.boundaries(axis);
        let cells = self.model.count(axis);

        if self.config.grid_mode {
            if cells == 0 {
                return None;
            }
            let index = self.model.get_index(axis, coordinate);
            return Some(AxisMatch {
                axis,
                index,
                kind: InsertionKind::Cell,
                coordinate: bounds[index],
                distance: (coordinate - bounds[index]).abs(),
                margin: 0,
            });
        }

        let snap = self.config.snap_distance.max(0);
        let mut candidates: Vec<AxisMatch> = bounds
            .iter()
            .enumerate()
            .filter(|(_, b)| (coordinate - **b).abs() <= snap)
            .map(|(index, b)| AxisMatch {
                axis,
                index,
                kind: if index < cells { InsertionKind::Cell } else { InsertionKind::Insert },
                coordinate: *b,
                distance: (coordinate - *b).abs(),
                margin: 0,
            })
            .collect();
        candidates.push(self.new_line(axis, coordinate, snap));

        candidates.into_iter().min_by(|a, b| self.rank(a, b))
    }

    /// Candidate for a new row/column holding the pointer
    fn new_line(&self, axis: Axis, coordinate: i32, snap: i32) -> AxisMatch {
        let bounds = self.model.boundaries(axis);
        let cells = self.model.count(axis);
        let first = bounds.first().copied().unwrap_or(0);

        let index = if cells == 0 || coordinate < first {
            0
        } else if coordinate >= bounds[cells] {
            cells
        } else {
            self.model.get_index(axis, coordinate)
        };
        let base = bounds.get(index).copied().unwrap_or(first);
        let margin = self.snap_offset((coordinate - base).max(0));

        AxisMatch {
            axis,
            index,
            kind: InsertionKind::Insert,
            coordinate: base + margin,
            distance: snap,
            margin,
        }
    }

    fn snap_offset(&self, offset: i32) -> i32 {
        let size = self.config.grid_size;
        if self.config.snap_to_grid && size > 0 {
            (offset + size / 2) / size * size
        } else {
            offset
        }
    }

    /// Closer first; ties by the configured preference, then lower index
    fn rank(&self, a: &AxisMatch, b: &AxisMatch) -> Ordering {
        a.distance
            .cmp(&b.distance)
            .then_with(|| {
                let order = a.creates_boundary().cmp(&b.creates_boundary());
                match self.config.tie_break {
                    TieBreak::PreferExistingCell => order,
                    TieBreak::PreferNewBoundary => order.reverse(),
                }
            })
            .then_with(|| a.index.cmp(&b.index))
    }

    /// Pixel range a match would give the dragged widget
    fn extent(&self, m: &AxisMatch, size: i32) -> (i32, i32) {
        match m.kind {
            InsertionKind::Cell => {
                let bounds = self.model.boundaries(m.axis);
                let span = self.inferred_span(m.axis, m.index, size);
                let last = (m.index + span).min(bounds.len() - 1);
                (bounds[m.index], bounds[last])
            }
            InsertionKind::Insert => {
                let size = if size > 0 { size } else { self.config.default_cell_size };
                (m.coordinate, m.coordinate + size.max(1))
            }
        }
    }

    /// Cells a widget of `size` pixels covers when placed at `index`
    fn inferred_span(&self, axis: Axis, index: usize, size: i32) -> usize {
        let bounds = self.model.boundaries(axis);
        let Some(cell) = bounds.get(index + 1).map(|end| end - bounds[index]) else {
            return 1;
        };
        if cell <= 0 || (size as f32) <= cell as f32 * MAX_CELL_DIFFERENCE {
            return 1;
        }
        ((size as f32 / cell as f32).round() as usize).max(1)
    }

    /// Commit a drop for the active mode
    pub fn handle_drop<T: LayoutTree>(&mut self, tree: &mut T, feedback: &DropFeedback) -> Result<Option<NodeId>, EditError> {
        if self.config.grid_mode {
            self.handle_grid_mode_drop(tree, feedback)
        } else {
            self.handle_free_form_drop(tree, feedback)
        }
    }

    /// Commit a free-form drop, creating the rows and columns it needs
    pub fn handle_free_form_drop<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        feedback: &DropFeedback,
    ) -> Result<Option<NodeId>, EditError> {
        let (Some(element), Some(row_match), Some(column_match)) =
            (feedback.element(), feedback.row_match(), feedback.column_match())
        else {
            return Ok(None);
        };

        let row = self.resolve(tree, row_match, element.height)?;
        let mut column = self.resolve(tree, column_match, element.width)?;

        let occupant = self
            .model
            .blocking(row, column, 1, 1, element.source)
            .map(|v| v.end(Axis::Column));
        if let Some(after) = occupant {
            debug!("Cell ({}, {}) taken, adding a column at {}", row, column, after);
            column = self.insert_for(tree, Axis::Column, after, element.width)?;
        }

        let spans = self.fit_spans(element, row, column, false);
        self.clear_spacers(tree, (row, column), spans, element.source)?;
        let margins = (row_match.margin, column_match.margin);
        let node = self.place(tree, element, (row, column), spans, margins)?;
        Ok(Some(node))
    }

    /// Commit a grid-mode drop into an existing cell. A cell held by another
    /// widget refuses the drop; a spacer in it is replaced.
    pub fn handle_grid_mode_drop<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        feedback: &DropFeedback,
    ) -> Result<Option<NodeId>, EditError> {
        let (Some(element), Some(row_match), Some(column_match)) =
            (feedback.element(), feedback.row_match(), feedback.column_match())
        else {
            return Ok(None);
        };
        if row_match.creates_boundary() || column_match.creates_boundary() {
            return Ok(None);
        }
        let (row, column) = (row_match.index, column_match.index);

        if self.model.blocking(row, column, 1, 1, element.source).is_some() {
            debug!("Drop refused: cell ({}, {}) is occupied", row, column);
            return Ok(None);
        }

        let spans = self.fit_spans(element, row, column, true);
        self.clear_spacers(tree, (row, column), spans, element.source)?;
        let node = self.place(tree, element, (row, column), spans, (0, 0))?;
        Ok(Some(node))
    }

    fn resolve<T: LayoutTree>(&mut self, tree: &mut T, m: &AxisMatch, size: i32) -> Result<usize, EditError> {
        match m.kind {
            InsertionKind::Cell => Ok(m.index),
            InsertionKind::Insert => self.insert_for(tree, m.axis, m.index, size + m.margin),
        }
    }

    fn insert_for<T: LayoutTree>(&mut self, tree: &mut T, axis: Axis, index: usize, size: i32) -> Result<usize, EditError> {
        if size > 0 {
            self.model.insert_line_sized(tree, axis, index, size)
        } else {
            self.model.insert_line(tree, axis, index)
        }
    }

    /// Remove every spacer inside the target cells
    fn clear_spacers<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        (row, column): (usize, usize),
        (row_span, column_span): (usize, usize),
        ignore: Option<NodeId>,
    ) -> Result<(), EditError> {
        while let Some(spacer) = self
            .model
            .overlapping(row, column, row_span, column_span, ignore)
            .filter(|v| v.spacer)
            .map(|v| v.node)
        {
            tree.apply(Edit::remove(spacer))?;
            self.model.mark_deleted(spacer);
        }
        Ok(())
    }

    /// Spans from the dragged size, shrunk until they overlap nothing
    fn fit_spans(&self, element: &DragElement, row: usize, column: usize, clamp: bool) -> (usize, usize) {
        let fit = |axis: Axis, start: usize, size: i32| {
            let span = self.inferred_span(axis, start, size);
            if clamp {
                span.min(self.model.count(axis).saturating_sub(start)).max(1)
            } else {
                span
            }
        };
        let mut row_span = fit(Axis::Row, row, element.height);
        let mut column_span = fit(Axis::Column, column, element.width);

        while column_span > 1 && self.model.blocking(row, column, 1, column_span, element.source).is_some() {
            column_span -= 1;
        }
        while row_span > 1 && self.model.blocking(row, column, row_span, column_span, element.source).is_some() {
            row_span -= 1;
        }
        (row_span, column_span)
    }

    /// Create (or move) the node into the layout at its cell
    fn place<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        element: &DragElement,
        (row, column): (usize, usize),
        (row_span, column_span): (usize, usize),
        (margin_top, margin_left): (i32, i32),
    ) -> Result<NodeId, EditError> {
        let node = match element.source {
            Some(source) => {
                tree.apply(Edit::remove(source))?;
                source
            }
            None => {
                let node = tree.create_node(&element.tag);
                for (name, value) in &element.attributes {
                    tree.apply(Edit::set(node, name, value))?;
                }
                node
            }
        };
        tree.apply(Edit::InsertChild {
            parent: self.model.layout(),
            child: node,
            index: None,
        })?;

        self.model.apply_position(tree, node, row, column, row_span, column_span)?;
        if margin_left > 0 {
            tree.apply(Edit::set(node, ATTR_LAYOUT_MARGIN_LEFT, self.model.px_to_dp(margin_left)))?;
        }
        if margin_top > 0 {
            tree.apply(Edit::set(node, ATTR_LAYOUT_MARGIN_TOP, self.model.px_to_dp(margin_top)))?;
        }
        if self.model.find_view(node).is_none() {
            self.model.register_view(tree, node, row, column);
        }

        debug!(
            "Dropped {} at ({}, {}) spanning {}x{}",
            element.tag, row, column, row_span, column_span
        );
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r_droid_layout::attributes::{
        ATTR_COLUMN_COUNT, ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_COLUMN_SPAN, ATTR_LAYOUT_ROW,
    };
    use r_droid_layout::LayoutDocument;

    /// Rows [0, 50, 100], columns [0, 60, 120]; (0,0) and (1,1) taken
    fn grid() -> (LayoutDocument, NodeId) {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 200, 200));
        for (row, column, bounds) in [(0, 0, Rect::new(0, 0, 60, 50)), (1, 1, Rect::new(60, 50, 60, 50))] {
            let node = doc.add_child(root, "Button").unwrap();
            doc.set_attribute(node, ATTR_LAYOUT_ROW, row).unwrap();
            doc.set_attribute(node, ATTR_LAYOUT_COLUMN, column).unwrap();
            doc.set_bounds(node, bounds);
        }
        (doc, root)
    }

    fn session(root: NodeId, element: DragElement, point: Point) -> DropFeedback {
        let mut feedback = DropFeedback::new();
        feedback.enter(root, element).unwrap();
        feedback.move_to(point).unwrap();
        feedback
    }

    fn handler<'a>(doc: &LayoutDocument, root: NodeId, config: &'a GridEditorConfig) -> GridDropHandler<'a> {
        GridDropHandler::new(GridModel::build(doc, root, config).unwrap(), config)
    }

    #[test]
    fn test_grid_mode_snaps_to_cell() {
        let (doc, root) = grid();
        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let handler = handler(&doc, root, &config);

        let m = handler.match_axis(Axis::Column, 95).unwrap();
        assert_eq!((m.index, m.kind), (1, InsertionKind::Cell));
        // Clamped past the grid
        assert_eq!(handler.match_axis(Axis::Row, 500).unwrap().index, 1);
        assert_eq!(handler.match_axis(Axis::Row, -20).unwrap().index, 0);
    }

    #[test]
    fn test_free_form_snaps_near_boundary() {
        let (doc, root) = grid();
        let config = GridEditorConfig::default();
        let handler = handler(&doc, root, &config);

        let m = handler.match_axis(Axis::Column, 63).unwrap();
        assert_eq!((m.index, m.kind, m.distance), (1, InsertionKind::Cell, 3));

        // Far from every boundary: a new column at the pointer, snapped to 8px
        let m = handler.match_axis(Axis::Column, 85).unwrap();
        assert_eq!((m.index, m.kind), (1, InsertionKind::Insert));
        assert_eq!((m.margin, m.coordinate), (24, 84));

        // Near the last boundary: a new trailing column
        let m = handler.match_axis(Axis::Column, 118).unwrap();
        assert_eq!((m.index, m.kind, m.margin), (2, InsertionKind::Insert, 0));
    }

    #[test]
    fn test_tie_break_is_configurable() {
        let (doc, root) = grid();
        let mut config = GridEditorConfig::default();
        // Exactly snap_distance from boundary 60
        {
            let handler = handler(&doc, root, &config);
            let m = handler.match_axis(Axis::Column, 70).unwrap();
            assert_eq!(m.kind, InsertionKind::Cell);
        }
        config.tie_break = TieBreak::PreferNewBoundary;
        let handler = handler(&doc, root, &config);
        let m = handler.match_axis(Axis::Column, 70).unwrap();
        assert_eq!(m.kind, InsertionKind::Insert);
        assert_eq!(m.index, 1);
    }

    #[test]
    fn test_grid_mode_drop_into_free_cell() {
        let (mut doc, root) = grid();
        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let feedback = {
            let handler = handler(&doc, root, &config);
            let mut feedback = session(root, DragElement::new("CheckBox", 40, 30), Point::new(70, 10));
            handler.compute_matches(&mut feedback, Point::new(70, 10));
            assert_eq!(feedback.preview, Some(Rect::new(60, 0, 60, 50)));
            feedback
        };

        let mut handler = handler(&doc, root, &config);
        let node = handler.handle_grid_mode_drop(&mut doc, &feedback).unwrap().unwrap();
        assert_eq!(doc.parent(node), Some(root));
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_ROW), Some(0));
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN), Some(1));
        assert_eq!(doc.attribute(node, ATTR_LAYOUT_COLUMN_SPAN), None);
    }

    #[test]
    fn test_grid_mode_refuses_occupied_cell() {
        let (mut doc, root) = grid();
        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("CheckBox", 40, 30), Point::new(10, 10));
        handler.compute_matches(&mut feedback, Point::new(10, 10));

        let children = doc.children(root).len();
        assert_eq!(handler.handle_grid_mode_drop(&mut doc, &feedback).unwrap(), None);
        assert_eq!(doc.children(root).len(), children);
    }

    #[test]
    fn test_grid_mode_replaces_spacer() {
        let (mut doc, root) = grid();
        let spacer = doc.add_child(root, "Space").unwrap();
        doc.set_attribute(spacer, ATTR_LAYOUT_ROW, 0).unwrap();
        doc.set_attribute(spacer, ATTR_LAYOUT_COLUMN, 1).unwrap();
        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("CheckBox", 40, 30), Point::new(70, 10));
        handler.compute_matches(&mut feedback, Point::new(70, 10));

        let node = handler.handle_grid_mode_drop(&mut doc, &feedback).unwrap();
        assert!(node.is_some());
        assert!(!doc.is_attached(spacer));
    }

    #[test]
    fn test_wide_widget_spans_columns() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 200, 200));
        doc.set_attribute(root, ATTR_COLUMN_COUNT, 2).unwrap();
        let only = doc.add_child(root, "Button").unwrap();
        doc.set_attribute(only, ATTR_LAYOUT_ROW, 1).unwrap();
        doc.set_attribute(only, ATTR_LAYOUT_COLUMN, 0).unwrap();
        doc.set_bounds(only, Rect::new(0, 50, 60, 50));
        let spacer = doc.add_child(root, "Space").unwrap();
        doc.set_attribute(spacer, ATTR_LAYOUT_ROW, 0).unwrap();
        doc.set_attribute(spacer, ATTR_LAYOUT_COLUMN, 1).unwrap();
        doc.set_bounds(spacer, Rect::new(60, 0, 60, 50));

        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("EditText", 130, 40), Point::new(5, 5));
        handler.compute_matches(&mut feedback, Point::new(5, 5));
        assert_eq!(feedback.preview, Some(Rect::new(0, 0, 120, 50)));

        let node = handler.handle_grid_mode_drop(&mut doc, &feedback).unwrap().unwrap();
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN_SPAN), Some(2));
        assert!(!doc.is_attached(spacer));
    }

    #[test]
    fn test_free_form_drop_creates_column() {
        let (mut doc, root) = grid();
        let config = GridEditorConfig::default();
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("Switch", 30, 30), Point::new(85, 5));
        handler.compute_matches(&mut feedback, Point::new(85, 5));

        let node = handler.handle_free_form_drop(&mut doc, &feedback).unwrap().unwrap();
        assert_eq!(handler.model().column_count(), 3);
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN), Some(1));
        assert_eq!(doc.attribute(node, ATTR_LAYOUT_MARGIN_LEFT), Some("24dp"));
        // The widget that was in column 1 moved right
        let moved = doc.children(root)[1];
        assert_eq!(doc.int_attribute(moved, ATTR_LAYOUT_COLUMN), Some(2));
    }

    #[test]
    fn test_free_form_occupied_cell_adds_column() {
        let (mut doc, root) = grid();
        let config = GridEditorConfig::default();
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("Switch", 30, 30), Point::new(2, 52));
        handler.compute_matches(&mut feedback, Point::new(62, 52));
        // Lands on (1, 1), held by the second button
        assert_eq!(feedback.column_match().map(|m| m.kind), Some(InsertionKind::Cell));

        let node = handler.handle_free_form_drop(&mut doc, &feedback).unwrap().unwrap();
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_ROW), Some(1));
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN), Some(2));
        assert_eq!(handler.model().column_count(), 3);
    }

    #[test]
    fn test_drop_into_empty_grid() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 300, 300));
        let config = GridEditorConfig::default();
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("Button", 80, 40), Point::new(3, 2));
        handler.compute_matches(&mut feedback, Point::new(3, 2));

        let node = handler.handle_free_form_drop(&mut doc, &feedback).unwrap().unwrap();
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_ROW), Some(0));
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN), Some(0));
        assert_eq!(handler.model().row_count(), 1);
        assert_eq!(handler.model().column_count(), 1);
    }

    #[test]
    fn test_grid_mode_empty_grid_has_no_match() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 300, 300));
        let config = GridEditorConfig { grid_mode: true, ..Default::default() };
        let mut handler = handler(&doc, root, &config);
        let mut feedback = session(root, DragElement::new("Button", 80, 40), Point::new(3, 2));
        handler.compute_matches(&mut feedback, Point::new(3, 2));

        assert!(!feedback.has_match());
        assert_eq!(handler.handle_grid_mode_drop(&mut doc, &feedback).unwrap(), None);
        assert!(doc.children(root).is_empty());
    }
}
