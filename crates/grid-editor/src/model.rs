//! Grid Model
//!
//! A transient view of one GridLayout: its row and column boundaries in
//! pixels and the cells each child occupies. A model is built from the
//! current document for every interaction and dropped afterwards; all
//! structural changes are written straight back to the tree.

use std::collections::{BTreeSet, HashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use r_droid_core::GridEditorConfig;
use r_droid_layout::attributes::{
    is_spacer, ATTR_COLUMN_COUNT, ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_COLUMN_SPAN,
    ATTR_LAYOUT_COLUMN_SPAN_ALIAS, ATTR_LAYOUT_GRAVITY, ATTR_LAYOUT_HEIGHT, ATTR_LAYOUT_ROW,
    ATTR_LAYOUT_ROW_SPAN, ATTR_LAYOUT_ROW_SPAN_ALIAS, ATTR_LAYOUT_WIDTH, ATTR_ORIENTATION,
    ATTR_ROW_COUNT, SPACE, VALUE_VERTICAL, VALUE_WRAP_CONTENT,
};
use r_droid_layout::{Edit, EditError, LayoutTree, NodeId, Rect};

/// Size ratio above which a single-cell widget is treated as spanning
/// several cells instead of stretching the cell it starts in.
pub const MAX_CELL_DIFFERENCE: f32 = 1.2;

/// Smallest distance kept between two boundaries
const MIN_CELL_SIZE: i32 = 1;

/// Upper bound for positions, spans and counts read from layout attributes
pub const MAX_GRID_LINES: usize = 256;

/// A grid axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    Row,
    Column,
}

impl Axis {
    pub fn start_attribute(self) -> &'static str {
        match self {
            Axis::Row => ATTR_LAYOUT_ROW,
            Axis::Column => ATTR_LAYOUT_COLUMN,
        }
    }

    pub fn span_attribute(self) -> &'static str {
        match self {
            Axis::Row => ATTR_LAYOUT_ROW_SPAN,
            Axis::Column => ATTR_LAYOUT_COLUMN_SPAN,
        }
    }

    fn span_alias(self) -> &'static str {
        match self {
            Axis::Row => ATTR_LAYOUT_ROW_SPAN_ALIAS,
            Axis::Column => ATTR_LAYOUT_COLUMN_SPAN_ALIAS,
        }
    }

    pub fn count_attribute(self) -> &'static str {
        match self {
            Axis::Row => ATTR_ROW_COUNT,
            Axis::Column => ATTR_COLUMN_COUNT,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Axis::Row => "row",
            Axis::Column => "column",
        }
    }
}

/// Grid placement of one child of the layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewData {
    pub node: NodeId,
    pub tag: String,
    pub row: usize,
    pub column: usize,
    pub row_span: usize,
    pub column_span: usize,
    pub gravity: Option<String>,
    /// Rendered bounds, shifted along with structural edits
    pub bounds: Option<Rect>,
    pub spacer: bool,
    #[serde(skip)]
    deleted: bool,
}

impl ViewData {
    fn read<T: LayoutTree>(tree: &T, node: NodeId) -> Self {
        let span = |axis: Axis| {
            tree.int_attribute(node, axis.span_attribute())
                .or_else(|| tree.int_attribute(node, axis.span_alias()))
                .unwrap_or(1)
                .clamp(1, MAX_GRID_LINES)
        };
        let tag = tree.tag(node).unwrap_or_default().to_string();
        Self {
            node,
            spacer: is_spacer(&tag),
            tag,
            row: 0,
            column: 0,
            row_span: span(Axis::Row),
            column_span: span(Axis::Column),
            gravity: tree.attribute(node, ATTR_LAYOUT_GRAVITY).map(str::to_string),
            bounds: tree.bounds(node).filter(Rect::is_valid),
            deleted: false,
        }
    }

    pub fn start(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.row,
            Axis::Column => self.column,
        }
    }

    pub fn span(&self, axis: Axis) -> usize {
        match axis {
            Axis::Row => self.row_span,
            Axis::Column => self.column_span,
        }
    }

    /// Exclusive end index along an axis
    pub fn end(&self, axis: Axis) -> usize {
        self.start(axis).saturating_add(self.span(axis))
    }

    /// Whether the widget covers `index` along `axis`
    pub fn spans(&self, axis: Axis, index: usize) -> bool {
        self.start(axis) <= index && index < self.end(axis)
    }

    /// Whether the widget covers the given cell
    pub fn occupies(&self, row: usize, column: usize) -> bool {
        self.spans(Axis::Row, row) && self.spans(Axis::Column, column)
    }

    /// Whether the widget intersects a cell range
    pub fn overlaps(&self, row: usize, column: usize, row_span: usize, column_span: usize) -> bool {
        self.row < row + row_span.max(1)
            && row < self.end(Axis::Row)
            && self.column < column + column_span.max(1)
            && column < self.end(Axis::Column)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn set_start(&mut self, axis: Axis, value: usize) {
        match axis {
            Axis::Row => self.row = value,
            Axis::Column => self.column = value,
        }
    }

    fn set_span(&mut self, axis: Axis, value: usize) {
        match axis {
            Axis::Row => self.row_span = value,
            Axis::Column => self.column_span = value,
        }
    }

    fn shift_bounds(&mut self, axis: Axis, delta: i32) {
        if let Some(b) = self.bounds.as_mut() {
            match axis {
                Axis::Row => b.y += delta,
                Axis::Column => b.x += delta,
            }
        }
    }

    fn grow_bounds(&mut self, axis: Axis, delta: i32) {
        if let Some(b) = self.bounds.as_mut() {
            match axis {
                Axis::Row => b.h = (b.h + delta).max(0),
                Axis::Column => b.w = (b.w + delta).max(0),
            }
        }
    }
}

/// Row/column structure of a GridLayout
#[derive(Debug, Clone)]
pub struct GridModel {
    layout: NodeId,
    bounds: Rect,
    vertical: bool,
    declared_row_count: Option<usize>,
    declared_column_count: Option<usize>,
    row_bounds: Vec<i32>,
    column_bounds: Vec<i32>,
    children: Vec<ViewData>,
    default_cell_size: i32,
    density: f32,
}

impl GridModel {
    /// Build the model for `layout` from the current tree.
    ///
    /// Returns None when the layout has no usable bounds; callers abort the
    /// interaction before touching the document.
    pub fn build<T: LayoutTree>(tree: &T, layout: NodeId, config: &GridEditorConfig) -> Option<Self> {
        let Some(bounds) = tree.bounds(layout).filter(Rect::is_valid) else {
            debug!("Layout {:?} has no usable bounds", layout);
            return None;
        };

        let vertical = tree.attribute(layout, ATTR_ORIENTATION) == Some(VALUE_VERTICAL);
        let count = |name: &str| tree.int_attribute(layout, name).map(|c| c.min(MAX_GRID_LINES));
        let declared_row_count = count(ATTR_ROW_COUNT);
        let declared_column_count = count(ATTR_COLUMN_COUNT);
        let index = |node: NodeId, name: &str| tree.int_attribute(node, name).map(|i| i.min(MAX_GRID_LINES - 1));

        let mut children = Vec::new();
        let mut declared = Vec::new();
        for node in tree.children(layout) {
            declared.push((index(node, ATTR_LAYOUT_ROW), index(node, ATTR_LAYOUT_COLUMN)));
            children.push(ViewData::read(tree, node));
        }
        place_children(&mut children, &declared, vertical, declared_row_count, declared_column_count);

        let rows = children
            .iter()
            .map(|v| v.end(Axis::Row))
            .max()
            .unwrap_or(0)
            .max(declared_row_count.unwrap_or(0));
        let columns = children
            .iter()
            .map(|v| v.end(Axis::Column))
            .max()
            .unwrap_or(0)
            .max(declared_column_count.unwrap_or(0));

        let extents = |axis: Axis| -> Vec<(usize, usize, i32, i32)> {
            children
                .iter()
                .filter_map(|v| {
                    v.bounds.map(|b| match axis {
                        Axis::Row => (v.row, v.row_span, b.y, b.y2()),
                        Axis::Column => (v.column, v.column_span, b.x, b.x2()),
                    })
                })
                .collect()
        };
        let row_bounds = derive_boundaries(bounds.y, bounds.y2(), rows, &extents(Axis::Row));
        let column_bounds = derive_boundaries(bounds.x, bounds.x2(), columns, &extents(Axis::Column));

        debug!(
            "Grid {:?}: {} rows, {} columns, {} children",
            layout,
            rows,
            columns,
            children.len()
        );

        Some(Self {
            layout,
            bounds,
            vertical,
            declared_row_count,
            declared_column_count,
            row_bounds,
            column_bounds,
            children,
            default_cell_size: config.default_cell_size.max(MIN_CELL_SIZE),
            density: if config.density > 0.0 { config.density } else { 1.0 },
        })
    }

    pub fn layout(&self) -> NodeId {
        self.layout
    }

    /// Bounds of the layout container
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_vertical(&self) -> bool {
        self.vertical
    }

    pub fn row_boundaries(&self) -> &[i32] {
        &self.row_bounds
    }

    pub fn column_boundaries(&self) -> &[i32] {
        &self.column_bounds
    }

    pub fn boundaries(&self, axis: Axis) -> &[i32] {
        match axis {
            Axis::Row => &self.row_bounds,
            Axis::Column => &self.column_bounds,
        }
    }

    fn boundaries_mut(&mut self, axis: Axis) -> &mut Vec<i32> {
        match axis {
            Axis::Row => &mut self.row_bounds,
            Axis::Column => &mut self.column_bounds,
        }
    }

    pub fn row_count(&self) -> usize {
        self.count(Axis::Row)
    }

    pub fn column_count(&self) -> usize {
        self.count(Axis::Column)
    }

    /// Number of cells along an axis
    pub fn count(&self, axis: Axis) -> usize {
        self.boundaries(axis).len().saturating_sub(1)
    }

    pub fn declared_count(&self, axis: Axis) -> Option<usize> {
        match axis {
            Axis::Row => self.declared_row_count,
            Axis::Column => self.declared_column_count,
        }
    }

    fn set_declared_count(&mut self, axis: Axis, value: Option<usize>) {
        match axis {
            Axis::Row => self.declared_row_count = value,
            Axis::Column => self.declared_column_count = value,
        }
    }

    /// Live (not deleted) children
    pub fn views(&self) -> impl Iterator<Item = &ViewData> {
        self.children.iter().filter(|v| !v.deleted)
    }

    pub fn find_view(&self, node: NodeId) -> Option<&ViewData> {
        self.views().find(|v| v.node == node)
    }

    /// The live widget covering a cell, spacers included
    pub fn view_at(&self, row: usize, column: usize) -> Option<&ViewData> {
        self.views().find(|v| v.occupies(row, column))
    }

    pub fn views_in_row(&self, row: usize) -> Vec<&ViewData> {
        self.views().filter(|v| v.spans(Axis::Row, row)).collect()
    }

    pub fn views_in_column(&self, column: usize) -> Vec<&ViewData> {
        self.views().filter(|v| v.spans(Axis::Column, column)).collect()
    }

    /// A row is empty when no live non-spacer widget covers it
    pub fn is_empty_row(&self, row: usize) -> bool {
        !self.is_occupied_line(Axis::Row, row)
    }

    pub fn is_empty_column(&self, column: usize) -> bool {
        !self.is_occupied_line(Axis::Column, column)
    }

    fn is_occupied_line(&self, axis: Axis, index: usize) -> bool {
        self.views().any(|v| !v.spacer && v.spans(axis, index))
    }

    /// First live widget other than `ignore` overlapping the cell range
    pub fn overlapping(
        &self,
        row: usize,
        column: usize,
        row_span: usize,
        column_span: usize,
        ignore: Option<NodeId>,
    ) -> Option<&ViewData> {
        self.views()
            .filter(|v| Some(v.node) != ignore)
            .find(|v| v.overlaps(row, column, row_span, column_span))
    }

    /// Like [`GridModel::overlapping`], but spacers never block
    pub fn blocking(
        &self,
        row: usize,
        column: usize,
        row_span: usize,
        column_span: usize,
        ignore: Option<NodeId>,
    ) -> Option<&ViewData> {
        self.views()
            .filter(|v| !v.spacer && Some(v.node) != ignore)
            .find(|v| v.overlaps(row, column, row_span, column_span))
    }

    /// Whether any live widget other than `ignore` covers the cell
    pub fn is_occupied(&self, row: usize, column: usize, ignore: Option<NodeId>) -> bool {
        self.overlapping(row, column, 1, 1, ignore).is_some()
    }

    /// Row containing pixel `y`, clamped to the grid
    pub fn get_row(&self, y: i32) -> usize {
        index_of(&self.row_bounds, y)
    }

    /// Column containing pixel `x`, clamped to the grid
    pub fn get_column(&self, x: i32) -> usize {
        index_of(&self.column_bounds, x)
    }

    pub fn get_index(&self, axis: Axis, coordinate: i32) -> usize {
        index_of(self.boundaries(axis), coordinate)
    }

    /// Pixel rectangle covering a range of cells
    pub fn get_cell_bounds(&self, row: usize, column: usize, row_span: usize, column_span: usize) -> Rect {
        let (y1, y2) = span_edges(&self.row_bounds, row, row_span);
        let (x1, x2) = span_edges(&self.column_bounds, column, column_span);
        Rect::from_edges(x1, y1, x2, y2)
    }

    /// Insert a row after the rows spanned by `children`.
    ///
    /// Returns the index of the new row, or None when no child of this grid
    /// was given.
    pub fn add_row<T: LayoutTree>(&mut self, tree: &mut T, children: &[NodeId]) -> Result<Option<usize>, EditError> {
        self.add_after(tree, Axis::Row, children)
    }

    /// Insert a column after the columns spanned by `children`
    pub fn add_column<T: LayoutTree>(&mut self, tree: &mut T, children: &[NodeId]) -> Result<Option<usize>, EditError> {
        self.add_after(tree, Axis::Column, children)
    }

    fn add_after<T: LayoutTree>(&mut self, tree: &mut T, axis: Axis, children: &[NodeId]) -> Result<Option<usize>, EditError> {
        let Some(index) = self
            .views()
            .filter(|v| children.contains(&v.node))
            .map(|v| v.end(axis))
            .max()
        else {
            debug!("No {} added: nothing selected in {:?}", axis.name(), self.layout);
            return Ok(None);
        };

        self.insert_line(tree, axis, index)?;
        self.add_spacer_line(tree, axis, index)?;
        Ok(Some(index))
    }

    /// Insert an empty row before row `index`
    pub fn insert_row<T: LayoutTree>(&mut self, tree: &mut T, index: usize) -> Result<usize, EditError> {
        self.insert_line(tree, Axis::Row, index)
    }

    /// Insert an empty column before column `index`
    pub fn insert_column<T: LayoutTree>(&mut self, tree: &mut T, index: usize) -> Result<usize, EditError> {
        self.insert_line(tree, Axis::Column, index)
    }

    /// Insert a new cell line at `index` along `axis`, shifting everything at
    /// or past it. Widgets crossing the insertion point grow by one.
    pub fn insert_line<T: LayoutTree>(&mut self, tree: &mut T, axis: Axis, index: usize) -> Result<usize, EditError> {
        self.insert_line_sized(tree, axis, index, self.default_cell_size)
    }

    pub(crate) fn insert_line_sized<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        axis: Axis,
        index: usize,
        size: i32,
    ) -> Result<usize, EditError> {
        let index = index.min(self.count(axis));
        let size = size.max(MIN_CELL_SIZE);

        for view in self.children.iter_mut().filter(|v| !v.deleted) {
            if view.start(axis) >= index {
                let start = view.start(axis) + 1;
                view.set_start(axis, start);
                view.shift_bounds(axis, size);
                tree.apply(Edit::set(view.node, axis.start_attribute(), start))?;
            } else if view.end(axis) > index {
                let span = view.span(axis) + 1;
                view.set_span(axis, span);
                view.grow_bounds(axis, size);
                write_span(tree, view.node, axis, span)?;
            }
        }

        let bounds = self.boundaries_mut(axis);
        let at = bounds[index];
        for b in bounds.iter_mut().skip(index + 1) {
            *b += size;
        }
        bounds.insert(index + 1, at + size);

        if let Some(count) = self.declared_count(axis) {
            self.set_declared_count(axis, Some(count + 1));
            tree.apply(Edit::set(self.layout, axis.count_attribute(), count + 1))?;
        }

        debug!("Inserted {} {} in {:?}", axis.name(), index, self.layout);
        Ok(index)
    }

    /// Keep a freshly inserted empty line open with a spacer
    fn add_spacer_line<T: LayoutTree>(&mut self, tree: &mut T, axis: Axis, index: usize) -> Result<(), EditError> {
        let other = match axis {
            Axis::Row => Axis::Column,
            Axis::Column => Axis::Row,
        };
        let cross = (0..self.count(other).max(1)).find(|&i| {
            let (row, column) = match axis {
                Axis::Row => (index, i),
                Axis::Column => (i, index),
            };
            !self.is_occupied(row, column, None)
        });
        let Some(cross) = cross else {
            // Widgets spanning the new line already keep it open
            return Ok(());
        };
        let (row, column) = match axis {
            Axis::Row => (index, cross),
            Axis::Column => (cross, index),
        };
        self.add_spacer(tree, axis, row, column)?;
        Ok(())
    }

    /// Create a spacer in an empty cell, sized to hold open its `axis` line
    pub fn add_spacer<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        axis: Axis,
        row: usize,
        column: usize,
    ) -> Result<NodeId, EditError> {
        let cell = self.get_cell_bounds(row, column, 1, 1);
        let node = tree.create_node(SPACE);
        tree.apply(Edit::set(node, ATTR_LAYOUT_ROW, row))?;
        tree.apply(Edit::set(node, ATTR_LAYOUT_COLUMN, column))?;
        let (width, height) = match axis {
            Axis::Row => (VALUE_WRAP_CONTENT.to_string(), self.px_to_dp(cell.h)),
            Axis::Column => (self.px_to_dp(cell.w), VALUE_WRAP_CONTENT.to_string()),
        };
        tree.apply(Edit::set(node, ATTR_LAYOUT_WIDTH, width))?;
        tree.apply(Edit::set(node, ATTR_LAYOUT_HEIGHT, height))?;
        tree.apply(Edit::InsertChild {
            parent: self.layout,
            child: node,
            index: None,
        })?;

        self.children.push(ViewData {
            node,
            tag: SPACE.to_string(),
            row,
            column,
            row_span: 1,
            column_span: 1,
            gravity: None,
            bounds: Some(cell),
            spacer: true,
            deleted: false,
        });
        Ok(node)
    }

    /// Remove the rows spanned by `children` that no other widget uses.
    ///
    /// Returns the removed row indices (as they were before removal).
    pub fn remove_rows<T: LayoutTree>(&mut self, tree: &mut T, children: &[NodeId]) -> Result<Vec<usize>, EditError> {
        self.remove_lines(tree, Axis::Row, children)
    }

    /// Remove the columns spanned by `children` that no other widget uses
    pub fn remove_columns<T: LayoutTree>(&mut self, tree: &mut T, children: &[NodeId]) -> Result<Vec<usize>, EditError> {
        self.remove_lines(tree, Axis::Column, children)
    }

    fn remove_lines<T: LayoutTree>(&mut self, tree: &mut T, axis: Axis, children: &[NodeId]) -> Result<Vec<usize>, EditError> {
        let selected: HashSet<NodeId> = self
            .views()
            .filter(|v| children.contains(&v.node))
            .map(|v| v.node)
            .collect();
        let lines: BTreeSet<usize> = self
            .views()
            .filter(|v| selected.contains(&v.node))
            .flat_map(|v| v.start(axis)..v.end(axis))
            .collect();

        let mut removed = Vec::new();
        for index in lines.into_iter().rev() {
            let blocked = self
                .views()
                .any(|v| !v.spacer && !selected.contains(&v.node) && v.spans(axis, index));
            if blocked {
                debug!("Keeping {} {}: still holds other widgets", axis.name(), index);
                continue;
            }
            self.remove_line(tree, axis, index, &selected)?;
            removed.push(index);
        }
        removed.reverse();
        Ok(removed)
    }

    /// Remove line `index`. Spacers and `doomed` widgets inside it are
    /// deleted (or shrunk when they span further); later widgets move back.
    fn remove_line<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        axis: Axis,
        index: usize,
        doomed: &HashSet<NodeId>,
    ) -> Result<(), EditError> {
        let count = self.count(axis);
        if index >= count {
            return Ok(());
        }
        let bounds = self.boundaries(axis);
        let size = bounds[index + 1] - bounds[index];

        let mut gone = Vec::new();
        for view in self.children.iter_mut().filter(|v| !v.deleted) {
            if view.spans(axis, index) {
                if !(view.spacer || doomed.contains(&view.node)) {
                    warn!("Removing {} {} under live widget {:?}", axis.name(), index, view.node);
                }
                if view.span(axis) <= 1 {
                    tree.apply(Edit::remove(view.node))?;
                    gone.push(view.node);
                } else {
                    let span = view.span(axis) - 1;
                    view.set_span(axis, span);
                    view.grow_bounds(axis, -size);
                    write_span(tree, view.node, axis, span)?;
                }
            } else if view.start(axis) > index {
                let start = view.start(axis) - 1;
                view.set_start(axis, start);
                view.shift_bounds(axis, -size);
                tree.apply(Edit::set(view.node, axis.start_attribute(), start))?;
            }
        }
        self.children.retain(|v| !gone.contains(&v.node));

        let bounds = self.boundaries_mut(axis);
        bounds.remove(index + 1);
        for b in bounds.iter_mut().skip(index + 1) {
            *b -= size;
        }

        if let Some(declared) = self.declared_count(axis) {
            let remaining = declared.saturating_sub(1);
            if remaining == 0 {
                self.set_declared_count(axis, None);
                tree.apply(Edit::unset(self.layout, axis.count_attribute()))?;
            } else {
                self.set_declared_count(axis, Some(remaining));
                tree.apply(Edit::set(self.layout, axis.count_attribute(), remaining))?;
            }
        }

        debug!("Removed {} {} from {:?}", axis.name(), index, self.layout);
        Ok(())
    }

    /// Mark a child as being deleted; it stops counting as an occupant
    pub fn mark_deleted(&mut self, node: NodeId) {
        if let Some(view) = self.children.iter_mut().find(|v| v.node == node) {
            view.deleted = true;
        }
    }

    /// Collapse every row and column no longer held open by a live widget.
    ///
    /// Spacers inside collapsed lines are removed from the document; widgets
    /// marked deleted are left for the caller to remove. Returns the number
    /// of rows and columns removed.
    pub fn cleanup<T: LayoutTree>(&mut self, tree: &mut T) -> Result<(usize, usize), EditError> {
        self.children.retain(|v| !v.deleted);

        let mut collapsed = (0, 0);
        for axis in [Axis::Row, Axis::Column] {
            for index in (0..self.count(axis)).rev() {
                if !self.is_occupied_line(axis, index) {
                    self.remove_line(tree, axis, index, &HashSet::new())?;
                    match axis {
                        Axis::Row => collapsed.0 += 1,
                        Axis::Column => collapsed.1 += 1,
                    }
                }
            }
        }

        if collapsed != (0, 0) {
            debug!(
                "Collapsed {} rows and {} columns in {:?}",
                collapsed.0, collapsed.1, self.layout
            );
        }
        Ok(collapsed)
    }

    /// Write a child's cell position and spans
    pub fn apply_position<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        node: NodeId,
        row: usize,
        column: usize,
        row_span: usize,
        column_span: usize,
    ) -> Result<(), EditError> {
        tree.apply(Edit::set(node, ATTR_LAYOUT_ROW, row))?;
        tree.apply(Edit::set(node, ATTR_LAYOUT_COLUMN, column))?;
        write_span(tree, node, Axis::Row, row_span)?;
        write_span(tree, node, Axis::Column, column_span)?;

        if let Some(view) = self.children.iter_mut().find(|v| v.node == node) {
            view.row = row;
            view.column = column;
            view.row_span = row_span.max(1);
            view.column_span = column_span.max(1);
        }
        Ok(())
    }

    /// Track a node that was just inserted into the layout
    pub(crate) fn register_view<T: LayoutTree>(&mut self, tree: &T, node: NodeId, row: usize, column: usize) {
        let mut view = ViewData::read(tree, node);
        view.row = row;
        view.column = column;
        view.bounds = Some(self.get_cell_bounds(row, column, view.row_span, view.column_span));
        self.children.push(view);
    }

    /// Pixels to a `dp` dimension string
    pub fn px_to_dp(&self, px: i32) -> String {
        format!("{}dp", (px as f32 / self.density).round() as i32)
    }
}

/// Write a span attribute, dropping it when it is back to the default
fn write_span<T: LayoutTree>(tree: &mut T, node: NodeId, axis: Axis, span: usize) -> Result<(), EditError> {
    if span <= 1 {
        if tree.attribute(node, axis.span_attribute()).is_some() {
            tree.apply(Edit::unset(node, axis.span_attribute()))?;
        }
        if tree.attribute(node, axis.span_alias()).is_some() {
            tree.apply(Edit::unset(node, axis.span_alias()))?;
        }
        Ok(())
    } else {
        tree.apply(Edit::set(node, axis.span_attribute(), span))
    }
}

/// Cell index containing `value`, clamped to `[0, cells - 1]`
fn index_of(bounds: &[i32], value: i32) -> usize {
    let cells = bounds.len().saturating_sub(1);
    if cells == 0 {
        return 0;
    }
    bounds
        .partition_point(|b| *b <= value)
        .saturating_sub(1)
        .min(cells - 1)
}

/// Pixel edges of `span` cells starting at `start`, clamped to the grid
fn span_edges(bounds: &[i32], start: usize, span: usize) -> (i32, i32) {
    let cells = bounds.len().saturating_sub(1);
    if cells == 0 {
        let edge = bounds.first().copied().unwrap_or(0);
        return (edge, edge);
    }
    let first = start.min(cells - 1);
    let last = (first + span.max(1)).min(cells);
    (bounds[first], bounds[last])
}

/// Assign cells to children, honoring declared positions and auto-placing
/// the rest in orientation order.
fn place_children(
    children: &mut [ViewData],
    declared: &[(Option<usize>, Option<usize>)],
    vertical: bool,
    row_limit: Option<usize>,
    column_limit: Option<usize>,
) {
    let mut occupied: HashSet<(usize, usize)> = HashSet::new();
    let claim = |occupied: &mut HashSet<(usize, usize)>, view: &ViewData| {
        for row in view.row..view.end(Axis::Row) {
            for column in view.column..view.end(Axis::Column) {
                occupied.insert((row, column));
            }
        }
    };

    for (view, &(row, column)) in children.iter_mut().zip(declared) {
        if let (Some(row), Some(column)) = (row, column) {
            view.row = row;
            view.column = column;
            claim(&mut occupied, view);
        }
    }

    // Auto placement walks the major axis and wraps along the minor one
    let limit = if vertical { row_limit } else { column_limit };
    let (mut major, mut minor) = (0usize, 0usize);
    for (view, &(row, column)) in children.iter_mut().zip(declared) {
        if row.is_some() && column.is_some() {
            continue;
        }
        let (fixed_major, fixed_minor) = if vertical { (column, row) } else { (row, column) };
        let (major_span, minor_span) = if vertical {
            (view.column_span, view.row_span)
        } else {
            (view.row_span, view.column_span)
        };
        if let Some(m) = fixed_major {
            if m != major {
                major = m;
                minor = 0;
            }
        }

        loop {
            let at = fixed_minor.unwrap_or(minor);
            // A declared position is kept even when it runs past the limit
            let within = fixed_minor.is_some() || limit.map_or(true, |l| at + minor_span <= l.max(minor_span));
            let free = (0..major_span).all(|i| {
                (0..minor_span).all(|j| {
                    let cell = if vertical { (at + j, major + i) } else { (major + i, at + j) };
                    !occupied.contains(&cell)
                })
            });
            if within && free {
                minor = at;
                break;
            }
            if fixed_minor.is_some() || !within {
                major += 1;
                minor = 0;
            } else {
                minor += 1;
            }
        }

        if vertical {
            view.row = minor;
            view.column = major;
        } else {
            view.row = major;
            view.column = minor;
        }
        claim(&mut occupied, view);
        minor += minor_span;
    }
}

/// Derive `count + 1` strictly increasing boundaries from child extents
/// `(start index, span, low edge, high edge)`.
fn derive_boundaries(start: i32, end: i32, count: usize, items: &[(usize, usize, i32, i32)]) -> Vec<i32> {
    if count == 0 {
        return vec![start];
    }

    // Leading edges of the children starting in each cell
    let mut edges: Vec<Option<i32>> = vec![None; count + 1];
    edges[0] = Some(start);
    for &(index, _, lo, _) in items {
        if index > 0 && index < count {
            edges[index] = Some(edges[index].map_or(lo, |e| e.min(lo)));
        }
    }

    let nominal = nominal_cell_size(&edges)
        .unwrap_or((end - start) / count as i32)
        .max(MIN_CELL_SIZE);

    // Trailing edges fill the gaps; the grid's far edge always counts
    let mut trailing: Vec<Option<i32>> = vec![None; count + 1];
    for &(index, span, lo, hi) in items {
        let last = index + span;
        if last == 0 || last > count {
            continue;
        }
        let oversized = (hi - lo) as f32 > nominal as f32 * MAX_CELL_DIFFERENCE;
        if last < count && span == 1 && oversized {
            continue;
        }
        trailing[last] = Some(trailing[last].map_or(hi, |t| t.max(hi)));
    }
    for i in 1..=count {
        if edges[i].is_none() {
            edges[i] = trailing[i];
        }
    }
    if edges[count].is_none() {
        edges[count] = Some(end.max(start + MIN_CELL_SIZE * count as i32));
    }

    // Interpolate between known edges
    let known: Vec<(usize, i32)> = edges
        .iter()
        .enumerate()
        .filter_map(|(i, e)| e.map(|v| (i, v)))
        .collect();
    let mut result = vec![0; count + 1];
    for pair in known.windows(2) {
        let (a, va) = pair[0];
        let (b, vb) = pair[1];
        for (k, slot) in result.iter_mut().enumerate().take(b + 1).skip(a) {
            *slot = va + (vb - va) * (k - a) as i32 / (b - a) as i32;
        }
    }

    for i in 1..result.len() {
        if result[i] < result[i - 1] + MIN_CELL_SIZE {
            result[i] = result[i - 1] + MIN_CELL_SIZE;
        }
    }
    result
}

/// Median size of cells whose both edges are already known
fn nominal_cell_size(edges: &[Option<i32>]) -> Option<i32> {
    let mut sizes: Vec<i32> = edges
        .windows(2)
        .filter_map(|w| match (w[0], w[1]) {
            (Some(a), Some(b)) if b > a => Some(b - a),
            _ => None,
        })
        .collect();
    if sizes.is_empty() {
        return None;
    }
    sizes.sort_unstable();
    Some(sizes[sizes.len() / 2])
}
