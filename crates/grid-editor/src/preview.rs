//! Preview Layout
//!
//! Assigns uniform cell bounds to every GridLayout of a document so the
//! grid can be edited without a renderer.

use tracing::debug;

use r_droid_core::{GridEditorConfig, PreviewConfig};
use r_droid_layout::attributes::is_grid_layout;
use r_droid_layout::{LayoutDocument, LayoutTree, NodeId, Rect};

use crate::model::GridModel;

/// Lay out every GridLayout in document order. Nested grids start at the
/// cell their parent gave them. Returns the number of grids laid out.
pub fn apply_preview(doc: &mut LayoutDocument, preview: &PreviewConfig, grid: &GridEditorConfig) -> usize {
    let Some(root) = doc.root() else {
        return 0;
    };

    let mut count = 0;
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if doc.tag(node).is_some_and(is_grid_layout) {
            let origin = doc
                .bounds(node)
                .map(|b| (b.x, b.y))
                .unwrap_or((preview.origin_x, preview.origin_y));
            lay_out_grid(doc, node, origin, preview, grid);
            count += 1;
        }
        let mut children = doc.children(node);
        children.reverse();
        stack.extend(children);
    }
    count
}

fn lay_out_grid(
    doc: &mut LayoutDocument,
    layout: NodeId,
    (x, y): (i32, i32),
    preview: &PreviewConfig,
    grid: &GridEditorConfig,
) {
    let (cell_width, cell_height) = (preview.cell_width.max(1), preview.cell_height.max(1));
    for child in doc.children(layout) {
        doc.clear_bounds(child);
    }

    // Placement first, then size the layout to fit it
    doc.set_bounds(layout, Rect::new(x, y, cell_width, cell_height));
    let Some(model) = GridModel::build(&*doc, layout, grid) else {
        return;
    };
    let rows = model.row_count().max(1) as i32;
    let columns = model.column_count().max(1) as i32;
    doc.set_bounds(layout, Rect::new(x, y, columns * cell_width, rows * cell_height));

    let Some(model) = GridModel::build(&*doc, layout, grid) else {
        return;
    };
    for view in model.views() {
        let bounds = model.get_cell_bounds(view.row, view.column, view.row_span, view.column_span);
        doc.set_bounds(view.node, bounds);
    }
    debug!("Preview of {:?}: {}x{} cells", layout, rows, columns);
}
