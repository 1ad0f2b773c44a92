//! Grid Layout Painter
//!
//! Turns the grid structure and drop feedback into paint commands. Nothing
//! here draws pixels; a host surface consumes the commands.

use serde::Serialize;

use r_droid_core::GridEditorConfig;
use r_droid_layout::{Point, Rect};

use crate::feedback::{DropFeedback, InsertionKind};
use crate::model::{Axis, GridModel};

/// Visual role of a paint command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawingStyle {
    /// Row/column guide lines
    Grid,
    /// Outline of the container while a drag is over it
    DropZone,
    /// Where the dropped widget would land
    DropPreview,
    /// Existing boundary a drop snaps to
    Guideline,
    /// Dashed line for a row/column the drop would create
    InsertionLine,
    /// Cell labels of the debug overlay
    DebugText,
    /// Widget outlines of the debug overlay
    WidgetBounds,
}

impl DrawingStyle {
    pub fn is_dashed(&self) -> bool {
        matches!(self, DrawingStyle::InsertionLine | DrawingStyle::Grid)
    }
}

/// A single drawing instruction
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op")]
pub enum PaintCommand {
    FillRect { rect: Rect, style: DrawingStyle },
    StrokeRect { rect: Rect, style: DrawingStyle },
    Line { from: Point, to: Point, style: DrawingStyle },
    Text { at: Point, text: String, style: DrawingStyle },
}

impl PaintCommand {
    pub fn style(&self) -> DrawingStyle {
        match self {
            PaintCommand::FillRect { style, .. }
            | PaintCommand::StrokeRect { style, .. }
            | PaintCommand::Line { style, .. }
            | PaintCommand::Text { style, .. } => *style,
        }
    }
}

/// Receiver of paint commands
pub trait PaintSurface {
    fn draw(&mut self, command: PaintCommand);
}

impl PaintSurface for Vec<PaintCommand> {
    fn draw(&mut self, command: PaintCommand) {
        self.push(command);
    }
}

/// Paints one grid
pub struct GridLayoutPainter<'a> {
    model: &'a GridModel,
    config: &'a GridEditorConfig,
}

impl<'a> GridLayoutPainter<'a> {
    pub fn new(model: &'a GridModel, config: &'a GridEditorConfig) -> Self {
        Self { model, config }
    }

    /// Paint everything enabled for the current state
    pub fn paint(&self, feedback: Option<&DropFeedback>) -> Vec<PaintCommand> {
        let mut commands = Vec::new();
        self.paint_to(&mut commands, feedback);
        commands
    }

    pub fn paint_to<S: PaintSurface>(&self, surface: &mut S, feedback: Option<&DropFeedback>) {
        if self.config.show_structure {
            self.paint_structure(surface);
        }
        if let Some(feedback) = feedback.filter(|f| f.state().is_active()) {
            self.paint_drop_feedback(surface, feedback);
        }
        if self.config.debug_overlay {
            self.paint_debug(surface);
        }
    }

    /// One guide line per boundary
    pub fn paint_structure<S: PaintSurface>(&self, surface: &mut S) {
        let b = self.model.bounds();
        for &y in self.model.row_boundaries() {
            surface.draw(PaintCommand::Line {
                from: Point::new(b.x, y),
                to: Point::new(b.x2(), y),
                style: DrawingStyle::Grid,
            });
        }
        for &x in self.model.column_boundaries() {
            surface.draw(PaintCommand::Line {
                from: Point::new(x, b.y),
                to: Point::new(x, b.y2()),
                style: DrawingStyle::Grid,
            });
        }
    }

    pub fn paint_drop_feedback<S: PaintSurface>(&self, surface: &mut S, feedback: &DropFeedback) {
        let b = self.model.bounds();
        surface.draw(PaintCommand::StrokeRect {
            rect: b,
            style: DrawingStyle::DropZone,
        });

        if let Some(preview) = feedback.preview {
            surface.draw(PaintCommand::FillRect {
                rect: preview,
                style: DrawingStyle::DropPreview,
            });
        }

        for m in [feedback.row_match(), feedback.column_match()].into_iter().flatten() {
            let style = match m.kind {
                InsertionKind::Cell => DrawingStyle::Guideline,
                InsertionKind::Insert => DrawingStyle::InsertionLine,
            };
            let (from, to) = match m.axis {
                Axis::Row => (Point::new(b.x, m.coordinate), Point::new(b.x2(), m.coordinate)),
                Axis::Column => (Point::new(m.coordinate, b.y), Point::new(m.coordinate, b.y2())),
            };
            surface.draw(PaintCommand::Line { from, to, style });
        }
    }

    /// Cell indices and widget outlines
    pub fn paint_debug<S: PaintSurface>(&self, surface: &mut S) {
        for row in 0..self.model.row_count() {
            for column in 0..self.model.column_count() {
                let cell = self.model.get_cell_bounds(row, column, 1, 1);
                surface.draw(PaintCommand::Text {
                    at: Point::new(cell.x + 2, cell.y + 2),
                    text: format!("{},{}", row, column),
                    style: DrawingStyle::DebugText,
                });
            }
        }
        for view in self.model.views() {
            if let Some(rect) = view.bounds {
                surface.draw(PaintCommand::StrokeRect {
                    rect,
                    style: DrawingStyle::WidgetBounds,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drop_handler::GridDropHandler;
    use crate::feedback::DragElement;
    use r_droid_layout::attributes::{ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_ROW};
    use r_droid_layout::{LayoutDocument, LayoutTree};

    fn model() -> GridModel {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 200, 200));
        let node = doc.add_child(root, "Button").unwrap();
        doc.set_attribute(node, ATTR_LAYOUT_ROW, 1).unwrap();
        doc.set_attribute(node, ATTR_LAYOUT_COLUMN, 1).unwrap();
        doc.set_bounds(node, Rect::new(60, 50, 60, 50));
        GridModel::build(&doc, root, &GridEditorConfig::default()).unwrap()
    }

    #[test]
    fn test_nothing_enabled_paints_nothing() {
        let model = model();
        let config = GridEditorConfig::default();
        assert!(GridLayoutPainter::new(&model, &config).paint(None).is_empty());
    }

    #[test]
    fn test_structure_lines() {
        let model = model();
        let config = GridEditorConfig { show_structure: true, ..Default::default() };
        let commands = GridLayoutPainter::new(&model, &config).paint(None);

        let lines = model.row_boundaries().len() + model.column_boundaries().len();
        assert_eq!(commands.len(), lines);
        assert!(commands.iter().all(|c| c.style() == DrawingStyle::Grid));
        assert!(commands.contains(&PaintCommand::Line {
            from: Point::new(60, 0),
            to: Point::new(60, 200),
            style: DrawingStyle::Grid,
        }));
    }

    #[test]
    fn test_debug_overlay() {
        let model = model();
        let config = GridEditorConfig { debug_overlay: true, ..Default::default() };
        let commands = GridLayoutPainter::new(&model, &config).paint(None);

        let labels = commands.iter().filter(|c| c.style() == DrawingStyle::DebugText).count();
        assert_eq!(labels, model.row_count() * model.column_count());
        assert!(commands.contains(&PaintCommand::StrokeRect {
            rect: Rect::new(60, 50, 60, 50),
            style: DrawingStyle::WidgetBounds,
        }));
    }

    #[test]
    fn test_drop_feedback() {
        let model = model();
        let config = GridEditorConfig::default();
        let mut feedback = DropFeedback::new();
        feedback.enter(model.layout(), DragElement::new("Button", 30, 30)).unwrap();
        feedback.move_to(Point::new(85, 3)).unwrap();
        GridDropHandler::new(model.clone(), &config).compute_matches(&mut feedback, Point::new(85, 3));

        let commands = GridLayoutPainter::new(&model, &config).paint(Some(&feedback));
        assert_eq!(commands[0].style(), DrawingStyle::DropZone);
        assert!(commands.iter().any(|c| c.style() == DrawingStyle::DropPreview));
        // Row snaps to boundary 0, the column needs a new boundary at 84
        assert!(commands.contains(&PaintCommand::Line {
            from: Point::new(0, 0),
            to: Point::new(200, 0),
            style: DrawingStyle::Guideline,
        }));
        assert!(commands.contains(&PaintCommand::Line {
            from: Point::new(84, 0),
            to: Point::new(84, 200),
            style: DrawingStyle::InsertionLine,
        }));

        // Finished sessions paint no feedback
        feedback.cancel().unwrap();
        assert!(GridLayoutPainter::new(&model, &config).paint(Some(&feedback)).is_empty());
    }
}
