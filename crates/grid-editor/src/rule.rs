//! GridLayout Rule
//!
//! Entry point of the grid editor. Owns the editor configuration and
//! drives the grid model, drop handler and painter for structural
//! actions, child insertion and removal, resizing and drag-and-drop.
//!
//! Every document change made here runs inside one
//! [`LayoutTree::transaction`], so a failed gesture leaves no partial edit.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use r_droid_core::{Event, EventBus, GridEditorConfig, GridFlag, RDroidError};
use r_droid_layout::attributes::{
    is_grid_layout, simple_name, ATTR_LAYOUT_GRAVITY, ATTR_LAYOUT_HEIGHT, ATTR_LAYOUT_WIDTH,
    ATTR_ORIENTATION, VALUE_VERTICAL,
};
use r_droid_layout::{EditError, LayoutTree, NodeId, Point, Rect};

use crate::drop_handler::GridDropHandler;
use crate::feedback::{DragElement, DragError, DropFeedback};
use crate::metadata::FillPreference;
use crate::model::GridModel;
use crate::painter::{GridLayoutPainter, PaintCommand};
use crate::resize::{span_cells, CellRange, ResizeState};

/// Grid editor errors
#[derive(Debug, Error)]
pub enum RuleError {
    #[error(transparent)]
    Edit(#[from] EditError),

    #[error(transparent)]
    Drag(#[from] DragError),

    #[error("{0:?} is not a GridLayout")]
    NotAGrid(NodeId),

    #[error("{0:?} is not inside a GridLayout")]
    NotInGrid(NodeId),

    #[error("GridLayout {0:?} has no usable bounds")]
    InvalidLayout(NodeId),

    #[error("Unknown action: {0}")]
    UnknownAction(String),
}

impl From<RuleError> for RDroidError {
    fn from(err: RuleError) -> Self {
        match err {
            RuleError::Edit(e) => RDroidError::Edit(e.to_string()),
            RuleError::Drag(e) => RDroidError::InvalidState(e.to_string()),
            RuleError::UnknownAction(name) => RDroidError::NotFound(format!("action {}", name)),
            other => RDroidError::Layout(other.to_string()),
        }
    }
}

/// User actions on a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    AddRow,
    RemoveRow,
    AddColumn,
    RemoveColumn,
    ToggleGridMode,
    ToggleSnapToGrid,
    ToggleShowStructure,
    ToggleDebugOverlay,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::AddRow,
        Action::RemoveRow,
        Action::AddColumn,
        Action::RemoveColumn,
        Action::ToggleGridMode,
        Action::ToggleSnapToGrid,
        Action::ToggleShowStructure,
        Action::ToggleDebugOverlay,
    ];

    /// Undo label
    pub fn label(&self) -> &'static str {
        match self {
            Action::AddRow => "Add Row",
            Action::RemoveRow => "Remove Row",
            Action::AddColumn => "Add Column",
            Action::RemoveColumn => "Remove Column",
            Action::ToggleGridMode => "Grid Mode",
            Action::ToggleSnapToGrid => "Snap to Grid",
            Action::ToggleShowStructure => "Show Structure",
            Action::ToggleDebugOverlay => "Debug Overlay",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::AddRow => "add-row",
            Action::RemoveRow => "remove-row",
            Action::AddColumn => "add-column",
            Action::RemoveColumn => "remove-column",
            Action::ToggleGridMode => "toggle-grid-mode",
            Action::ToggleSnapToGrid => "toggle-snap-to-grid",
            Action::ToggleShowStructure => "toggle-show-structure",
            Action::ToggleDebugOverlay => "toggle-debug-overlay",
        }
    }

    /// The setting a toggle action flips
    pub fn flag(&self) -> Option<GridFlag> {
        match self {
            Action::ToggleGridMode => Some(GridFlag::GridMode),
            Action::ToggleSnapToGrid => Some(GridFlag::SnapToGrid),
            Action::ToggleShowStructure => Some(GridFlag::ShowStructure),
            Action::ToggleDebugOverlay => Some(GridFlag::DebugOverlay),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Action::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| RuleError::UnknownAction(s.to_string()))
    }
}

/// Target of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionContext {
    pub layout: NodeId,
    /// Selected children of the layout
    pub selection: Vec<NodeId>,
}

impl ActionContext {
    pub fn new(layout: NodeId, selection: Vec<NodeId>) -> Self {
        Self { layout, selection }
    }
}

/// Result of an action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// The document changed
    Edited { label: String },
    /// A setting changed; the new configuration should be persisted
    ConfigChanged(GridEditorConfig),
    /// Nothing to do
    Unchanged,
}

/// How a child arrived in the layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertType {
    Create,
    Paste,
    /// Moved in from another container
    MoveInto,
    /// Moved within the same layout
    MoveWithin,
}

/// GridLayout editing rule
pub struct GridLayoutRule {
    config: GridEditorConfig,
    events: Option<Arc<EventBus>>,
}

impl GridLayoutRule {
    pub fn new(config: GridEditorConfig) -> Self {
        Self { config, events: None }
    }

    /// Publish edits and setting changes on `bus`
    pub fn with_events(mut self, bus: Arc<EventBus>) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn config(&self) -> &GridEditorConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: GridEditorConfig) {
        self.config = config;
    }

    fn emit(&self, event: Event) {
        if let Some(bus) = &self.events {
            bus.emit(event);
        }
    }

    /// Grid model for `layout`, checking it is a usable GridLayout
    pub fn grid_model<T: LayoutTree>(&self, tree: &T, layout: NodeId) -> Result<GridModel, RuleError> {
        if !tree.tag(layout).is_some_and(is_grid_layout) {
            return Err(RuleError::NotAGrid(layout));
        }
        GridModel::build(tree, layout, &self.config).ok_or(RuleError::InvalidLayout(layout))
    }

    /// Run an action
    pub fn apply<T: LayoutTree>(
        &mut self,
        tree: &mut T,
        action: Action,
        ctx: &ActionContext,
    ) -> Result<ActionOutcome, RuleError> {
        if let Some(flag) = action.flag() {
            let value = self.config.toggle(flag);
            info!("{} {}", action.label(), if value { "on" } else { "off" });
            self.emit(Event::ConfigChanged);
            return Ok(ActionOutcome::ConfigChanged(self.config.clone()));
        }

        let mut model = self.grid_model(&*tree, ctx.layout)?;
        let selection = &ctx.selection;
        let changed = tree.transaction(action.label(), |t| match action {
            Action::AddRow => Ok(model.add_row(t, selection)?.is_some()),
            Action::AddColumn => Ok(model.add_column(t, selection)?.is_some()),
            Action::RemoveRow => Ok(!model.remove_rows(t, selection)?.is_empty()),
            Action::RemoveColumn => Ok(!model.remove_columns(t, selection)?.is_empty()),
            _ => Ok(false),
        })?;

        if changed {
            self.edited(action.label())
        } else {
            debug!("{}: nothing changed", action.label());
            Ok(ActionOutcome::Unchanged)
        }
    }

    fn edited(&self, label: &str) -> Result<ActionOutcome, RuleError> {
        self.emit(Event::GridEdited { label: label.to_string() });
        Ok(ActionOutcome::Edited { label: label.to_string() })
    }

    /// Give a newly inserted child its default gravity
    pub fn on_child_inserted<T: LayoutTree>(
        &self,
        tree: &mut T,
        node: NodeId,
        parent: NodeId,
        insert_type: InsertType,
    ) -> Result<(), EditError> {
        if insert_type == InsertType::MoveWithin || tree.attribute(node, ATTR_LAYOUT_GRAVITY).is_some() {
            return Ok(());
        }
        let vertical = tree.attribute(parent, ATTR_ORIENTATION) == Some(VALUE_VERTICAL);
        let gravity = tree
            .tag(node)
            .and_then(|tag| FillPreference::of(tag).gravity(vertical));
        if let Some(gravity) = gravity {
            debug!("Default gravity {} for {:?}", gravity, node);
            tree.set_attribute(node, ATTR_LAYOUT_GRAVITY, gravity)?;
        }
        Ok(())
    }

    /// Collapse the rows and columns `deleted` leave empty. Free-form mode
    /// only; spacers among `deleted` keep counting as occupants.
    pub fn on_removing_children<T: LayoutTree>(
        &self,
        tree: &mut T,
        deleted: &[NodeId],
        parent: NodeId,
    ) -> Result<(), RuleError> {
        if self.config.grid_mode || !tree.tag(parent).is_some_and(is_grid_layout) {
            return Ok(());
        }
        let Some(mut model) = GridModel::build(&*tree, parent, &self.config) else {
            return Ok(());
        };

        let collapsed = tree.transaction("Remove Children", |t| {
            for &node in deleted {
                if model.find_view(node).is_some_and(|v| !v.spacer) {
                    model.mark_deleted(node);
                }
            }
            model.cleanup(t)
        })?;

        if collapsed != (0, 0) {
            self.emit(Event::GridEdited { label: "Remove Children".into() });
        }
        Ok(())
    }

    /// Start resizing a child of a grid
    pub fn on_resize_begin<T: LayoutTree>(
        &self,
        tree: &T,
        node: NodeId,
        modifiers: u32,
    ) -> Result<ResizeState, RuleError> {
        let layout = tree
            .parent(node)
            .filter(|p| tree.tag(*p).is_some_and(is_grid_layout))
            .ok_or(RuleError::NotInGrid(node))?;
        let model = self.grid_model(tree, layout)?;
        let view = model.find_view(node).ok_or(RuleError::NotInGrid(node))?;

        let start = CellRange {
            row: view.row,
            column: view.column,
            row_span: view.row_span,
            column_span: view.column_span,
        };
        let original = view
            .bounds
            .unwrap_or_else(|| model.get_cell_bounds(view.row, view.column, view.row_span, view.column_span));
        Ok(ResizeState::new(node, layout, original, start, modifiers))
    }

    /// Track the proposed bounds; returns the rectangle to show as feedback
    pub fn on_resize_update<T: LayoutTree>(
        &self,
        tree: &T,
        state: &mut ResizeState,
        bounds: Rect,
        modifiers: u32,
    ) -> Rect {
        state.bounds = bounds;
        state.modifiers = modifiers;
        state.cells = None;
        if !state.span_mode() {
            return bounds;
        }
        match GridModel::build(tree, state.layout, &self.config) {
            Some(model) => {
                let cells = span_cells(&model, state);
                state.cells = Some(cells);
                model.get_cell_bounds(cells.row, cells.column, cells.row_span, cells.column_span)
            }
            None => bounds,
        }
    }

    /// Commit a resize, as a span change or as pixel sizes
    pub fn on_resize_end<T: LayoutTree>(&self, tree: &mut T, state: &ResizeState) -> Result<ActionOutcome, RuleError> {
        let mut model = self.grid_model(&*tree, state.layout)?;
        let node = state.node;

        if state.span_mode() {
            let cells = span_cells(&model, state);
            if cells == state.start {
                return Ok(ActionOutcome::Unchanged);
            }
            tree.transaction("Resize Span", |t| {
                model.apply_position(t, node, cells.row, cells.column, cells.row_span, cells.column_span)
            })?;
            info!(
                "Resized {:?} to {}x{} cells at ({}, {})",
                node, cells.row_span, cells.column_span, cells.row, cells.column
            );
            return self.edited("Resize Span");
        }

        let (width, height) = (state.width_changed(), state.height_changed());
        if !width && !height {
            return Ok(ActionOutcome::Unchanged);
        }
        let b = state.bounds;
        tree.transaction("Resize", |t| {
            if width {
                t.set_attribute(node, ATTR_LAYOUT_WIDTH, model.px_to_dp(b.w))?;
            }
            if height {
                t.set_attribute(node, ATTR_LAYOUT_HEIGHT, model.px_to_dp(b.h))?;
            }
            Ok(())
        })?;
        self.edited("Resize")
    }

    /// A drag entered `layout`
    pub fn on_drop_enter<T: LayoutTree>(
        &self,
        tree: &T,
        layout: NodeId,
        feedback: &mut DropFeedback,
        element: DragElement,
    ) -> Result<(), RuleError> {
        if !tree.tag(layout).is_some_and(is_grid_layout) {
            return Err(RuleError::NotAGrid(layout));
        }
        feedback.enter(layout, element)?;
        self.emit(Event::DropEntered);
        Ok(())
    }

    /// The pointer moved; recompute the matches
    pub fn on_drop_move<T: LayoutTree>(
        &self,
        tree: &T,
        feedback: &mut DropFeedback,
        point: Point,
    ) -> Result<(), RuleError> {
        feedback.move_to(point)?;
        let model = feedback
            .layout()
            .and_then(|layout| GridModel::build(tree, layout, &self.config));
        match model {
            Some(model) => GridDropHandler::new(model, &self.config).compute_matches(feedback, point),
            None => feedback.clear_matches(),
        }
        Ok(())
    }

    /// Drop at `point`. Returns the inserted node, or None when the drop
    /// was refused.
    pub fn on_dropped<T: LayoutTree>(
        &self,
        tree: &mut T,
        feedback: &mut DropFeedback,
        point: Point,
    ) -> Result<Option<NodeId>, RuleError> {
        self.on_drop_move(&*tree, feedback, point)?;

        let target = match (feedback.layout(), feedback.element().cloned()) {
            (Some(layout), Some(element)) if feedback.has_match() => {
                GridModel::build(&*tree, layout, &self.config).map(|model| (layout, element, model))
            }
            _ => None,
        };
        let Some((layout, element, model)) = target else {
            return self.refuse(feedback);
        };

        let insert_type = match element.source {
            None => InsertType::Create,
            Some(source) if tree.parent(source) == Some(layout) => InsertType::MoveWithin,
            Some(_) => InsertType::MoveInto,
        };
        let label = format!("Drop {}", simple_name(&element.tag));
        let mut handler = GridDropHandler::new(model, &self.config);
        let session: &DropFeedback = feedback;

        let result = tree.transaction(&label, |t| {
            let node = handler.handle_drop(t, session)?;
            if let Some(node) = node {
                self.on_child_inserted(t, node, layout, insert_type)?;
            }
            Ok(node)
        });

        match result {
            Ok(Some(node)) => {
                feedback.commit()?;
                info!("{} committed as {:?}", label, node);
                self.emit(Event::DropCommitted);
                self.emit(Event::GridEdited { label });
                Ok(Some(node))
            }
            Ok(None) => self.refuse(feedback),
            Err(e) => {
                warn!("{} failed: {}", label, e);
                feedback.cancel()?;
                self.emit(Event::DropCancelled);
                self.emit(Event::Error { message: format!("{} failed", label), details: Some(e.to_string()) });
                Err(e.into())
            }
        }
    }

    fn refuse(&self, feedback: &mut DropFeedback) -> Result<Option<NodeId>, RuleError> {
        debug!("Drop refused");
        feedback.cancel()?;
        self.emit(Event::DropCancelled);
        Ok(None)
    }

    /// The drag left the layout
    pub fn on_drop_leave(&self, feedback: &mut DropFeedback) -> Result<(), RuleError> {
        feedback.cancel()?;
        self.emit(Event::DropCancelled);
        Ok(())
    }

    /// Paint commands for the grid and any active drag
    pub fn paint<T: LayoutTree>(
        &self,
        tree: &T,
        layout: NodeId,
        feedback: Option<&DropFeedback>,
    ) -> Result<Vec<PaintCommand>, RuleError> {
        let model = self.grid_model(tree, layout)?;
        Ok(GridLayoutPainter::new(&model, &self.config).paint(feedback))
    }
}

impl Default for GridLayoutRule {
    fn default() -> Self {
        Self::new(GridEditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::painter::DrawingStyle;
    use crate::resize::SPAN_MODIFIER;
    use r_droid_layout::attributes::{
        ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_COLUMN_SPAN, ATTR_LAYOUT_ROW, ATTR_LAYOUT_ROW_SPAN, ATTR_ROW_COUNT,
    };
    use r_droid_layout::{Edit, LayoutDocument};

    /// Rows [0, 50, 100], columns [0, 60, 120]
    fn two_by_two() -> (LayoutDocument, NodeId, NodeId, NodeId) {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        doc.set_bounds(root, Rect::new(0, 0, 200, 200));
        let a = add(&mut doc, root, "Button", 0, 0, Rect::new(0, 0, 60, 50));
        let b = add(&mut doc, root, "TextView", 1, 1, Rect::new(60, 50, 60, 50));
        (doc, root, a, b)
    }

    fn add(doc: &mut LayoutDocument, parent: NodeId, tag: &str, row: usize, column: usize, bounds: Rect) -> NodeId {
        let node = doc.add_child(parent, tag).unwrap();
        doc.set_attribute(node, ATTR_LAYOUT_ROW, row).unwrap();
        doc.set_attribute(node, ATTR_LAYOUT_COLUMN, column).unwrap();
        doc.set_bounds(node, bounds);
        node
    }

    /// Document wrapper rejecting writes of one attribute
    #[derive(Clone)]
    struct Rejecting {
        doc: LayoutDocument,
        reject: &'static str,
    }

    impl LayoutTree for Rejecting {
        fn root(&self) -> Option<NodeId> {
            self.doc.root()
        }
        fn tag(&self, node: NodeId) -> Option<&str> {
            self.doc.tag(node)
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.doc.parent(node)
        }
        fn children(&self, node: NodeId) -> Vec<NodeId> {
            self.doc.children(node)
        }
        fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
            self.doc.attribute(node, name)
        }
        fn bounds(&self, node: NodeId) -> Option<Rect> {
            self.doc.bounds(node)
        }
        fn create_node(&mut self, tag: &str) -> NodeId {
            self.doc.create_node(tag)
        }
        fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
            match &edit {
                Edit::SetAttribute { name, .. } if name == self.reject => {
                    Err(EditError::Rejected(name.clone()))
                }
                _ => self.doc.apply(edit),
            }
        }
        fn transaction<R, F>(&mut self, _label: &str, f: F) -> Result<R, EditError>
        where
            F: FnOnce(&mut Self) -> Result<R, EditError>,
        {
            let snapshot = self.doc.clone();
            let result = f(self);
            if result.is_err() {
                self.doc = snapshot;
            }
            result
        }
    }

    #[test]
    fn test_action_names() {
        assert_eq!("add-row".parse::<Action>().unwrap(), Action::AddRow);
        assert_eq!(Action::ToggleDebugOverlay.to_string(), "toggle-debug-overlay");
        assert!(matches!("explode".parse::<Action>(), Err(RuleError::UnknownAction(_))));
        assert_eq!(Action::RemoveColumn.flag(), None);
    }

    #[test]
    fn test_add_row_publishes_edit() {
        let (mut doc, root, a, b) = two_by_two();
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let mut rule = GridLayoutRule::default().with_events(bus);

        let outcome = rule
            .apply(&mut doc, Action::AddRow, &ActionContext::new(root, vec![a]))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Edited { label: "Add Row".into() });
        assert_eq!(doc.int_attribute(b, ATTR_LAYOUT_ROW), Some(2));
        assert_eq!(events.drain(), vec![Event::GridEdited { label: "Add Row".into() }]);
    }

    #[test]
    fn test_remove_occupied_row_is_noop() {
        let (mut doc, root, a, _) = two_by_two();
        add(&mut doc, root, "Button", 0, 1, Rect::new(60, 0, 60, 50));
        let revision = doc.revision();
        let mut rule = GridLayoutRule::default();

        let outcome = rule
            .apply(&mut doc, Action::RemoveRow, &ActionContext::new(root, vec![a]))
            .unwrap();
        assert_eq!(outcome, ActionOutcome::Unchanged);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_failed_action_rolls_back() {
        let (mut doc, root, a, b) = two_by_two();
        doc.set_attribute(root, ATTR_ROW_COUNT, 2).unwrap();
        let mut tree = Rejecting { doc, reject: ATTR_ROW_COUNT };
        let mut rule = GridLayoutRule::default();

        let result = rule.apply(&mut tree, Action::AddRow, &ActionContext::new(root, vec![a]));
        assert!(matches!(result, Err(RuleError::Edit(EditError::Rejected(_)))));
        // The row shift made before the rejected write is undone
        assert_eq!(tree.int_attribute(b, ATTR_LAYOUT_ROW), Some(1));
        assert_eq!(tree.children(root).len(), 2);
    }

    #[test]
    fn test_toggle_returns_config() {
        let (mut doc, root, _, _) = two_by_two();
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let mut rule = GridLayoutRule::default().with_events(bus);

        let outcome = rule
            .apply(&mut doc, Action::ToggleGridMode, &ActionContext::new(root, vec![]))
            .unwrap();
        match outcome {
            ActionOutcome::ConfigChanged(config) => assert!(config.grid_mode),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert!(rule.config().grid_mode);
        assert_eq!(events.drain(), vec![Event::ConfigChanged]);
    }

    #[test]
    fn test_actions_need_a_grid() {
        let (mut doc, root) = LayoutDocument::with_root("LinearLayout");
        doc.set_bounds(root, Rect::new(0, 0, 100, 100));
        let mut rule = GridLayoutRule::default();
        let result = rule.apply(&mut doc, Action::AddColumn, &ActionContext::new(root, vec![]));
        assert!(matches!(result, Err(RuleError::NotAGrid(_))));

        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        let result = rule.apply(&mut doc, Action::AddColumn, &ActionContext::new(root, vec![]));
        assert!(matches!(result, Err(RuleError::InvalidLayout(_))));
    }

    #[test]
    fn test_child_inserted_default_gravity() {
        let (mut doc, root, a, _) = two_by_two();
        let rule = GridLayoutRule::default();

        let edit = doc.add_child(root, "EditText").unwrap();
        rule.on_child_inserted(&mut doc, edit, root, InsertType::Create).unwrap();
        assert_eq!(doc.attribute(edit, ATTR_LAYOUT_GRAVITY), Some("fill_horizontal"));

        let list = doc.add_child(root, "ListView").unwrap();
        rule.on_child_inserted(&mut doc, list, root, InsertType::MoveWithin).unwrap();
        assert_eq!(doc.attribute(list, ATTR_LAYOUT_GRAVITY), None);

        doc.set_attribute(list, ATTR_LAYOUT_GRAVITY, "center").unwrap();
        rule.on_child_inserted(&mut doc, list, root, InsertType::Paste).unwrap();
        assert_eq!(doc.attribute(list, ATTR_LAYOUT_GRAVITY), Some("center"));

        rule.on_child_inserted(&mut doc, a, root, InsertType::MoveInto).unwrap();
        assert_eq!(doc.attribute(a, ATTR_LAYOUT_GRAVITY), None);
    }

    #[test]
    fn test_removing_only_spacer_collapses_its_row() {
        let (mut doc, root, a, b) = two_by_two();
        let spacer = add(&mut doc, root, "Space", 2, 0, Rect::new(0, 100, 60, 40));
        let rule = GridLayoutRule::default();

        rule.on_removing_children(&mut doc, &[spacer], root).unwrap();
        // Cleanup removed the row the spacer held open
        assert!(!doc.is_attached(spacer));
        let grid = rule.grid_model(&doc, root).unwrap();
        assert_eq!(grid.row_count(), 2);
        assert!(doc.is_attached(a));
        assert_eq!(doc.int_attribute(b, ATTR_LAYOUT_ROW), Some(1));

        // The host's own removal of the spacer is harmless
        doc.apply(Edit::remove(spacer)).unwrap();
    }

    #[test]
    fn test_removing_children_collapses_emptied_lines() {
        let (mut doc, root, a, b) = two_by_two();
        let rule = GridLayoutRule::default();

        rule.on_removing_children(&mut doc, &[a], root).unwrap();
        assert_eq!(doc.int_attribute(b, ATTR_LAYOUT_ROW), Some(0));
        assert_eq!(doc.int_attribute(b, ATTR_LAYOUT_COLUMN), Some(0));
    }

    #[test]
    fn test_removing_children_in_grid_mode_keeps_structure() {
        let (mut doc, root, a, b) = two_by_two();
        let rule = GridLayoutRule::new(GridEditorConfig { grid_mode: true, ..Default::default() });
        let revision = doc.revision();

        rule.on_removing_children(&mut doc, &[a], root).unwrap();
        assert_eq!(doc.revision(), revision);
        assert_eq!(doc.int_attribute(b, ATTR_LAYOUT_ROW), Some(1));
    }

    #[test]
    fn test_span_resize() {
        let (mut doc, root, a, _) = two_by_two();
        let rule = GridLayoutRule::default();

        let mut state = rule.on_resize_begin(&doc, a, SPAN_MODIFIER).unwrap();
        assert_eq!(state.layout, root);
        let feedback = rule.on_resize_update(&doc, &mut state, Rect::new(55, 5, 50, 40), SPAN_MODIFIER);
        assert_eq!(feedback, Rect::new(0, 0, 120, 50));

        let outcome = rule.on_resize_end(&mut doc, &state).unwrap();
        assert_eq!(outcome, ActionOutcome::Edited { label: "Resize Span".into() });
        assert_eq!(doc.int_attribute(a, ATTR_LAYOUT_COLUMN_SPAN), Some(2));
        assert_eq!(doc.int_attribute(a, ATTR_LAYOUT_COLUMN), Some(0));
    }

    #[test]
    fn test_span_resize_leaves_other_widgets_uncovered() {
        let (mut doc, root, a, b) = two_by_two();
        let rule = GridLayoutRule::default();

        let mut state = rule.on_resize_begin(&doc, a, SPAN_MODIFIER).unwrap();
        let feedback = rule.on_resize_update(&doc, &mut state, Rect::new(0, 0, 120, 100), SPAN_MODIFIER);
        assert_eq!(feedback, Rect::new(0, 0, 60, 100));

        rule.on_resize_end(&mut doc, &state).unwrap();
        assert_eq!(doc.int_attribute(a, ATTR_LAYOUT_ROW_SPAN), Some(2));
        assert_eq!(doc.int_attribute(a, ATTR_LAYOUT_COLUMN_SPAN), None);

        let grid = rule.grid_model(&doc, root).unwrap();
        let view = grid.find_view(b).unwrap();
        assert!(grid.blocking(view.row, view.column, 1, 1, Some(b)).is_none());
    }

    #[test]
    fn test_pixel_resize() {
        let (mut doc, _, a, _) = two_by_two();
        let rule = GridLayoutRule::new(GridEditorConfig { density: 2.0, ..Default::default() });

        let mut state = rule.on_resize_begin(&doc, a, 0).unwrap();
        rule.on_resize_update(&doc, &mut state, Rect::new(0, 0, 90, 50), 0);
        rule.on_resize_end(&mut doc, &state).unwrap();
        assert_eq!(doc.attribute(a, ATTR_LAYOUT_WIDTH), Some("45dp"));
        assert_eq!(doc.attribute(a, ATTR_LAYOUT_HEIGHT), None);
        assert_eq!(doc.attribute(a, ATTR_LAYOUT_COLUMN_SPAN), None);
    }

    #[test]
    fn test_resize_outside_grid() {
        let (mut doc, root) = LayoutDocument::with_root("LinearLayout");
        doc.set_bounds(root, Rect::new(0, 0, 100, 100));
        let child = doc.add_child(root, "Button").unwrap();
        let rule = GridLayoutRule::default();
        assert!(matches!(rule.on_resize_begin(&doc, child, 0), Err(RuleError::NotInGrid(_))));
    }

    #[test]
    fn test_drop_session_commits() {
        let (mut doc, root, _, _) = two_by_two();
        let bus = Arc::new(EventBus::new());
        let events = bus.subscribe();
        let rule = GridLayoutRule::new(GridEditorConfig { grid_mode: true, ..Default::default() })
            .with_events(bus);
        let mut feedback = DropFeedback::new();

        rule.on_drop_enter(&doc, root, &mut feedback, DragElement::new("EditText", 40, 30))
            .unwrap();
        rule.on_drop_move(&doc, &mut feedback, Point::new(10, 60)).unwrap();
        assert!(feedback.has_match());
        let commands = rule.paint(&doc, root, Some(&feedback)).unwrap();
        assert!(commands.iter().any(|c| c.style() == DrawingStyle::DropPreview));

        let node = rule.on_dropped(&mut doc, &mut feedback, Point::new(10, 60)).unwrap().unwrap();
        assert_eq!(feedback.state(), crate::feedback::DragState::Committed);
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_ROW), Some(1));
        assert_eq!(doc.int_attribute(node, ATTR_LAYOUT_COLUMN), Some(0));
        assert_eq!(doc.attribute(node, ATTR_LAYOUT_GRAVITY), Some("fill_horizontal"));
        assert_eq!(
            events.drain(),
            vec![
                Event::DropEntered,
                Event::DropCommitted,
                Event::GridEdited { label: "Drop EditText".into() },
            ]
        );
    }

    #[test]
    fn test_drop_refused_on_occupied_cell() {
        let (mut doc, root, _, _) = two_by_two();
        let rule = GridLayoutRule::new(GridEditorConfig { grid_mode: true, ..Default::default() });
        let mut feedback = DropFeedback::new();
        let revision = doc.revision();

        rule.on_drop_enter(&doc, root, &mut feedback, DragElement::new("Button", 40, 30))
            .unwrap();
        assert_eq!(rule.on_dropped(&mut doc, &mut feedback, Point::new(5, 5)).unwrap(), None);
        assert_eq!(feedback.state(), crate::feedback::DragState::Cancelled);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_move_within_keeps_gravity() {
        let (mut doc, root, a, _) = two_by_two();
        let rule = GridLayoutRule::new(GridEditorConfig { grid_mode: true, ..Default::default() });
        let mut feedback = DropFeedback::new();
        let element = DragElement::from_node(&doc, a).unwrap();

        rule.on_drop_enter(&doc, root, &mut feedback, element).unwrap();
        let node = rule.on_dropped(&mut doc, &mut feedback, Point::new(70, 5)).unwrap();
        assert_eq!(node, Some(a));
        assert_eq!(doc.int_attribute(a, ATTR_LAYOUT_COLUMN), Some(1));
        assert_eq!(doc.parent(a), Some(root));
        assert_eq!(doc.children(root).len(), 2);
    }

    #[test]
    fn test_drop_leave_cancels() {
        let (doc, root, _, _) = two_by_two();
        let rule = GridLayoutRule::default();
        let mut feedback = DropFeedback::new();
        rule.on_drop_enter(&doc, root, &mut feedback, DragElement::new("Button", 1, 1))
            .unwrap();
        rule.on_drop_leave(&mut feedback).unwrap();
        assert!(rule.on_drop_leave(&mut feedback).is_err());
    }
}
