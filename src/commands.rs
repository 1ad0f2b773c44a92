//! CLI commands for the R-Droid designer
//!
//! Each command opens a layout file, lays it out with the preview geometry,
//! runs the grid editor on its first GridLayout and writes the result.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use tracing::info;

use r_droid_core::{AppConfig, Event, EventBus, GridEditorConfig, GridFlag, RDroidError};
use r_droid_grid_editor::{
    apply_preview, Action, ActionContext, ActionOutcome, DragElement, DropFeedback, GridLayoutRule,
    ViewData, SPAN_MODIFIER,
};
use r_droid_layout::attributes::{is_grid_layout, ATTR_ID, ATTR_LAYOUT_COLUMN, ATTR_LAYOUT_ROW};
use r_droid_layout::{LayoutDocument, LayoutParser, LayoutTree, LayoutWriter, NodeId, Point, Rect};

/// A layout file opened for editing
struct Session {
    doc: LayoutDocument,
    layout: NodeId,
    rule: GridLayoutRule,
    events: Arc<EventBus>,
}

impl Session {
    async fn open(path: &Path, grid: GridEditorConfig, config: &AppConfig, events: Arc<EventBus>) -> Result<Self> {
        let mut doc = LayoutParser::parse_file(path)
            .await
            .with_context(|| format!("Failed to read layout {:?}", path))?;
        apply_preview(&mut doc, &config.preview, &grid);
        let layout = doc
            .find_first(is_grid_layout)
            .ok_or_else(|| anyhow!("No GridLayout in {:?}", path))?;

        events.emit(Event::LayoutOpened(path.to_path_buf()));
        Ok(Self {
            doc,
            layout,
            rule: GridLayoutRule::new(grid).with_events(events.clone()),
            events,
        })
    }

    fn find(&self, id: &str) -> Result<NodeId> {
        self.doc
            .find_by_id(id)
            .ok_or_else(|| anyhow!("No view with id {}", id))
    }

    /// Write to `output`, or return the XML when no output was given
    async fn finish(&self, output: Option<&Path>, summary: String) -> Result<String> {
        let writer = LayoutWriter::new();
        match output {
            Some(path) => {
                writer.write_to_file(&self.doc, path).await?;
                self.events.emit(Event::LayoutSaved(path.to_path_buf()));
                info!("Wrote {:?}", path);
                Ok(summary)
            }
            None => Ok(writer.write_to_string(&self.doc)?),
        }
    }
}

/// Row/column summary of a grid
#[derive(Debug, Serialize)]
struct GridSummary<'a> {
    rows: usize,
    columns: usize,
    row_boundaries: &'a [i32],
    column_boundaries: &'a [i32],
    views: Vec<&'a ViewData>,
}

/// Print the grid model of a layout
pub struct InspectCommand {
    pub layout: PathBuf,
    pub json: bool,
}

impl InspectCommand {
    pub async fn execute(&self, config: &AppConfig, events: Arc<EventBus>) -> Result<String> {
        let session = Session::open(&self.layout, config.grid.clone(), config, events).await?;
        let model = session
            .rule
            .grid_model(&session.doc, session.layout)
            .map_err(RDroidError::from)?;

        if self.json {
            let summary = GridSummary {
                rows: model.row_count(),
                columns: model.column_count(),
                row_boundaries: model.row_boundaries(),
                column_boundaries: model.column_boundaries(),
                views: model.views().collect(),
            };
            return Ok(serde_json::to_string_pretty(&summary)?);
        }

        let mut out = format!(
            "GridLayout: {} rows x {} columns ({})\nrows:    {:?}\ncolumns: {:?}\n",
            model.row_count(),
            model.column_count(),
            if model.is_vertical() { "vertical" } else { "horizontal" },
            model.row_boundaries(),
            model.column_boundaries(),
        );
        for view in model.views() {
            let id = session.doc.attribute(view.node, ATTR_ID).unwrap_or("-");
            out.push_str(&format!(
                "  ({}, {}) {}x{} {} {}\n",
                view.row, view.column, view.row_span, view.column_span, view.tag, id
            ));
        }
        Ok(out)
    }
}

/// Structural grid action
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GridAction {
    AddRow,
    RemoveRow,
    AddColumn,
    RemoveColumn,
}

impl From<GridAction> for Action {
    fn from(action: GridAction) -> Self {
        match action {
            GridAction::AddRow => Action::AddRow,
            GridAction::RemoveRow => Action::RemoveRow,
            GridAction::AddColumn => Action::AddColumn,
            GridAction::RemoveColumn => Action::RemoveColumn,
        }
    }
}

/// Add or remove rows and columns around selected views
pub struct ActionCommand {
    pub layout: PathBuf,
    pub action: GridAction,
    pub select: Vec<String>,
    pub output: Option<PathBuf>,
}

impl ActionCommand {
    pub async fn execute(&self, config: &AppConfig, events: Arc<EventBus>) -> Result<String> {
        let mut session = Session::open(&self.layout, config.grid.clone(), config, events).await?;
        let selection = self
            .select
            .iter()
            .map(|id| session.find(id))
            .collect::<Result<Vec<_>>>()?;

        let ctx = ActionContext::new(session.layout, selection);
        let outcome = session
            .rule
            .apply(&mut session.doc, self.action.into(), &ctx)
            .map_err(RDroidError::from)?;
        let summary = match outcome {
            ActionOutcome::Edited { label } => format!("{} applied", label),
            _ => format!("{} left the layout unchanged", Action::from(self.action).label()),
        };
        info!("{}", summary);
        session.finish(self.output.as_deref(), summary).await
    }
}

/// Drop a new widget into the grid
pub struct DropCommand {
    pub layout: PathBuf,
    pub tag: String,
    pub id: Option<String>,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub grid_mode: bool,
    pub output: Option<PathBuf>,
}

impl DropCommand {
    pub async fn execute(&self, config: &AppConfig, events: Arc<EventBus>) -> Result<String> {
        let mut grid = config.grid.clone();
        grid.grid_mode |= self.grid_mode;
        let mut session = Session::open(&self.layout, grid, config, events).await?;

        let mut element = DragElement::new(&self.tag, self.width, self.height);
        if let Some(id) = &self.id {
            element = element.with_attribute(ATTR_ID, format!("@+id/{}", id));
        }

        let point = Point::new(self.x, self.y);
        let mut feedback = DropFeedback::new();
        session
            .rule
            .on_drop_enter(&session.doc, session.layout, &mut feedback, element)
            .map_err(RDroidError::from)?;
        session
            .rule
            .on_drop_move(&session.doc, &mut feedback, point)
            .map_err(RDroidError::from)?;
        let node = session
            .rule
            .on_dropped(&mut session.doc, &mut feedback, point)
            .map_err(RDroidError::from)?;

        let summary = match node {
            Some(node) => {
                let row = session.doc.attribute(node, ATTR_LAYOUT_ROW).unwrap_or("0");
                let column = session.doc.attribute(node, ATTR_LAYOUT_COLUMN).unwrap_or("0");
                format!("Dropped {} at row {}, column {}", self.tag, row, column)
            }
            None => return Err(anyhow!("No cell accepts a drop at ({}, {})", self.x, self.y)),
        };
        info!("{}", summary);
        session.finish(self.output.as_deref(), summary).await
    }
}

/// Resize a view in pixels or in cells
pub struct ResizeCommand {
    pub layout: PathBuf,
    pub select: String,
    pub bounds: Rect,
    pub span: bool,
    pub output: Option<PathBuf>,
}

impl ResizeCommand {
    pub async fn execute(&self, config: &AppConfig, events: Arc<EventBus>) -> Result<String> {
        let mut session = Session::open(&self.layout, config.grid.clone(), config, events).await?;
        let node = session.find(&self.select)?;
        let modifiers = if self.span { SPAN_MODIFIER } else { 0 };

        let mut state = session
            .rule
            .on_resize_begin(&session.doc, node, modifiers)
            .map_err(RDroidError::from)?;
        session
            .rule
            .on_resize_update(&session.doc, &mut state, self.bounds, modifiers);
        let outcome = session
            .rule
            .on_resize_end(&mut session.doc, &state)
            .map_err(RDroidError::from)?;

        let summary = match outcome {
            ActionOutcome::Edited { label } => format!("{} applied to {}", label, self.select),
            _ => format!("{} unchanged", self.select),
        };
        session.finish(self.output.as_deref(), summary).await
    }
}

/// Paint commands of the grid overlays as JSON
pub struct OverlayCommand {
    pub layout: PathBuf,
    pub structure: bool,
    pub debug: bool,
}

impl OverlayCommand {
    pub async fn execute(&self, config: &AppConfig, events: Arc<EventBus>) -> Result<String> {
        let mut grid = config.grid.clone();
        grid.show_structure |= self.structure;
        grid.debug_overlay |= self.debug;
        let session = Session::open(&self.layout, grid, config, events).await?;

        let commands = session
            .rule
            .paint(&session.doc, session.layout, None)
            .map_err(RDroidError::from)?;
        Ok(serde_json::to_string_pretty(&commands)?)
    }
}

/// Show or toggle persistent grid settings
pub struct ConfigCommand {
    pub path: PathBuf,
    pub toggle: Option<String>,
}

impl ConfigCommand {
    pub async fn execute(&self, config: &mut AppConfig, events: Arc<EventBus>) -> Result<String> {
        if let Some(name) = &self.toggle {
            let flag: GridFlag = name.parse()?;
            let value = config.grid.toggle(flag);
            config.save_to(&self.path).await?;
            events.emit(Event::ConfigChanged);
            info!("{} is now {}", flag.as_str(), if value { "on" } else { "off" });
        }
        Ok(toml::to_string_pretty(&config.grid)?)
    }
}
