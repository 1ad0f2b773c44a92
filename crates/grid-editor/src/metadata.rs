//! View Metadata
//!
//! Per-widget defaults the designer applies when a widget is dropped into
//! a grid.

use serde::{Deserialize, Serialize};

use r_droid_layout::attributes::{simple_name, GRAVITY_FILL, GRAVITY_FILL_HORIZONTAL, GRAVITY_FILL_VERTICAL};

/// How a widget prefers to fill its cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillPreference {
    #[default]
    None,
    /// Fill horizontally
    Width,
    /// Fill vertically
    Height,
    /// Fill both ways
    Both,
    /// Fill horizontally only inside a vertical container
    WidthInVertical,
}

impl FillPreference {
    /// Fill preference of a widget by tag
    pub fn of(tag: &str) -> Self {
        match simple_name(tag) {
            "EditText" | "AutoCompleteTextView" | "MultiAutoCompleteTextView" | "SeekBar"
            | "ProgressBar" | "RatingBar" | "Spinner" => FillPreference::Width,
            "ListView" | "GridView" | "ExpandableListView" | "ScrollView" | "WebView"
            | "RecyclerView" => FillPreference::Both,
            "HorizontalScrollView" | "ViewPager" => FillPreference::Width,
            "View" | "ImageView" => FillPreference::None,
            "TextView" | "CheckedTextView" => FillPreference::WidthInVertical,
            "VerticalSeekBar" => FillPreference::Height,
            _ => FillPreference::None,
        }
    }

    pub fn fills_width(&self, vertical: bool) -> bool {
        match self {
            FillPreference::Width | FillPreference::Both => true,
            FillPreference::WidthInVertical => vertical,
            _ => false,
        }
    }

    pub fn fills_height(&self) -> bool {
        matches!(self, FillPreference::Height | FillPreference::Both)
    }

    /// `layout_gravity` value for this preference, if any
    pub fn gravity(&self, vertical: bool) -> Option<&'static str> {
        match (self.fills_width(vertical), self.fills_height()) {
            (true, true) => Some(GRAVITY_FILL),
            (true, false) => Some(GRAVITY_FILL_HORIZONTAL),
            (false, true) => Some(GRAVITY_FILL_VERTICAL),
            (false, false) => None,
        }
    }
}
