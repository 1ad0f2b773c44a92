//! Layout attribute and tag names
//!
//! Attributes are stored under their qualified XML names.

/// Android namespace URI
pub const ANDROID_URI: &str = "http://schemas.android.com/apk/res/android";

pub const ATTR_ID: &str = "android:id";
pub const ATTR_LAYOUT_WIDTH: &str = "android:layout_width";
pub const ATTR_LAYOUT_HEIGHT: &str = "android:layout_height";
pub const ATTR_LAYOUT_GRAVITY: &str = "android:layout_gravity";
pub const ATTR_ORIENTATION: &str = "android:orientation";
pub const ATTR_LAYOUT_MARGIN_LEFT: &str = "android:layout_marginLeft";
pub const ATTR_LAYOUT_MARGIN_TOP: &str = "android:layout_marginTop";

pub const ATTR_ROW_COUNT: &str = "android:rowCount";
pub const ATTR_COLUMN_COUNT: &str = "android:columnCount";
pub const ATTR_LAYOUT_ROW: &str = "android:layout_row";
pub const ATTR_LAYOUT_COLUMN: &str = "android:layout_column";
pub const ATTR_LAYOUT_ROW_SPAN: &str = "android:layout_rowSpan";
pub const ATTR_LAYOUT_COLUMN_SPAN: &str = "android:layout_columnSpan";

/// Older spellings still found in hand-written layouts
pub const ATTR_LAYOUT_ROW_SPAN_ALIAS: &str = "android:layout_row_span";
pub const ATTR_LAYOUT_COLUMN_SPAN_ALIAS: &str = "android:layout_column_span";

pub const VALUE_VERTICAL: &str = "vertical";
pub const VALUE_WRAP_CONTENT: &str = "wrap_content";

pub const GRAVITY_FILL: &str = "fill";
pub const GRAVITY_FILL_HORIZONTAL: &str = "fill_horizontal";
pub const GRAVITY_FILL_VERTICAL: &str = "fill_vertical";

pub const GRID_LAYOUT: &str = "GridLayout";
pub const FQCN_GRID_LAYOUT: &str = "android.widget.GridLayout";
pub const FQCN_GRID_LAYOUT_V7: &str = "android.support.v7.widget.GridLayout";

pub const SPACE: &str = "Space";
pub const FQCN_SPACE: &str = "android.widget.Space";
pub const FQCN_SPACE_V7: &str = "android.support.v7.widget.Space";

/// Check if a tag names a GridLayout container
pub fn is_grid_layout(tag: &str) -> bool {
    matches!(tag, GRID_LAYOUT | FQCN_GRID_LAYOUT | FQCN_GRID_LAYOUT_V7)
}

/// Check if a tag names a spacer widget
pub fn is_spacer(tag: &str) -> bool {
    matches!(tag, SPACE | FQCN_SPACE | FQCN_SPACE_V7)
}

/// Strip the `@+id/` or `@id/` prefix from an id reference
pub fn strip_id_prefix(id: &str) -> &str {
    id.strip_prefix("@+id/")
        .or_else(|| id.strip_prefix("@id/"))
        .unwrap_or(id)
}

/// Simple class name of a possibly fully-qualified tag
pub fn simple_name(tag: &str) -> &str {
    tag.rsplit('.').next().unwrap_or(tag)
}
