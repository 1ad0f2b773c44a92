//! Android Layout Documents
//!
//! In-memory model of Android layout resource files plus the abstract
//! tree-mutation interface the designer rules edit through.
//!
//! - `tree`: the `LayoutTree` trait, `Edit` operations and `NodeId`s
//! - `document`: `LayoutDocument`, an arena-backed `LayoutTree`
//! - `parser` / `writer`: layout XML in and out

pub mod attributes;
pub mod document;
pub mod geometry;
pub mod parser;
pub mod tree;
pub mod writer;

pub use document::LayoutDocument;
pub use geometry::{Point, Rect};
pub use parser::{LayoutParser, ParseError};
pub use tree::{Edit, EditError, LayoutTree, NodeId};
pub use writer::{LayoutWriter, WriteError};
