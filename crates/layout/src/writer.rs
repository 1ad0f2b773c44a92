//! Layout XML Writer
//!
//! Writes a [`LayoutDocument`] back to layout XML.

use std::io::Cursor;
use std::path::Path;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::info;

use crate::document::LayoutDocument;
use crate::tree::{LayoutTree, NodeId};

/// Writer errors
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("XML write error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("Document has no root element")]
    NoRoot,
}

/// Layout writer
pub struct LayoutWriter {
    indent: usize,
}

impl LayoutWriter {
    /// Create a new writer with default settings
    pub fn new() -> Self {
        Self { indent: 4 }
    }

    /// Set indentation
    pub fn with_indent(mut self, spaces: usize) -> Self {
        self.indent = spaces;
        self
    }

    /// Write the document to string
    pub fn write_to_string(&self, doc: &LayoutDocument) -> Result<String, WriteError> {
        let root = doc.root().ok_or(WriteError::NoRoot)?;
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', self.indent);

        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        writer.write_event(Event::Text(BytesText::from_escaped("\n")))?;

        self.write_node(&mut writer, doc, root)?;
        for text in doc.epilogue() {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }

        let result = writer.into_inner().into_inner();
        Ok(String::from_utf8(result)?)
    }

    /// Write the document to file
    pub async fn write_to_file(&self, doc: &LayoutDocument, path: impl AsRef<Path>) -> Result<(), WriteError> {
        let content = self.write_to_string(doc)?;
        tokio::fs::write(path.as_ref(), content).await?;
        info!("Wrote layout to {:?}", path.as_ref());
        Ok(())
    }

    fn write_node<W: std::io::Write>(
        &self,
        writer: &mut Writer<W>,
        doc: &LayoutDocument,
        node: NodeId,
    ) -> Result<(), WriteError> {
        for text in doc.comments(node) {
            writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
        }

        let tag = doc.tag(node).unwrap_or_default();
        let mut elem = BytesStart::new(tag);
        for (name, value) in doc.attributes(node) {
            elem.push_attribute((name, value));
        }

        let children = doc.children(node);
        let trailing = doc.trailing_comments(node);
        if children.is_empty() && trailing.is_empty() {
            writer.write_event(Event::Empty(elem))?;
        } else {
            writer.write_event(Event::Start(elem))?;
            for child in children {
                self.write_node(writer, doc, child)?;
            }
            for text in trailing {
                writer.write_event(Event::Comment(BytesText::from_escaped(text.as_str())))?;
            }
            writer.write_event(Event::End(BytesEnd::new(tag)))?;
        }
        Ok(())
    }
}

impl Default for LayoutWriter {
    fn default() -> Self {
        Self::new()
    }
}
