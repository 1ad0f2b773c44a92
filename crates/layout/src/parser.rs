//! Layout XML Parser
//!
//! Parses Android layout resource files into a [`LayoutDocument`].

use std::path::Path;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;

use crate::document::LayoutDocument;
use crate::tree::{Edit, EditError, LayoutTree, NodeId};

/// Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),
    #[error("Invalid attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),
    #[error("Invalid layout structure: {0}")]
    InvalidStructure(String),
    #[error("Document error: {0}")]
    Edit(#[from] EditError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// Layout parser
pub struct LayoutParser;

impl LayoutParser {
    /// Parse a layout file from path
    pub async fn parse_file(path: impl AsRef<Path>) -> Result<LayoutDocument, ParseError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        debug!("Parsing layout {:?}", path.as_ref());
        Self::parse_string(&content)
    }

    /// Parse a layout from string
    pub fn parse_string(xml: &str) -> Result<LayoutDocument, ParseError> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut doc = LayoutDocument::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut comments: Vec<String> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(ref e)) => {
                    let node = Self::open_element(&mut doc, stack.last().copied(), e)?;
                    Self::attach_comments(&mut doc, node, &mut comments);
                    stack.push(node);
                }
                Ok(Event::Empty(ref e)) => {
                    let node = Self::open_element(&mut doc, stack.last().copied(), e)?;
                    Self::attach_comments(&mut doc, node, &mut comments);
                }
                Ok(Event::End(_)) => {
                    if let Some(node) = stack.pop() {
                        for text in comments.drain(..) {
                            doc.add_trailing_comment(node, text);
                        }
                    }
                }
                Ok(Event::Comment(ref e)) => {
                    comments.push(std::str::from_utf8(e.as_ref())?.to_string());
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(ParseError::XmlError(e)),
                _ => {}
            }
            buf.clear();
        }

        if doc.root().is_none() {
            return Err(ParseError::InvalidStructure("layout has no root element".into()));
        }
        for text in comments {
            doc.add_epilogue_comment(text);
        }
        Ok(doc)
    }

    fn attach_comments(doc: &mut LayoutDocument, node: NodeId, comments: &mut Vec<String>) {
        for text in comments.drain(..) {
            doc.add_comment(node, text);
        }
    }

    fn open_element(
        doc: &mut LayoutDocument,
        parent: Option<NodeId>,
        e: &BytesStart,
    ) -> Result<NodeId, ParseError> {
        let tag = std::str::from_utf8(e.name().as_ref())?.to_string();
        let node = doc.create_node(&tag);

        for attr in e.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
            let value = attr.unescape_value()?.into_owned();
            doc.apply(Edit::SetAttribute { node, name: key, value })?;
        }

        match parent {
            Some(parent) => doc.apply(Edit::InsertChild { parent, child: node, index: None })?,
            None if doc.root().is_none() => doc.set_root(node)?,
            None => {
                return Err(ParseError::InvalidStructure(format!(
                    "multiple root elements (second is <{}>)",
                    tag
                )))
            }
        }
        Ok(node)
    }
}
