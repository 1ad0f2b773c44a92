//! Layout Document
//!
//! Arena-backed implementation of [`LayoutTree`]. Nodes are never freed:
//! a removed node stays in the arena, detached, so ids remain stable for
//! the lifetime of the document.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::geometry::Rect;
use crate::tree::{Edit, EditError, LayoutTree, NodeId};

#[derive(Debug, Clone, Default)]
struct NodeData {
    tag: String,
    attributes: IndexMap<String, String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bounds: Option<Rect>,
    /// Comments written before the element
    comments: Vec<String>,
    /// Comments written after the last child, before the closing tag
    trailing_comments: Vec<String>,
}

/// In-memory layout document
#[derive(Debug, Clone, Default)]
pub struct LayoutDocument {
    nodes: Vec<NodeData>,
    root: Option<NodeId>,
    /// Comments after the root element
    epilogue: Vec<String>,
    /// Incremented for every applied edit
    revision: u64,
}

impl LayoutDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document with a root element
    pub fn with_root(tag: &str) -> (Self, NodeId) {
        let mut doc = Self::new();
        let root = doc.create_node(tag);
        doc.root = Some(root);
        (doc, root)
    }

    /// Make a detached node the document root
    pub fn set_root(&mut self, node: NodeId) -> Result<(), EditError> {
        let data = self.node(node)?;
        if data.parent.is_some() {
            return Err(EditError::AlreadyAttached(node));
        }
        self.root = Some(node);
        Ok(())
    }

    /// Create a node and append it to `parent`
    pub fn add_child(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, EditError> {
        let child = self.create_node(tag);
        self.apply(Edit::InsertChild {
            parent,
            child,
            index: None,
        })?;
        Ok(child)
    }

    /// Record rendered bounds for a node (render results are not edits)
    pub fn set_bounds(&mut self, node: NodeId, bounds: Rect) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.bounds = Some(bounds);
        }
    }

    pub fn clear_bounds(&mut self, node: NodeId) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.bounds = None;
        }
    }

    /// Attach a comment in front of `node`
    pub fn add_comment(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.comments.push(text.into());
        }
    }

    /// Attach a comment after the children of `node`
    pub fn add_trailing_comment(&mut self, node: NodeId, text: impl Into<String>) {
        if let Some(data) = self.nodes.get_mut(node.0) {
            data.trailing_comments.push(text.into());
        }
    }

    /// Add a comment after the root element
    pub fn add_epilogue_comment(&mut self, text: impl Into<String>) {
        self.epilogue.push(text.into());
    }

    pub fn comments(&self, node: NodeId) -> &[String] {
        self.nodes.get(node.0).map_or(&[], |data| data.comments.as_slice())
    }

    pub fn trailing_comments(&self, node: NodeId) -> &[String] {
        self.nodes.get(node.0).map_or(&[], |data| data.trailing_comments.as_slice())
    }

    pub fn epilogue(&self) -> &[String] {
        &self.epilogue
    }

    /// All attributes of a node in document order
    pub fn attributes(&self, node: NodeId) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .get(node.0)
            .into_iter()
            .flat_map(|data| data.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if Some(id) == self.root {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|data| data.parent);
        }
        false
    }

    /// Number of edits applied so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of nodes ever created, attached or not
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, node: NodeId) -> Result<&NodeData, EditError> {
        self.nodes.get(node.0).ok_or(EditError::UnknownNode(node))
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut NodeData, EditError> {
        self.nodes.get_mut(node.0).ok_or(EditError::UnknownNode(node))
    }

    fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes.get(id.0).and_then(|data| data.parent);
        }
        false
    }
}

impl LayoutTree for LayoutDocument {
    fn root(&self) -> Option<NodeId> {
        self.root
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|data| data.tag.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(node.0)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.nodes
            .get(node.0)
            .and_then(|data| data.attributes.get(name))
            .map(String::as_str)
    }

    fn bounds(&self, node: NodeId) -> Option<Rect> {
        self.nodes.get(node.0).and_then(|data| data.bounds)
    }

    fn create_node(&mut self, tag: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            tag: tag.to_string(),
            ..Default::default()
        });
        id
    }

    fn apply(&mut self, edit: Edit) -> Result<(), EditError> {
        match edit {
            Edit::SetAttribute { node, name, value } => {
                self.node_mut(node)?.attributes.insert(name, value);
            }
            Edit::RemoveAttribute { node, name } => {
                self.node_mut(node)?.attributes.shift_remove(&name);
            }
            Edit::InsertChild { parent, child, index } => {
                self.node(parent)?;
                if self.node(child)?.parent.is_some() || self.root == Some(child) {
                    return Err(EditError::AlreadyAttached(child));
                }
                if self.is_ancestor_or_self(child, parent) {
                    return Err(EditError::Cycle { parent, child });
                }
                let siblings = &mut self.node_mut(parent)?.children;
                let index = index.unwrap_or(siblings.len());
                if index > siblings.len() {
                    return Err(EditError::IndexOutOfRange { parent, index });
                }
                siblings.insert(index, child);
                self.node_mut(child)?.parent = Some(parent);
            }
            Edit::RemoveChild { node } => {
                if self.root == Some(node) {
                    return Err(EditError::Rejected("cannot remove the document root".into()));
                }
                let Some(parent) = self.node(node)?.parent else {
                    // Already detached
                    return Ok(());
                };
                self.node_mut(parent)?.children.retain(|c| *c != node);
                self.node_mut(node)?.parent = None;
            }
        }
        self.revision += 1;
        Ok(())
    }

    fn transaction<R, F>(&mut self, label: &str, f: F) -> Result<R, EditError>
    where
        F: FnOnce(&mut Self) -> Result<R, EditError>,
    {
        let snapshot = self.clone();
        match f(self) {
            Ok(result) => {
                debug!("Edit '{}' committed at revision {}", label, self.revision);
                Ok(result)
            }
            Err(e) => {
                warn!("Edit '{}' rolled back: {}", label, e);
                *self = snapshot;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{ATTR_ID, ATTR_LAYOUT_ROW};

    #[test]
    fn test_insert_and_remove() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        let a = doc.add_child(root, "Button").unwrap();
        let b = doc.add_child(root, "TextView").unwrap();
        assert_eq!(doc.children(root), vec![a, b]);
        assert_eq!(doc.parent(a), Some(root));

        doc.apply(Edit::remove(a)).unwrap();
        assert_eq!(doc.children(root), vec![b]);
        assert!(!doc.is_attached(a));

        // Removing twice is harmless
        doc.apply(Edit::remove(a)).unwrap();
    }

    #[test]
    fn test_insert_rejects_cycles_and_double_attach() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        let child = doc.add_child(root, "LinearLayout").unwrap();
        assert_eq!(
            doc.apply(Edit::InsertChild { parent: child, child: root, index: None }),
            Err(EditError::AlreadyAttached(root))
        );
        let detached = doc.create_node("FrameLayout");
        doc.apply(Edit::InsertChild { parent: child, child: detached, index: Some(0) }).unwrap();
        assert_eq!(
            doc.apply(Edit::InsertChild { parent: root, child: detached, index: None }),
            Err(EditError::AlreadyAttached(detached))
        );
        let loose = doc.create_node("View");
        assert_eq!(
            doc.apply(Edit::InsertChild { parent: root, child: loose, index: Some(5) }),
            Err(EditError::IndexOutOfRange { parent: root, index: 5 })
        );
    }

    #[test]
    fn test_transaction_rolls_back() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        let button = doc.add_child(root, "Button").unwrap();
        let revision = doc.revision();

        let result: Result<(), EditError> = doc.transaction("failing", |doc| {
            doc.set_attribute(button, ATTR_LAYOUT_ROW, 3)?;
            doc.apply(Edit::remove(root))
        });

        assert!(result.is_err());
        assert_eq!(doc.attribute(button, ATTR_LAYOUT_ROW), None);
        assert_eq!(doc.revision(), revision);
    }

    #[test]
    fn test_find_by_id() {
        let (mut doc, root) = LayoutDocument::with_root("GridLayout");
        let button = doc.add_child(root, "Button").unwrap();
        doc.set_attribute(button, ATTR_ID, "@+id/ok").unwrap();
        assert_eq!(doc.find_by_id("ok"), Some(button));
        assert_eq!(doc.find_by_id("@id/ok"), Some(button));
        assert_eq!(doc.find_by_id("cancel"), None);
    }
}
