//! Layout Tree Interface
//!
//! The abstract node tree the designer rules read and mutate. Rules never
//! touch a concrete tree type: every mutation goes through
//! [`LayoutTree::apply`] and every user gesture through
//! [`LayoutTree::transaction`].

use serde::{Deserialize, Serialize};

use crate::attributes::{strip_id_prefix, ATTR_ID};
use crate::geometry::Rect;

/// Handle to a node owned by a layout tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// A single mutation of the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Set (or overwrite) an attribute
    SetAttribute {
        node: NodeId,
        name: String,
        value: String,
    },
    /// Remove an attribute; removing a missing attribute is a no-op
    RemoveAttribute { node: NodeId, name: String },
    /// Attach a detached node under `parent`, appending when `index` is None
    InsertChild {
        parent: NodeId,
        child: NodeId,
        index: Option<usize>,
    },
    /// Detach a node from its parent; detaching a detached node is a no-op
    RemoveChild { node: NodeId },
}

impl Edit {
    pub fn set(node: NodeId, name: &str, value: impl ToString) -> Self {
        Edit::SetAttribute {
            node,
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn unset(node: NodeId, name: &str) -> Self {
        Edit::RemoveAttribute {
            node,
            name: name.to_string(),
        }
    }

    pub fn remove(node: NodeId) -> Self {
        Edit::RemoveChild { node }
    }
}

/// Edit errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("Unknown node: {0:?}")]
    UnknownNode(NodeId),
    #[error("Node {0:?} is already attached")]
    AlreadyAttached(NodeId),
    #[error("Cannot insert {child:?} below itself ({parent:?})")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("Index {index} out of range for children of {parent:?}")]
    IndexOutOfRange { parent: NodeId, index: usize },
    #[error("Edit rejected: {0}")]
    Rejected(String),
}

/// Read/write access to a layout node tree
pub trait LayoutTree {
    /// Root node, if the tree is not empty
    fn root(&self) -> Option<NodeId>;

    /// Element tag (simple or fully-qualified class name)
    fn tag(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children in document order
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Attribute value by qualified name (e.g. `android:layout_row`)
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str>;

    /// Rendered bounds in layout coordinates, if known
    fn bounds(&self, node: NodeId) -> Option<Rect>;

    /// Create a detached node; attach it with [`Edit::InsertChild`]
    fn create_node(&mut self, tag: &str) -> NodeId;

    /// Apply a single edit
    fn apply(&mut self, edit: Edit) -> Result<(), EditError>;

    /// Run `f` as one atomic edit: when it fails, every edit it applied is
    /// rolled back before the error is returned.
    fn transaction<R, F>(&mut self, label: &str, f: F) -> Result<R, EditError>
    where
        Self: Sized,
        F: FnOnce(&mut Self) -> Result<R, EditError>;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: impl ToString) -> Result<(), EditError>
    where
        Self: Sized,
    {
        self.apply(Edit::set(node, name, value))
    }

    /// Attribute parsed as an unsigned integer; malformed values read as None
    fn int_attribute(&self, node: NodeId, name: &str) -> Option<usize> {
        self.attribute(node, name).and_then(|v| v.trim().parse().ok())
    }

    /// Find a node by its `android:id` (with or without the `@+id/` prefix)
    fn find_by_id(&self, id: &str) -> Option<NodeId> {
        let wanted = strip_id_prefix(id);
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(node) = stack.pop() {
            if self.attribute(node, ATTR_ID).map(strip_id_prefix) == Some(wanted) {
                return Some(node);
            }
            let mut children = self.children(node);
            children.reverse();
            stack.extend(children);
        }
        None
    }

    /// First node (pre-order) whose tag satisfies the predicate
    fn find_first(&self, predicate: impl Fn(&str) -> bool) -> Option<NodeId>
    where
        Self: Sized,
    {
        let mut stack: Vec<NodeId> = self.root().into_iter().collect();
        while let Some(node) = stack.pop() {
            if self.tag(node).is_some_and(&predicate) {
                return Some(node);
            }
            let mut children = self.children(node);
            children.reverse();
            stack.extend(children);
        }
        None
    }
}
