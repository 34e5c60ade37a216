#![forbid(unsafe_code)]

//! NodeSet type for XML canonicalization and transforms.
//!
//! A `NodeSet` represents a set of nodes from a parsed document,
//! identified by their `roxmltree::NodeId`.  Canonicalization consults it
//! to decide node visibility; the enveloped-signature transform edits it
//! to drop signature subtrees.

use std::collections::HashSet;

/// A set of XML document nodes identified by `NodeId`.
#[derive(Debug, Clone, Default)]
pub struct NodeSet {
    nodes: HashSet<u32>,
}

impl NodeSet {
    /// Create a node set containing all nodes except comments.
    /// Per W3C DSig spec, `URI=""` selects the document without comments.
    pub fn all_without_comments(doc: &roxmltree::Document<'_>) -> Self {
        let mut nodes = HashSet::new();
        for node in doc.root().descendants() {
            if !node.is_comment() {
                nodes.insert(node.id().get());
            }
        }
        Self { nodes }
    }

    /// Create a node set for the subtree rooted at the given node,
    /// excluding comment nodes.
    pub fn tree_without_comments(root: roxmltree::Node<'_, '_>) -> Self {
        let mut nodes = HashSet::new();
        for node in root.descendants() {
            if !node.is_comment() {
                nodes.insert(node.id().get());
            }
        }
        Self { nodes }
    }

    /// Check if a node is in this set.
    pub fn contains(&self, node: &roxmltree::Node<'_, '_>) -> bool {
        self.nodes.contains(&node.id().get())
    }

    /// Remove the subtree rooted at the given node from this set.
    pub fn remove_subtree(&mut self, root: roxmltree::Node<'_, '_>) {
        for node in root.descendants() {
            self.nodes.remove(&node.id().get());
        }
    }
}
