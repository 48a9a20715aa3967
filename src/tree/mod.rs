//! Category tree data model
//!
//! A [`TreeNode`] is either a category (organizes further children) or a
//! leaf (carries consolidated content). A node that carries content and
//! still lists children is a mixed node. Serialized form:
//!
//! ```json
//! {"name": "...", "url": "...", "children": [...]}
//! {"name": "...", "url": "...", "content": {...}, "children": [...]}
//! ```

mod builder;

pub use builder::{attachment_path, build_chain};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One element of a breadcrumb trail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub name: String,
    pub url: String,
}

impl Crumb {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Node classification, derived from what the node carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Category,
    Leaf,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Leaf => write!(f, "leaf"),
        }
    }
}

/// Consolidated content attached to a leaf
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub sections: Vec<ContentSection>,
}

impl NodeContent {
    /// Returns true if no section carries any text
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(|s| s.text.is_empty())
    }

    /// Looks up a section by name
    pub fn section(&self, name: &str) -> Option<&ContentSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// A named block of consolidated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSection {
    pub name: String,
    pub text: String,
}

/// One category or terminal item in the harvested tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub name: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<NodeContent>,

    /// Ordered by discovery
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Creates a category node with no children
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            content: None,
            children: Vec::new(),
        }
    }

    /// A node is a leaf exactly when it carries content
    pub fn kind(&self) -> NodeKind {
        if self.content.is_some() {
            NodeKind::Leaf
        } else {
            NodeKind::Category
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind() == NodeKind::Leaf
    }

    /// A leaf that also lists children
    pub fn is_mixed(&self) -> bool {
        self.is_leaf() && !self.children.is_empty()
    }

    pub fn has_child(&self, url: &str) -> bool {
        self.children.iter().any(|c| c.url == url)
    }

    /// Merges `incoming` children into this node by URL
    ///
    /// Children with a URL not yet present are appended in order. For a
    /// child already present, missing content is filled in and its own
    /// children are merged the same way. Returns the number appended here.
    pub fn merge_children(&mut self, incoming: Vec<TreeNode>) -> usize {
        let mut appended = 0;

        for child in incoming {
            match self.children.iter_mut().find(|c| c.url == child.url) {
                Some(existing) => existing.merge(child),
                None => {
                    self.children.push(child);
                    appended += 1;
                }
            }
        }

        appended
    }

    /// Merges another copy of this node: missing content is taken from
    /// `other`, and its children are merged by URL
    pub fn merge(&mut self, other: TreeNode) {
        if self.content.is_none() {
            self.content = other.content;
        }
        self.merge_children(other.children);
    }

    /// Finds the first node with this URL, depth-first
    pub fn find(&self, url: &str) -> Option<&TreeNode> {
        if self.url == url {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(url))
    }

    /// Follows child indices from this node
    pub fn node_at(&self, path: &[usize]) -> Option<&TreeNode> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Follows child indices from this node, mutably
    pub fn node_at_mut(&mut self, path: &[usize]) -> Option<&mut TreeNode> {
        let mut node = self;
        for &index in path {
            node = node.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Visits every node depth-first, pre-order, with its depth
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a TreeNode, usize)) {
        self.walk_at(0, visit);
    }

    fn walk_at<'a>(&'a self, depth: usize, visit: &mut impl FnMut(&'a TreeNode, usize)) {
        visit(self, depth);
        for child in &self.children {
            child.walk_at(depth + 1, visit);
        }
    }

    /// Total number of nodes in this subtree
    pub fn count(&self) -> usize {
        let mut total = 0;
        self.walk(&mut |_, _| total += 1);
        total
    }

    /// Returns true if no URL repeats along any root-to-node chain
    pub fn is_acyclic(&self) -> bool {
        fn check<'a>(node: &'a TreeNode, ancestors: &mut HashSet<&'a str>) -> bool {
            if !ancestors.insert(node.url.as_str()) {
                return false;
            }
            let ok = node.children.iter().all(|c| check(c, ancestors));
            ancestors.remove(node.url.as_str());
            ok
        }

        check(self, &mut HashSet::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str, url: &str, text: &str) -> TreeNode {
        let mut node = TreeNode::new(name, url);
        node.content = Some(NodeContent {
            title: Some(name.to_string()),
            sections: vec![ContentSection {
                name: "content".to_string(),
                text: text.to_string(),
            }],
        });
        node
    }

    #[test]
    fn test_kind_is_derived_from_content() {
        let mut node = TreeNode::new("Phone", "https://example.com/Phone");
        assert_eq!(node.kind(), NodeKind::Category);
        assert!(!node.is_mixed());

        node.content = Some(NodeContent::default());
        assert_eq!(node.kind(), NodeKind::Leaf);

        node.children.push(TreeNode::new("Case", "https://example.com/Case"));
        assert!(node.is_mixed());
    }

    #[test]
    fn test_merge_children_appends_new_and_skips_existing() {
        let mut node = TreeNode::new("Root", "u:root");
        node.children.push(TreeNode::new("A", "u:a"));

        let appended = node.merge_children(vec![
            TreeNode::new("A again", "u:a"),
            TreeNode::new("B", "u:b"),
        ]);

        assert_eq!(appended, 1);
        assert_eq!(node.children.len(), 2);
        assert_eq!(node.children[0].name, "A");
        assert_eq!(node.children[1].url, "u:b");
    }

    #[test]
    fn test_merge_children_fills_content_and_grandchildren() {
        let mut node = TreeNode::new("Root", "u:root");
        node.children.push(TreeNode::new("A", "u:a"));

        let mut stored = leaf("A", "u:a", "Stored text.");
        stored.children.push(TreeNode::new("A1", "u:a1"));
        node.merge_children(vec![stored]);

        let a = &node.children[0];
        assert!(a.is_leaf());
        assert_eq!(a.children.len(), 1);
    }

    #[test]
    fn test_find_and_node_at() {
        let mut root = TreeNode::new("Root", "u:root");
        let mut a = TreeNode::new("A", "u:a");
        a.children.push(TreeNode::new("A1", "u:a1"));
        root.children.push(a);
        root.children.push(TreeNode::new("B", "u:b"));

        assert_eq!(root.find("u:a1").map(|n| n.name.as_str()), Some("A1"));
        assert!(root.find("u:missing").is_none());
        assert_eq!(root.node_at(&[0, 0]).map(|n| n.url.as_str()), Some("u:a1"));
        assert_eq!(root.node_at(&[]).map(|n| n.url.as_str()), Some("u:root"));
        assert!(root.node_at(&[2]).is_none());

        root.node_at_mut(&[1]).unwrap().name = "Bee".to_string();
        assert_eq!(root.children[1].name, "Bee");
        assert_eq!(root.count(), 4);
    }

    #[test]
    fn test_is_acyclic() {
        let mut root = TreeNode::new("Root", "u:root");
        let mut a = TreeNode::new("A", "u:a");
        a.children.push(TreeNode::new("B", "u:b"));
        root.children.push(a);
        // Same URL on sibling branches is fine
        root.children.push(TreeNode::new("B", "u:b"));
        assert!(root.is_acyclic());

        root.children[0].children[0]
            .children
            .push(TreeNode::new("Root", "u:root"));
        assert!(!root.is_acyclic());
    }

    #[test]
    fn test_serialized_shape() {
        let mut root = TreeNode::new("Root", "u:root");
        root.children.push(leaf("A", "u:a", "Text."));

        let json = serde_json::to_value(&root).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["children"][0]["content"]["sections"][0]["text"], "Text.");

        let back: TreeNode = serde_json::from_value(json).unwrap();
        assert_eq!(back, root);
    }
}
