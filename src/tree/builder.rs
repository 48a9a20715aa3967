//! Tree Builder: materializes a breadcrumb trail as a chain of nodes

use crate::tree::{Crumb, TreeNode};

/// Builds a strict chain of nodes from a root-to-target trail
///
/// The returned root's descendants form a single chain matching `path`;
/// the final node is the attachment point for further expansion (see
/// [`attachment_path`]). Returns `None` for an empty trail.
///
/// # Examples
///
/// ```
/// use canopy::tree::{attachment_path, build_chain, Crumb};
///
/// let root = build_chain(&[
///     Crumb::new("Root", "https://example.com/Device"),
///     Crumb::new("Phone", "https://example.com/Device/Phone"),
/// ])
/// .unwrap();
///
/// let path = attachment_path(&root);
/// assert_eq!(root.node_at(&path).unwrap().name, "Phone");
/// ```
pub fn build_chain(path: &[Crumb]) -> Option<TreeNode> {
    path.iter().rev().fold(None, |below, crumb| {
        let mut node = TreeNode::new(crumb.name.clone(), crumb.url.clone());
        node.children.extend(below);
        Some(node)
    })
}

/// Returns the child-index path from the root of a chain to its final node
pub fn attachment_path(chain: &TreeNode) -> Vec<usize> {
    let mut path = Vec::new();
    let mut node = chain;
    while let Some(child) = node.children.first() {
        path.push(0);
        node = child;
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail() -> Vec<Crumb> {
        vec![
            Crumb::new("Root", "u:root"),
            Crumb::new("Cat1", "u:cat1"),
            Crumb::new("Cat2", "u:cat2"),
            Crumb::new("Target", "u:target"),
        ]
    }

    #[test]
    fn test_empty_trail_builds_nothing() {
        assert!(build_chain(&[]).is_none());
    }

    #[test]
    fn test_single_crumb_is_its_own_attachment_point() {
        let root = build_chain(&[Crumb::new("Root", "u:root")]).unwrap();
        assert!(root.children.is_empty());
        assert!(attachment_path(&root).is_empty());
    }

    #[test]
    fn test_chain_matches_trail() {
        let root = build_chain(&trail()).unwrap();

        let mut seen = Vec::new();
        root.walk(&mut |node, depth| {
            assert!(node.children.len() <= 1);
            seen.push((depth, node.url.clone()));
        });

        assert_eq!(
            seen,
            vec![
                (0, "u:root".to_string()),
                (1, "u:cat1".to_string()),
                (2, "u:cat2".to_string()),
                (3, "u:target".to_string()),
            ]
        );
    }

    #[test]
    fn test_attachment_path_reaches_target() {
        let root = build_chain(&trail()).unwrap();
        let path = attachment_path(&root);

        assert_eq!(path, vec![0, 0, 0]);
        let target = root.node_at(&path).unwrap();
        assert_eq!(target.name, "Target");
        assert!(target.content.is_none());
    }
}
