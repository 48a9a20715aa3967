//! Markdown outline generation
//!
//! One heading per node, nested by depth, with each leaf's consolidated
//! sections underneath.

use crate::output::OutputResult;
use crate::state::write_atomic;
use crate::tree::TreeNode;
use std::path::Path;

/// Markdown has no heading level past six
const MAX_HEADING_LEVEL: usize = 6;

/// Writes the Markdown outline of `tree` to `output_path`
pub fn write_markdown_outline(tree: &TreeNode, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_outline(tree);
    write_atomic(output_path, markdown.as_bytes())?;
    Ok(())
}

/// Formats a tree as a Markdown outline
pub fn format_markdown_outline(tree: &TreeNode) -> String {
    let mut md = String::new();

    tree.walk(&mut |node, depth| {
        let level = (depth + 1).min(MAX_HEADING_LEVEL);
        md.push_str(&format!(
            "{} [{}]({})\n\n",
            "#".repeat(level),
            node.name,
            node.url
        ));

        let Some(content) = &node.content else {
            return;
        };

        if let Some(title) = content.title.as_deref().filter(|t| *t != node.name) {
            md.push_str(&format!("_{}_\n\n", title));
        }

        if content.is_empty() {
            md.push_str("_No content extracted._\n\n");
            return;
        }

        let named = content.sections.len() > 1;
        for section in content.sections.iter().filter(|s| !s.text.is_empty()) {
            if named {
                md.push_str(&format!("**{}**\n\n", section.name));
            }
            md.push_str(&section.text);
            md.push_str("\n\n");
        }
    });

    md
}
