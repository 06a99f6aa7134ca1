//! Window hierarchy dump in the platform's XML layout.

use std::fmt::Write as _;

use uiauto_core_types::{NodeFlag, Orientation};

use super::tree::{NodeData, Tree};

pub(crate) fn dump_xml(tree: &Tree, compressed: bool, orientation: Orientation) -> String {
    let rotation = match orientation {
        Orientation::Portrait => 0,
        Orientation::Landscape => 1,
    };
    let mut out = String::from("<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>");
    let _ = write!(out, "<hierarchy rotation=\"{rotation}\">");
    write_node(tree, tree.root(), compressed, true, &mut out);
    out.push_str("</hierarchy>");
    out
}

fn write_node(tree: &Tree, id: u64, compressed: bool, is_root: bool, out: &mut String) {
    let Some(node) = tree.get(id) else { return };
    if node.props.hidden {
        return;
    }
    let emit = !compressed || is_root || is_important(node);
    if emit {
        let bounds = node.bounds();
        let _ = write!(
            out,
            "<node index=\"{}\" text=\"{}\" resource-id=\"{}\" class=\"{}\" package=\"{}\" content-desc=\"{}\"",
            tree.sibling_index(id),
            escape(&node.props.text),
            escape(&node.props.resource_id),
            escape(&node.props.class_name),
            escape(&node.package),
            escape(&node.props.description),
        );
        for flag in NodeFlag::ALL {
            let name = match flag {
                NodeFlag::LongClickable => "long-clickable",
                other => other.name(),
            };
            let _ = write!(out, " {}=\"{}\"", name, node.flag(flag));
        }
        let _ = write!(
            out,
            " bounds=\"[{},{}][{},{}]\">",
            bounds.left, bounds.top, bounds.right, bounds.bottom
        );
    }
    for child in &node.children {
        write_node(tree, *child, compressed, false, out);
    }
    if emit {
        out.push_str("</node>");
    }
}

/// Nodes a compressed dump keeps: anything carrying content or an action.
fn is_important(node: &NodeData) -> bool {
    !node.props.text.is_empty()
        || !node.props.description.is_empty()
        || !node.props.resource_id.is_empty()
        || node.flag(NodeFlag::Clickable)
        || node.flag(NodeFlag::LongClickable)
        || node.flag(NodeFlag::Scrollable)
        || node.flag(NodeFlag::Checkable)
        || node.flag(NodeFlag::Focusable)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
