//! DOM Serializer - Convert subtrees back to markup
//!
//! Output mirrors what `innerHTML`/`outerHTML` produce: attributes in
//! insertion order, escaped text, no end tags for void elements, and raw
//! text elements written verbatim.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::*;
use crate::utils::{escape_attribute, escape_text};

/// Serialize the children of a node (`innerHTML`)
pub fn inner_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::new();
    let node = arena.get(node_id)?;
    let raw = RAW_TEXT_ELEMENTS.contains(&node.node_name.as_str());
    for &child_id in &node.children_ids {
        serialize_node(arena, child_id, raw, &mut output)?;
    }
    Ok(output)
}

/// Serialize a node including itself (`outerHTML`)
pub fn outer_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::new();
    serialize_node(arena, node_id, false, &mut output)?;
    Ok(output)
}

fn serialize_node(
    arena: &DomArena,
    node_id: NodeId,
    raw_text: bool,
    output: &mut String,
) -> Result<()> {
    let node = arena.get(node_id)?;

    match node.node_type {
        NodeType::Element => {
            output.push('<');
            output.push_str(&node.node_name);
            for (name, value) in &node.attributes {
                output.push(' ');
                output.push_str(name);
                output.push_str("=\"");
                output.push_str(&escape_attribute(value));
                output.push('"');
            }
            output.push('>');

            if is_void_element(&node.node_name) {
                return Ok(());
            }

            let raw = RAW_TEXT_ELEMENTS.contains(&node.node_name.as_str());
            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, raw, output)?;
            }

            output.push_str("</");
            output.push_str(&node.node_name);
            output.push('>');
        }
        NodeType::Text if raw_text => output.push_str(&node.node_value),
        NodeType::Text => output.push_str(&escape_text(&node.node_value)),
        NodeType::Comment => {
            output.push_str("<!--");
            output.push_str(&node.node_value);
            output.push_str("-->");
        }
        NodeType::Document | NodeType::DocumentFragment => {
            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, false, output)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::parse_into;

    #[test]
    fn test_markup_roundtrip() {
        let markup = "<p class=\"a\" title=\"x &quot;y&quot;\">1 &lt; 2<br></p><!--c--><style>a>b{}</style>";
        let mut arena = DomArena::new();
        let root = arena.alloc(|id| DomNode::element(id, "div"));
        parse_into(&mut arena, root, markup).unwrap();

        assert_eq!(inner_html(&arena, root).unwrap(), markup);
        assert_eq!(
            outer_html(&arena, root).unwrap(),
            format!("<div>{}</div>", markup)
        );
    }
}
