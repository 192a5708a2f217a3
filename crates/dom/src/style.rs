//! Inline style declarations and computed-style lookup

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{NodeId, BLOCK_ELEMENTS};

/// Properties whose value flows from parent to child when not set
pub const INHERITED_PROPERTIES: &[&str] = &[
    "color",
    "cursor",
    "direction",
    "font",
    "font-family",
    "font-size",
    "font-style",
    "font-variant",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style",
    "text-align",
    "text-indent",
    "text-transform",
    "visibility",
    "white-space",
    "word-spacing",
];

/// Parse `name: value; ...` into ordered declarations
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                None
            } else {
                Some((name, value.to_string()))
            }
        })
        .collect()
}

pub fn serialize_declarations(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(name, value)| format!("{}: {};", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Upsert a declaration; an empty value removes it
pub fn set_declaration(style: &str, property: &str, value: &str) -> String {
    let property = property.trim().to_ascii_lowercase();
    let value = value.trim();
    let mut decls = parse_declarations(style);
    match decls.iter().position(|(name, _)| *name == property) {
        Some(pos) if value.is_empty() => {
            decls.remove(pos);
        }
        Some(pos) => decls[pos].1 = value.to_string(),
        None if value.is_empty() => {}
        None => decls.push((property, value.to_string())),
    }
    serialize_declarations(&decls)
}

pub fn declared_value(arena: &DomArena, node_id: NodeId, property: &str) -> Result<Option<String>> {
    let node = arena.get(node_id)?;
    Ok(node.attr("style").and_then(|style| {
        parse_declarations(style)
            .into_iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value)
    }))
}

/// Resolve a property the way `getComputedStyle` would for this tree:
/// the inline declaration, then inheritance, then the tag's display default.
pub fn computed_value(
    arena: &DomArena,
    node_id: NodeId,
    property: &str,
    default_display: Option<&str>,
) -> Result<Option<String>> {
    let property = property.trim().to_ascii_lowercase();

    if let Some(value) = declared_value(arena, node_id, &property)? {
        return Ok(Some(value));
    }

    if INHERITED_PROPERTIES.contains(&property.as_str()) {
        let mut cursor = arena.parent(node_id)?;
        while let Some(ancestor) = cursor {
            if arena.get(ancestor)?.is_element() {
                if let Some(value) = declared_value(arena, ancestor, &property)? {
                    return Ok(Some(value));
                }
            }
            cursor = arena.parent(ancestor)?;
        }
        return Ok(None);
    }

    if property == "display" {
        let node = arena.get(node_id)?;
        if let Some(tag) = node.tag_name() {
            if let Some(default) = default_display {
                return Ok(Some(default.to_string()));
            }
            let display = if BLOCK_ELEMENTS.contains(&tag) {
                "block"
            } else {
                "inline"
            };
            return Ok(Some(display.to_string()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DomNode;

    #[test]
    fn test_set_declaration() {
        let style = set_declaration("", "Color", "red");
        assert_eq!(style, "color: red;");

        let style = set_declaration(&style, "margin-top", "4px");
        assert_eq!(style, "color: red; margin-top: 4px;");

        let style = set_declaration(&style, "color", "blue");
        assert_eq!(style, "color: blue; margin-top: 4px;");

        let style = set_declaration(&style, "color", "");
        assert_eq!(style, "margin-top: 4px;");
    }

    #[test]
    fn test_parse_skips_garbage() {
        let decls = parse_declarations(" color : red ;; bogus; width:");
        assert_eq!(decls, vec![("color".to_string(), "red".to_string())]);
    }

    #[test]
    fn test_computed_value_inherits() {
        let mut arena = DomArena::new();
        let div = arena.alloc(|id| {
            let mut node = DomNode::element(id, "div");
            node.set_attr("style", "color: green; width: 10px");
            node
        });
        let span = arena.alloc(|id| DomNode::element(id, "span"));
        arena.append_child(div, span).unwrap();

        assert_eq!(
            computed_value(&arena, span, "color", None).unwrap(),
            Some("green".to_string())
        );
        assert_eq!(computed_value(&arena, span, "width", None).unwrap(), None);
        assert_eq!(
            computed_value(&arena, span, "display", None).unwrap(),
            Some("inline".to_string())
        );
        assert_eq!(
            computed_value(&arena, div, "display", None).unwrap(),
            Some("block".to_string())
        );
    }
}
