//! Markup fragment parser used by `set_inner_html`
//!
//! Forgiving by construction: unclosed elements close at end of input,
//! stray end tags are ignored, and `<!...>`/`<?...>` constructs are skipped.
//! Raw-text elements (`script`, `style`) keep their content verbatim.

use crate::arena::DomArena;
use crate::error::Result;
use crate::types::{is_void_element, DomNode, NodeId, RAW_TEXT_ELEMENTS};
use crate::utils::decode_entities;

/// Parse `markup` and append the resulting nodes under `parent`
///
/// Returns the IDs of the top-level nodes created.
pub fn parse_into(arena: &mut DomArena, parent: NodeId, markup: &str) -> Result<Vec<NodeId>> {
    let bytes = markup.as_bytes();
    let mut idx = 0_usize;
    let mut open: Vec<NodeId> = vec![parent];
    let mut top_level = Vec::new();

    while idx < bytes.len() {
        if bytes[idx] != b'<' {
            let next = find_byte(bytes, idx, b'<').unwrap_or(bytes.len());
            let text = decode_entities(&markup[idx..next]);
            append(arena, &open, &mut top_level, |id| DomNode::text(id, text))?;
            idx = next;
            continue;
        }

        if starts_with(bytes, idx, b"<!--") {
            let body_start = idx + 4;
            let (body_end, after) = match find_seq(bytes, body_start, b"-->") {
                Some(end) => (end, end + 3),
                None => (bytes.len(), bytes.len()),
            };
            let body = markup[body_start..body_end].to_string();
            append(arena, &open, &mut top_level, |id| DomNode::comment(id, body))?;
            idx = after;
            continue;
        }

        if starts_with(bytes, idx, b"<!") || starts_with(bytes, idx, b"<?") {
            idx = find_byte(bytes, idx, b'>').map_or(bytes.len(), |gt| gt + 1);
            continue;
        }

        let Some((tag, next_idx)) = parse_tag(markup, idx) else {
            // A lone '<' is text
            let next = find_byte(bytes, idx + 1, b'<').unwrap_or(bytes.len());
            let text = decode_entities(&markup[idx..next]);
            append(arena, &open, &mut top_level, |id| DomNode::text(id, text))?;
            idx = next;
            continue;
        };
        idx = next_idx;

        if tag.is_end {
            // Pop up to the matching open element; never past the fragment parent
            if let Some(pos) = open
                .iter()
                .skip(1)
                .rposition(|&id| arena.get(id).is_ok_and(|n| n.node_name == tag.name))
            {
                open.truncate(pos + 1);
            }
            continue;
        }

        let attributes = tag.attributes;
        let name = tag.name;
        let element = append(arena, &open, &mut top_level, |id| {
            let mut node = DomNode::element(id, &name);
            for (key, value) in attributes {
                if node.attr(&key).is_none() {
                    node.set_attr(&key, value);
                }
            }
            node
        })?;

        if tag.self_closing || is_void_element(&name) {
            continue;
        }

        if RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            let (raw, after) = read_raw_text_until_end_tag(markup, idx, &name);
            if !raw.is_empty() {
                let raw = raw.to_string();
                let text = arena.alloc(|id| DomNode::text(id, raw));
                arena.append_child(element, text)?;
            }
            idx = after;
            continue;
        }

        open.push(element);
    }

    Ok(top_level)
}

fn append(
    arena: &mut DomArena,
    open: &[NodeId],
    top_level: &mut Vec<NodeId>,
    build: impl FnOnce(NodeId) -> DomNode,
) -> Result<NodeId> {
    let id = arena.alloc(build);
    let parent = open[open.len() - 1];
    arena.append_child(parent, id)?;
    if open.len() == 1 {
        top_level.push(id);
    }
    Ok(id)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ParsedTag {
    name: String,
    is_end: bool,
    self_closing: bool,
    attributes: Vec<(String, String)>,
}

fn parse_tag(markup: &str, start: usize) -> Option<(ParsedTag, usize)> {
    let bytes = markup.as_bytes();
    let mut idx = start + 1;
    let mut is_end = false;
    if bytes.get(idx).copied() == Some(b'/') {
        is_end = true;
        idx += 1;
    }

    let name_start = idx;
    while idx < bytes.len() && is_tag_name_char(bytes[idx]) {
        idx += 1;
    }
    if idx == name_start || !bytes[name_start].is_ascii_alphabetic() {
        return None;
    }
    let name = markup[name_start..idx].to_ascii_lowercase();

    let mut attributes = Vec::new();
    let mut self_closing = false;
    loop {
        idx = skip_spaces(bytes, idx);
        match bytes.get(idx).copied() {
            None => return None,
            Some(b'>') => {
                idx += 1;
                break;
            }
            Some(b'/') => {
                if bytes.get(idx + 1).copied() == Some(b'>') {
                    self_closing = true;
                    idx += 2;
                    break;
                }
                idx += 1;
            }
            Some(_) => {
                let attr_start = idx;
                while idx < bytes.len()
                    && !bytes[idx].is_ascii_whitespace()
                    && !matches!(bytes[idx], b'=' | b'>' | b'/')
                {
                    idx += 1;
                }
                let key = markup[attr_start..idx].to_ascii_lowercase();
                idx = skip_spaces(bytes, idx);

                let mut value = String::new();
                if bytes.get(idx).copied() == Some(b'=') {
                    idx = skip_spaces(bytes, idx + 1);
                    match bytes.get(idx).copied() {
                        Some(quote @ (b'"' | b'\'')) => {
                            let close = find_byte(bytes, idx + 1, quote)?;
                            value = decode_entities(&markup[idx + 1..close]);
                            idx = close + 1;
                        }
                        _ => {
                            let value_start = idx;
                            while idx < bytes.len()
                                && !bytes[idx].is_ascii_whitespace()
                                && bytes[idx] != b'>'
                            {
                                idx += 1;
                            }
                            value = decode_entities(&markup[value_start..idx]);
                        }
                    }
                }
                if !key.is_empty() {
                    attributes.push((key, value));
                }
            }
        }
    }

    Some((
        ParsedTag {
            name,
            is_end,
            self_closing,
            attributes,
        },
        idx,
    ))
}

fn read_raw_text_until_end_tag<'a>(
    input: &'a str,
    start: usize,
    tag_name: &str,
) -> (&'a str, usize) {
    let bytes = input.as_bytes();
    let tag_bytes = tag_name.as_bytes();
    let mut idx = start;

    while idx < bytes.len() {
        if bytes[idx] == b'<'
            && bytes.get(idx + 1).copied() == Some(b'/')
            && starts_with_ignore_ascii_case(bytes, idx + 2, tag_bytes)
        {
            let after = find_byte(bytes, idx, b'>').map_or(bytes.len(), |gt| gt + 1);
            return (&input[start..idx], after);
        }
        idx += 1;
    }

    (&input[start..], bytes.len())
}

fn find_byte(bytes: &[u8], from: usize, needle: u8) -> Option<usize> {
    bytes
        .get(from..)?
        .iter()
        .position(|&b| b == needle)
        .map(|pos| from + pos)
}

fn find_seq(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

fn starts_with(bytes: &[u8], idx: usize, prefix: &[u8]) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(prefix))
}

fn starts_with_ignore_ascii_case(bytes: &[u8], idx: usize, prefix: &[u8]) -> bool {
    bytes
        .get(idx..idx + prefix.len())
        .is_some_and(|slice| slice.eq_ignore_ascii_case(prefix))
}

fn skip_spaces(bytes: &[u8], mut idx: usize) -> usize {
    while idx < bytes.len() && bytes[idx].is_ascii_whitespace() {
        idx += 1;
    }
    idx
}

fn is_tag_name_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' || byte == b':'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeType;

    fn parse(markup: &str) -> (DomArena, NodeId, Vec<NodeId>) {
        let mut arena = DomArena::new();
        let root = arena.alloc(|id| DomNode::element(id, "div"));
        let top = parse_into(&mut arena, root, markup).unwrap();
        (arena, root, top)
    }

    #[test]
    fn test_nested_elements_and_text() {
        let (arena, root, top) = parse("<p class=\"a b\" id=x>Hi <b>there</b></p>!");
        assert_eq!(top.len(), 2);

        let p = arena.get(top[0]).unwrap();
        assert_eq!(p.node_name, "p");
        assert_eq!(p.attr("class"), Some("a b"));
        assert_eq!(p.attr("id"), Some("x"));
        assert_eq!(p.children_ids.len(), 2);

        let bang = arena.get(top[1]).unwrap();
        assert_eq!(bang.node_type, NodeType::Text);
        assert_eq!(bang.node_value, "!");
        assert_eq!(arena.get(root).unwrap().children_ids.len(), 2);
    }

    #[test]
    fn test_void_and_self_closing() {
        let (arena, _, top) = parse("<br><input disabled/><span/>after");
        let names: Vec<_> = top
            .iter()
            .map(|&id| arena.get(id).unwrap().node_name.clone())
            .collect();
        assert_eq!(names, vec!["br", "input", "span", "#text"]);
        assert_eq!(arena.get(top[1]).unwrap().attr("disabled"), Some(""));
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let (arena, _, top) = parse("</i><ul><li>one<li>two</ul><em>x");
        let ul = arena.get(top[0]).unwrap();
        assert_eq!(ul.node_name, "ul");
        // Second <li> nests inside the first: no implied end tags here
        assert_eq!(ul.children_ids.len(), 1);
        let em = arena.get(top[1]).unwrap();
        assert_eq!(em.node_name, "em");
        assert_eq!(em.children_ids.len(), 1);
    }

    #[test]
    fn test_comments_raw_text_and_entities() {
        let (arena, _, top) =
            parse("<!-- note --><script>if (a < b) {}</script>&lt;ok&gt;<!doctype html>");
        assert_eq!(arena.get(top[0]).unwrap().node_type, NodeType::Comment);
        assert_eq!(arena.get(top[0]).unwrap().node_value, " note ");

        let script = arena.get(top[1]).unwrap();
        let raw = arena.get(script.children_ids[0]).unwrap();
        assert_eq!(raw.node_value, "if (a < b) {}");

        assert_eq!(arena.get(top[2]).unwrap().node_value, "<ok>");
        assert_eq!(top.len(), 3);
    }

    #[test]
    fn test_lone_angle_bracket_is_text() {
        let (arena, _, top) = parse("1 < 2");
        let text: String = top
            .iter()
            .map(|&id| arena.get(id).unwrap().node_value.clone())
            .collect();
        assert_eq!(text, "1 < 2");
    }
}
