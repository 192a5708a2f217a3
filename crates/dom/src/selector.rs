//! Minimal CSS selector engine
//!
//! Grammar covered:
//!
//! ```text
//! list      := complex ("," complex)*
//! complex   := compound ((" " | ">") compound)*
//! compound  := ("*" | tag)? ("#" id | "." class | "[" attr ("=" value)? "]")*
//! ```
//!
//! Matching runs right to left with backtracking over ancestors.

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::NodeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrSelector {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Part {
    /// How this part relates to the part before it; `None` for the first
    combinator: Option<Combinator>,
    compound: Compound,
}

/// A parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    groups: Vec<Vec<Part>>,
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self> {
        Parser::new(selector).parse_list()
    }

    /// Does `node_id` match any group of the list
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> bool {
        self.groups
            .iter()
            .any(|parts| matches_chain(arena, node_id, parts))
    }

    /// Matching element descendants of `scope`, in document order
    pub fn select(&self, arena: &DomArena, scope: NodeId) -> Result<Vec<NodeId>> {
        Ok(arena
            .descendant_elements(scope)?
            .into_iter()
            .filter(|&id| self.matches(arena, id))
            .collect())
    }
}

fn matches_chain(arena: &DomArena, node_id: NodeId, parts: &[Part]) -> bool {
    let Some((last, rest)) = parts.split_last() else {
        return false;
    };
    if !matches_compound(arena, node_id, &last.compound) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }

    let parent = |id| arena.parent(id).ok().flatten();
    match last.combinator.unwrap_or(Combinator::Descendant) {
        Combinator::Child => parent(node_id).is_some_and(|p| matches_chain(arena, p, rest)),
        Combinator::Descendant => {
            let mut cursor = parent(node_id);
            while let Some(ancestor) = cursor {
                if matches_chain(arena, ancestor, rest) {
                    return true;
                }
                cursor = parent(ancestor);
            }
            false
        }
    }
}

fn matches_compound(arena: &DomArena, node_id: NodeId, compound: &Compound) -> bool {
    let Ok(node) = arena.get(node_id) else {
        return false;
    };
    if !node.is_element() {
        return false;
    }
    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if node.attr("id") != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.is_empty() {
        let tokens = node.class_tokens();
        if !compound
            .classes
            .iter()
            .all(|class| tokens.contains(&class.as_str()))
        {
            return false;
        }
    }
    compound.attrs.iter().all(|attr| match attr {
        AttrSelector::Exists(name) => node.attr(name).is_some(),
        AttrSelector::Equals(name, value) => node.attr(name) == Some(value.as_str()),
    })
}

struct Parser<'a> {
    input: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::selector(self.input, reason)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Returns true if any whitespace was consumed
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn parse_list(mut self) -> Result<SelectorList> {
        let mut groups = Vec::new();
        loop {
            self.skip_ws();
            groups.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList { groups })
    }

    fn parse_complex(&mut self) -> Result<Vec<Part>> {
        let mut parts = vec![Part {
            combinator: None,
            compound: self.parse_compound()?,
        }];
        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            parts.push(Part {
                combinator: Some(combinator),
                compound: self.parse_compound()?,
            });
        }
        Ok(parts)
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut seen_any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                seen_any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.ident()?.to_ascii_lowercase());
                seen_any = true;
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                _ => break,
            }
            seen_any = true;
        }

        if !seen_any {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected selector, found '{}'", c)),
                None => self.error("expected selector, found end of input"),
            });
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrSelector> {
        self.skip_ws();
        let name = self.ident()?.to_ascii_lowercase();
        self.skip_ws();
        let attr = match self.bump() {
            Some(']') => return Ok(AttrSelector::Exists(name)),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let mut value = String::new();
                        loop {
                            match self.bump() {
                                Some(c) if c == quote => break,
                                Some(c) => value.push(c),
                                None => return Err(self.error("unterminated string")),
                            }
                        }
                        value
                    }
                    _ => self.ident()?,
                };
                AttrSelector::Equals(name, value)
            }
            _ => return Err(self.error("malformed attribute selector")),
        };
        self.skip_ws();
        match self.bump() {
            Some(']') => Ok(attr),
            _ => Err(self.error("expected ']'")),
        }
    }

    fn ident(&mut self) -> Result<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}
