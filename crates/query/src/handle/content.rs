//! Style, attribute, text, markup and class access on the current element

use smallvec::SmallVec;

use super::Handle;
use crate::error::{QueryError, Result};

/// `backgroundColor` → `background-color`; kebab-case input passes through
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.trim().chars() {
        if c.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split class arguments into individual tokens
///
/// Every name may carry several whitespace-separated tokens; a name with
/// none is rejected.
pub(crate) fn class_tokens<I, S>(operation: &'static str, names: I) -> Result<SmallVec<[String; 4]>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tokens = SmallVec::new();
    for name in names {
        let name = name.as_ref();
        let before = tokens.len();
        tokens.extend(name.split_whitespace().map(String::from));
        if tokens.len() == before {
            return Err(QueryError::unsupported(
                operation,
                format!("class name {:?} is empty", name),
            ));
        }
    }
    Ok(tokens)
}

/// Kebab-cased property and value, checked so one write sets one declaration
fn style_declaration(property: &str, value: &str) -> Result<(String, String)> {
    let property = to_kebab_case(property);
    if property.is_empty() || property.contains(|c: char| c == ':' || c == ';' || c.is_whitespace())
    {
        return Err(QueryError::unsupported(
            "css",
            format!("invalid property name {:?}", property),
        ));
    }
    if value.contains(';') {
        return Err(QueryError::unsupported(
            "css",
            format!("value {:?} for {} would end the declaration", value, property),
        ));
    }
    Ok((property, value.to_string()))
}

impl Handle {
    /// Computed value of a style property
    pub fn css(&self, property: &str) -> Result<Option<String>> {
        let node = self.target("css")?;
        let value = self.doc().computed_style(node, &to_kebab_case(property))?;
        Ok(value)
    }

    /// Inline style declarations as written (`style` attribute)
    pub fn css_text(&self) -> Result<String> {
        let node = self.target("css")?;
        let value = self.doc().attribute(node, "style")?;
        Ok(value.unwrap_or_default())
    }

    pub fn set_css(&self, property: &str, value: &str) -> Result<&Self> {
        let node = self.target("css")?;
        let (property, value) = style_declaration(property, value)?;
        self.doc_mut().set_style(node, &property, &value)?;
        Ok(self)
    }

    /// Apply each pair as an independent style write
    ///
    /// Every pair is checked before the first one is written.
    pub fn set_styles<I, K, V>(&self, declarations: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let node = self.target("css")?;
        let declarations = declarations
            .into_iter()
            .map(|(property, value)| style_declaration(property.as_ref(), value.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let mut doc = self.doc_mut();
        for (property, value) in &declarations {
            doc.set_style(node, property, value)?;
        }
        Ok(self)
    }

    pub fn attr(&self, name: &str) -> Result<Option<String>> {
        let node = self.target("attr")?;
        let value = self.doc().attribute(node, name)?;
        Ok(value)
    }

    pub fn set_attr(&self, name: &str, value: &str) -> Result<&Self> {
        let node = self.target("attr")?;
        self.doc_mut().set_attribute(node, name, value)?;
        Ok(self)
    }

    /// Apply each pair as an independent attribute write; camel-case keys
    /// are written kebab-case
    pub fn set_attrs<I, K, V>(&self, attributes: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let node = self.target("attr")?;
        let mut doc = self.doc_mut();
        for (name, value) in attributes {
            doc.set_attribute(node, &to_kebab_case(name.as_ref()), value.as_ref())?;
        }
        Ok(self)
    }

    pub fn remove_attr(&self, name: &str) -> Result<&Self> {
        let node = self.target("removeAttr")?;
        self.doc_mut().remove_attribute(node, name)?;
        Ok(self)
    }

    pub fn text(&self) -> Result<String> {
        let node = self.target("text")?;
        let text = self.doc().text_content(node)?;
        Ok(text)
    }

    pub fn set_text(&self, text: &str) -> Result<&Self> {
        let node = self.target("text")?;
        self.doc_mut().set_text_content(node, text)?;
        Ok(self)
    }

    pub fn html(&self) -> Result<String> {
        let node = self.target("html")?;
        let markup = self.doc().inner_html(node)?;
        Ok(markup)
    }

    pub fn set_html(&self, markup: &str) -> Result<&Self> {
        let node = self.target("html")?;
        self.doc_mut().set_inner_html(node, markup)?;
        Ok(self)
    }

    /// The raw `class` attribute, empty when absent
    pub fn class_name(&self) -> Result<String> {
        let node = self.target("className")?;
        let value = self.doc().attribute(node, "class")?;
        Ok(value.unwrap_or_default())
    }

    pub fn set_class_name(&self, class_name: &str) -> Result<&Self> {
        let node = self.target("className")?;
        self.doc_mut().set_attribute(node, "class", class_name)?;
        Ok(self)
    }

    /// Add every class; the result is a set, so order and repeats don't matter
    pub fn add_class<I, S>(&self, names: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let node = self.target("addClass")?;
        let tokens = class_tokens("addClass", names)?;
        let mut doc = self.doc_mut();
        for token in &tokens {
            doc.add_class(node, token)?;
        }
        Ok(self)
    }

    pub fn del_class<I, S>(&self, names: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let node = self.target("delClass")?;
        let tokens = class_tokens("delClass", names)?;
        let mut doc = self.doc_mut();
        for token in &tokens {
            doc.remove_class(node, token)?;
        }
        Ok(self)
    }

    pub fn toggle_class<I, S>(&self, names: I) -> Result<&Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let node = self.target("toggleClass")?;
        let tokens = class_tokens("toggleClass", names)?;
        let mut doc = self.doc_mut();
        for token in &tokens {
            doc.toggle_class(node, token)?;
        }
        Ok(self)
    }

    pub fn has_class(&self, name: &str) -> Result<bool> {
        let node = self.target("hasClass")?;
        let tokens = class_tokens("hasClass", [name])?;
        let doc = self.doc();
        for token in &tokens {
            if !doc.has_class(node, token)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn show(&self) -> Result<&Self> {
        self.set_css("display", "")
    }

    pub fn hide(&self) -> Result<&Self> {
        self.set_css("display", "none")
    }
}
