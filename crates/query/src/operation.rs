//! Named operations
//!
//! The dispatcher and any other dynamic caller reach `Handle` through this
//! table. Each handler picks a typed method from the number and shape of
//! its arguments, never from the name alone:
//!
//! | arguments | mode |
//! |---|---|
//! | none | read the current value |
//! | one map | bulk write, one independent write per pair |
//! | one scalar | read the named value |
//! | two scalars | write `name = value` |

use std::fmt;
use std::str::FromStr;

use crate::arg::{Arg, Outcome};
use crate::error::{QueryError, Result};
use crate::handle::Handle;

/// Handler bound to an operation name
pub type Handler = fn(&Handle, &[Arg]) -> Result<Outcome>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Css,
    Attr,
    RemoveAttr,
    Text,
    Html,
    ClassName,
    AddClass,
    DelClass,
    ToggleClass,
    HasClass,
    Parent,
    Children,
    FirstChild,
    LastChild,
    Eq,
    PrevNode,
    NextNode,
    PrevNodeAll,
    NextNodeAll,
    AddFirstChild,
    AddLastChild,
    InsertChild,
    InsertElementBefore,
    InsertElementAfter,
    RemoveChild,
    Remove,
    Show,
    Hide,
    On,
    Off,
    Trigger,
    Size,
}

const TABLE: &[(Operation, &str, Handler)] = &[
    (Operation::Css, "css", css),
    (Operation::Attr, "attr", attr),
    (Operation::RemoveAttr, "removeAttr", remove_attr),
    (Operation::Text, "text", text),
    (Operation::Html, "html", html),
    (Operation::ClassName, "className", class_name),
    (Operation::AddClass, "addClass", add_class),
    (Operation::DelClass, "delClass", del_class),
    (Operation::ToggleClass, "toggleClass", toggle_class),
    (Operation::HasClass, "hasClass", has_class),
    (Operation::Parent, "parent", parent),
    (Operation::Children, "children", children),
    (Operation::FirstChild, "firstChild", first_child),
    (Operation::LastChild, "lastChild", last_child),
    (Operation::Eq, "eq", eq),
    (Operation::PrevNode, "prevNode", prev_node),
    (Operation::NextNode, "nextNode", next_node),
    (Operation::PrevNodeAll, "prevNodeAll", prev_node_all),
    (Operation::NextNodeAll, "nextNodeAll", next_node_all),
    (Operation::AddFirstChild, "addFirstChild", add_first_child),
    (Operation::AddLastChild, "addLastChild", add_last_child),
    (Operation::InsertChild, "insertChild", insert_child),
    (Operation::InsertElementBefore, "insertElementBefore", insert_element_before),
    (Operation::InsertElementAfter, "insertElementAfter", insert_element_after),
    (Operation::RemoveChild, "removeChild", remove_child),
    (Operation::Remove, "remove", remove),
    (Operation::Show, "show", show),
    (Operation::Hide, "hide", hide),
    (Operation::On, "on", on),
    (Operation::Off, "off", off),
    (Operation::Trigger, "trigger", trigger),
    (Operation::Size, "size", size),
];

impl Operation {
    fn entry(self) -> &'static (Operation, &'static str, Handler) {
        // The table lists variants in declaration order
        &TABLE[self as usize]
    }

    /// Name accepted by [`FromStr`]
    pub fn name(self) -> &'static str {
        self.entry().1
    }

    pub fn handler(self) -> Handler {
        self.entry().2
    }

    pub fn all() -> impl Iterator<Item = Operation> {
        TABLE.iter().map(|(op, _, _)| *op)
    }
}

impl FromStr for Operation {
    type Err = QueryError;

    fn from_str(name: &str) -> Result<Self> {
        TABLE
            .iter()
            .find(|(_, n, _)| *n == name)
            .map(|(op, _, _)| *op)
            .ok_or_else(|| QueryError::UnknownOperation(name.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Handle {
    /// Run a named operation against this handle
    pub fn invoke(&self, operation: Operation, args: &[Arg]) -> Result<Outcome> {
        (operation.handler())(self, args)
    }
}

fn shapes(args: &[Arg]) -> String {
    let kinds: Vec<_> = args.iter().map(Arg::kind).collect();
    format!("({})", kinds.join(", "))
}

fn bad_arity(operation: &'static str, args: &[Arg]) -> QueryError {
    QueryError::unsupported(operation, format!("no form accepts {}", shapes(args)))
}

fn scalar(operation: &'static str, value: &Arg) -> Result<String> {
    value.as_scalar().ok_or_else(|| {
        QueryError::unsupported(
            operation,
            format!("value must be a string or number, got {}", value.kind()),
        )
    })
}

fn index(operation: &'static str, value: &Arg) -> Result<isize> {
    value.as_index().ok_or_else(|| {
        QueryError::unsupported(
            operation,
            format!("index must be an integer, got {}", value.kind()),
        )
    })
}

/// Map pairs with every value checked as a scalar before anything is written
fn scalar_pairs(operation: &'static str, pairs: &[(String, Arg)]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|(key, value)| Ok((key.clone(), scalar(operation, value)?)))
        .collect()
}

/// Leaf strings of a possibly nested list of class names
fn class_names(operation: &'static str, args: &[Arg], out: &mut Vec<String>) -> Result<()> {
    for arg in args {
        match arg {
            Arg::Str(name) => out.push(name.clone()),
            Arg::List(items) => class_names(operation, items, out)?,
            other => {
                return Err(QueryError::unsupported(
                    operation,
                    format!("class names must be strings, got {}", other.kind()),
                ))
            }
        }
    }
    Ok(())
}

fn collect_class_names(operation: &'static str, args: &[Arg]) -> Result<Vec<String>> {
    let mut names = Vec::new();
    class_names(operation, args, &mut names)?;
    if names.is_empty() {
        return Err(QueryError::unsupported(operation, "no class names given"));
    }
    Ok(names)
}

fn chained(handle: &Handle) -> Outcome {
    Outcome::Handle(handle.clone())
}

fn css(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Value(Some(h.css_text()?))),
        [Arg::Map(pairs)] => h.set_styles(scalar_pairs("css", pairs)?).map(chained),
        [name @ (Arg::Str(_) | Arg::Number(_))] => {
            Ok(Outcome::Value(h.css(&scalar("css", name)?)?))
        }
        [name @ (Arg::Str(_) | Arg::Number(_)), value] => {
            h.set_css(&scalar("css", name)?, &scalar("css", value)?).map(chained)
        }
        _ => Err(bad_arity("css", args)),
    }
}

fn attr(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Map(pairs)] => h.set_attrs(scalar_pairs("attr", pairs)?).map(chained),
        [name @ (Arg::Str(_) | Arg::Number(_))] => {
            Ok(Outcome::Value(h.attr(&scalar("attr", name)?)?))
        }
        [name @ (Arg::Str(_) | Arg::Number(_)), value] => {
            h.set_attr(&scalar("attr", name)?, &scalar("attr", value)?).map(chained)
        }
        _ => Err(bad_arity("attr", args)),
    }
}

fn remove_attr(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Str(name)] => h.remove_attr(name).map(chained),
        _ => Err(bad_arity("removeAttr", args)),
    }
}

fn text(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Value(Some(h.text()?))),
        [value] => h.set_text(&scalar("text", value)?).map(chained),
        _ => Err(bad_arity("text", args)),
    }
}

fn html(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Value(Some(h.html()?))),
        [value] => h.set_html(&scalar("html", value)?).map(chained),
        _ => Err(bad_arity("html", args)),
    }
}

fn class_name(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Value(Some(h.class_name()?))),
        [Arg::Str(value)] => h.set_class_name(value).map(chained),
        _ => Err(bad_arity("className", args)),
    }
}

fn add_class(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    h.add_class(collect_class_names("addClass", args)?).map(chained)
}

fn del_class(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    h.del_class(collect_class_names("delClass", args)?).map(chained)
}

fn toggle_class(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    h.toggle_class(collect_class_names("toggleClass", args)?).map(chained)
}

fn has_class(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Str(name)] => Ok(Outcome::Bool(h.has_class(name)?)),
        _ => Err(bad_arity("hasClass", args)),
    }
}

fn parent(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    let parent = match args {
        [] => h.parent()?,
        [Arg::Str(selector)] => h.parent_matching(selector)?,
        [levels @ Arg::Number(_)] => {
            let levels = usize::try_from(index("parent", levels)?)
                .map_err(|_| QueryError::unsupported("parent", "levels must not be negative"))?;
            h.ancestor(levels)?
        }
        _ => return Err(bad_arity("parent", args)),
    };
    Ok(Outcome::Handle(parent))
}

fn children(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    let children = match args {
        [] => h.children()?,
        [Arg::Str(selector)] => h.children_matching(selector)?,
        [position @ Arg::Number(_)] => h.child(index("children", position)?)?,
        _ => return Err(bad_arity("children", args)),
    };
    Ok(Outcome::Handle(children))
}

fn first_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.first_child()?)),
        _ => Err(bad_arity("firstChild", args)),
    }
}

fn last_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.last_child()?)),
        _ => Err(bad_arity("lastChild", args)),
    }
}

fn eq(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [position] => Ok(Outcome::Handle(h.eq(index("eq", position)?)?)),
        _ => Err(bad_arity("eq", args)),
    }
}

fn prev_node(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.prev_node()?)),
        _ => Err(bad_arity("prevNode", args)),
    }
}

fn next_node(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.next_node()?)),
        _ => Err(bad_arity("nextNode", args)),
    }
}

fn prev_node_all(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.prev_node_all(None)?)),
        [Arg::Str(filter)] => Ok(Outcome::Handle(h.prev_node_all(Some(filter))?)),
        _ => Err(bad_arity("prevNodeAll", args)),
    }
}

fn next_node_all(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Handle(h.next_node_all(None)?)),
        [Arg::Str(filter)] => Ok(Outcome::Handle(h.next_node_all(Some(filter))?)),
        _ => Err(bad_arity("nextNodeAll", args)),
    }
}

fn add_first_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [content] => Ok(Outcome::Handle(h.add_first_child(content.clone())?)),
        _ => Err(bad_arity("addFirstChild", args)),
    }
}

fn add_last_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [content] => Ok(Outcome::Handle(h.add_last_child(content.clone())?)),
        _ => Err(bad_arity("addLastChild", args)),
    }
}

fn insert_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    let (position, content, before) = match args {
        [position, content] => (position, content, true),
        [position, content, Arg::Bool(before)] => (position, content, *before),
        _ => return Err(bad_arity("insertChild", args)),
    };
    let position = index("insertChild", position)?;
    Ok(Outcome::Handle(h.insert_child(position, content.clone(), before)?))
}

fn insert_element_before(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [content] => Ok(Outcome::Handle(h.insert_element_before(content.clone())?)),
        _ => Err(bad_arity("insertElementBefore", args)),
    }
}

fn insert_element_after(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [content] => Ok(Outcome::Handle(h.insert_element_after(content.clone())?)),
        _ => Err(bad_arity("insertElementAfter", args)),
    }
}

fn remove_child(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => h.remove_children().map(chained),
        [Arg::Str(selector)] => h.remove_matching(selector).map(chained),
        [position @ Arg::Number(_)] => h
            .remove_child_at(index("removeChild", position)?)
            .map(chained),
        _ => Err(bad_arity("removeChild", args)),
    }
}

fn remove(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => h.remove().map(chained),
        _ => Err(bad_arity("remove", args)),
    }
}

fn show(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => h.show().map(chained),
        _ => Err(bad_arity("show", args)),
    }
}

fn hide(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => h.hide().map(chained),
        _ => Err(bad_arity("hide", args)),
    }
}

fn on(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Str(event), Arg::Listener(listener)] => h.on(event, listener.clone()).map(chained),
        _ => Err(QueryError::InvalidEventSpec(format!(
            "expected (string, listener), got {}",
            shapes(args)
        ))),
    }
}

fn off(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Str(event)] => h.off(event, None).map(chained),
        [Arg::Str(event), Arg::Listener(listener)] => h.off(event, Some(listener)).map(chained),
        _ => Err(QueryError::InvalidEventSpec(format!(
            "expected (string[, listener]), got {}",
            shapes(args)
        ))),
    }
}

fn trigger(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [Arg::Str(event)] => h.trigger(event).map(chained),
        _ => Err(QueryError::InvalidEventSpec(format!(
            "expected (string), got {}",
            shapes(args)
        ))),
    }
}

fn size(h: &Handle, args: &[Arg]) -> Result<Outcome> {
    match args {
        [] => Ok(Outcome::Count(h.size())),
        _ => Err(bad_arity("size", args)),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use dom::Document;

    use super::*;
    use crate::args;
    use crate::testing::fixture;

    #[test]
    fn test_table_matches_declaration_order() {
        for (position, op) in Operation::all().enumerate() {
            assert_eq!(op as usize, position);
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
        assert_eq!(Operation::all().count(), 32);
        assert_eq!(Operation::InsertChild.to_string(), "insertChild");
    }

    #[test]
    fn test_unknown_name() {
        assert!(matches!(
            "doesNotExist".parse::<Operation>(),
            Err(QueryError::UnknownOperation(name)) if name == "doesNotExist"
        ));
        assert!("CSS".parse::<Operation>().is_err());
    }

    #[test]
    fn test_css_forms() {
        let (q, _) = fixture("<div></div>");
        let div = q.select("div").unwrap();

        let written = div
            .invoke(Operation::Css, &args![Arg::map([("color", "red"), ("fontSize", "12px")])])
            .unwrap();
        assert_eq!(written.into_handle().unwrap().items(), div.items());

        let color = div.invoke(Operation::Css, &args!["color"]).unwrap();
        assert_eq!(color.into_value().as_deref(), Some("red"));
        let size = div.invoke(Operation::Css, &args!["font-size"]).unwrap();
        assert_eq!(size.into_value().as_deref(), Some("12px"));

        div.invoke(Operation::Css, &args!["zIndex", 3]).unwrap();
        assert_eq!(div.css("z-index").unwrap().as_deref(), Some("3"));

        let all = div.invoke(Operation::Css, &[]).unwrap().into_value().unwrap();
        assert_eq!(all, "color: red; font-size: 12px; z-index: 3;");

        assert!(matches!(
            div.invoke(Operation::Css, &args!["color", true]),
            Err(QueryError::UnsupportedArgument { operation: "css", .. })
        ));
        // Nothing written when any value in the map is rejected
        assert!(div
            .invoke(Operation::Css, &args![Arg::map([("top", Arg::from("1px")), ("left", Arg::Null)])])
            .is_err());
        assert_eq!(div.css("top").unwrap(), None);
    }

    #[test]
    fn test_attr_forms() {
        let (q, _) = fixture("<a></a>");
        let a = q.select("a").unwrap();

        a.invoke(Operation::Attr, &args!["href", "/x"]).unwrap();
        a.invoke(Operation::Attr, &args![serde_json::json!({ "dataId": 7 })])
            .unwrap();
        assert_eq!(
            a.invoke(Operation::Attr, &args!["href"]).unwrap().into_value().as_deref(),
            Some("/x")
        );
        assert_eq!(a.attr("data-id").unwrap().as_deref(), Some("7"));
        assert!(matches!(
            a.invoke(Operation::Attr, &[]),
            Err(QueryError::UnsupportedArgument { operation: "attr", .. })
        ));

        // Numeric names are read and written like their string form
        a.invoke(Operation::Attr, &args![7, "seven"]).unwrap();
        assert_eq!(
            a.invoke(Operation::Attr, &args![7]).unwrap().into_value().as_deref(),
            Some("seven")
        );
        assert_eq!(a.invoke(Operation::Css, &args![3]).unwrap().into_value(), None);
        assert!(a.invoke(Operation::Attr, &args![true]).is_err());

        a.invoke(Operation::RemoveAttr, &args!["href"]).unwrap();
        assert_eq!(a.attr("href").unwrap(), None);
    }

    #[test]
    fn test_class_forms_flatten() {
        let (q, _) = fixture("<p></p>");
        let p = q.select("p").unwrap();

        let nested = Arg::List(vec![Arg::from("b"), Arg::List(vec![Arg::from("c")])]);
        p.invoke(Operation::AddClass, &args!["a", nested]).unwrap();
        assert_eq!(p.class_name().unwrap(), "a b c");

        p.invoke(Operation::DelClass, &args!["a"]).unwrap();
        p.invoke(Operation::ToggleClass, &args!["c", "d"]).unwrap();
        assert_eq!(
            p.invoke(Operation::ClassName, &[]).unwrap().into_value().as_deref(),
            Some("b d")
        );
        assert_eq!(
            p.invoke(Operation::HasClass, &args!["d"]).unwrap().as_bool(),
            Some(true)
        );

        for bad in [args![], args![1], args![Arg::List(vec![Arg::Null])]] {
            assert!(matches!(
                p.invoke(Operation::AddClass, &bad),
                Err(QueryError::UnsupportedArgument { operation: "addClass", .. })
            ));
        }
    }

    #[test]
    fn test_text_and_html_forms() {
        let (q, _) = fixture("<p></p>");
        let p = q.select("p").unwrap();

        p.invoke(Operation::Text, &args![12]).unwrap();
        assert_eq!(p.invoke(Operation::Text, &[]).unwrap().into_value().as_deref(), Some("12"));

        p.invoke(Operation::Html, &args!["<i>x</i>"]).unwrap();
        assert_eq!(
            p.invoke(Operation::Html, &[]).unwrap().into_value().as_deref(),
            Some("<i>x</i>")
        );
        assert!(p.invoke(Operation::Text, &args!["a", "b"]).is_err());
    }

    #[test]
    fn test_traversal_forms() {
        let (q, doc) = fixture("<div id='g'><div id='p'><b></b><i id='me'></i></div><u class='k'></u></div>");
        let me = q.select("#me").unwrap();
        let parent_id = doc.borrow().select("#p").unwrap()[0];
        let grand_id = doc.borrow().select("#g").unwrap()[0];
        let k_id = doc.borrow().select(".k").unwrap()[0];

        let parent = me.invoke(Operation::Parent, &[]).unwrap().into_handle().unwrap();
        assert_eq!(parent.items(), &[parent_id]);
        let grand = me.invoke(Operation::Parent, &args![2]).unwrap().into_handle().unwrap();
        assert_eq!(grand.items(), &[grand_id]);
        let k = me.invoke(Operation::Parent, &args![".k"]).unwrap().into_handle().unwrap();
        assert_eq!(k.items(), &[k_id]);
        assert!(me.invoke(Operation::Parent, &args![-1]).is_err());

        let second = parent
            .invoke(Operation::Children, &args![1])
            .unwrap()
            .into_handle()
            .unwrap();
        assert_eq!(second.items(), me.items());
        assert!(matches!(
            parent.invoke(Operation::Children, &args![2]),
            Err(QueryError::ChildNotFound { .. })
        ));

        let prev = me.invoke(Operation::PrevNodeAll, &args!["b"]).unwrap().into_handle().unwrap();
        assert_eq!(prev.len(), 1);
        assert!(matches!(me.invoke(Operation::Size, &[]).unwrap(), Outcome::Count(1)));
    }

    #[test]
    fn test_insert_child_default_before() {
        let (q, _) = fixture("<ol><li>0</li><li>1</li></ol>");
        let ol = q.select("ol").unwrap();

        ol.invoke(Operation::InsertChild, &args![1, "x"]).unwrap();
        ol.invoke(Operation::InsertChild, &args![0, "y", false]).unwrap();
        assert_eq!(ol.text().unwrap(), "0yx1");
        assert!(ol.invoke(Operation::InsertChild, &args!["1", "z"]).is_err());
    }

    #[test]
    fn test_event_forms() {
        let (q, _) = fixture("<button></button>");
        let button = q.select("button").unwrap();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let listener = Arg::listener(move |_| counter.set(counter.get() + 1));

        button.invoke(Operation::On, &args!["click", listener.clone()]).unwrap();
        button.invoke(Operation::Trigger, &args!["click"]).unwrap();
        assert_eq!(hits.get(), 1);

        button.invoke(Operation::Off, &args!["click", listener]).unwrap();
        button.invoke(Operation::Trigger, &args!["click"]).unwrap();
        assert_eq!(hits.get(), 1);

        assert!(matches!(
            button.invoke(Operation::On, &args!["click", "not a function"]),
            Err(QueryError::InvalidEventSpec(_))
        ));
        assert!(matches!(
            button.invoke(Operation::On, &args![5, Arg::listener(|_| {})]),
            Err(QueryError::InvalidEventSpec(_))
        ));
    }
}
