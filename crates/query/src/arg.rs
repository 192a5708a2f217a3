//! Dynamic arguments and results
//!
//! `Arg` is what callers hand to the entry point and to named operations;
//! `Outcome` is what a named operation gives back. Operations pick their
//! behavior from the shape of the arguments, so the variants mirror the
//! shapes a script can produce.

use std::fmt;
use std::rc::Rc;

use dom::{Event, EventListener, NodeId};
use serde_json::Value;

use crate::handle::Handle;

/// Opaque reference to a node of the injected document
pub type ElementRef = NodeId;

#[derive(Clone)]
pub enum Arg {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<Arg>),
    /// Key/value pairs, applied in order
    Map(Vec<(String, Arg)>),
    Node(ElementRef),
    Nodes(Vec<ElementRef>),
    Handle(Handle),
    Listener(EventListener),
}

impl Arg {
    /// Build a `Map` from pairs
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Arg>,
    {
        Arg::Map(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn listener(f: impl Fn(&Event) + 'static) -> Self {
        Arg::Listener(Rc::new(f))
    }

    /// Short name of the variant, for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Arg::Null => "null",
            Arg::Bool(_) => "boolean",
            Arg::Number(_) => "number",
            Arg::Str(_) => "string",
            Arg::List(_) => "list",
            Arg::Map(_) => "map",
            Arg::Node(_) => "node",
            Arg::Nodes(_) => "node collection",
            Arg::Handle(_) => "handle",
            Arg::Listener(_) => "listener",
        }
    }

    /// String form of a string or number, `None` for every other shape
    pub fn as_scalar(&self) -> Option<String> {
        match self {
            Arg::Str(s) => Some(s.clone()),
            Arg::Number(n) => Some(format_number(*n)),
            _ => None,
        }
    }

    /// Integral number as a signed index
    pub fn as_index(&self) -> Option<isize> {
        match self {
            Arg::Number(n) if n.is_finite() && n.fract() == 0.0 => Some(*n as isize),
            _ => None,
        }
    }
}

/// Integral values print without a fractional part, like script engines do
pub(crate) fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Null => f.write_str("Null"),
            Arg::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Arg::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Arg::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Arg::List(items) => f.debug_tuple("List").field(items).finish(),
            Arg::Map(pairs) => f.debug_tuple("Map").field(pairs).finish(),
            Arg::Node(id) => f.debug_tuple("Node").field(id).finish(),
            Arg::Nodes(ids) => f.debug_tuple("Nodes").field(ids).finish(),
            Arg::Handle(handle) => f.debug_tuple("Handle").field(handle).finish(),
            Arg::Listener(_) => f.write_str("Listener(..)"),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

impl From<bool> for Arg {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Number(value)
    }
}

impl From<i32> for Arg {
    fn from(value: i32) -> Self {
        Arg::Number(f64::from(value))
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Arg::Number(value as f64)
    }
}

impl From<usize> for Arg {
    fn from(value: usize) -> Self {
        Arg::Number(value as f64)
    }
}

impl From<Vec<Arg>> for Arg {
    fn from(value: Vec<Arg>) -> Self {
        Arg::List(value)
    }
}

impl From<Vec<ElementRef>> for Arg {
    fn from(value: Vec<ElementRef>) -> Self {
        Arg::Nodes(value)
    }
}

impl From<&[ElementRef]> for Arg {
    fn from(value: &[ElementRef]) -> Self {
        Arg::Nodes(value.to_vec())
    }
}

impl From<Handle> for Arg {
    fn from(value: Handle) -> Self {
        Arg::Handle(value)
    }
}

impl From<&Handle> for Arg {
    fn from(value: &Handle) -> Self {
        Arg::Handle(value.clone())
    }
}

impl From<EventListener> for Arg {
    fn from(value: EventListener) -> Self {
        Arg::Listener(value)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Arg::Null, Into::into)
    }
}

/// JSON maps onto the scalar, list and map shapes
impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Arg::Null,
            Value::Bool(b) => Arg::Bool(b),
            Value::Number(n) => n.as_f64().map_or(Arg::Null, Arg::Number),
            Value::String(s) => Arg::Str(s),
            Value::Array(items) => Arg::List(items.into_iter().map(Arg::from).collect()),
            Value::Object(map) => Arg::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        }
    }
}

/// Build a `Vec<Arg>` from heterogeneous values
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Arg::from($value)),+]
    };
}

/// Result of a named operation
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Write and traversal operations
    Handle(Handle),
    /// Scalar reads; `None` when the value is absent
    Value(Option<String>),
    Bool(bool),
    Count(usize),
}

impl Outcome {
    pub fn into_handle(self) -> Option<Handle> {
        match self {
            Outcome::Handle(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn into_value(self) -> Option<String> {
        match self {
            Outcome::Value(value) => value,
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Outcome::Bool(b) => Some(*b),
            _ => None,
        }
    }
}
