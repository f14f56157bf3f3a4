//! Values pushed into and read out of views.
//!
//! A [`Record`] maps placeholder names to [`Value`]s, preserving insertion
//! order. Values are scalars, lists, nested records (directive objects or
//! list items), nodes, views, event handlers, or [`Deferred`] futures.
//!
//! The [`record!`](crate::record) macro builds records inline:
//!
//! ```ignore
//! let data = record! {
//!     "title" => "People",
//!     "rows" => vec![record! { "_id" => 1, "name" => "A" }],
//! };
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use serde_json::{Map, Number, Value as Json};

use crate::dom::{Handler, NodeId};
use crate::view::View;

type BoxedValueFuture = Pin<Box<dyn Future<Output = Value>>>;

// ---------------------------------------------------------------------------
// Deferred
// ---------------------------------------------------------------------------

/// A value that will be known later.
///
/// The wrapped future is consumed the first time the value is pushed; pushing
/// the same `Deferred` twice applies it once.
#[derive(Clone)]
pub struct Deferred(Rc<RefCell<Option<BoxedValueFuture>>>);

impl Deferred {
    /// Wrap a future.
    pub fn new(future: impl Future<Output = Value> + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::pin(future)))))
    }

    /// Take the future out, leaving the slot empty.
    pub(crate) fn take(&self) -> Option<BoxedValueFuture> {
        self.0.borrow_mut().take()
    }

    /// Whether the future has already been taken.
    pub fn is_consumed(&self) -> bool {
        self.0.borrow().is_none()
    }
}

impl PartialEq for Deferred {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_consumed() { "consumed" } else { "waiting" };
        write!(f, "Deferred(<{state}>)")
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// A value bound to a placeholder.
#[derive(Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    /// A directive object, or a list item when inside a list.
    Record(Record),
    /// Content to insert in place of the target's children.
    Node(NodeId),
    /// A view whose root is inserted in place of the target's children.
    View(View),
    /// Event callback, used as a listener directive value.
    Handler(Handler),
    /// A value resolved asynchronously.
    Deferred(Deferred),
}

impl Value {
    /// Wrap a future as a deferred value.
    pub fn deferred(future: impl Future<Output = Value> + 'static) -> Self {
        Value::Deferred(Deferred::new(future))
    }

    /// Wrap a closure as a handler value.
    pub fn handler(f: impl Fn(&mut crate::dom::Event) + 'static) -> Self {
        Value::Handler(Handler::new(f))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Loose truthiness: `null`, `false`, `0`, `NaN` and `""` are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Text form used when a value is written as node content.
    ///
    /// `None` for `null` and for values with no textual form (nodes, views,
    /// handlers, deferreds, records).
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(s.clone()),
            Value::List(items) => Some(
                items
                    .iter()
                    .map(|item| item.to_text().unwrap_or_default())
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            _ => None,
        }
    }

    /// Convert to JSON. Nodes, views, handlers and deferreds have no JSON form;
    /// inside lists and records they are dropped.
    pub fn to_json(&self) -> Option<Json> {
        match self {
            Value::Null => Some(Json::Null),
            Value::Bool(b) => Some(Json::Bool(*b)),
            Value::Number(n) => Some(number_to_json(*n)),
            Value::String(s) => Some(Json::String(s.clone())),
            Value::List(items) => Some(Json::Array(
                items.iter().filter_map(Value::to_json).collect(),
            )),
            Value::Record(record) => Some(record.to_json()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn number_to_json(n: f64) -> Json {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        Json::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(Json::Null, Json::Number)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Number(n) => write!(f, "Number({n})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Record(record) => fmt::Debug::fmt(record, f),
            Value::Node(id) => write!(f, "Node({id:?})"),
            Value::View(view) => fmt::Debug::fmt(view, f),
            Value::Handler(h) => fmt::Debug::fmt(h, f),
            Value::Deferred(d) => fmt::Debug::fmt(d, f),
        }
    }
}

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            Json::String(s) => Value::String(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(map) => Value::Record(Record::from(map)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(n as f64)
            }
        })*
    };
}

number_from!(i32, i64, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Record(record)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Value::Node(id)
    }
}

impl From<View> for Value {
    fn from(view: View) -> Self {
        Value::View(view)
    }
}

impl From<&View> for Value {
    fn from(view: &View) -> Self {
        Value::View(view.clone())
    }
}

impl From<Handler> for Value {
    fn from(handler: Handler) -> Self {
        Value::Handler(handler)
    }
}

impl From<Deferred> for Value {
    fn from(deferred: Deferred) -> Self {
        Value::Deferred(deferred)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An insertion-ordered map from names to values.
#[derive(Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry (builder).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace an entry. A replaced entry keeps its position.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let at = self.entries.iter().position(|(k, _)| k == name)?;
        Some(self.entries.remove(at).1)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a record from a JSON object; other JSON values yield `None`.
    pub fn from_json(json: Json) -> Option<Self> {
        match json {
            Json::Object(map) => Some(Self::from(map)),
            _ => None,
        }
    }

    /// Convert to a JSON object, dropping entries with no JSON form.
    pub fn to_json(&self) -> Json {
        let map: Map<String, Json> = self
            .entries
            .iter()
            .filter_map(|(k, v)| Some((k.clone(), v.to_json()?)))
            .collect();
        Json::Object(map)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl From<Map<String, Json>> for Record {
    fn from(map: Map<String, Json>) -> Self {
        map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        record.extend(iter);
        record
    }
}

impl<K: Into<String>, V: Into<Value>> Extend<(K, V)> for Record {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build a [`Record`] from `key => value` pairs.
#[macro_export]
macro_rules! record {
    () => {
        $crate::value::Record::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::value::Record::new();
        $( record.insert($key, $value); )+
        record
    }};
}

// ---------------------------------------------------------------------------
// ItemKey
// ---------------------------------------------------------------------------

/// Identity of a list item across reconciliation passes.
///
/// Keys compare the way object property names do: an integral number and its
/// canonical decimal string (`1` and `"1"`) are the same key, while `"01"` or
/// `"1.0"` stay strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Int(i64),
    Str(String),
}

impl ItemKey {
    /// Key from an explicit key field. Falsy values (`null`, `0`, `""`,
    /// `false`) yield `None` so the caller falls back to the ordinal.
    pub fn from_value(value: &Value) -> Option<Self> {
        if !value.is_truthy() {
            return None;
        }
        match value {
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => Some(ItemKey::Int(*n as i64)),
            other => other.to_text().map(|text| match text.parse::<i64>() {
                Ok(n) if n.to_string() == text => ItemKey::Int(n),
                _ => ItemKey::Str(text),
            }),
        }
    }

    /// The value stored under the key field on read-back.
    pub fn to_value(&self) -> Value {
        match self {
            ItemKey::Int(n) => Value::Number(*n as f64),
            ItemKey::Str(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Int(n) => write!(f, "{n}"),
            ItemKey::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ItemKey {
    fn from(n: i64) -> Self {
        ItemKey::Int(n)
    }
}

impl From<usize> for ItemKey {
    fn from(n: usize) -> Self {
        ItemKey::Int(n as i64)
    }
}

impl From<&str> for ItemKey {
    fn from(s: &str) -> Self {
        ItemKey::Str(s.to_owned())
    }
}

impl From<String> for ItemKey {
    fn from(s: String) -> Self {
        ItemKey::Str(s)
    }
}
