//! The `Jv` value handle.
//!
//! A `Jv` is a shared-ownership handle to an immutable JSON-like value.
//! Cloning a handle is the copy primitive (the share count goes up and both
//! handles alias the same storage); dropping a handle is the release
//! primitive. Storage is released when the last handle goes away, so a
//! value can be handed to the engine thread, a channel and the REPL at the
//! same time without any of them freeing it under the others.
//!
//! The `invalid` kind doubles as an error carrier: an invalid value may
//! wrap a payload (its message), usually a string or an object.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::dump::PrintFlags;
use crate::error::{JvError, JvResult};

/// Discriminator of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Invalid,
    Null,
    False,
    True,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    /// The jq name of this kind. `true` and `false` are both "boolean".
    pub fn name(self) -> &'static str {
        match self {
            Kind::Invalid => "invalid",
            Kind::Null => "null",
            Kind::False | Kind::True => "boolean",
            Kind::Number => "number",
            Kind::String => "string",
            Kind::Array => "array",
            Kind::Object => "object",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Storage behind a handle.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Invalid(Option<Jv>),
    Null,
    False,
    True,
    Number(f64),
    String(String),
    Array(Vec<Jv>),
    Object(IndexMap<String, Jv>),
}

/// Borrowed view of a value for pattern matching.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Invalid(Option<&'a Jv>),
    Null,
    Bool(bool),
    Number(f64),
    String(&'a str),
    Array(&'a [Jv]),
    Object(&'a IndexMap<String, Jv>),
}

/// Reference-counted handle to a JSON-like value.
#[derive(Clone, PartialEq)]
pub struct Jv(Arc<Node>);

impl Jv {
    fn from_node(node: Node) -> Self {
        Jv(Arc::new(node))
    }

    pub(crate) fn node(&self) -> &Node {
        &self.0
    }

    // ═══════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════

    pub fn null() -> Self {
        Self::from_node(Node::Null)
    }

    pub fn from_bool(b: bool) -> Self {
        Self::from_node(if b { Node::True } else { Node::False })
    }

    pub fn number(n: f64) -> Self {
        Self::from_node(Node::Number(n))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Self::from_node(Node::String(s.into()))
    }

    /// An empty array.
    pub fn array() -> Self {
        Self::from_node(Node::Array(Vec::new()))
    }

    /// An empty object.
    pub fn object() -> Self {
        Self::from_node(Node::Object(IndexMap::new()))
    }

    /// An invalid value with no message.
    pub fn invalid() -> Self {
        Self::from_node(Node::Invalid(None))
    }

    /// An invalid value carrying `message` as its payload.
    ///
    /// The payload handle moves into the new value.
    pub fn invalid_with_message(message: Jv) -> Self {
        Self::from_node(Node::Invalid(Some(message)))
    }

    /// Build an object from key/value pairs. Later duplicates win.
    pub fn from_pairs<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Jv)>) -> Self {
        let map = pairs.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self::from_node(Node::Object(map))
    }

    /// Parse exactly one JSON value from `text`.
    pub fn parse(text: &str) -> JvResult<Self> {
        let json: serde_json::Value = serde_json::from_str(text)?;
        Ok(Jv::from(json))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════

    pub fn kind(&self) -> Kind {
        match self.node() {
            Node::Invalid(_) => Kind::Invalid,
            Node::Null => Kind::Null,
            Node::False => Kind::False,
            Node::True => Kind::True,
            Node::Number(_) => Kind::Number,
            Node::String(_) => Kind::String,
            Node::Array(_) => Kind::Array,
            Node::Object(_) => Kind::Object,
        }
    }

    pub fn view(&self) -> View<'_> {
        match self.node() {
            Node::Invalid(msg) => View::Invalid(msg.as_ref()),
            Node::Null => View::Null,
            Node::False => View::Bool(false),
            Node::True => View::Bool(true),
            Node::Number(n) => View::Number(*n),
            Node::String(s) => View::String(s),
            Node::Array(items) => View::Array(items),
            Node::Object(map) => View::Object(map),
        }
    }

    /// True unless this is an invalid value.
    pub fn is_valid(&self) -> bool {
        !matches!(self.node(), Node::Invalid(_))
    }

    /// Number of live handles sharing this value's storage.
    pub fn share_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }

    /// True if both handles alias the same storage.
    pub fn ptr_eq(a: &Jv, b: &Jv) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Typed access
    // ═══════════════════════════════════════════════════════════════════

    pub fn as_str(&self) -> JvResult<&str> {
        match self.node() {
            Node::String(s) => Ok(s),
            _ => Err(JvError::type_mismatch("string", self.kind())),
        }
    }

    pub fn as_number(&self) -> JvResult<f64> {
        match self.node() {
            Node::Number(n) => Ok(*n),
            _ => Err(JvError::type_mismatch("number", self.kind())),
        }
    }

    pub fn as_bool(&self) -> JvResult<bool> {
        match self.node() {
            Node::True => Ok(true),
            Node::False => Ok(false),
            _ => Err(JvError::type_mismatch("boolean", self.kind())),
        }
    }

    pub fn as_array(&self) -> JvResult<&[Jv]> {
        match self.node() {
            Node::Array(items) => Ok(items),
            _ => Err(JvError::type_mismatch("array", self.kind())),
        }
    }

    pub fn as_object(&self) -> JvResult<&IndexMap<String, Jv>> {
        match self.node() {
            Node::Object(map) => Ok(map),
            _ => Err(JvError::type_mismatch("object", self.kind())),
        }
    }

    /// Length of a string (in chars), array or object.
    pub fn len(&self) -> JvResult<usize> {
        match self.node() {
            Node::String(s) => Ok(s.chars().count()),
            Node::Array(items) => Ok(items.len()),
            Node::Object(map) => Ok(map.len()),
            _ => Err(JvError::type_mismatch("string, array or object", self.kind())),
        }
    }

    /// Look up an object field. Returns a new handle sharing the field's storage.
    pub fn get(&self, key: &str) -> JvResult<Option<Jv>> {
        Ok(self.as_object()?.get(key).cloned())
    }

    /// Look up an array element.
    pub fn index(&self, i: usize) -> JvResult<Option<Jv>> {
        Ok(self.as_array()?.get(i).cloned())
    }

    // ═══════════════════════════════════════════════════════════════════
    // Copy-on-write builders
    // ═══════════════════════════════════════════════════════════════════

    /// Append to an array, consuming this handle.
    ///
    /// Other handles sharing the storage keep seeing the old array.
    pub fn append(mut self, item: Jv) -> JvResult<Jv> {
        let kind = self.kind();
        match Arc::make_mut(&mut self.0) {
            Node::Array(items) => items.push(item),
            _ => return Err(JvError::type_mismatch("array", kind)),
        }
        Ok(self)
    }

    /// Set an object field, consuming this handle.
    pub fn insert(mut self, key: impl Into<String>, value: Jv) -> JvResult<Jv> {
        let kind = self.kind();
        match Arc::make_mut(&mut self.0) {
            Node::Object(map) => {
                map.insert(key.into(), value);
            }
            _ => return Err(JvError::type_mismatch("object", kind)),
        }
        Ok(self)
    }

    // ═══════════════════════════════════════════════════════════════════
    // Invalid values
    // ═══════════════════════════════════════════════════════════════════

    /// The message carried by an invalid value.
    ///
    /// Returns `null` when this value is valid or carries no message.
    pub fn invalid_message(&self) -> Jv {
        match self.node() {
            Node::Invalid(Some(msg)) => msg.clone(),
            _ => Jv::null(),
        }
    }

    /// The message of an invalid value as text.
    ///
    /// String messages come back verbatim; any other payload is dumped as
    /// compact JSON. `None` when there is no message.
    pub fn invalid_message_string(&self) -> Option<String> {
        match self.node() {
            Node::Invalid(Some(msg)) => Some(match msg.node() {
                Node::String(s) => s.clone(),
                _ => msg.dump(PrintFlags::empty()),
            }),
            _ => None,
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Generic representation
    // ═══════════════════════════════════════════════════════════════════

    /// Convert to a `serde_json::Value`, recursively.
    ///
    /// Invalid values and non-finite numbers become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self.node() {
            Node::Invalid(_) | Node::Null => serde_json::Value::Null,
            Node::False => serde_json::Value::Bool(false),
            Node::True => serde_json::Value::Bool(true),
            Node::Number(n) => number_to_json(*n),
            Node::String(s) => serde_json::Value::String(s.clone()),
            Node::Array(items) => serde_json::Value::Array(items.iter().map(Jv::to_json).collect()),
            Node::Object(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

/// Largest integer an f64 holds exactly.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_992.0;

fn number_to_json(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() <= MAX_SAFE_INTEGER {
        serde_json::Value::Number((n as i64).into())
    } else {
        serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

/// Out-of-range literals saturate to the largest finite double, as in jq.
fn clamp_number(n: f64) -> f64 {
    if n.is_infinite() { f64::MAX.copysign(n) } else { n }
}

impl From<serde_json::Value> for Jv {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Jv::null(),
            serde_json::Value::Bool(b) => Jv::from_bool(b),
            serde_json::Value::Number(n) => Jv::number(clamp_number(n.as_f64().unwrap_or_default())),
            serde_json::Value::String(s) => Jv::string(s),
            serde_json::Value::Array(arr) => arr.into_iter().map(Jv::from).collect(),
            serde_json::Value::Object(obj) => {
                Jv::from_pairs(obj.into_iter().map(|(k, v)| (k, Jv::from(v))))
            }
        }
    }
}

impl From<bool> for Jv {
    fn from(b: bool) -> Self {
        Jv::from_bool(b)
    }
}

impl From<f64> for Jv {
    fn from(n: f64) -> Self {
        Jv::number(n)
    }
}

impl From<&str> for Jv {
    fn from(s: &str) -> Self {
        Jv::string(s)
    }
}

impl From<String> for Jv {
    fn from(s: String) -> Self {
        Jv::string(s)
    }
}

impl FromIterator<Jv> for Jv {
    fn from_iter<I: IntoIterator<Item = Jv>>(iter: I) -> Self {
        Jv::from_node(Node::Array(iter.into_iter().collect()))
    }
}

impl Default for Jv {
    fn default() -> Self {
        Jv::null()
    }
}

impl fmt::Debug for Jv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Jv({})", self.dump(PrintFlags::empty()))
    }
}

impl fmt::Display for Jv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump(PrintFlags::empty()))
    }
}

impl Serialize for Jv {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Jv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(Jv::from(json))
    }
}
