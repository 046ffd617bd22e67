//! # Attribute Values
//!
//! A bag stores loosely-typed values. [`Value`] is the runtime representation of
//! anything an attribute can hold: scalars, ordered lists, ordered string-keyed
//! maps, and nested [`DataBag`] instances.
//!
//! | Variant | Holds | Array form |
//! |---------|-------|------------|
//! | `Null` | nothing | `null` |
//! | `Bool` / `Int` / `Float` / `String` | a scalar | unchanged |
//! | `List` | `Vec<Value>` | each element converted |
//! | `Map` | [`Attributes`] | each value converted |
//! | `Bag` | a nested [`DataBag`] | the bag's [`plain_array`](DataBag::plain_array) |
//!
//! Truthiness and emptiness follow loose-typing rules: `0`, `0.0`, `""`, `"0"`,
//! empty lists and empty maps are falsy; bags are always truthy.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bag::DataBag;

/// Ordered key/value storage used for attributes and plain maps.
///
/// Insertion order is preserved for iteration, key listing and JSON output.
pub type Attributes = IndexMap<String, Value>;

/// Shared null returned by raw lookups for absent keys.
pub(crate) static NULL: Value = Value::Null;

/// Runtime representation of an attribute value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Map(Attributes),
    Bag(Box<DataBag>),
}

/// Anything that can reduce itself to a tree of plain containers.
///
/// Bags expose this capability; casts and conversions use it to flatten
/// nested bags wherever they are found.
pub trait Arrayable {
    fn to_array(&self) -> Value;
}

impl Arrayable for Value {
    /// Recursively replaces nested bags by their array form.
    fn to_array(&self) -> Value {
        match self {
            Value::Bag(bag) => Value::Map(bag.plain_array()),
            Value::List(items) => Value::List(items.iter().map(Arrayable::to_array).collect()),
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(key, value)| (key.clone(), value.to_array()))
                    .collect(),
            ),
            scalar => scalar.clone(),
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Loose truthiness, as used by the boolean cast.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(v) => *v,
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::String(v) => !(v.is_empty() || v == "0"),
            Value::List(v) => !v.is_empty(),
            Value::Map(v) => !v.is_empty(),
            Value::Bag(_) => true,
        }
    }

    /// Inverse of [`Value::is_truthy`].
    pub fn is_empty_value(&self) -> bool {
        !self.is_truthy()
    }

    /// True for lists and maps, the two plain container kinds.
    pub fn is_array(&self) -> bool {
        matches!(self, Value::List(_) | Value::Map(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Attributes> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bag(&self) -> Option<&DataBag> {
        match self {
            Value::Bag(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bag_mut(&mut self) -> Option<&mut DataBag> {
        match self {
            Value::Bag(v) => Some(v),
            _ => None,
        }
    }

    /// Short name of the variant, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Bag(_) => "bag",
        }
    }

    /// Text form of a scalar (or a bag's JSON), `None` for null and plain containers.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Null | Value::List(_) | Value::Map(_) => None,
            Value::Bag(bag) => Some(bag.to_string()),
            scalar => Some(scalar.to_text()),
        }
    }

    /// Loose string conversion.
    ///
    /// `true` becomes `"1"`, `false` and null become `""`, containers and bags
    /// become their JSON text.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(true) => "1".to_string(),
            Value::Bool(false) => String::new(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            other => serde_json::Value::from(other).to_string(),
        }
    }

    /// Loose integer conversion. Strings contribute their leading number, if any.
    pub fn to_int(&self) -> i64 {
        match self {
            Value::Null => 0,
            Value::Bool(v) => i64::from(*v),
            Value::Int(v) => *v,
            Value::Float(v) => *v as i64,
            Value::String(v) => leading_int(v),
            Value::List(v) => i64::from(!v.is_empty()),
            Value::Map(v) => i64::from(!v.is_empty()),
            Value::Bag(_) => 1,
        }
    }

    /// Loose float conversion. Strings contribute their leading number, if any.
    pub fn to_float(&self) -> f64 {
        match self {
            Value::Float(v) => *v,
            Value::String(v) => leading_number(v).map_or(0.0, |(n, _)| n),
            other => other.to_int() as f64,
        }
    }
}

/// Parses the longest numeric prefix of `text`, after leading whitespace.
///
/// Returns the number and whether the prefix was a plain integer.
pub(crate) fn leading_number(text: &str) -> Option<(f64, bool)> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut integral = true;
    let mut mantissa_digits = end - digits_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let fraction_start = end + 1;
        let mut cursor = fraction_start;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > fraction_start || mantissa_digits > 0 {
            mantissa_digits += cursor - fraction_start;
            integral = false;
            end = cursor;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut cursor = end + 1;
        if matches!(bytes.get(cursor), Some(b'+') | Some(b'-')) {
            cursor += 1;
        }
        let exponent_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        if cursor > exponent_start {
            integral = false;
            end = cursor;
        }
    }

    text[..end].parse::<f64>().ok().map(|n| (n, integral))
}

fn leading_int(text: &str) -> i64 {
    match leading_number(text) {
        Some((_, true)) => {
            let trimmed = text.trim_start();
            let digits: String = trimmed
                .chars()
                .enumerate()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            digits.parse::<i64>().unwrap_or_else(|_| {
                if digits.starts_with('-') {
                    i64::MIN
                } else {
                    i64::MAX
                }
            })
        }
        Some((n, false)) => n as i64,
        None => 0,
    }
}

/// Returns true when the whole string (ignoring surrounding whitespace) is a number.
pub(crate) fn is_numeric_str(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok_and(|n| n.is_finite())
}

/// List position named by a path segment. Only canonical decimal digits
/// count: `"+1"`, `"01"` and `" 1"` name no element.
pub(crate) fn list_index(segment: &str) -> Option<usize> {
    let canonical = !segment.is_empty()
        && segment.bytes().all(|b| b.is_ascii_digit())
        && (segment == "0" || !segment.starts_with('0'));
    if canonical {
        segment.parse().ok()
    } else {
        None
    }
}

// --- Conversions into Value ---

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<usize> for Value {
    fn from(v: usize) -> Self {
        Value::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Attributes> for Value {
    fn from(v: Attributes) -> Self {
        Value::Map(v)
    }
}

impl From<DataBag> for Value {
    fn from(v: DataBag) -> Self {
        Value::Bag(Box::new(v))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            // Non-finite floats have no JSON form and become null
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(serde_json::Value::from).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
            Value::Bag(bag) => serde_json::Value::Object(
                bag.plain_array()
                    .iter()
                    .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(f) if f.is_finite() => serializer.serialize_f64(*f),
            Value::Float(_) => serializer.serialize_unit(),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => items.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
            Value::Bag(bag) => bag.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

/// Builds an [`Attributes`] map from `key => value` pairs.
///
/// ```
/// use databag::{attributes, Value};
///
/// let attrs = attributes! { "name" => "Ada", "age" => 36 };
/// assert_eq!(attrs["age"], Value::Int(36));
/// ```
#[macro_export]
macro_rules! attributes {
    () => {
        $crate::Attributes::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::Attributes::new();
        $( map.insert(::std::string::String::from($key), $crate::Value::from($value)); )+
        map
    }};
}
