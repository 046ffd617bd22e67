//! # Conversions
//!
//! Views of a bag as plain data:
//!
//! - [`DataBag::to_array`]: ordered map of plain values; nested bags are
//!   flattened recursively. Scalar casts are applied first and stored, so a
//!   full conversion leaves the bag holding its cast values.
//! - [`DataBag::plain_array`]: the same tree from a shared reference; casts
//!   show up in the output only.
//! - [`DataBag::to_object`]: JSON object record. The recursive form walks the
//!   raw attributes and turns every nested container (lists included) into an
//!   object; the shallow form wraps `to_array()` as is.
//! - [`DataBag::to_json`]: JSON text of `to_array()`.
//! - `Display` and `Serialize`: JSON text and serde tree of `plain_array()`.
//!
//! ## Known Limitation
//!
//! Conversions recurse without a depth guard. Bags form trees by ownership,
//! but a value graph rebuilt by hand from shared data could still be deep
//! enough to exhaust the stack.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::bag::DataBag;
use crate::error::Result;
use crate::schema::BagType;
use crate::value::{Attributes, Value};

/// Formatting options for [`DataBag::to_json_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonOptions {
    pub pretty: bool,
}

impl JsonOptions {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl DataBag {
    /// Plain array form of the bag.
    ///
    /// Scalar casts are written back into the bag before converting, so keys
    /// with a scalar cast are present afterwards even if they were unset.
    /// Nested-bag casts stay lazy.
    pub fn to_array(&mut self) -> Attributes {
        self.store_scalar_casts();
        self.plain_array()
    }

    /// Array form without touching the bag: scalar casts are applied to the
    /// output only.
    pub fn plain_array(&self) -> Attributes {
        let casts = self.bag_type.schema().casts();
        let mut array = Attributes::with_capacity(self.attributes.len());

        for (key, value) in &self.attributes {
            let value = match casts.get(key).and_then(|cast| cast.coerce(value)) {
                Some(coerced) => crate::value::Arrayable::to_array(&coerced),
                None => crate::value::Arrayable::to_array(value),
            };
            array.insert(key.clone(), value);
        }

        for (key, cast) in casts {
            if array.contains_key(key) {
                continue;
            }
            if let Some(coerced) = cast.coerce(&Value::Null) {
                array.insert(key.clone(), coerced);
            }
        }

        array
    }

    /// Identical to [`DataBag::to_array`]; the hook generic JSON encoders use.
    pub fn to_json_serializable(&mut self) -> Attributes {
        self.to_array()
    }

    /// Convert to a JSON object record.
    ///
    /// With `recursive`, nested maps, lists and bags all become objects (lists
    /// keyed by index) and empty keys are dropped. Without it, the top level is
    /// an object over `to_array()` and nested values keep their JSON shape.
    pub fn to_object(&mut self, recursive: bool) -> serde_json::Map<String, serde_json::Value> {
        if recursive {
            return entries_to_object(self.attributes.iter());
        }

        self.to_array()
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::from(value)))
            .collect()
    }

    /// JSON text using the bag type's default formatting.
    pub fn to_json(&mut self) -> Result<String> {
        let options = JsonOptions {
            pretty: self.bag_type.schema().pretty_json(),
        };
        self.to_json_with(options)
    }

    pub fn to_json_with(&mut self, options: JsonOptions) -> Result<String> {
        encode(&self.to_array(), options)
    }

    /// Rebuild a bag of `bag_type` from JSON object text.
    ///
    /// Restores state as-is: the allow-list is not consulted.
    pub fn from_json(bag_type: BagType, json: &str) -> Result<Self> {
        let attributes: Attributes = serde_json::from_str(json)?;
        Ok(DataBag::new(bag_type, attributes))
    }
}

fn encode(array: &Attributes, options: JsonOptions) -> Result<String> {
    let text = if options.pretty {
        serde_json::to_string_pretty(array)?
    } else {
        serde_json::to_string(array)?
    };
    Ok(text)
}

fn entries_to_object<'a, I>(entries: I) -> serde_json::Map<String, serde_json::Value>
where
    I: IntoIterator<Item = (&'a String, &'a Value)>,
{
    entries
        .into_iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.clone(), value_to_object(value)))
        .collect()
}

fn value_to_object(value: &Value) -> serde_json::Value {
    match value {
        Value::Map(map) => serde_json::Value::Object(entries_to_object(map.iter())),
        Value::List(items) => serde_json::Value::Object(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), value_to_object(item)))
                .collect(),
        ),
        Value::Bag(bag) => serde_json::Value::Object(entries_to_object(bag.attributes.iter())),
        scalar => serde_json::Value::from(scalar),
    }
}

impl crate::value::Arrayable for DataBag {
    fn to_array(&self) -> Value {
        Value::Map(self.plain_array())
    }
}

impl Serialize for DataBag {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.plain_array().serialize(serializer)
    }
}

impl fmt::Display for DataBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let options = JsonOptions {
            pretty: self.bag_type.schema().pretty_json(),
        };
        let text = encode(&self.plain_array(), options).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}
