//! # Attribute Casting
//!
//! A bag type may declare a [`CastType`] per key. Casts run lazily: reading a
//! key through [`DataBag::get`] coerces the stored value and writes the result
//! back, so every later read sees the cast value.
//!
//! ## Directives
//!
//! | Directive | Unset value | Set value |
//! |-----------|-------------|-----------|
//! | `Boolean` | `false` | truthiness |
//! | `Integer` | `0` | leading number, truncated |
//! | `Float` | `0.0` | leading number |
//! | `String` | `""` | text form |
//! | `Array` | `[]` | lists/maps unchanged, bags flattened, scalars wrapped |
//! | `Bag(T)` | null, or an empty `T` with `cast_unset_objects` | converted into a `T` |
//! | `BagList(T)` | `[]` | each element converted into a `T` |
//!
//! Conversion into a nested bag accepts maps, lists and other bags; anything
//! else fails with [`BagError::InvalidCast`].
//!
//! Whole-bag conversions ([`DataBag::to_array`]) only apply the scalar
//! directives. Nested-bag directives are left to [`DataBag::get`] and
//! [`DataBag::apply_casts`] so that converting a bag never instantiates
//! nested bags just to flatten them again.

use std::str::FromStr;

use tracing::debug;

use crate::bag::DataBag;
use crate::error::{BagError, Result};
use crate::schema::{BagRegistry, BagType};
use crate::value::{Arrayable, Attributes, Value};

/// Per-key cast directive.
#[derive(Debug, Clone, PartialEq)]
pub enum CastType {
    Boolean,
    Integer,
    Float,
    String,
    Array,
    /// A single nested bag of the given type.
    Bag(BagType),
    /// A list of nested bags of the given type.
    BagList(BagType),
}

/// The scalar directives, by their textual names.
pub const SCALAR_CASTS: [&str; 5] = ["boolean", "integer", "float", "string", "array"];

impl CastType {
    pub fn is_scalar(&self) -> bool {
        !matches!(self, CastType::Bag(_) | CastType::BagList(_))
    }

    /// Resolve a textual directive: a scalar name, a registered type name,
    /// or a registered type name followed by `[]`.
    pub fn resolve(directive: &str, registry: &BagRegistry) -> Result<Self> {
        if let Ok(scalar) = directive.parse::<CastType>() {
            return Ok(scalar);
        }

        let (name, list) = match directive.strip_suffix("[]") {
            Some(name) => (name, true),
            None => (directive, false),
        };
        let bag_type = registry.resolve(name).cloned().ok_or_else(|| {
            BagError::invalid_argument(format!("Unknown cast type '{}'", directive))
        })?;

        Ok(if list {
            CastType::BagList(bag_type)
        } else {
            CastType::Bag(bag_type)
        })
    }

    /// Coerce `value` for a scalar directive; `None` for nested-bag directives.
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        match self {
            CastType::Boolean => Some(Value::Bool(value.is_truthy())),
            CastType::Integer => Some(Value::Int(value.to_int())),
            CastType::Float => Some(Value::Float(value.to_float())),
            CastType::String => Some(Value::String(value.to_text())),
            CastType::Array => Some(cast_array(value)),
            CastType::Bag(_) | CastType::BagList(_) => None,
        }
    }
}

impl FromStr for CastType {
    type Err = BagError;

    /// Parses the scalar directives only.
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "boolean" => Ok(CastType::Boolean),
            "integer" => Ok(CastType::Integer),
            "float" => Ok(CastType::Float),
            "string" => Ok(CastType::String),
            "array" => Ok(CastType::Array),
            other => Err(BagError::invalid_argument(format!(
                "'{}' is not a scalar cast",
                other
            ))),
        }
    }
}

/// Array cast: containers pass through, bags become their (owned) array form,
/// null becomes an empty list and any other scalar a one-element list.
fn cast_array(value: &Value) -> Value {
    match value {
        Value::List(_) | Value::Map(_) => value.clone(),
        Value::Bag(_) => value.to_array(),
        Value::Null => Value::List(Vec::new()),
        scalar => Value::List(vec![scalar.clone()]),
    }
}

/// Build a bag of type `bag_type` from `data`, or fail with an invalid cast
/// naming `key`.
pub(crate) fn make_nested(bag_type: &BagType, data: &Value, key: &str) -> Result<DataBag> {
    let attributes = plain_attributes(data).ok_or_else(|| BagError::InvalidCast {
        bag_type: bag_type.name().to_string(),
        key: key.to_string(),
        data: data.render(),
    })?;

    debug!(bag_type = bag_type.name(), key, "Instantiating nested bag");
    bag_type.make(attributes)
}

/// Reduce a value to a key/value mapping, if it has one.
///
/// Lists map their indexes to string keys.
pub(crate) fn plain_attributes(data: &Value) -> Option<Attributes> {
    match data {
        Value::Map(map) => Some(map.clone()),
        Value::Bag(bag) => Some(bag.plain_array()),
        Value::List(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item.clone()))
                .collect(),
        ),
        _ => None,
    }
}

impl DataBag {
    /// Apply every declared cast, or only the scalar ones, writing the
    /// results into the bag.
    pub fn apply_casts(&mut self, scalar_only: bool) -> Result<()> {
        let keys: Vec<String> = self
            .bag_type
            .schema()
            .casts()
            .iter()
            .filter(|(_, cast)| !scalar_only || cast.is_scalar())
            .map(|(key, _)| key.clone())
            .collect();

        for key in keys {
            self.apply_cast(&key)?;
        }
        Ok(())
    }

    /// Apply the cast declared for `key`, if any.
    pub(crate) fn apply_cast(&mut self, key: &str) -> Result<()> {
        let schema = self.bag_type.schema();
        let Some(cast) = schema.cast(key).cloned() else {
            return Ok(());
        };
        let cast_unset = schema.cast_unset_objects();

        match cast {
            CastType::Bag(bag_type) => self.cast_nested(key, &bag_type, cast_unset),
            CastType::BagList(bag_type) => self.cast_nested_list(key, &bag_type, cast_unset),
            scalar => {
                self.store_scalar_cast(key, &scalar);
                Ok(())
            }
        }
    }

    /// Write every scalar cast result into the bag. Scalar casts cannot fail.
    pub(crate) fn store_scalar_casts(&mut self) {
        let casts: Vec<(String, CastType)> = self
            .bag_type
            .schema()
            .casts()
            .iter()
            .filter(|(_, cast)| cast.is_scalar())
            .map(|(key, cast)| (key.clone(), cast.clone()))
            .collect();

        for (key, cast) in &casts {
            self.store_scalar_cast(key, cast);
        }
    }

    fn store_scalar_cast(&mut self, key: &str, cast: &CastType) {
        let current = self.attributes.get(key).unwrap_or(&Value::Null);
        if let Some(coerced) = cast.coerce(current) {
            self.attributes.insert(key.to_string(), coerced);
        }
    }

    fn cast_nested(&mut self, key: &str, bag_type: &BagType, cast_unset: bool) -> Result<()> {
        let nested = match self.attributes.get(key).filter(|v| !v.is_null()) {
            None if cast_unset => bag_type.make(Attributes::new())?,
            None => return Ok(()),
            Some(Value::Bag(bag)) if bag.is_type(bag_type) => return Ok(()),
            Some(data) => make_nested(bag_type, data, key)?,
        };

        self.attributes.insert(key.to_string(), Value::from(nested));
        Ok(())
    }

    fn cast_nested_list(&mut self, key: &str, bag_type: &BagType, cast_unset: bool) -> Result<()> {
        if self.attributes.get(key).map_or(true, Value::is_null) {
            self.attributes.insert(key.to_string(), Value::List(Vec::new()));
            return Ok(());
        }
        // Non-list values are left for validation to report
        let Some(Value::List(items)) = self.attributes.get_mut(key) else {
            return Ok(());
        };

        for (index, item) in items.iter_mut().enumerate() {
            if item.is_null() && !cast_unset {
                continue;
            }
            if matches!(item, Value::Bag(bag) if bag.is_type(bag_type)) {
                continue;
            }

            let item_key = format!("{}.{}", key, index);
            let nested = if item.is_truthy() {
                make_nested(bag_type, item, &item_key)?
            } else {
                make_nested(bag_type, &Value::List(Vec::new()), &item_key)?
            };
            *item = Value::from(nested);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes;
    use crate::test_utils::{CONTACT, TYPED, TYPED_WITH_DEFAULTS};

    fn typed() -> DataBag {
        DataBag::new(TYPED.clone(), Attributes::new())
    }

    #[test]
    fn casts_boolean() {
        let mut bag = typed();
        assert_eq!(bag.get("bool").unwrap(), Some(&Value::Bool(false)));

        bag.assign("bool", "boolean value").unwrap();
        assert_eq!(bag.get("bool").unwrap(), Some(&Value::Bool(true)));
        assert_eq!(bag["bool"], Value::Bool(true));
    }

    #[test]
    fn casts_integer() {
        let mut bag = typed();
        assert_eq!(bag.get("int").unwrap(), Some(&Value::Int(0)));

        bag.assign("int", "integer value").unwrap();
        assert_eq!(bag.get("int").unwrap(), Some(&Value::Int(0)));

        bag.assign("int", 40.0).unwrap();
        assert_eq!(bag.get("int").unwrap(), Some(&Value::Int(40)));
    }

    #[test]
    fn casts_float() {
        let mut bag = typed();
        assert_eq!(bag.get("float").unwrap(), Some(&Value::Float(0.0)));

        bag.assign("float", "float value").unwrap();
        assert_eq!(bag.get("float").unwrap(), Some(&Value::Float(0.0)));

        bag.assign("float", 40).unwrap();
        assert_eq!(bag.get("float").unwrap(), Some(&Value::Float(40.0)));
    }

    #[test]
    fn casts_string() {
        let mut bag = typed();
        assert_eq!(bag.get("string").unwrap(), Some(&Value::from("")));

        bag.assign("string", "string value").unwrap();
        assert_eq!(bag.get("string").unwrap(), Some(&Value::from("string value")));

        bag.assign("string", 40).unwrap();
        assert_eq!(bag.get("string").unwrap(), Some(&Value::from("40")));
    }

    #[test]
    fn casts_array() {
        let mut bag = typed();
        assert_eq!(bag.get("array").unwrap(), Some(&Value::List(vec![])));

        bag.assign("array", vec!["array"]).unwrap();
        assert_eq!(bag.get("array").unwrap(), Some(&Value::from(vec!["array"])));

        bag.assign("array", "string value").unwrap();
        assert_eq!(
            bag.get("array").unwrap(),
            Some(&Value::from(vec!["string value"]))
        );

        let nested = DataBag::new(CONTACT.clone(), attributes! { "test" => "type" });
        bag.assign("array", nested).unwrap();
        assert_eq!(
            bag.get("array").unwrap(),
            Some(&Value::from(attributes! { "test" => "type" }))
        );
    }

    #[test]
    fn casts_nested_bag() {
        let mut bag = typed();
        bag.assign("object", attributes! { "test" => "testing" })
            .unwrap();

        let object = bag.get("object").unwrap().and_then(Value::as_bag).unwrap();
        assert!(object.is_type(&CONTACT));
        assert_eq!(object["test"], Value::from("testing"));
    }

    #[test]
    fn keeps_bag_of_the_right_type() {
        let mut bag = typed();
        let nested = DataBag::new(CONTACT.clone(), attributes! { "name" => "kept" });
        bag.assign("object", nested.clone()).unwrap();

        assert_eq!(bag.get("object").unwrap(), Some(&Value::from(nested)));
    }

    #[test]
    fn converts_bag_of_another_type() {
        let mut bag = typed();
        bag.assign("object", DataBag::from(attributes! { "name" => "converted" }))
            .unwrap();

        let object = bag.get("object").unwrap().and_then(Value::as_bag).unwrap();
        assert!(object.is_type(&CONTACT));
        assert_eq!(object["name"], Value::from("converted"));
    }

    #[test]
    fn casts_list_of_nested_bags() {
        let mut bag = typed();
        assert_eq!(bag.get("objects").unwrap(), Some(&Value::List(vec![])));

        bag.assign(
            "objects",
            vec![
                attributes! { "test" => "testing a" },
                attributes! { "test" => "testing b" },
            ],
        )
        .unwrap();

        let objects = bag.get("objects").unwrap().and_then(Value::as_list).unwrap();
        assert_eq!(objects.len(), 2);
        assert_eq!(objects[0].as_bag().unwrap()["test"], Value::from("testing a"));
        assert_eq!(objects[1].as_bag().unwrap()["test"], Value::from("testing b"));
        assert!(objects.iter().all(|o| o.as_bag().is_some_and(|b| b.is_type(&CONTACT))));
    }

    #[test]
    fn fails_to_cast_scalar_to_nested_bag() {
        let mut bag = typed();
        bag.assign("object", "not an array").unwrap();

        let err = bag.get("object").unwrap_err();
        match err {
            BagError::InvalidCast { bag_type, key, data } => {
                assert_eq!(bag_type, CONTACT.name());
                assert_eq!(key, "object");
                assert_eq!(data.as_deref(), Some("not an array"));
            }
            other => panic!("Expected InvalidCast, got {:?}", other),
        }
    }

    #[test]
    fn fails_to_cast_scalar_in_list() {
        let mut bag = typed();
        bag.assign(
            "objects",
            vec![Value::from(attributes! { "type" => "an array" }), Value::from(444)],
        )
        .unwrap();

        let err = bag.get("objects").unwrap_err();
        assert!(matches!(err, BagError::InvalidCast { ref key, .. } if key == "objects.1"));
    }

    #[test]
    fn unset_nested_bag_stays_null() {
        let mut bag = typed();
        assert_eq!(bag.get("object").unwrap(), None);
    }

    #[test]
    fn unset_nested_bag_materializes_when_configured() {
        let mut bag = DataBag::new(TYPED_WITH_DEFAULTS.clone(), Attributes::new());
        let object = bag.get("object").unwrap().and_then(Value::as_bag).unwrap();
        assert!(object.is_type(&CONTACT));
        assert!(object.is_empty());
    }

    #[test]
    fn null_list_elements_stay_null() {
        let mut bag = typed();
        bag.assign(
            "objects",
            vec![Value::Null, Value::from(attributes! { "type" => "test" }), Value::Null],
        )
        .unwrap();

        let objects = bag.get("objects").unwrap().and_then(Value::as_list).unwrap();
        assert_eq!(objects.len(), 3);
        assert!(objects[0].is_null());
        assert!(objects[2].is_null());
        assert_eq!(objects[1].as_bag().unwrap()["type"], Value::from("test"));
    }

    #[test]
    fn null_list_elements_materialize_when_configured() {
        let mut bag = DataBag::new(TYPED_WITH_DEFAULTS.clone(), Attributes::new());
        bag.assign(
            "objects",
            vec![Value::Null, Value::from(attributes! { "type" => "test" })],
        )
        .unwrap();

        let objects = bag.get("objects").unwrap().and_then(Value::as_list).unwrap();
        assert_eq!(objects.len(), 2);
        let first = objects[0].as_bag().unwrap();
        assert!(first.is_type(&CONTACT));
        assert_eq!(first["type"], Value::Null);
        assert_eq!(objects[1].as_bag().unwrap()["type"], Value::from("test"));
    }

    #[test]
    fn apply_casts_scalar_only_skips_nested() {
        let mut bag = typed();
        bag.set("object", attributes! { "test" => "raw" }).unwrap();
        bag.apply_casts(true).unwrap();

        assert_eq!(bag["bool"], Value::Bool(false));
        assert!(bag["object"].as_map().is_some());

        bag.apply_casts(false).unwrap();
        assert!(bag["object"].as_bag().is_some());
    }

    #[test]
    fn resolves_textual_directives() {
        let registry = BagRegistry::new().with(CONTACT.clone());

        assert_eq!(CastType::resolve("boolean", &registry).unwrap(), CastType::Boolean);
        assert_eq!(
            CastType::resolve(CONTACT.name(), &registry).unwrap(),
            CastType::Bag(CONTACT.clone())
        );
        assert_eq!(
            CastType::resolve(&format!("{}[]", CONTACT.name()), &registry).unwrap(),
            CastType::BagList(CONTACT.clone())
        );
        assert!(CastType::resolve("date", &registry).is_err());
    }

    #[test]
    fn scalar_cast_names_parse() {
        for name in SCALAR_CASTS {
            assert!(name.parse::<CastType>().unwrap().is_scalar());
        }
    }
}
