//! # The Attribute Bag
//!
//! [`DataBag`] is an ordered store of named [`Value`]s with a small access facade
//! on top. Everything type-specific (allow-list, magic flag, casts, rules) lives
//! in the bag's [`BagType`]; the bag itself owns only its attributes and the
//! cached outcome of the last validation.
//!
//! ## Access Styles
//!
//! | Style | Read | Write | Notes |
//! |-------|------|-------|-------|
//! | Method | [`get`](DataBag::get) | [`set`](DataBag::set) | reads apply casts, writes check the allow-list |
//! | Magic | `bag["key"]` | [`assign`](DataBag::assign) | reads are raw, writes also need `magic_assignment` |
//! | Bulk | [`attributes`](DataBag::attributes) | [`set_attributes`](DataBag::set_attributes) | bulk writes are all-or-nothing |
//! | Trusted | - | [`set_raw_attributes`](DataBag::set_raw_attributes) | bypasses the allow-list |
//!
//! Absent keys and keys holding null read as `None` through the method style
//! and as [`Value::Null`] through indexing.
//!
//! ## In-place Updates
//!
//! Use [`get_mut`](DataBag::get_mut) or [`mutate`](DataBag::mutate) to change a
//! stored container without copying it out and back:
//!
//! ```
//! use databag::{DataBag, Value};
//!
//! let mut bag = DataBag::default();
//! bag.set("array", vec!["testing 0"]).unwrap();
//! bag.mutate("array", |v| {
//!     if let Some(list) = v.as_list_mut() {
//!         list.push(Value::from("testing 1"));
//!     }
//! })
//! .unwrap();
//! assert_eq!(bag["array"].as_list().map(|l| l.len()), Some(2));
//! ```

use std::ops::Index;

use tracing::trace;

use crate::error::{BagError, Result};
use crate::schema::BagType;
use crate::validation::{RuleSet, ValidationOutcome};
use crate::value::{Attributes, Value, NULL};

/// A loosely-typed record of named values.
#[derive(Debug, Clone, Default)]
pub struct DataBag {
    pub(crate) bag_type: BagType,
    pub(crate) attributes: Attributes,
    pub(crate) rules: Option<RuleSet>,
    pub(crate) outcome: Option<ValidationOutcome>,
}

impl DataBag {
    /// Create a bag populated without allow-list checks.
    pub fn new(bag_type: BagType, attributes: Attributes) -> Self {
        Self {
            bag_type,
            attributes,
            rules: None,
            outcome: None,
        }
    }

    /// Create a bag, rejecting any key outside the type's allow-list.
    pub fn try_new(bag_type: BagType, attributes: Attributes) -> Result<Self> {
        let mut bag = Self::new(bag_type, Attributes::new());
        bag.set_attributes(attributes)?;
        Ok(bag)
    }

    pub fn bag_type(&self) -> &BagType {
        &self.bag_type
    }

    /// Whether this bag is an instance of `bag_type`.
    pub fn is_type(&self, bag_type: &BagType) -> bool {
        self.bag_type == *bag_type
    }

    fn check_assignable(&self, key: &str) -> Result<()> {
        if self.bag_type.schema().allows(key) {
            Ok(())
        } else {
            trace!(bag_type = self.bag_type.name(), key, "Rejected write outside allow-list");
            Err(BagError::unassignable(format!(
                "Not allowed to assign value for '{}'",
                key
            )))
        }
    }

    // --- Reading ---

    /// Read an attribute, applying its declared cast first.
    ///
    /// Casts write their result back into the bag. Returns `None` for absent
    /// keys and for keys holding null.
    pub fn get(&mut self, key: &str) -> Result<Option<&Value>> {
        self.apply_cast(key)?;
        Ok(self.attributes.get(key).filter(|v| !v.is_null()))
    }

    /// Mutable handle to a stored value, after applying its cast.
    pub fn get_mut(&mut self, key: &str) -> Result<Option<&mut Value>> {
        self.apply_cast(key)?;
        Ok(self.attributes.get_mut(key).filter(|v| !v.is_null()))
    }

    /// Raw read without casting.
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|v| !v.is_null())
    }

    /// All stored attributes, uncast.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// True when `key` is present and not null.
    pub fn has(&self, key: &str) -> bool {
        self.attribute(key).is_some()
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.attributes.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.attributes.iter()
    }

    // --- Writing ---

    /// Store a value under `key` if the allow-list permits it.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        self.check_assignable(key)?;
        self.attributes.insert(key.to_string(), value.into());
        Ok(self)
    }

    /// Merge `attributes` into the bag.
    ///
    /// Every key is checked before anything is written, so a rejected key
    /// leaves the bag untouched.
    pub fn set_attributes(&mut self, attributes: Attributes) -> Result<()> {
        for key in attributes.keys() {
            self.check_assignable(key)?;
        }
        self.set_raw_attributes(attributes);
        Ok(())
    }

    /// Merge `attributes` into the bag without consulting the allow-list.
    ///
    /// Existing keys keep their position and take the new value.
    pub fn set_raw_attributes(&mut self, attributes: Attributes) {
        self.attributes.extend(attributes);
    }

    /// Property/index-style write.
    ///
    /// Same as [`DataBag::set`], but also refused when the bag type disables
    /// magic assignment.
    pub fn assign(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        if !self.bag_type.schema().magic_assignment() {
            return Err(BagError::unassignable("Not allowed to assign value by magic"));
        }
        self.set(key, value)?;
        Ok(())
    }

    /// Apply `f` to the stored value in place.
    ///
    /// The value's cast runs first; an absent key is created as null, which
    /// counts as a write for the allow-list.
    pub fn mutate<F>(&mut self, key: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut Value),
    {
        self.apply_cast(key)?;
        if !self.attributes.contains_key(key) {
            self.check_assignable(key)?;
        }
        f(self.attributes.entry(key.to_string()).or_default());
        Ok(())
    }

    /// Remove `key`. Removing an absent key is not an error.
    pub fn unset(&mut self, key: &str) {
        self.attributes.shift_remove(key);
    }

    /// Remove every attribute.
    pub fn clear(&mut self) -> &mut Self {
        self.attributes.clear();
        self
    }
}

impl PartialEq for DataBag {
    fn eq(&self, other: &Self) -> bool {
        self.bag_type == other.bag_type && self.attributes == other.attributes
    }
}

impl Index<&str> for DataBag {
    type Output = Value;

    /// Raw read; absent keys yield [`Value::Null`].
    fn index(&self, key: &str) -> &Value {
        self.attributes.get(key).unwrap_or(&NULL)
    }
}

impl<'a> IntoIterator for &'a DataBag {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.attributes.iter()
    }
}

impl From<Attributes> for DataBag {
    fn from(attributes: Attributes) -> Self {
        DataBag::new(BagType::anonymous(), attributes)
    }
}
