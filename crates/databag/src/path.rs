//! # Dot-notation Lookup
//!
//! [`DataBag::get_nested`] resolves paths such as `"contents.mass"` or
//! `"more.0.a"` across nested bags, maps and lists.
//!
//! ## Resolution
//!
//! 1. No path: the bag itself.
//! 2. A top-level key equal to the whole path (dots included) wins outright.
//! 3. Otherwise the path is split on `.`. The first segment is read from the
//!    bag; each following segment descends one level:
//!    - into a nested bag, by handing the remaining suffix to that bag's own
//!      `get_nested` (so its literal-key rule applies to the suffix);
//!    - into a map, by key;
//!    - into a list, by index.
//!
//!    Anything else yields the default.
//!
//! Lookups are read-only and see stored values; casts are not applied. Call
//! [`DataBag::apply_casts`] first to resolve through cast values.

use tracing::trace;

use crate::bag::DataBag;
use crate::value::{list_index, Value, NULL};

/// Fallback for [`DataBag::get_nested`]: a value, or a closure producing one.
pub trait NestedDefault {
    fn resolve(self) -> Value;
}

impl NestedDefault for Value {
    fn resolve(self) -> Value {
        self
    }
}

impl<F> NestedDefault for F
where
    F: FnOnce() -> Value,
{
    fn resolve(self) -> Value {
        self()
    }
}

/// Result of a dot-path lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested<'a> {
    /// The bag itself (no path given).
    Bag(&'a DataBag),
    /// A stored value.
    Found(&'a Value),
    /// The fallback, because the path did not resolve.
    Default(Value),
}

impl<'a> Nested<'a> {
    /// The resolved or default value; `None` for the bag itself.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Nested::Bag(_) => None,
            Nested::Found(value) => Some(*value),
            Nested::Default(value) => Some(value),
        }
    }

    /// The bag the lookup landed on, if any.
    pub fn as_bag(&self) -> Option<&'a DataBag> {
        match self {
            Nested::Bag(bag) => Some(*bag),
            Nested::Found(value) => value.as_bag(),
            Nested::Default(_) => None,
        }
    }

    pub fn is_default(&self) -> bool {
        matches!(self, Nested::Default(_))
    }

    /// Owned value; the bag itself becomes [`Value::Bag`].
    pub fn into_value(self) -> Value {
        match self {
            Nested::Bag(bag) => Value::from(bag.clone()),
            Nested::Found(value) => value.clone(),
            Nested::Default(value) => value,
        }
    }
}

impl DataBag {
    /// Look up a value by dot-notation path.
    ///
    /// `default` is returned (or called) when a segment cannot be resolved.
    pub fn get_nested<D>(&self, path: Option<&str>, default: D) -> Nested<'_>
    where
        D: NestedDefault,
    {
        let Some(path) = path else {
            return Nested::Bag(self);
        };

        if let Some(value) = self.attribute(path) {
            return Nested::Found(value);
        }

        let mut segments = path.split('.');
        let first = segments.next().unwrap_or_default();
        let rest: Vec<&str> = segments.collect();
        let mut current = self.attributes.get(first).unwrap_or(&NULL);

        for (index, segment) in rest.iter().enumerate() {
            let next = match current {
                Value::Bag(bag) => {
                    let suffix = rest[index..].join(".");
                    return bag.get_nested(Some(&suffix), default);
                }
                Value::Map(map) => map.get(*segment),
                Value::List(items) => list_index(segment).and_then(|i| items.get(i)),
                _ => None,
            };

            match next {
                Some(value) => current = value,
                None => {
                    trace!(path, segment, "Dot path did not resolve, using default");
                    return Nested::Default(default.resolve());
                }
            }
        }

        Nested::Found(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes;

    fn sample() -> DataBag {
        DataBag::from(attributes! {
            "top" => "test",
            "contents" => DataBag::from(attributes! { "mass" => "testing", "assignment" => 2242 }),
            "more" => vec![DataBag::from(attributes! { "a" => "b" })],
            "array" => attributes! { "normal" => "nested" },
            "dotted.key" => "literal",
        })
    }

    #[test]
    fn no_path_returns_the_bag() {
        let bag = sample();
        let nested = bag.get_nested(None, Value::Null);
        assert!(std::ptr::eq(nested.as_bag().unwrap(), &bag));
    }

    #[test]
    fn resolves_at_depth() {
        let bag = sample();

        assert_eq!(bag.get_nested(Some("top"), Value::Null).value(), Some(&Value::from("test")));
        assert_eq!(
            bag.get_nested(Some("array.normal"), Value::Null).value(),
            Some(&Value::from("nested"))
        );
        assert_eq!(
            bag.get_nested(Some("contents.mass"), Value::Null).value(),
            Some(&Value::from("testing"))
        );
        assert_eq!(
            bag.get_nested(Some("more.0.a"), Value::Null).value(),
            Some(&Value::from("b"))
        );
    }

    #[test]
    fn falls_back_to_default() {
        let bag = sample();

        let nested = bag.get_nested(Some("more.1.4.3.hop"), Value::from("DEF"));
        assert!(nested.is_default());
        assert_eq!(nested.value(), Some(&Value::from("DEF")));

        assert_eq!(
            bag.get_nested(Some("no.such.path"), Value::from("DEF")).into_value(),
            Value::from("DEF")
        );
    }

    #[test]
    fn list_segments_must_be_plain_indexes() {
        let bag = sample();
        for path in ["more.+0.a", "more.00.a", "more. 0.a"] {
            assert!(bag.get_nested(Some(path), Value::Null).is_default(), "{}", path);
        }
    }

    #[test]
    fn calls_default_closure() {
        let bag = sample();
        let nested = bag.get_nested(Some("top.deeper"), || Value::from(7));
        assert_eq!(nested.into_value(), Value::from(7));
    }

    #[test]
    fn literal_key_wins_over_splitting() {
        let bag = sample();
        assert_eq!(
            bag.get_nested(Some("dotted.key"), Value::Null).value(),
            Some(&Value::from("literal"))
        );
    }

    #[test]
    fn nested_bag_applies_its_own_literal_rule() {
        let bag = DataBag::from(attributes! {
            "inner" => DataBag::from(attributes! { "a.b" => "from literal" }),
        });
        assert_eq!(
            bag.get_nested(Some("inner.a.b"), Value::Null).value(),
            Some(&Value::from("from literal"))
        );
    }

    #[test]
    fn absent_single_segment_is_null_not_default() {
        let bag = sample();
        let nested = bag.get_nested(Some("missing"), Value::from("DEF"));
        assert_eq!(nested, Nested::Found(&Value::Null));
    }

    #[test]
    fn resolving_to_a_nested_bag() {
        let bag = sample();
        let nested = bag.get_nested(Some("contents"), Value::Null);
        assert_eq!(nested.as_bag().unwrap()["mass"], Value::from("testing"));
    }
}
