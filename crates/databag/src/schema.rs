//! # Bag Types
//!
//! Every [`DataBag`] belongs to a bag type. The type carries everything that
//! is fixed per kind of bag rather than per instance:
//!
//! | Setting | Default | Effect |
//! |---------|---------|--------|
//! | `assignable` | none | allow-list of writable keys; empty means all keys |
//! | `magic_assignment` | `true` | whether [`DataBag::assign`] may write |
//! | `cast_unset_objects` | `false` | materialize empty nested bags for null values |
//! | `casts` | none | per-key [`CastType`] directives |
//! | `rules` | none | per-key rule expressions for validation |
//! | `pretty_json` | `false` | default formatting of `to_json()` and `Display` |
//!
//! Types are cheap handles ([`BagType`] wraps an `Arc`) that are built once
//! and shared by all instances. Nested-bag casts reference their target type
//! directly; validation rules reference types by name through a
//! [`BagRegistry`], which stands in for constructing a class from its name.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};

use crate::bag::DataBag;
use crate::cast::CastType;
use crate::config::DataBagConfig;
use crate::error::Result;
use crate::validation::RuleSet;
use crate::value::Attributes;

/// Name used by [`BagType::anonymous`].
pub const ANONYMOUS_TYPE: &str = "DataBag";

/// Immutable description of a bag type.
#[derive(Debug)]
pub struct BagSchema {
    name: String,
    assignable: IndexSet<String>,
    magic_assignment: bool,
    cast_unset_objects: bool,
    casts: IndexMap<String, CastType>,
    rules: RuleSet,
    pretty_json: bool,
}

impl BagSchema {
    /// Fully qualified type name (e.g. `"app::Contact"`).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last segment of the type name (e.g. `"Contact"`).
    pub fn friendly_name(&self) -> &str {
        friendly_name(&self.name)
    }

    pub fn assignable(&self) -> &IndexSet<String> {
        &self.assignable
    }

    /// Whether `key` may be written. An empty allow-list permits every key.
    pub fn allows(&self, key: &str) -> bool {
        self.assignable.is_empty() || self.assignable.contains(key)
    }

    pub fn magic_assignment(&self) -> bool {
        self.magic_assignment
    }

    pub fn cast_unset_objects(&self) -> bool {
        self.cast_unset_objects
    }

    pub fn casts(&self) -> &IndexMap<String, CastType> {
        &self.casts
    }

    pub fn cast(&self, key: &str) -> Option<&CastType> {
        self.casts.get(key)
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn pretty_json(&self) -> bool {
        self.pretty_json
    }
}

/// Shared handle to a [`BagSchema`].
///
/// Two handles denote the same type when their names match.
#[derive(Clone)]
pub struct BagType(Arc<BagSchema>);

impl BagType {
    /// Start describing a new bag type.
    pub fn builder(name: impl Into<String>) -> BagTypeBuilder {
        BagTypeBuilder::new(name)
    }

    /// Start describing a new bag type with defaults taken from `config`.
    pub fn configured(name: impl Into<String>, config: &DataBagConfig) -> BagTypeBuilder {
        BagTypeBuilder::new(name)
            .magic_assignment(config.magic_assignment)
            .cast_unset_objects(config.cast_unset_objects)
            .pretty_json(config.pretty_json)
    }

    /// A type with no restrictions, casts or rules.
    pub fn anonymous() -> Self {
        BagTypeBuilder::new(ANONYMOUS_TYPE).build()
    }

    pub fn schema(&self) -> &BagSchema {
        &self.0
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn friendly_name(&self) -> &str {
        self.0.friendly_name()
    }

    /// Construct an instance, checking every key against the allow-list.
    pub fn make(&self, attributes: Attributes) -> Result<DataBag> {
        DataBag::try_new(self.clone(), attributes)
    }
}

impl PartialEq for BagType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl fmt::Debug for BagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BagType").field(&self.0.name).finish()
    }
}

impl Default for BagType {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// Builder for [`BagType`].
#[derive(Debug)]
pub struct BagTypeBuilder {
    schema: BagSchema,
}

impl BagTypeBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            schema: BagSchema {
                name: name.into(),
                assignable: IndexSet::new(),
                magic_assignment: true,
                cast_unset_objects: false,
                casts: IndexMap::new(),
                rules: RuleSet::new(),
                pretty_json: false,
            },
        }
    }

    /// Restrict writes to the given keys.
    pub fn assignable<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema.assignable = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn magic_assignment(mut self, enabled: bool) -> Self {
        self.schema.magic_assignment = enabled;
        self
    }

    pub fn cast_unset_objects(mut self, enabled: bool) -> Self {
        self.schema.cast_unset_objects = enabled;
        self
    }

    pub fn cast(mut self, key: impl Into<String>, cast: CastType) -> Self {
        self.schema.casts.insert(key.into(), cast);
        self
    }

    pub fn rule(mut self, key: impl Into<String>, expression: impl Into<String>) -> Self {
        self.schema.rules.insert(key.into(), expression.into());
        self
    }

    pub fn rules<I, K, V>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.schema
            .rules
            .extend(rules.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn pretty_json(mut self, enabled: bool) -> Self {
        self.schema.pretty_json = enabled;
        self
    }

    pub fn build(self) -> BagType {
        BagType(Arc::new(self.schema))
    }
}

/// Lookup table from type name to [`BagType`], used to resolve
/// `dataobject:<name>` validation rules.
#[derive(Debug, Clone, Default)]
pub struct BagRegistry {
    types: HashMap<String, BagType>,
}

impl BagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a type under its full name. Replaces an earlier type of the same name.
    pub fn register(&mut self, bag_type: BagType) -> &mut Self {
        self.types.insert(bag_type.name().to_string(), bag_type);
        self
    }

    /// Builder-style variant of [`BagRegistry::register`].
    pub fn with(mut self, bag_type: BagType) -> Self {
        self.register(bag_type);
        self
    }

    pub fn resolve(&self, name: &str) -> Option<&BagType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Last `::`, `\` or `.` separated segment of a type name.
pub fn friendly_name(name: &str) -> &str {
    name.rsplit(|c: char| c == '\\' || c == '.' || c == ':')
        .find(|segment| !segment.is_empty())
        .unwrap_or(name)
}
