//! The built-in validation engine.
//!
//! [`Validator`] evaluates a [`RuleSet`] against a set of attributes. Each
//! rule key may be a plain attribute name, a dot path into nested data
//! (`"address.city"`), or a pattern with `*` segments that expands to every
//! matching child (`"lines.*.amount"`).
//!
//! ## Evaluation
//!
//! For each attribute, the rules of its chain run in order:
//!
//! - Non-implicit rules are skipped when the attribute is absent or holds a
//!   blank string. `required` and `present` are implicit.
//! - `nullable` skips the non-implicit rules when the value is null.
//! - `sometimes` skips the whole chain when the attribute is absent.
//! - `bail` stops the chain at its first failure. A failed implicit rule
//!   always stops the chain.
//!
//! Every failure records one message under the attribute path. Templates can
//! be overridden per rule (`"required"`) or per attribute and rule
//! (`"name.required"`) with [`Validator::set_message`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::builtin;
use super::messages::MessageBag;
use super::rules::{parse_rules, RuleCall};
use super::{RuleSet, ValidationEngine, ValidationOutcome};
use crate::config::DataBagConfig;
use crate::error::{BagError, Result};
use crate::schema::BagRegistry;
use crate::value::{list_index, Attributes, Value};

/// Rules that steer a chain instead of checking the value.
const MARKERS: [&str; 3] = ["bail", "nullable", "sometimes"];

/// A single validation rule.
pub trait Rule: Send + Sync {
    /// Implicit rules also run for absent and blank attributes.
    fn implicit(&self) -> bool {
        false
    }

    fn passes(
        &self,
        ctx: &mut RuleContext<'_>,
        attribute: &str,
        value: Option<&Value>,
        params: &[String],
    ) -> Result<bool>;

    /// Message template recorded when the rule fails.
    fn message(&self, ctx: &RuleContext<'_>, value: Option<&Value>) -> String;

    /// Fill in rule-specific placeholders. `:attribute` is handled by the validator.
    fn replace(&self, message: String, _params: &[String]) -> String {
        message
    }
}

/// State shared by the rules of one validation run.
pub struct RuleContext<'a> {
    validator: &'a Validator,
    data: &'a Attributes,
    messages: &'a mut MessageBag,
    numeric: bool,
}

impl<'a> RuleContext<'a> {
    pub fn validator(&self) -> &'a Validator {
        self.validator
    }

    /// The full data set under validation.
    pub fn data(&self) -> &'a Attributes {
        self.data
    }

    /// Whether the chain being evaluated also carries `numeric` or `integer`.
    pub fn numeric(&self) -> bool {
        self.numeric
    }

    pub fn messages(&self) -> &MessageBag {
        &*self.messages
    }

    pub fn add_message(&mut self, attribute: impl Into<String>, message: impl Into<String>) {
        self.messages.add(attribute, message);
    }

    /// Run `expression` against the value at `attribute`, recording failures
    /// in this run's messages.
    pub fn validate_attribute(&mut self, attribute: &str, expression: &str) -> Result<bool> {
        let calls = parse_rules(expression)?;
        let validator = self.validator;
        validator.run_chain(self, attribute, &calls)
    }
}

/// Rule-based [`ValidationEngine`] with a Laravel-style vocabulary.
pub struct Validator {
    rules: HashMap<String, Arc<dyn Rule>>,
    messages: HashMap<String, String>,
    registry: BagRegistry,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_registry(BagRegistry::new())
    }

    /// A validator resolving `dataobject:<name>` rules through `registry`.
    pub fn with_registry(registry: BagRegistry) -> Self {
        let mut validator = Self {
            rules: HashMap::new(),
            messages: HashMap::new(),
            registry,
        };
        builtin::register(&mut validator);
        validator
    }

    /// A validator taking its message overrides from `config`.
    pub fn from_config(config: &DataBagConfig, registry: BagRegistry) -> Self {
        let mut validator = Self::with_registry(registry);
        for (key, template) in config.messages.iter().flatten() {
            validator.set_message(key.clone(), template.clone());
        }
        validator
    }

    /// Register `rule` under `name`, replacing any rule of that name.
    pub fn extend(&mut self, name: &str, rule: impl Rule + 'static) -> &mut Self {
        self.rules.insert(name.to_lowercase(), Arc::new(rule));
        self
    }

    /// Override a message template. `key` is a rule name, or
    /// `"<attribute>.<rule>"` for a single attribute.
    pub fn set_message(&mut self, key: impl Into<String>, template: impl Into<String>) -> &mut Self {
        self.messages.insert(key.into(), template.into());
        self
    }

    pub fn has_rule(&self, name: &str) -> bool {
        self.rules.contains_key(&name.to_lowercase()) || MARKERS.contains(&name)
    }

    pub fn registry(&self) -> &BagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BagRegistry {
        &mut self.registry
    }

    /// Substitute `:attribute` and `rule`'s own placeholders into `message`.
    pub fn make_replacements(
        &self,
        message: &str,
        attribute: &str,
        rule: &dyn Rule,
        params: &[String],
    ) -> String {
        let message = message.replace(":attribute", &display_attribute(attribute));
        rule.replace(message, params)
    }

    fn rule(&self, name: &str) -> Result<&Arc<dyn Rule>> {
        self.rules
            .get(name)
            .ok_or_else(|| BagError::invalid_argument(format!("Unknown validation rule '{}'", name)))
    }

    fn failure_message(
        &self,
        ctx: &RuleContext<'_>,
        call: &RuleCall,
        rule: &dyn Rule,
        attribute: &str,
        value: Option<&Value>,
    ) -> String {
        let template = self
            .messages
            .get(&format!("{}.{}", attribute, call.name))
            .or_else(|| self.messages.get(&call.name))
            .cloned()
            .unwrap_or_else(|| rule.message(ctx, value));
        self.make_replacements(&template, attribute, rule, &call.params)
    }

    fn run_chain(&self, ctx: &mut RuleContext<'_>, attribute: &str, calls: &[RuleCall]) -> Result<bool> {
        let data = ctx.data;
        let value = data_get(data, attribute);
        let has = |name: &str| calls.iter().any(|call| call.name == name);

        if has("sometimes") && value.is_none() {
            return Ok(true);
        }

        let numeric = has("numeric") || has("integer");
        let outer = std::mem::replace(&mut ctx.numeric, numeric);
        let result = self.run_calls(ctx, attribute, value, calls, has("nullable"), has("bail"));
        ctx.numeric = outer;
        result
    }

    fn run_calls(
        &self,
        ctx: &mut RuleContext<'_>,
        attribute: &str,
        value: Option<&Value>,
        calls: &[RuleCall],
        nullable: bool,
        bail: bool,
    ) -> Result<bool> {
        let mut passed = true;

        for call in calls {
            if MARKERS.contains(&call.name.as_str()) {
                continue;
            }
            let rule = self.rule(&call.name)?;

            if !rule.implicit() {
                let validatable = match value {
                    None => false,
                    Some(Value::String(text)) => !text.trim().is_empty(),
                    Some(_) => true,
                };
                if !validatable || (nullable && value.is_some_and(Value::is_null)) {
                    continue;
                }
            }

            if rule.passes(ctx, attribute, value, &call.params)? {
                continue;
            }

            passed = false;
            let message = self.failure_message(ctx, call, &**rule, attribute, value);
            ctx.add_message(attribute, message);

            if bail || rule.implicit() {
                break;
            }
        }

        Ok(passed)
    }
}

impl ValidationEngine for Validator {
    fn validate(&self, data: &Attributes, rules: &RuleSet) -> Result<ValidationOutcome> {
        let mut messages = MessageBag::new();
        {
            let mut ctx = RuleContext {
                validator: self,
                data,
                messages: &mut messages,
                numeric: false,
            };
            for (key, expression) in rules {
                let calls = parse_rules(expression)?;
                for attribute in expand_key(data, key) {
                    self.run_chain(&mut ctx, &attribute, &calls)?;
                }
            }
        }

        let outcome = ValidationOutcome::new(messages);
        debug!(
            rules = rules.len(),
            messages = outcome.messages().len(),
            passed = outcome.passed(),
            "Validated attributes"
        );
        Ok(outcome)
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rules: Vec<&str> = self.rules.keys().map(String::as_str).collect();
        rules.sort_unstable();
        f.debug_struct("Validator")
            .field("rules", &rules)
            .field("messages", &self.messages)
            .field("registry", &self.registry)
            .finish()
    }
}

/// Attribute name as shown in messages.
///
/// A dotted path names its element by the singular of the parent segment:
/// `"tags.1"` shows as `tag`, `"group.names.0"` as `name`.
pub fn display_attribute(attribute: &str) -> String {
    let segments: Vec<&str> = attribute.split('.').collect();
    let name = match segments.len() {
        0 | 1 => attribute.to_string(),
        len => singular(segments[len - 2]),
    };
    name.replace('_', " ")
}

fn singular(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        return format!("{}y", &word[..word.len() - 3]);
    }
    for suffix in ["sses", "shes", "ches", "xes", "zes"] {
        if lower.ends_with(suffix) {
            return word[..word.len() - 2].to_string();
        }
    }
    if lower.ends_with('s') && !lower.ends_with("ss") && !lower.ends_with("us") && word.len() > 1 {
        return word[..word.len() - 1].to_string();
    }
    word.to_string()
}

/// Value at `path`: a literal key first, then one segment at a time through
/// maps, lists and bags. `Some(Null)` means present but null.
pub(crate) fn data_get<'v>(data: &'v Attributes, path: &str) -> Option<&'v Value> {
    if let Some(value) = data.get(path) {
        return Some(value);
    }

    let mut segments = path.split('.');
    let mut current = data.get(segments.next()?)?;
    for segment in segments {
        current = child(current, segment)?;
    }
    Some(current)
}

fn child<'v>(value: &'v Value, key: &str) -> Option<&'v Value> {
    match value {
        Value::Map(map) => map.get(key),
        Value::List(items) => list_index(key).and_then(|index| items.get(index)),
        Value::Bag(bag) => bag.attributes().get(key),
        _ => None,
    }
}

fn child_keys(value: &Value) -> Vec<String> {
    match value {
        Value::Map(map) => map.keys().cloned().collect(),
        Value::List(items) => (0..items.len()).map(|index| index.to_string()).collect(),
        Value::Bag(bag) => bag.keys().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

/// Concrete attribute paths for a rule key. `*` segments expand to the
/// children present in `data`; a pattern matching nothing yields no paths.
pub(crate) fn expand_key(data: &Attributes, key: &str) -> Vec<String> {
    if !key.split('.').any(|segment| segment == "*") {
        return vec![key.to_string()];
    }

    let mut paths = vec![String::new()];
    for segment in key.split('.') {
        let mut next = Vec::new();
        for prefix in &paths {
            if segment != "*" {
                next.push(join_path(prefix, segment));
                continue;
            }
            let keys = if prefix.is_empty() {
                data.keys().cloned().collect()
            } else {
                data_get(data, prefix).map(child_keys).unwrap_or_default()
            };
            next.extend(keys.iter().map(|key| join_path(prefix, key)));
        }
        paths = next;
    }
    paths
}

fn join_path(prefix: &str, segment: &str) -> String {
    if prefix.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", prefix, segment)
    }
}
