//! # Validation
//!
//! Bags validate their own attributes against a [`RuleSet`]: a map from
//! attribute key to a rule expression such as `"required|string"`. The
//! rules come from the bag type, or from a per-instance override set with
//! [`DataBag::set_rules`].
//!
//! The engine that evaluates rules is passed in explicitly; anything
//! implementing [`ValidationEngine`] will do. [`Validator`] is the built-in
//! engine, including the `dataobject:<type>` rule that validates nested bags.
//!
//! ## Lifecycle
//!
//! ```text
//! Unvalidated --validate()--> Passed | Failed
//! ```
//!
//! [`DataBag::messages`] validates first when the bag is still unvalidated;
//! otherwise it reports the cached outcome. Writing to the bag does not reset
//! the outcome: call `validate()` again to refresh it.
//!
//! ## Example
//!
//! ```
//! use databag::{BagType, DataBag, Validator};
//!
//! let contact = BagType::builder("app::Contact")
//!     .rule("name", "required|string")
//!     .build();
//! let validator = Validator::new();
//!
//! let mut bag = contact.make(Default::default()).unwrap();
//! assert!(!bag.validate(&validator).unwrap());
//! assert_eq!(
//!     bag.messages(&validator).unwrap().first(),
//!     Some("The name field is required.")
//! );
//!
//! bag.set("name", "X").unwrap();
//! assert!(bag.validate(&validator).unwrap());
//! ```

mod builtin;
mod messages;
mod nested;
mod rules;
mod validator;

use indexmap::IndexMap;
use tracing::debug;

use crate::bag::DataBag;
use crate::error::Result;
use crate::value::{Attributes, Value};

pub use messages::MessageBag;
pub use rules::{parse_rules, required_param, RuleCall};
pub use validator::{display_attribute, Rule, RuleContext, Validator};

/// Rule expressions by attribute key, in declaration order.
pub type RuleSet = IndexMap<String, String>;

/// Evaluates rules against a set of attributes.
pub trait ValidationEngine {
    fn validate(&self, data: &Attributes, rules: &RuleSet) -> Result<ValidationOutcome>;
}

/// Result of one validation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationOutcome {
    messages: MessageBag,
}

impl ValidationOutcome {
    pub fn new(messages: MessageBag) -> Self {
        Self { messages }
    }

    /// True when the run recorded no messages.
    pub fn passed(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn failed(&self) -> bool {
        !self.passed()
    }

    pub fn messages(&self) -> &MessageBag {
        &self.messages
    }

    pub fn into_messages(self) -> MessageBag {
        self.messages
    }
}

impl DataBag {
    /// Validate the bag's attributes against its rules and cache the outcome.
    ///
    /// Returns whether validation passed. Rule failures are not errors; an
    /// `Err` means a rule was misconfigured.
    pub fn validate(&mut self, engine: &dyn ValidationEngine) -> Result<bool> {
        let data = self.validation_data();
        let outcome = engine.validate(&data, self.get_rules())?;
        let passed = outcome.passed();

        debug!(
            bag_type = self.bag_type.name(),
            rules = self.get_rules().len(),
            passed,
            "Validated bag"
        );

        self.outcome = Some(outcome);
        Ok(passed)
    }

    /// Messages of the last validation, validating first if there was none.
    ///
    /// Empty when validation passed.
    pub fn messages(&mut self, engine: &dyn ValidationEngine) -> Result<MessageBag> {
        if self.outcome.is_none() {
            self.validate(engine)?;
        }

        Ok(match &self.outcome {
            Some(outcome) if outcome.failed() => outcome.messages().clone(),
            _ => MessageBag::new(),
        })
    }

    /// The cached outcome, if the bag was validated.
    pub fn last_outcome(&self) -> Option<&ValidationOutcome> {
        self.outcome.as_ref()
    }

    /// The instance's rules, or the bag type's when none were set.
    pub fn get_rules(&self) -> &RuleSet {
        self.rules
            .as_ref()
            .unwrap_or_else(|| self.bag_type.schema().rules())
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = Some(rules);
    }

    /// Attributes as a reader sees them: scalar casts applied, nested bags kept.
    fn validation_data(&self) -> Attributes {
        let casts = self.bag_type.schema().casts();
        let mut data: Attributes = self
            .attributes
            .iter()
            .map(|(key, value)| {
                let value = casts
                    .get(key)
                    .and_then(|cast| cast.coerce(value))
                    .unwrap_or_else(|| value.clone());
                (key.clone(), value)
            })
            .collect();

        for (key, cast) in casts {
            if data.contains_key(key) {
                continue;
            }
            if let Some(coerced) = cast.coerce(&Value::Null) {
                data.insert(key.clone(), coerced);
            }
        }
        data
    }
}
