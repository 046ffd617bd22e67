//! Built-in rule vocabulary.
//!
//! | Rule | Implicit | Passes when |
//! |------|----------|-------------|
//! | `required` | yes | present and not null, blank text, or an empty container |
//! | `present` | yes | the key exists, whatever its value |
//! | `string` | | text |
//! | `integer` | | an integer, or text/float holding one |
//! | `numeric` | | a number, or numeric text |
//! | `boolean` | | `true`, `false`, `0`, `1`, `"0"`, `"1"` |
//! | `array` | | a list or map |
//! | `min:n` / `max:n` | | size within bound (see below) |
//! | `in:a,b,..` | | text form is one of the listed values |
//! | `each:rule,..` | | a list or map; `rule` is applied to every element |
//! | `dataobject:T` | | a valid nested bag of type `T` |
//!
//! Size is the numeric value when the chain also carries `numeric` or
//! `integer`, the element count for containers, and the character count of
//! the text form otherwise.

use super::nested::DataObjectRule;
use super::rules::{required_param, RuleCall};
use super::validator::{Rule, RuleContext, Validator};
use crate::error::{BagError, Result};
use crate::value::{is_numeric_str, Value};

pub(super) fn register(validator: &mut Validator) {
    validator
        .extend("required", Required)
        .extend("present", Present)
        .extend("string", StringRule)
        .extend("integer", Integer)
        .extend("numeric", Numeric)
        .extend("boolean", Boolean)
        .extend("array", ArrayRule)
        .extend("min", Min)
        .extend("max", Max)
        .extend("in", In)
        .extend("each", Each)
        .extend("dataobject", DataObjectRule);
}

struct Required;

impl Rule for Required {
    fn implicit(&self) -> bool {
        true
    }

    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(value.is_some_and(|v| !is_blank(v)))
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute field is required.".to_string()
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(text) => text.trim().is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        Value::Bag(bag) => bag.is_empty(),
        Value::Bool(_) | Value::Int(_) | Value::Float(_) => false,
    }
}

struct Present;

impl Rule for Present {
    fn implicit(&self) -> bool {
        true
    }

    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(value.is_some())
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute field must be present.".to_string()
    }
}

struct StringRule;

impl Rule for StringRule {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(matches!(value, Some(Value::String(_))))
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be a string.".to_string()
    }
}

struct Integer;

impl Rule for Integer {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(match value {
            Some(Value::Int(_)) => true,
            Some(Value::Float(v)) => v.is_finite() && v.fract() == 0.0,
            Some(Value::String(text)) => text.trim().parse::<i64>().is_ok(),
            _ => false,
        })
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be an integer.".to_string()
    }
}

struct Numeric;

impl Rule for Numeric {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(value.is_some_and(is_numeric))
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be a number.".to_string()
    }
}

fn is_numeric(value: &Value) -> bool {
    match value {
        Value::Int(_) => true,
        Value::Float(v) => v.is_finite(),
        Value::String(text) => is_numeric_str(text),
        _ => false,
    }
}

struct Boolean;

impl Rule for Boolean {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(match value {
            Some(Value::Bool(_)) | Some(Value::Int(0 | 1)) => true,
            Some(Value::String(text)) => text == "0" || text == "1",
            _ => false,
        })
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute field must be true or false.".to_string()
    }
}

struct ArrayRule;

impl Rule for ArrayRule {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, _: &[String]) -> Result<bool> {
        Ok(value.is_some_and(Value::is_array))
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be an array.".to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SizeKind {
    Numeric,
    Items,
    Characters,
}

fn size(ctx: &RuleContext<'_>, value: &Value) -> (SizeKind, f64) {
    match value {
        Value::Int(_) | Value::Float(_) if ctx.numeric() => (SizeKind::Numeric, value.to_float()),
        Value::String(text) if ctx.numeric() && is_numeric_str(text) => {
            (SizeKind::Numeric, value.to_float())
        }
        Value::List(items) => (SizeKind::Items, items.len() as f64),
        Value::Map(map) => (SizeKind::Items, map.len() as f64),
        Value::Bag(bag) => (SizeKind::Items, bag.len() as f64),
        other => (SizeKind::Characters, other.to_text().chars().count() as f64),
    }
}

fn size_kind(ctx: &RuleContext<'_>, value: Option<&Value>) -> SizeKind {
    value.map_or(SizeKind::Characters, |v| size(ctx, v).0)
}

fn limit(rule: &str, params: &[String]) -> Result<f64> {
    let param = required_param(rule, params)?;
    param.trim().parse::<f64>().map_err(|_| {
        BagError::invalid_argument(format!(
            "Validation rule {} requires a numeric parameter, got '{}'",
            rule, param
        ))
    })
}

struct Min;

impl Rule for Min {
    fn passes(&self, ctx: &mut RuleContext<'_>, _: &str, value: Option<&Value>, params: &[String]) -> Result<bool> {
        let min = limit("min", params)?;
        Ok(value.is_some_and(|v| size(ctx, v).1 >= min))
    }

    fn message(&self, ctx: &RuleContext<'_>, value: Option<&Value>) -> String {
        match size_kind(ctx, value) {
            SizeKind::Numeric => "The :attribute must be at least :min.",
            SizeKind::Items => "The :attribute must have at least :min items.",
            SizeKind::Characters => "The :attribute must be at least :min characters.",
        }
        .to_string()
    }

    fn replace(&self, message: String, params: &[String]) -> String {
        message.replace(":min", params.first().map_or("", String::as_str))
    }
}

struct Max;

impl Rule for Max {
    fn passes(&self, ctx: &mut RuleContext<'_>, _: &str, value: Option<&Value>, params: &[String]) -> Result<bool> {
        let max = limit("max", params)?;
        Ok(value.is_some_and(|v| size(ctx, v).1 <= max))
    }

    fn message(&self, ctx: &RuleContext<'_>, value: Option<&Value>) -> String {
        match size_kind(ctx, value) {
            SizeKind::Numeric => "The :attribute must not be greater than :max.",
            SizeKind::Items => "The :attribute must not have more than :max items.",
            SizeKind::Characters => "The :attribute must not be greater than :max characters.",
        }
        .to_string()
    }

    fn replace(&self, message: String, params: &[String]) -> String {
        message.replace(":max", params.first().map_or("", String::as_str))
    }
}

struct In;

impl Rule for In {
    fn passes(&self, _: &mut RuleContext<'_>, _: &str, value: Option<&Value>, params: &[String]) -> Result<bool> {
        let listed = |v: &Value| {
            let text = v.to_text();
            params.iter().any(|param| *param == text)
        };
        Ok(match value {
            Some(Value::List(items)) => items.iter().all(listed),
            Some(Value::Map(map)) => map.values().all(listed),
            Some(other) => listed(other),
            None => false,
        })
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The selected :attribute is invalid.".to_string()
    }

    fn replace(&self, message: String, params: &[String]) -> String {
        message.replace(":values", &params.join(", "))
    }
}

/// `each:rule,param,..` runs `rule:param,..` against every element, with
/// failures reported under `attribute.<index>`.
struct Each;

impl Rule for Each {
    fn passes(
        &self,
        ctx: &mut RuleContext<'_>,
        attribute: &str,
        value: Option<&Value>,
        params: &[String],
    ) -> Result<bool> {
        let rule = required_param("each", params)?;
        let expression = RuleCall::new(rule, params[1..].to_vec()).to_string();

        let keys: Vec<String> = match value {
            Some(Value::List(items)) => (0..items.len()).map(|index| index.to_string()).collect(),
            Some(Value::Map(map)) => map.keys().cloned().collect(),
            _ => return Ok(false),
        };

        for key in keys {
            ctx.validate_attribute(&format!("{}.{}", attribute, key), &expression)?;
        }

        // Element failures carry their own messages
        Ok(true)
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be an array.".to_string()
    }
}

#[cfg(test)]
mod tests {
    use crate::attributes;
    use crate::validation::{RuleSet, ValidationEngine, Validator};
    use crate::value::{Attributes, Value};

    fn first_message(data: Attributes, key: &str, expression: &str) -> Option<String> {
        let rules: RuleSet = [(key.to_string(), expression.to_string())].into_iter().collect();
        let outcome = Validator::new().validate(&data, &rules).unwrap();
        outcome.messages().first_for(key).map(str::to_string)
    }

    #[test]
    fn in_substitutes_allowed_values() {
        let mut validator = Validator::new();
        validator.set_message("in", "The :attribute must be one of: :values.");
        let rules: RuleSet = [("status".to_string(), "in:draft, published".to_string())]
            .into_iter()
            .collect();

        let outcome = validator
            .validate(&attributes! { "status" => "archived" }, &rules)
            .unwrap();
        assert_eq!(
            outcome.messages().first(),
            Some("The status must be one of: draft, published.")
        );
    }

    #[test]
    fn required_rejects_blank_values() {
        for blank in [
            Value::Null,
            Value::from("   "),
            Value::List(vec![]),
            Value::Map(Attributes::new()),
        ] {
            assert!(
                first_message(attributes! { "a" => blank.clone() }, "a", "required").is_some(),
                "{:?} should be blank",
                blank
            );
        }
        assert!(first_message(attributes! { "a" => 0 }, "a", "required").is_none());
        assert!(first_message(attributes! { "a" => false }, "a", "required").is_none());
    }

    #[test]
    fn present_only_needs_the_key() {
        assert!(first_message(attributes! { "a" => Value::Null }, "a", "present").is_none());
        assert_eq!(
            first_message(attributes! {}, "a", "present").as_deref(),
            Some("The a field must be present.")
        );
    }

    #[test]
    fn integer_accepts_integral_text_and_floats() {
        assert!(first_message(attributes! { "n" => " 42 " }, "n", "integer").is_none());
        assert!(first_message(attributes! { "n" => 4.0 }, "n", "integer").is_none());
        assert!(first_message(attributes! { "n" => 4.5 }, "n", "integer").is_some());
        assert!(first_message(attributes! { "n" => "4x" }, "n", "integer").is_some());
    }

    #[test]
    fn numeric_accepts_numeric_text() {
        assert!(first_message(attributes! { "n" => "1e3" }, "n", "numeric").is_none());
        assert_eq!(
            first_message(attributes! { "n" => "one" }, "n", "numeric").as_deref(),
            Some("The n must be a number.")
        );
    }

    #[test]
    fn boolean_accepts_loose_flags() {
        for ok in [Value::from(true), Value::from(0), Value::from("1")] {
            assert!(first_message(attributes! { "f" => ok }, "f", "boolean").is_none());
        }
        assert_eq!(
            first_message(attributes! { "f" => "yes" }, "f", "boolean").as_deref(),
            Some("The f field must be true or false.")
        );
    }

    #[test]
    fn min_treats_numbers_as_text_without_numeric_rule() {
        // "12345" has five characters
        assert!(first_message(attributes! { "n" => 12345 }, "n", "min:5").is_none());
        assert!(first_message(attributes! { "n" => 12345 }, "n", "numeric|min:20000").is_some());
    }

    #[test]
    fn in_lists_accepted_values() {
        assert!(first_message(attributes! { "s" => "draft" }, "s", "in:draft,published").is_none());
        assert!(first_message(attributes! { "s" => vec!["draft", "x"] }, "s", "array|in:draft").is_some());
    }

    #[test]
    fn min_without_parameter_is_an_error() {
        let rules: RuleSet = [("a".to_string(), "min".to_string())].into_iter().collect();
        assert!(Validator::new()
            .validate(&attributes! { "a" => "text" }, &rules)
            .is_err());
    }

    #[test]
    fn each_validates_elements() {
        let rules: RuleSet = [(
            "array".to_string(),
            "array|each:string|each:min,5".to_string(),
        )]
        .into_iter()
        .collect();
        let data = attributes! { "array" => vec![Value::from("long enough"), Value::from(3), Value::from("ab")] };

        let outcome = Validator::new().validate(&data, &rules).unwrap();
        let messages = outcome.messages();

        assert!(!messages.has("array"));
        assert!(!messages.has("array.0"));
        assert_eq!(
            messages.get("array.1"),
            [
                "The array must be a string.".to_string(),
                "The array must be at least 5 characters.".to_string(),
            ]
        );
        assert_eq!(
            messages.first_for("array.2"),
            Some("The array must be at least 5 characters.")
        );
    }

    #[test]
    fn each_fails_for_non_arrays() {
        assert_eq!(
            first_message(attributes! { "tags" => "solo" }, "tags", "each:string").as_deref(),
            Some("The tags must be an array.")
        );
    }
}
