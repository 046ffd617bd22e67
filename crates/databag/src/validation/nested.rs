//! The `dataobject:<type>` rule: validate an attribute as a nested bag.
//!
//! The value is used as is when it already is a bag of the named type.
//! Anything else is reduced to attributes (maps directly, lists by index,
//! bags of other types through their array form) and a bag of the named type
//! is built from them. The nested bag is then validated with the same
//! validator; its messages are copied into the parent run under
//! `<attribute>.<nested key>`.
//!
//! A value that cannot be reduced fails validation with its own message. A
//! type name missing from the registry, or a type that rejects the data on
//! construction, is a misconfigured rule and surfaces as
//! [`BagError::InvalidArgument`].

use tracing::debug;

use super::validator::{Rule, RuleContext};
use crate::cast::plain_attributes;
use crate::error::{BagError, Result};
use crate::schema::friendly_name;
use crate::value::Value;

const UNINTERPRETABLE: &str = "Value for :attribute could not be interpreted as :friendlydataobject";

pub(super) struct DataObjectRule;

impl Rule for DataObjectRule {
    fn passes(
        &self,
        ctx: &mut RuleContext<'_>,
        attribute: &str,
        value: Option<&Value>,
        params: &[String],
    ) -> Result<bool> {
        let Some(type_name) = params.first() else {
            return Ok(true);
        };
        let Some(value) = value.filter(|v| v.is_truthy()) else {
            return Ok(false);
        };

        let mut nested = match value {
            Value::Bag(bag) if bag.bag_type().name() == type_name.as_str() => (**bag).clone(),
            other => {
                let Some(attributes) = plain_attributes(other) else {
                    let message =
                        ctx.validator()
                            .make_replacements(UNINTERPRETABLE, attribute, self, params);
                    ctx.add_message(attribute, message);
                    return Ok(false);
                };

                let bag_type = ctx.validator().registry().resolve(type_name).ok_or_else(|| {
                    BagError::invalid_argument(format!(
                        "{} is not a validatable DataObject",
                        type_name
                    ))
                })?;

                bag_type.make(attributes).map_err(|err| {
                    BagError::invalid_argument_from(
                        format!("{} is not instantiable as a DataObject", type_name),
                        err,
                    )
                })?
            }
        };

        if nested.validate(ctx.validator())? {
            return Ok(true);
        }

        let messages = nested.messages(ctx.validator())?;
        debug!(
            attribute,
            bag_type = type_name.as_str(),
            messages = messages.len(),
            "Nested bag failed validation"
        );
        for (key, list) in &messages {
            for message in list {
                ctx.add_message(format!("{}.{}", attribute, key), message.clone());
            }
        }

        Ok(false)
    }

    fn message(&self, _: &RuleContext<'_>, _: Option<&Value>) -> String {
        "The :attribute must be a valid :friendlydataobject.".to_string()
    }

    fn replace(&self, message: String, params: &[String]) -> String {
        let name = params.first().map_or("", String::as_str);
        message
            .replace(":friendlydataobject", friendly_name(name))
            .replace(":dataobject", name)
    }
}
