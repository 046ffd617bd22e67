//! Rule expression parsing.
//!
//! An expression is a `|`-separated chain of rules; each rule is a name,
//! optionally followed by `:` and comma-separated parameters:
//!
//! ```text
//! required|string|min:3|in:draft,published
//! ```
//!
//! Rule names are case-insensitive and normalized to lowercase.

use std::fmt;
use std::str::FromStr;

use crate::error::{BagError, Result};

/// One parsed rule: a name and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleCall {
    pub name: String,
    pub params: Vec<String>,
}

impl RuleCall {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
        }
    }

    /// The first parameter, or an error naming the rule.
    pub fn require_param(&self) -> Result<&str> {
        required_param(&self.name, &self.params)
    }
}

/// The first of `params`, or an error naming `rule`.
pub fn required_param<'p>(rule: &str, params: &'p [String]) -> Result<&'p str> {
    params.first().map(String::as_str).ok_or_else(|| {
        BagError::invalid_argument(format!(
            "Validation rule {} requires at least 1 parameters.",
            rule
        ))
    })
}

impl FromStr for RuleCall {
    type Err = BagError;

    fn from_str(s: &str) -> Result<Self> {
        let (name, params) = match s.split_once(':') {
            Some((name, params)) => (name, Some(params)),
            None => (s, None),
        };

        let name = name.trim().to_lowercase();
        if name.is_empty() {
            return Err(BagError::invalid_argument(format!(
                "Rule '{}' has no name",
                s
            )));
        }

        let params = match params {
            Some(params) if !params.is_empty() => {
                params.split(',').map(|p| p.trim().to_string()).collect()
            }
            _ => Vec::new(),
        };

        Ok(RuleCall { name, params })
    }
}

impl fmt::Display for RuleCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.params.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.name, self.params.join(","))
        }
    }
}

/// Parse a full rule expression. Empty segments (`"required||string"`) are skipped.
pub fn parse_rules(expression: &str) -> Result<Vec<RuleCall>> {
    expression
        .split('|')
        .filter(|segment| !segment.trim().is_empty())
        .map(str::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_chain() {
        let calls = parse_rules("required|string|min:3").unwrap();
        assert_eq!(
            calls,
            vec![
                RuleCall::new("required", vec![]),
                RuleCall::new("string", vec![]),
                RuleCall::new("min", vec!["3".into()]),
            ]
        );
    }

    #[test]
    fn splits_parameters_on_commas() {
        let call: RuleCall = "in:draft, published,archived".parse().unwrap();
        assert_eq!(call.params, vec!["draft", "published", "archived"]);
    }

    #[test]
    fn keeps_type_paths_in_parameters() {
        let call: RuleCall = "dataObject:app::fixtures::Contact".parse().unwrap();
        assert_eq!(call.name, "dataobject");
        assert_eq!(call.params, vec!["app::fixtures::Contact"]);
    }

    #[test]
    fn skips_empty_segments() {
        assert_eq!(parse_rules("required||string|").unwrap().len(), 2);
        assert!(parse_rules("").unwrap().is_empty());
    }

    #[test]
    fn rejects_nameless_rule() {
        assert!(matches!(
            parse_rules("required|:5"),
            Err(BagError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn displays_back_to_expression() {
        let call: RuleCall = "min:5".parse().unwrap();
        assert_eq!(call.to_string(), "min:5");
        assert_eq!(RuleCall::new("string", vec![]).to_string(), "string");
    }

    #[test]
    fn missing_parameter_is_an_error() {
        let call: RuleCall = "min".parse().unwrap();
        let err = call.require_param().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation rule min requires at least 1 parameters."
        );
    }
}
