//! # DataBag
//!
//! A loosely-typed attribute bag: an ordered record of named values with a
//! small access facade, declarative casts, plain-data conversions, dot-path
//! lookups, and rule-based validation that recurses into nested bags.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  BagType (schema.rs)                                         │
//! │  - allow-list, magic flag, casts, rules, JSON formatting     │
//! │  - shared by every instance; resolved by name in a registry  │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  DataBag (bag.rs)                                            │
//! │  - ordered attributes + cached validation outcome            │
//! │  - get/set/assign/index, bulk and raw writes                 │
//! └──────────────────────────────────────────────────────────────┘
//!        │              │               │               │
//!        ▼              ▼               ▼               ▼
//!    cast.rs       convert.rs        path.rs      validation/
//!    lazy casts    array/JSON        dot paths    rules, engine,
//!                                                 nested bags
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use databag::{attributes, BagType, CastType, DataBag, Value};
//!
//! let contact = BagType::builder("app::Contact")
//!     .cast("age", CastType::Integer)
//!     .build();
//!
//! let mut bag = DataBag::new(contact, attributes! { "name" => "Ada" });
//! bag.set("age", "36").unwrap();
//!
//! assert_eq!(bag.get("age").unwrap(), Some(&Value::Int(36)));
//! assert_eq!(bag.to_json().unwrap(), r#"{"name":"Ada","age":36}"#);
//! ```
//!
//! ## Errors
//!
//! Misuse (writing a disallowed key, casting a scalar into a nested bag,
//! misconfigured rules) returns a [`BagError`]. Failed validation does not:
//! it is reported through [`DataBag::validate`] and [`DataBag::messages`].
//!
//! ## Logging
//!
//! The crate emits `tracing` events (nested-bag instantiation, validation
//! runs) and never installs a subscriber.

pub mod bag;
pub mod cast;
pub mod config;
pub mod convert;
pub mod error;
pub mod path;
pub mod schema;
pub mod validation;
pub mod value;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

pub use bag::DataBag;
pub use cast::CastType;
pub use config::DataBagConfig;
pub use convert::JsonOptions;
pub use error::{BagError, Result};
pub use path::{Nested, NestedDefault};
pub use schema::{BagRegistry, BagSchema, BagType, BagTypeBuilder};
pub use validation::{
    MessageBag, Rule, RuleContext, RuleSet, ValidationEngine, ValidationOutcome, Validator,
};
pub use value::{Arrayable, Attributes, Value};
