//! Fixture bag types shared by unit and integration tests.

use once_cell::sync::Lazy;

use crate::cast::CastType;
use crate::schema::{BagRegistry, BagType};
use crate::validation::Validator;

/// Plain bag with `name` and `list` rules.
pub static CONTACT: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::Contact")
        .rule("name", "required|string")
        .rule("list", "array|min:1")
        .build()
});

/// Requires a valid nested `Contact` under `nested`; `more` is optional.
pub static ENVELOPE: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::Envelope")
        .rule("nested", "required|dataobject:fixtures::Contact")
        .rule("more", "dataobject:fixtures::Contact")
        .build()
});

/// Validates `nested` against a type that is never registered.
pub static BROKEN_ENVELOPE: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::BrokenEnvelope")
        .rule("nested", "required|dataobject:fixtures::NotABag")
        .build()
});

/// One cast of every kind.
pub static TYPED: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::Typed")
        .cast("bool", CastType::Boolean)
        .cast("int", CastType::Integer)
        .cast("float", CastType::Float)
        .cast("string", CastType::String)
        .cast("array", CastType::Array)
        .cast("object", CastType::Bag(CONTACT.clone()))
        .cast("objects", CastType::BagList(CONTACT.clone()))
        .build()
});

/// Nested-bag casts that materialize empty bags for null.
pub static TYPED_WITH_DEFAULTS: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::TypedWithDefaults")
        .cast_unset_objects(true)
        .cast("object", CastType::Bag(CONTACT.clone()))
        .cast("objects", CastType::BagList(CONTACT.clone()))
        .build()
});

/// Element-wise list validation.
pub static TAG_LIST: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::TagList")
        .rule("array", "array|each:string|each:min,5")
        .build()
});

/// Only `name` and `list` may be written.
pub static RESTRICTED: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::Restricted")
        .assignable(["name", "list"])
        .build()
});

/// Property/index-style writes disabled.
pub static MAGICLESS: Lazy<BagType> = Lazy::new(|| {
    BagType::builder("fixtures::Magicless")
        .magic_assignment(false)
        .build()
});

/// Registry holding every fixture type (`BROKEN_ENVELOPE`'s target excluded).
pub fn registry() -> BagRegistry {
    BagRegistry::new()
        .with(CONTACT.clone())
        .with(ENVELOPE.clone())
        .with(BROKEN_ENVELOPE.clone())
        .with(TYPED.clone())
        .with(TYPED_WITH_DEFAULTS.clone())
        .with(TAG_LIST.clone())
        .with(RESTRICTED.clone())
        .with(MAGICLESS.clone())
}

/// Built-in validator over [`registry`].
pub fn validator() -> Validator {
    Validator::with_registry(registry())
}
