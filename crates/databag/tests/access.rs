use databag::test_utils::{CONTACT, MAGICLESS, RESTRICTED};
use databag::{attributes, Attributes, BagError, DataBag, Nested, Value};

#[test]
fn fresh_bag_reads_null_everywhere() {
    let mut bag = DataBag::new(CONTACT.clone(), Attributes::new());

    for key in ["name", "list", "anything"] {
        assert_eq!(bag.get(key).unwrap(), None);
        assert_eq!(bag[key], Value::Null);
        assert!(!bag.has(key));
    }
}

#[test]
fn set_values_read_back_in_assignment_order() {
    let mut bag = DataBag::new(CONTACT.clone(), Attributes::new());
    bag.set("b", "second").unwrap();
    bag.set("a", 1).unwrap();
    bag.assign("c", vec![1, 2]).unwrap();

    assert_eq!(bag.get("b").unwrap(), Some(&Value::from("second")));
    assert_eq!(bag["a"], Value::from(1));
    assert!(bag.has("c"));
    assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
}

#[test]
fn construction_initializes_attributes() {
    let bag = DataBag::new(
        CONTACT.clone(),
        attributes! { "name" => "initialized", "list" => vec!["a"] },
    );
    assert_eq!(bag.len(), 2);
    assert_eq!(bag["name"], Value::from("initialized"));
}

#[test]
fn mass_assignment_merges_and_clear_empties() {
    let mut bag = DataBag::default();
    bag.set_attributes(attributes! { "a" => 1, "b" => 2 }).unwrap();
    bag.set_attributes(attributes! { "a" => 3 }).unwrap();
    assert_eq!((bag["a"].to_int(), bag["b"].to_int()), (3, 2));

    bag.clear();
    assert_eq!(bag.len(), 0);
    assert_eq!(bag["a"], Value::Null);
    assert_eq!(bag["b"], Value::Null);
}

#[test]
fn allow_list_guards_every_write_style() {
    let mut bag = DataBag::new(RESTRICTED.clone(), Attributes::new());

    bag.set("name", "x").unwrap();
    assert!(matches!(
        bag.set("other", "x"),
        Err(BagError::UnassignableAttribute(_))
    ));
    assert!(matches!(
        bag.assign("other", "x"),
        Err(BagError::UnassignableAttribute(_))
    ));

    let err = bag
        .set_attributes(attributes! { "list" => vec![1], "other" => 1 })
        .unwrap_err();
    assert!(matches!(err, BagError::UnassignableAttribute(_)));
    assert!(!bag.has("list"));
    assert_eq!(bag.keys().collect::<Vec<_>>(), vec!["name"]);
}

#[test]
fn magicless_bag_refuses_property_writes() {
    let mut bag = DataBag::new(MAGICLESS.clone(), Attributes::new());

    bag.set("name", "ok").unwrap();
    let err = bag.assign("name", "x").unwrap_err();
    assert_eq!(err.to_string(), "Not allowed to assign value by magic");
    assert_eq!(bag.get("name").unwrap(), Some(&Value::from("ok")));
}

#[test]
fn in_place_list_updates() {
    let mut bag = DataBag::default();
    bag.set("array", vec!["testing 0"]).unwrap();

    bag.mutate("array", |value| {
        if let Some(list) = value.as_list_mut() {
            list.push(Value::from("testing 1"));
        }
    })
    .unwrap();
    if let Some(list) = bag.get_mut("array").unwrap().and_then(Value::as_list_mut) {
        list.push(Value::from("testing 2"));
    }

    assert_eq!(
        bag["array"],
        Value::from(vec!["testing 0", "testing 1", "testing 2"])
    );
}

#[test]
fn isset_and_unset() {
    let mut bag = DataBag::from(attributes! { "present" => "yes", "null" => Value::Null });
    assert!(bag.has("present"));
    assert!(!bag.has("null"));

    bag.unset("present");
    assert!(!bag.has("present"));
    assert_eq!(bag.len(), 1);
}

#[test]
fn counts_and_iterates() {
    let bag = DataBag::from(attributes! {
        "one" => "testing",
        "two" => 23,
        "three" => vec!["help", "me", "im", "trapped", "in", "a", "test", "factory"],
    });
    assert_eq!(bag.len(), 3);
    assert_eq!(bag.iter().count(), 3);
    assert_eq!((&bag).into_iter().next().map(|(k, _)| k.as_str()), Some("one"));
}

#[test]
fn dot_path_lookup() {
    let bag = DataBag::new(
        CONTACT.clone(),
        attributes! {
            "top" => "test",
            "contents" => DataBag::new(CONTACT.clone(), attributes! { "mass" => "testing", "assignment" => 2242 }),
            "more" => vec![DataBag::new(CONTACT.clone(), attributes! { "a" => "b" })],
            "array" => attributes! { "normal" => "nested" },
        },
    );

    assert!(matches!(bag.get_nested(None, Value::Null), Nested::Bag(b) if std::ptr::eq(b, &bag)));
    assert_eq!(bag.get_nested(Some("top"), Value::Null).into_value(), Value::from("test"));
    assert_eq!(
        bag.get_nested(Some("array.normal"), Value::Null).into_value(),
        Value::from("nested")
    );
    assert_eq!(
        bag.get_nested(Some("contents.mass"), Value::Null).into_value(),
        Value::from("testing")
    );
    assert_eq!(bag.get_nested(Some("more.0.a"), Value::Null).into_value(), Value::from("b"));
    assert_eq!(
        bag.get_nested(Some("more.1.4.3.hop"), Value::from("DEF")).into_value(),
        Value::from("DEF")
    );
    assert_eq!(
        bag.get_nested(Some("no.such.path"), Value::from("DEF")).into_value(),
        Value::from("DEF")
    );
}
