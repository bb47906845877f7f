use serde_json::json;

use crate::config::{ConfigData, ConfigFormat, MessageCatalog};

fn catalog(value: serde_json::Value) -> MessageCatalog {
    let data = ConfigData::deserialize(&value.to_string(), ConfigFormat::Json).unwrap();
    MessageCatalog::from_config(&data)
}

#[test]
fn test_format_with_values() {
    let messages = catalog(json!({ "greeter.greet": "{greeting}, {name}!" }));

    assert_eq!(
        messages.format("greeter.greet", [("greeting", "Hello"), ("name", "alex")]),
        "Hello, alex!"
    );
    assert_eq!(
        messages.format("greeter.greet", [("name", 7)]),
        "{greeting}, 7!"
    );
}

#[test]
fn test_missing_key_renders_the_key() {
    let messages = catalog(json!({}));
    assert!(messages.is_empty());
    assert_eq!(messages.format("greeter.unknown", Vec::<(&str, &str)>::new()), "greeter.unknown");
}

#[test]
fn test_nested_tables_flatten_to_dotted_keys() {
    let messages = catalog(json!({
        "greeter": {
            "greet": "Hi {name}",
            "help": ["greet <name>", "history"],
            "limit": 3
        }
    }));

    assert!(messages.contains("greeter.greet"));
    assert_eq!(messages.raw("greeter.help"), "greet <name>\nhistory");
    assert_eq!(messages.raw("greeter.limit"), "3");
    assert_eq!(messages.len(), 3);
}

#[test]
fn test_namespaced_placeholders_shadow_globals() {
    let messages = catalog(json!({
        "placeholder.prefix": "[{brand}]",
        "placeholder.brand": "Kiln",
        "greeter.placeholder.brand": "Greeter",
        "greeter.greet": "{prefix} Hello {name}",
        "admin.reload": "{prefix} reloaded"
    }));

    assert_eq!(messages.format("admin.reload", [("name", "x")]), "[Kiln] reloaded");
    // The namespace only overrides what it names; `prefix` was expanded globally.
    assert_eq!(messages.format("greeter.greet", [("name", "alex")]), "[Kiln] Hello alex");
    assert_eq!(
        messages.format("greeter.greet", [("name", "alex"), ("prefix", "!")]),
        "! Hello alex"
    );
}

#[test]
fn test_namespace_placeholders_see_globals() {
    let messages = catalog(json!({
        "placeholder.color": "gold",
        "shop.placeholder.tag": "<{color}>shop",
        "shop.buy": "{tag}: bought {item}"
    }));

    assert_eq!(messages.format("shop.buy", [("item", "bread")]), "<gold>shop: bought bread");
}

#[test]
fn test_escaped_braces_stay_literal() {
    let messages = catalog(json!({ "help.json": "Use {{\"name\": \"{name}\"}}" }));

    assert_eq!(messages.format("help.json", [("name", "alex")]), "Use {\"name\": \"alex\"}");
}

#[test]
fn test_cyclic_placeholders_stop_expanding() {
    let messages = catalog(json!({
        "placeholder.a": "<{b}>",
        "placeholder.b": "({a})",
        "loop.show": "{a}"
    }));

    let rendered = messages.format("loop.show", Vec::<(&str, &str)>::new());
    assert!(rendered.starts_with("<(<("), "{}", rendered);
    assert!(rendered.contains('{'), "{}", rendered);
}

#[test]
fn test_overrides_replace_single_messages() {
    let mut defaults = ConfigData::new();
    defaults.set("greeter", json!({ "greet": "Hello {name}", "bye": "Bye {name}" })).unwrap();
    let mut overrides = ConfigData::new();
    overrides.set("greeter", json!({ "greet": "Howdy {name}" })).unwrap();

    let messages = MessageCatalog::with_defaults(&defaults, &overrides);

    assert_eq!(messages.format("greeter.greet", [("name", "sam")]), "Howdy sam");
    assert_eq!(messages.format("greeter.bye", [("name", "sam")]), "Bye sam");
}

#[test]
fn test_reload_replaces_entries() {
    let mut messages = catalog(json!({ "a.one": "1" }));
    let mut data = ConfigData::new();
    data.set("a.two", "2").unwrap();

    messages.reload(&data);

    assert!(!messages.contains("a.one"));
    assert_eq!(messages.raw("a.two"), "2");
}
