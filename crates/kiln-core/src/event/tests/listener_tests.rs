use std::any::Any;
use std::sync::{Arc, Mutex};

use crate::event::{typed_listener, Event, EventListener, EventResult, ServerEvent};

#[derive(Debug)]
struct Tick(u32);

impl Event for Tick {
    fn name(&self) -> &str {
        "server.tick"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[test]
fn test_closure_listener_receives_event() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = seen.clone();
    let listener = move |event: &dyn Event| {
        seen_clone.lock().unwrap().push(event.name().to_string());
        EventResult::Continue
    };

    let result = listener.on_event(&ServerEvent::new("player.join"));

    assert_eq!(result, EventResult::Continue);
    assert_eq!(*seen.lock().unwrap(), vec!["player.join".to_string()]);
}

#[test]
fn test_typed_listener_ignores_other_event_types() {
    let ticks = Arc::new(Mutex::new(0u32));
    let ticks_clone = ticks.clone();
    let listener = typed_listener(move |tick: &Tick| {
        *ticks_clone.lock().unwrap() += tick.0;
        EventResult::Stop
    });

    assert_eq!(listener.on_event(&Tick(5)), EventResult::Stop);
    assert_eq!(listener.on_event(&ServerEvent::new("server.tick")), EventResult::Continue);
    assert_eq!(*ticks.lock().unwrap(), 5);
}

#[test]
fn test_server_event_fields() {
    let event = ServerEvent::new("player.join")
        .with("player", "alex")
        .with("first_join", true);

    assert_eq!(event.name(), "player.join");
    assert_eq!(event.field::<String>("player").as_deref(), Some("alex"));
    assert_eq!(event.field::<bool>("first_join"), Some(true));
    assert_eq!(event.field::<u32>("player"), None);
    assert_eq!(event.field::<String>("missing"), None);
}
