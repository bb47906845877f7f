use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::injection::{BindingError, Container, Dependencies, Injector, Scope};

struct Database {
    url: String,
}

struct Repository {
    db: Arc<Database>,
}

#[test]
fn test_instance_and_provider_resolution() {
    let mut injector = Injector::new();
    injector
        .bind_instance("db", Database { url: "mem://".into() })
        .bind_provider("repo", &["db"], |deps: &Dependencies| {
            Ok(Repository { db: deps.get::<Database>("db")? })
        });

    let repo = injector.resolve("repo").unwrap().downcast::<Repository>().unwrap();

    assert_eq!(repo.db.url, "mem://");
    assert!(injector.contains("db"));
    assert!(!injector.contains("cache"));
    assert_eq!(injector.len(), 2);
}

#[test]
fn test_singleton_provider_runs_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut injector = Injector::new();
    injector.bind_provider("counter", &[], move |_: &Dependencies| {
        Ok(counter.fetch_add(1, Ordering::SeqCst))
    });

    let first = injector.resolve("counter").unwrap();
    let second = injector.resolve("counter").unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_transient_provider_runs_every_time() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut injector = Injector::new();
    injector.bind_scoped("ticket", &[], Scope::Transient, move |_: &Dependencies| {
        Ok(counter.fetch_add(1, Ordering::SeqCst))
    });

    injector.resolve("ticket").unwrap();
    injector.resolve("ticket").unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unbound_key_names_requester() {
    let mut injector = Injector::new();
    injector.bind_provider("repo", &["db"], |_: &Dependencies| Ok(()));

    assert_eq!(
        injector.resolve("repo").unwrap_err(),
        BindingError::Unbound { key: "db".into(), requested_by: Some("repo".into()) }
    );
    assert_eq!(
        injector.resolve("nothing").unwrap_err(),
        BindingError::Unbound { key: "nothing".into(), requested_by: None }
    );
}

#[test]
fn test_two_key_cycle_is_detected() {
    let mut injector = Injector::new();
    injector
        .bind_provider("a", &["b"], |_: &Dependencies| Ok(()))
        .bind_provider("b", &["a"], |_: &Dependencies| Ok(()));

    let err = injector.resolve("a").unwrap_err();

    assert_eq!(err, BindingError::Cycle { path: vec!["a".into(), "b".into(), "a".into()] });
    assert_eq!(err.to_string(), "Circular dependency detected: a -> b -> a");
}

#[test]
fn test_cycle_path_starts_at_reentered_key() {
    let mut injector = Injector::new();
    injector
        .bind_provider("root", &["x"], |_: &Dependencies| Ok(()))
        .bind_provider("x", &["y"], |_: &Dependencies| Ok(()))
        .bind_provider("y", &["x"], |_: &Dependencies| Ok(()));

    assert_eq!(
        injector.resolve("root").unwrap_err(),
        BindingError::Cycle { path: vec!["x".into(), "y".into(), "x".into()] }
    );
}

#[test]
fn test_self_dependency_is_a_cycle() {
    let mut injector = Injector::new();
    injector.bind_provider("loop", &["loop"], |_: &Dependencies| Ok(()));

    assert_eq!(
        injector.resolve("loop").unwrap_err(),
        BindingError::Cycle { path: vec!["loop".into(), "loop".into()] }
    );
}

#[test]
fn test_provider_failure_is_reported() {
    let mut injector = Injector::new();
    injector.bind_provider::<(), _>("broken", &[], |_: &Dependencies| Err("disk on fire".into()));

    assert_eq!(
        injector.resolve("broken").unwrap_err(),
        BindingError::Provider { key: "broken".into(), message: "disk on fire".into() }
    );
}

#[test]
fn test_rebinding_replaces_cached_singleton() {
    let mut injector = Injector::new();
    injector.bind_provider("name", &[], |_: &Dependencies| Ok("first".to_string()));
    let first = injector.resolve("name").unwrap().downcast::<String>().unwrap();

    injector.bind_provider("name", &[], |_: &Dependencies| Ok("second".to_string()));
    let second = injector.resolve("name").unwrap().downcast::<String>().unwrap();

    assert_eq!(*first, "first");
    assert_eq!(*second, "second");
}

#[test]
fn test_dependencies_typed_access() {
    let mut deps = Dependencies::new();
    deps.insert("count", Arc::new(3u32));

    assert_eq!(*deps.get::<u32>("count").unwrap(), 3);
    assert!(deps.get::<String>("count").is_err());
    assert!(deps.get::<u32>("other").is_err());
    assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["count"]);
}
