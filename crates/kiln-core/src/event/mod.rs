pub mod types;

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

pub use types::ServerEvent;

/// Event priority level, used by the host to order listeners of one event
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum EventPriority {
    /// Lowest priority, notified last
    Low = 0,
    #[default]
    Normal = 1,
    High = 2,
    /// Notified before every other listener
    Critical = 3,
}

impl fmt::Display for EventPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EventPriority::Low => "low",
            EventPriority::Normal => "normal",
            EventPriority::High => "high",
            EventPriority::Critical => "critical",
        };
        f.write_str(name)
    }
}

/// Result of event processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    /// Propagation continues to the next listener
    Continue,
    /// Propagation stops after this listener
    Stop,
}

/// Core event trait
pub trait Event: Any + fmt::Debug + Send + Sync {
    /// Event type name listeners subscribe to, e.g. `"player.join"`
    fn name(&self) -> &str;

    /// Cast to Any for downcasting
    fn as_any(&self) -> &dyn Any;
}

/// A constructed listener object, registered with the host by the registrar.
pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &dyn Event) -> EventResult;
}

impl<F> EventListener for F
where
    F: Fn(&dyn Event) -> EventResult + Send + Sync,
{
    fn on_event(&self, event: &dyn Event) -> EventResult {
        self(event)
    }
}

/// Listener that only reacts to one concrete event type.
///
/// Events of any other type pass through with [`EventResult::Continue`].
pub struct TypedListener<E, F> {
    handler: F,
    _event: PhantomData<fn(&E)>,
}

impl<E, F> fmt::Debug for TypedListener<E, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedListener")
            .field("event", &std::any::type_name::<E>())
            .finish_non_exhaustive()
    }
}

impl<E, F> EventListener for TypedListener<E, F>
where
    E: Event,
    F: Fn(&E) -> EventResult + Send + Sync,
{
    fn on_event(&self, event: &dyn Event) -> EventResult {
        match event.as_any().downcast_ref::<E>() {
            Some(typed) => (self.handler)(typed),
            None => EventResult::Continue,
        }
    }
}

/// Helper function to create a listener for a single concrete event type
pub fn typed_listener<E, F>(handler: F) -> TypedListener<E, F>
where
    E: Event,
    F: Fn(&E) -> EventResult + Send + Sync,
{
    TypedListener {
        handler,
        _event: PhantomData,
    }
}

#[cfg(test)]
mod tests;
