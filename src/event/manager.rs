use log::debug;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use super::{Event, EventArgs};
use crate::core::Result;

pub type Listener = Rc<dyn Fn(Event, &EventArgs<'_>) -> Result<()>>;

/// Global listener registry.
///
/// Listeners for an event run in registration order; the first error stops
/// the dispatch and is returned to the caller.
#[derive(Default)]
pub struct EventManager {
    listeners: HashMap<Event, Vec<Listener>>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one listener for several events.
    pub fn add_event_listener<F>(&mut self, events: &[Event], listener: F)
    where
        F: Fn(Event, &EventArgs<'_>) -> Result<()> + 'static,
    {
        let listener: Listener = Rc::new(listener);
        for event in events {
            self.listeners
                .entry(*event)
                .or_default()
                .push(Rc::clone(&listener));
        }
    }

    pub fn remove_event_listeners(&mut self, event: Event) {
        self.listeners.remove(&event);
    }

    pub fn has_listeners(&self, event: Event) -> bool {
        self.listeners
            .get(&event)
            .is_some_and(|listeners| !listeners.is_empty())
    }

    pub fn listener_count(&self, event: Event) -> usize {
        self.listeners.get(&event).map_or(0, Vec::len)
    }

    pub fn dispatch_event(&self, event: Event, args: &EventArgs<'_>) -> Result<()> {
        let Some(listeners) = self.listeners.get(&event) else {
            return Ok(());
        };

        debug!("Dispatching {} to {} listener(s)", event, listeners.len());
        for listener in listeners {
            listener(event, args)?;
        }
        Ok(())
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(event, listeners)| (event.as_str(), listeners.len()))
            .collect();
        counts.sort();
        f.debug_struct("EventManager")
            .field("listeners", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AdapterError;
    use crate::event::LoadClassMetadataEventArgs;
    use crate::mapping::ClassMetadata;
    use std::cell::RefCell;

    #[test]
    fn test_listener_registered_for_many_events() {
        let mut events = EventManager::new();
        events.add_event_listener(&[Event::OnClear, Event::PreFlushReference], |_, _| Ok(()));

        assert!(events.has_listeners(Event::OnClear));
        assert!(events.has_listeners(Event::PreFlushReference));
        assert!(!events.has_listeners(Event::PostFlushReference));
        assert_eq!(events.listener_count(Event::OnClear), 1);

        events.remove_event_listeners(Event::OnClear);
        assert!(!events.has_listeners(Event::OnClear));
    }

    #[test]
    fn test_dispatch_runs_in_order_and_stops_on_error() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events = EventManager::new();

        let first = Rc::clone(&seen);
        events.add_event_listener(&[Event::LoadClassMetadata], move |event, _| {
            first.borrow_mut().push(format!("first:{}", event));
            Ok(())
        });
        events.add_event_listener(&[Event::LoadClassMetadata], |_, _| {
            Err(AdapterError::Backend(anyhow::anyhow!("listener failed")))
        });
        let third = Rc::clone(&seen);
        events.add_event_listener(&[Event::LoadClassMetadata], move |_, _| {
            third.borrow_mut().push("third".to_string());
            Ok(())
        });

        let metadata = ClassMetadata::new("test::Empty", Vec::<String>::new());
        let args = EventArgs::LoadClassMetadata(LoadClassMetadataEventArgs::new(&metadata));
        let result = events.dispatch_event(Event::LoadClassMetadata, &args);

        assert!(matches!(result, Err(AdapterError::Backend(_))));
        assert_eq!(*seen.borrow(), vec!["first:loadClassMetadata".to_string()]);
    }
}
