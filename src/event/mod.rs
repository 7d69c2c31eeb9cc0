// ============================================================================
// Reference Lifecycle Events
// ============================================================================
//
// Typed event bus for the unit of work. Event names are a stable contract for
// listeners; payloads are typed per kind instead of being resolved by string.
//
// ============================================================================

pub mod args;
pub mod invoker;
pub mod manager;

pub use args::{EventArgs, LifecycleEventArgs, LoadClassMetadataEventArgs, ManagerEventArgs};
pub use invoker::{InvokeMask, ListenersInvoker};
pub use manager::{EventManager, Listener};

use std::fmt;
use std::str::FromStr;

use crate::core::MappingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Event {
    PreBindReference,
    PostBindReference,
    PostLoadReference,
    PreUpdateReference,
    PostUpdateReference,
    PreRemoveReference,
    PostRemoveReference,
    PreFlushReference,
    OnFlushReference,
    PostFlushReference,
    OnClear,
    LoadClassMetadata,
}

impl Event {
    pub const ALL: [Event; 12] = [
        Event::PreBindReference,
        Event::PostBindReference,
        Event::PostLoadReference,
        Event::PreUpdateReference,
        Event::PostUpdateReference,
        Event::PreRemoveReference,
        Event::PostRemoveReference,
        Event::PreFlushReference,
        Event::OnFlushReference,
        Event::PostFlushReference,
        Event::OnClear,
        Event::LoadClassMetadata,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Event::PreBindReference => "preBindReference",
            Event::PostBindReference => "postBindReference",
            Event::PostLoadReference => "postLoadReference",
            Event::PreUpdateReference => "preUpdateReference",
            Event::PostUpdateReference => "postUpdateReference",
            Event::PreRemoveReference => "preRemoveReference",
            Event::PostRemoveReference => "postRemoveReference",
            Event::PreFlushReference => "preFlushReference",
            Event::OnFlushReference => "onFlushReference",
            Event::PostFlushReference => "postFlushReference",
            Event::OnClear => "onClear",
            Event::LoadClassMetadata => "loadClassMetadata",
        }
    }

    /// Events fired per (object, reference field); only these accept
    /// per-class lifecycle callbacks.
    pub fn is_lifecycle(&self) -> bool {
        matches!(
            self,
            Event::PreBindReference
                | Event::PostBindReference
                | Event::PostLoadReference
                | Event::PreUpdateReference
                | Event::PostUpdateReference
                | Event::PreRemoveReference
                | Event::PostRemoveReference
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Event {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Event::ALL
            .iter()
            .copied()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| MappingError::InvalidLifecycleEvent(s.to_string()))
    }
}
