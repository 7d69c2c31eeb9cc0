use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use super::{Event, EventArgs, EventManager, LifecycleEventArgs};
use crate::core::Result;
use crate::mapping::ClassMetadata;

/// Bitmask of the event systems subscribed to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct InvokeMask(u8);

impl InvokeMask {
    pub const NONE: InvokeMask = InvokeMask(0);
    pub const CALLBACKS: InvokeMask = InvokeMask(2);
    pub const MANAGER: InvokeMask = InvokeMask(4);

    pub fn bits(&self) -> u8 {
        self.0
    }

    pub fn contains(&self, other: InvokeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for InvokeMask {
    type Output = InvokeMask;

    fn bitor(self, rhs: InvokeMask) -> InvokeMask {
        InvokeMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for InvokeMask {
    fn bitor_assign(&mut self, rhs: InvokeMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for InvokeMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04b}", self.0)
    }
}

/// Decides which listener systems apply to an event and runs them.
pub struct ListenersInvoker<'a> {
    event_manager: &'a EventManager,
}

impl<'a> ListenersInvoker<'a> {
    pub fn new(event_manager: &'a EventManager) -> Self {
        Self { event_manager }
    }

    /// Lets callers skip building a payload when nothing listens.
    pub fn subscribed_systems(&self, metadata: &ClassMetadata, event: Event) -> InvokeMask {
        let mut invoke = InvokeMask::NONE;

        if metadata.has_lifecycle_callbacks(event) {
            invoke |= InvokeMask::CALLBACKS;
        }

        if self.event_manager.has_listeners(event) {
            invoke |= InvokeMask::MANAGER;
        }

        invoke
    }

    /// Class callbacks run before the global listeners.
    pub fn invoke(
        &self,
        metadata: &ClassMetadata,
        event: Event,
        args: &LifecycleEventArgs<'_>,
        invoke: InvokeMask,
    ) -> Result<()> {
        if invoke.contains(InvokeMask::CALLBACKS) {
            for callback in metadata.lifecycle_callbacks(event) {
                callback(args)?;
            }
        }

        if invoke.contains(InvokeMask::MANAGER) {
            self.event_manager
                .dispatch_event(event, &EventArgs::Lifecycle(*args))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_bits() {
        let mut mask = InvokeMask::NONE;
        assert!(mask.is_empty());

        mask |= InvokeMask::MANAGER;
        assert!(mask.contains(InvokeMask::MANAGER));
        assert!(!mask.contains(InvokeMask::CALLBACKS));

        let both = InvokeMask::CALLBACKS | InvokeMask::MANAGER;
        assert_eq!(both.bits(), 6);
    }

    #[test]
    fn test_subscribed_systems() {
        let mut events = EventManager::new();
        let mut metadata = ClassMetadata::new("test::Owner", Vec::<String>::new());
        metadata
            .add_lifecycle_callback(Event::PreBindReference, |_| Ok(()))
            .unwrap();
        events.add_event_listener(&[Event::PreRemoveReference], |_, _| Ok(()));

        let invoker = ListenersInvoker::new(&events);
        assert_eq!(
            invoker.subscribed_systems(&metadata, Event::PreBindReference),
            InvokeMask::CALLBACKS
        );
        assert_eq!(
            invoker.subscribed_systems(&metadata, Event::PreRemoveReference),
            InvokeMask::MANAGER
        );
        assert!(invoker
            .subscribed_systems(&metadata, Event::PostLoadReference)
            .is_empty());
    }
}
