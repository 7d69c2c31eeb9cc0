//! Everything application code needs to map classes and drive the adapter.

pub use crate::{
    ClassMetadata, Configuration, Event, EventArgs, FieldValue, InMemoryObjectManager,
    JsonDriver, LifecycleBridge, LifecycleEventArgs, Mapped, MappedClass, ObjectAdapterManager,
    ObjectHandle, ObjectManager, ReferenceKind, SyncType, Value, manager_handle,
};
