// ============================================================================
// object_adapter Library
// ============================================================================
//
// Keeps object pairs consistent across two persistence managers: an object
// owned by one store and the counterpart(s) it references in another. The
// unit of work binds counterparts through the manager serving each reference
// field, mirrors common fields between the two sides, and flushes the pending
// work once per manager.
//
// ============================================================================

extern crate self as object_adapter;

pub mod config;
pub mod core;
pub mod event;
pub mod facade;
pub mod manager;
pub mod mapping;
pub mod prelude;
pub mod unit_of_work;

pub use crate::config::{Configuration, DEFAULT_MANAGER_NAME};
pub use crate::core::{
    AdapterError, ConfigurationError, FieldValue, Mapped, MappedClass, MappingError, ObjectHandle,
    ObjectId, Result, UnitOfWorkError, Value,
};
pub use event::{
    Event, EventArgs, EventManager, InvokeMask, LifecycleEventArgs, ListenersInvoker,
    LoadClassMetadataEventArgs, ManagerEventArgs,
};
pub use facade::{LifecycleBridge, ObjectAdapterManager};
pub use manager::{InMemoryObjectManager, ManagerCall, ManagerHandle, ObjectManager, manager_handle};
pub use mapping::{
    ClassMetadata, ClassMetadataFactory, CommonFieldMapping, JsonDriver, RawCommonFieldMapping,
    RawReferenceMapping, ReferenceKind, ReferenceMapping, SyncType,
};
pub use unit_of_work::{ObjectState, ScheduleKind, ScheduledReference, UnitOfWork};

pub use object_adapter_derive::Mapped;
