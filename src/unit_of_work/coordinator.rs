use indexmap::IndexMap;
use log::{debug, warn};
use std::collections::HashMap;
use std::rc::Rc;

use super::{ObjectState, ReferenceSchedule, ScheduleKey, ScheduleKind, ScheduledReference};
use crate::config::Configuration;
use crate::core::{MappingError, ObjectHandle, ObjectId, Result, UnitOfWorkError};
use crate::event::{
    Event, EventArgs, EventManager, LifecycleEventArgs, ListenersInvoker, ManagerEventArgs,
};
use crate::manager::{ManagerHandle, ManagerId};
use crate::mapping::{ClassMetadata, ClassMetadataFactory, ReferenceMapping, SyncType};

/// A reference field ready to be bound: mapping, counterpart and its manager.
struct PendingReference<'m> {
    mapping: &'m ReferenceMapping,
    referenced: ObjectHandle,
    manager: ManagerHandle,
}

/// Cross-manager unit of work.
///
/// Tracks root objects and their counterparts, hands each counterpart to the
/// manager serving its reference field, mirrors common fields, and batches the
/// pending work per manager until [`commit`](Self::commit).
///
/// One instance serves one logical transaction. After a downstream failure the
/// schedule may hold entries whose manager never flushed; discard the unit of
/// work (or [`clear`](Self::clear) it) instead of committing again.
pub struct UnitOfWork {
    configuration: Configuration,
    metadata_factory: ClassMetadataFactory,
    event_manager: EventManager,

    /// Root objects: persisted, removed or loaded here.
    managed_objects: HashMap<ObjectId, ObjectHandle>,

    /// Counterparts scheduled or loaded here.
    referenced_objects: HashMap<ObjectId, ObjectHandle>,

    schedule: ReferenceSchedule,

    /// Managers called since the last clear, in first-use order.
    touched_managers: IndexMap<ManagerId, ManagerHandle>,
}

impl UnitOfWork {
    pub fn new(
        configuration: Configuration,
        metadata_factory: ClassMetadataFactory,
        event_manager: EventManager,
    ) -> Self {
        Self {
            configuration,
            metadata_factory,
            event_manager,
            managed_objects: HashMap::new(),
            referenced_objects: HashMap::new(),
            schedule: ReferenceSchedule::new(),
            touched_managers: IndexMap::new(),
        }
    }

    // ========================================================================
    // Collaborators
    // ========================================================================

    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        &mut self.configuration
    }

    pub fn metadata_factory(&self) -> &ClassMetadataFactory {
        &self.metadata_factory
    }

    pub fn metadata_factory_mut(&mut self) -> &mut ClassMetadataFactory {
        &mut self.metadata_factory
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.event_manager
    }

    pub fn event_manager_mut(&mut self) -> &mut EventManager {
        &mut self.event_manager
    }

    pub fn get_class_metadata(&self, class_name: &str) -> Result<Rc<ClassMetadata>> {
        self.metadata_factory.get_metadata_for(class_name)
    }

    fn metadata_for(&self, object: &ObjectHandle) -> Result<Rc<ClassMetadata>> {
        let class_name = object.class_name()?;
        self.metadata_factory.get_metadata_for(class_name)
    }

    // ========================================================================
    // Reference resolution
    // ========================================================================

    /// Manager responsible for the counterpart held in `field` of `object`.
    pub fn get_manager(&self, object: &ObjectHandle, field: &str) -> Result<ManagerHandle> {
        let metadata = self.metadata_for(object)?;
        let mapping =
            metadata
                .referenced_object(field)
                .ok_or_else(|| MappingError::NoReferenceMapping {
                    class: metadata.name().to_string(),
                    field: field.to_string(),
                })?;
        self.manager_for(mapping)
    }

    fn manager_for(&self, mapping: &ReferenceMapping) -> Result<ManagerHandle> {
        self.configuration
            .get_manager_by_reference_type(mapping.kind, &mapping.manager)
    }

    fn touch_manager(&mut self, manager: &ManagerHandle) {
        self.touched_managers
            .entry(ManagerId::of(manager))
            .or_insert_with(|| Rc::clone(manager));
    }

    // ========================================================================
    // State
    // ========================================================================

    pub fn object_state(&self, object: &ObjectHandle) -> ObjectState {
        let id = object.id();
        if self.managed_objects.contains_key(&id) {
            ObjectState::Managed
        } else if self.referenced_objects.contains_key(&id) {
            ObjectState::Referenced
        } else {
            ObjectState::New
        }
    }

    pub fn is_managed(&self, object: &ObjectHandle) -> bool {
        self.managed_objects.contains_key(&object.id())
    }

    pub fn is_referenced(&self, object: &ObjectHandle) -> bool {
        self.referenced_objects.contains_key(&object.id())
    }

    pub fn managed_objects(&self) -> impl Iterator<Item = &ObjectHandle> {
        self.managed_objects.values()
    }

    pub fn referenced_objects(&self) -> impl Iterator<Item = &ObjectHandle> {
        self.referenced_objects.values()
    }

    pub fn scheduled_references_for_insert(&self) -> &IndexMap<ScheduleKey, ScheduledReference> {
        self.schedule.list(ScheduleKind::Insert)
    }

    pub fn scheduled_references_for_update(&self) -> &IndexMap<ScheduleKey, ScheduledReference> {
        self.schedule.list(ScheduleKind::Update)
    }

    pub fn scheduled_references_for_remove(&self) -> &IndexMap<ScheduleKey, ScheduledReference> {
        self.schedule.list(ScheduleKind::Remove)
    }

    /// The schedule list holding `(object, field)`, if any.
    pub fn scheduled_kind(&self, object: &ObjectHandle, field: &str) -> Option<ScheduleKind> {
        self.schedule.scheduled_kind(object.id(), field)
    }

    // ========================================================================
    // Persist / remove / load
    // ========================================================================

    /// Bind every counterpart of `object`: a first persist as a root schedules
    /// inserts, later ones schedule updates.
    ///
    /// An object tracked only as another object's counterpart has never been a
    /// root here, so its own reference fields take the insert path.
    pub fn persist(&mut self, object: &ObjectHandle) -> Result<()> {
        let metadata = self.metadata_for(object)?;

        let kind = match self.object_state(object) {
            ObjectState::New | ObjectState::Referenced => ScheduleKind::Insert,
            ObjectState::Managed => ScheduleKind::Update,
        };
        self.bind_references(object, &metadata, kind)
    }

    /// Hand every populated counterpart of `object` to its manager for removal.
    /// Empty reference fields are skipped.
    pub fn remove(&mut self, object: &ObjectHandle) -> Result<()> {
        let metadata = self.metadata_for(object)?;
        let class_name = metadata.name();

        let mut pending = Vec::new();
        for mapping in metadata.referenced_objects() {
            let Some(referenced) = object.read()?.reference(&mapping.field_name)? else {
                debug!(
                    "{}::{} holds no referenced object, nothing to remove",
                    class_name, mapping.field_name
                );
                continue;
            };

            self.schedule.ensure_schedulable(
                class_name,
                object.id(),
                &mapping.field_name,
                ScheduleKind::Remove,
            )?;
            pending.push(PendingReference {
                mapping,
                manager: self.manager_for(mapping)?,
                referenced,
            });
        }

        for reference in pending {
            let field = reference.mapping.field_name.as_str();
            self.invoke_lifecycle(
                &metadata,
                Event::PreRemoveReference,
                object,
                Some(&reference.referenced),
                field,
            )?;

            debug!("Removing {}::{} -> {:?}", class_name, field, reference.referenced);
            reference
                .manager
                .try_borrow_mut()?
                .remove(&reference.referenced)?;

            self.track_referenced(&reference.referenced);
            self.touch_manager(&reference.manager);
            self.schedule.schedule(
                class_name,
                ScheduleKind::Remove,
                ScheduledReference::new(
                    object.clone(),
                    field,
                    reference.referenced,
                    reference.manager,
                ),
            )?;
        }

        self.managed_objects.insert(object.id(), object.clone());
        Ok(())
    }

    /// Resolve every counterpart of `object` from its linking key and assign
    /// it to the reference field. Nothing is scheduled.
    pub fn load_references(&mut self, object: &ObjectHandle) -> Result<()> {
        let metadata = self.metadata_for(object)?;
        let class_name = metadata.name();

        for mapping in metadata.referenced_objects() {
            let key = object.read()?.field(&mapping.inversed_by)?;
            if key.is_null() {
                warn!(
                    "{}::{} has a null linking key, reference {} not loaded",
                    class_name, mapping.inversed_by, mapping.field_name
                );
                continue;
            }

            let manager = self.manager_for(mapping)?;
            debug!(
                "Loading {}::{} as {} {}",
                class_name, mapping.field_name, mapping.target_object, key
            );
            let referenced = manager
                .try_borrow_mut()?
                .get_reference(&mapping.target_object, &key)?;

            object
                .write()?
                .set_reference(&mapping.field_name, Some(referenced.clone()))?;
            self.track_referenced(&referenced);
            self.touch_manager(&manager);

            self.invoke_lifecycle(
                &metadata,
                Event::PostLoadReference,
                object,
                Some(&referenced),
                &mapping.field_name,
            )?;
        }

        self.managed_objects.insert(object.id(), object.clone());
        Ok(())
    }

    /// Shared loop of the insert and update paths.
    ///
    /// Every reference field is read, resolved and checked against the
    /// schedule before the first listener or manager call. Per field the order
    /// is pre event, manager persist, post event, common-field sync, schedule.
    fn bind_references(
        &mut self,
        object: &ObjectHandle,
        metadata: &ClassMetadata,
        kind: ScheduleKind,
    ) -> Result<()> {
        let class_name = metadata.name();

        let mut pending = Vec::new();
        for mapping in metadata.referenced_objects() {
            let referenced = object.read()?.reference(&mapping.field_name)?.ok_or_else(|| {
                UnitOfWorkError::MissingReferencedObject {
                    class: class_name.to_string(),
                    field: mapping.field_name.clone(),
                }
            })?;

            self.schedule
                .ensure_schedulable(class_name, object.id(), &mapping.field_name, kind)?;
            pending.push(PendingReference {
                mapping,
                manager: self.manager_for(mapping)?,
                referenced,
            });
        }

        for reference in pending {
            let field = reference.mapping.field_name.as_str();
            self.invoke_lifecycle(
                metadata,
                kind.pre_event(),
                object,
                Some(&reference.referenced),
                field,
            )?;

            debug!(
                "Persisting {}::{} -> {:?} ({})",
                class_name, field, reference.referenced, kind
            );
            reference
                .manager
                .try_borrow_mut()?
                .persist(&reference.referenced)?;

            self.invoke_lifecycle(
                metadata,
                kind.post_event(),
                object,
                Some(&reference.referenced),
                field,
            )?;

            Self::sync_common_fields(metadata, field, object, &reference.referenced)?;

            self.track_referenced(&reference.referenced);
            self.touch_manager(&reference.manager);
            self.schedule.schedule(
                class_name,
                kind,
                ScheduledReference::new(
                    object.clone(),
                    field,
                    reference.referenced,
                    reference.manager,
                ),
            )?;
        }

        self.managed_objects.insert(object.id(), object.clone());
        Ok(())
    }

    /// Copy the common fields of one reference field in their sync direction.
    fn sync_common_fields(
        metadata: &ClassMetadata,
        field: &str,
        object: &ObjectHandle,
        referenced: &ObjectHandle,
    ) -> Result<()> {
        for common in metadata.common_fields_for(field) {
            match common.sync_type {
                SyncType::ToReference => {
                    let value = object.read()?.field(&common.inversed_by)?;
                    referenced.write()?.set_field(&common.referenced_by, value)?;
                }
                SyncType::FromReference => {
                    let value = referenced.read()?.field(&common.referenced_by)?;
                    object.write()?.set_field(&common.inversed_by, value)?;
                }
            }
        }
        Ok(())
    }

    fn track_referenced(&mut self, referenced: &ObjectHandle) {
        self.referenced_objects
            .insert(referenced.id(), referenced.clone());
    }

    // ========================================================================
    // Commit / clear
    // ========================================================================

    /// Flush every manager owning scheduled work once, fire the post events
    /// per entry, then drain the schedule.
    pub fn commit(&mut self) -> Result<()> {
        self.dispatch_manager_event(Event::PreFlushReference)?;

        let managers = self.schedule.managers();
        self.dispatch_manager_event(Event::OnFlushReference)?;

        for manager in &managers {
            let mut manager = manager.try_borrow_mut()?;
            debug!("Flushing manager {}", manager.name());
            manager.flush()?;
        }

        for (kind, entry) in self.schedule.iter() {
            let metadata = self.metadata_for(entry.object())?;
            self.invoke_lifecycle(
                &metadata,
                kind.post_event(),
                entry.object(),
                Some(entry.referenced()),
                entry.field(),
            )?;
        }

        self.dispatch_manager_event(Event::PostFlushReference)?;

        debug!(
            "Committed {} scheduled reference(s) over {} manager(s)",
            self.schedule.len(),
            managers.len()
        );
        self.schedule.clear();
        Ok(())
    }

    /// Clear every manager used since the last clear and forget all tracked
    /// objects and scheduled work.
    pub fn clear(&mut self) -> Result<()> {
        for manager in self.touched_managers.values() {
            let mut manager = manager.try_borrow_mut()?;
            debug!("Clearing manager {}", manager.name());
            manager.clear()?;
        }

        self.touched_managers.clear();
        self.managed_objects.clear();
        self.referenced_objects.clear();
        self.schedule.clear();

        self.dispatch_manager_event(Event::OnClear)
    }

    // ========================================================================
    // Events
    // ========================================================================

    fn invoke_lifecycle(
        &self,
        metadata: &ClassMetadata,
        event: Event,
        object: &ObjectHandle,
        referenced: Option<&ObjectHandle>,
        field: &str,
    ) -> Result<()> {
        let invoker = ListenersInvoker::new(&self.event_manager);
        let invoke = invoker.subscribed_systems(metadata, event);
        if invoke.is_empty() {
            return Ok(());
        }

        let args = LifecycleEventArgs::new(self, object, referenced, field);
        invoker.invoke(metadata, event, &args, invoke)
    }

    fn dispatch_manager_event(&self, event: Event) -> Result<()> {
        if !self.event_manager.has_listeners(event) {
            return Ok(());
        }
        self.event_manager
            .dispatch_event(event, &EventArgs::Manager(ManagerEventArgs::new(self)))
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("managed_objects", &self.managed_objects.len())
            .field("referenced_objects", &self.referenced_objects.len())
            .field("scheduled", &self.schedule.len())
            .field("touched_managers", &self.touched_managers.len())
            .finish()
    }
}
