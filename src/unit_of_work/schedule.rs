// ============================================================================
// Reference Schedule
// ============================================================================
//
// Pending insert/update/remove work, keyed by (object identity, reference
// field). A key lives in at most one of the three lists; scheduling it again
// fails until the lists are drained by commit or clear.
//
// ============================================================================

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::core::{ObjectHandle, ObjectId, Result, UnitOfWorkError};
use crate::event::Event;
use crate::manager::{ManagerHandle, ManagerId};

pub type ScheduleKey = (ObjectId, String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleKind {
    Insert,
    Update,
    Remove,
}

impl ScheduleKind {
    /// Commit order of the lists.
    pub const ALL: [ScheduleKind; 3] = [
        ScheduleKind::Insert,
        ScheduleKind::Update,
        ScheduleKind::Remove,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleKind::Insert => "insert",
            ScheduleKind::Update => "update",
            ScheduleKind::Remove => "remove",
        }
    }

    pub fn pre_event(&self) -> Event {
        match self {
            ScheduleKind::Insert => Event::PreBindReference,
            ScheduleKind::Update => Event::PreUpdateReference,
            ScheduleKind::Remove => Event::PreRemoveReference,
        }
    }

    pub fn post_event(&self) -> Event {
        match self {
            ScheduleKind::Insert => Event::PostBindReference,
            ScheduleKind::Update => Event::PostUpdateReference,
            ScheduleKind::Remove => Event::PostRemoveReference,
        }
    }
}

impl fmt::Display for ScheduleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending (object, field) -> counterpart entry and the manager owning it.
#[derive(Clone)]
pub struct ScheduledReference {
    object: ObjectHandle,
    field: String,
    referenced: ObjectHandle,
    manager: ManagerHandle,
}

impl ScheduledReference {
    pub fn new(
        object: ObjectHandle,
        field: impl Into<String>,
        referenced: ObjectHandle,
        manager: ManagerHandle,
    ) -> Self {
        Self {
            object,
            field: field.into(),
            referenced,
            manager,
        }
    }

    pub fn key(&self) -> ScheduleKey {
        (self.object.id(), self.field.clone())
    }

    pub fn object(&self) -> &ObjectHandle {
        &self.object
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn referenced(&self) -> &ObjectHandle {
        &self.referenced
    }

    pub fn manager(&self) -> &ManagerHandle {
        &self.manager
    }

    pub fn manager_id(&self) -> ManagerId {
        ManagerId::of(&self.manager)
    }
}

impl fmt::Debug for ScheduledReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let manager = match self.manager.try_borrow() {
            Ok(manager) => manager.name().to_string(),
            Err(_) => "<borrowed>".to_string(),
        };
        f.debug_struct("ScheduledReference")
            .field("object", &self.object)
            .field("field", &self.field)
            .field("referenced", &self.referenced)
            .field("manager", &manager)
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ReferenceSchedule {
    inserts: IndexMap<ScheduleKey, ScheduledReference>,
    updates: IndexMap<ScheduleKey, ScheduledReference>,
    removes: IndexMap<ScheduleKey, ScheduledReference>,
}

impl ReferenceSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, kind: ScheduleKind) -> &IndexMap<ScheduleKey, ScheduledReference> {
        match kind {
            ScheduleKind::Insert => &self.inserts,
            ScheduleKind::Update => &self.updates,
            ScheduleKind::Remove => &self.removes,
        }
    }

    fn list_mut(&mut self, kind: ScheduleKind) -> &mut IndexMap<ScheduleKey, ScheduledReference> {
        match kind {
            ScheduleKind::Insert => &mut self.inserts,
            ScheduleKind::Update => &mut self.updates,
            ScheduleKind::Remove => &mut self.removes,
        }
    }

    /// The list currently holding `(object, field)`, if any.
    pub fn scheduled_kind(&self, object: ObjectId, field: &str) -> Option<ScheduleKind> {
        let key = (object, field.to_string());
        ScheduleKind::ALL
            .into_iter()
            .find(|kind| self.list(*kind).contains_key(&key))
    }

    /// Fails when `(object, field)` already sits in any list.
    pub fn ensure_schedulable(
        &self,
        class_name: &str,
        object: ObjectId,
        field: &str,
        requested: ScheduleKind,
    ) -> Result<()> {
        match self.scheduled_kind(object, field) {
            Some(existing) => Err(UnitOfWorkError::DuplicateSchedule {
                class: class_name.to_string(),
                field: field.to_string(),
                existing: existing.to_string(),
                requested: requested.to_string(),
            }
            .into()),
            None => Ok(()),
        }
    }

    pub fn schedule(
        &mut self,
        class_name: &str,
        kind: ScheduleKind,
        entry: ScheduledReference,
    ) -> Result<()> {
        self.ensure_schedulable(class_name, entry.object.id(), &entry.field, kind)?;
        self.list_mut(kind).insert(entry.key(), entry);
        Ok(())
    }

    /// Every entry, inserts first, then updates, then removes.
    pub fn iter(&self) -> impl Iterator<Item = (ScheduleKind, &ScheduledReference)> {
        ScheduleKind::ALL
            .into_iter()
            .flat_map(move |kind| self.list(kind).values().map(move |entry| (kind, entry)))
    }

    /// Distinct managers in the order first met while scanning
    /// insert -> update -> remove.
    pub fn managers(&self) -> Vec<ManagerHandle> {
        let mut managers: IndexMap<ManagerId, ManagerHandle> = IndexMap::new();
        for (_, entry) in self.iter() {
            managers
                .entry(entry.manager_id())
                .or_insert_with(|| Rc::clone(&entry.manager));
        }
        managers.into_values().collect()
    }

    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.removes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.inserts.clear();
        self.updates.clear();
        self.removes.clear();
    }
}
