use indexmap::IndexMap;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;
use uuid::Uuid;

use super::ObjectManager;
use crate::core::{MappedClass, ObjectHandle, ObjectId, Result, Value};

/// Call recorded by [`InMemoryObjectManager`].
#[derive(Debug, Clone, PartialEq)]
pub enum ManagerCall {
    Persist(ObjectId),
    Remove(ObjectId),
    Flush,
    Clear,
    GetReference { class_name: String, key: Value },
}

type Instantiator = Rc<dyn Fn() -> ObjectHandle>;

/// Object manager keeping committed objects in memory.
///
/// When an identifier field is configured, persisted objects with a null
/// identifier get a fresh UUID, and committed objects are keyed by
/// `(class, identifier)`.
pub struct InMemoryObjectManager {
    name: String,
    identifier: Option<String>,
    prototypes: HashMap<String, Instantiator>,
    /// Staged until flush
    pending_persist: IndexMap<ObjectId, ObjectHandle>,
    pending_remove: IndexMap<ObjectId, ObjectHandle>,
    store: IndexMap<(String, Value), ObjectHandle>,
    calls: Vec<ManagerCall>,
}

impl InMemoryObjectManager {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identifier: None,
            prototypes: HashMap::new(),
            pending_persist: IndexMap::new(),
            pending_remove: IndexMap::new(),
            store: IndexMap::new(),
            calls: Vec::new(),
        }
    }

    pub fn with_identifier(mut self, field: impl Into<String>) -> Self {
        self.identifier = Some(field.into());
        self
    }

    /// Placeholders returned by `get_reference` are clones of this prototype.
    pub fn with_prototype<T: MappedClass + Clone>(mut self, prototype: T) -> Self {
        self.prototypes.insert(
            T::CLASS_NAME.to_string(),
            Rc::new(move || ObjectHandle::new(prototype.clone())),
        );
        self
    }

    pub fn calls(&self) -> &[ManagerCall] {
        &self.calls
    }

    pub fn reset_calls(&mut self) {
        self.calls.clear();
    }

    pub fn flush_count(&self) -> usize {
        self.count_calls(|call| matches!(call, ManagerCall::Flush))
    }

    pub fn clear_count(&self) -> usize {
        self.count_calls(|call| matches!(call, ManagerCall::Clear))
    }

    fn count_calls(&self, predicate: impl Fn(&ManagerCall) -> bool) -> usize {
        self.calls.iter().filter(|call| predicate(call)).count()
    }

    pub fn is_scheduled_for_persist(&self, object: &ObjectHandle) -> bool {
        self.pending_persist.contains_key(&object.id())
    }

    pub fn is_scheduled_for_remove(&self, object: &ObjectHandle) -> bool {
        self.pending_remove.contains_key(&object.id())
    }

    pub fn stored(&self, class_name: &str, key: &Value) -> Option<ObjectHandle> {
        self.store
            .get(&(class_name.to_string(), key.clone()))
            .cloned()
    }

    pub fn contains(&self, object: &ObjectHandle) -> bool {
        self.store.values().any(|stored| stored.ptr_eq(object))
    }

    pub fn stored_count(&self) -> usize {
        self.store.len()
    }

    fn store_key(&self, object: &ObjectHandle) -> Result<(String, Value)> {
        let class_name = object.class_name()?.to_string();
        let key = match &self.identifier {
            Some(field) => object.read()?.field(field)?,
            None => Value::Text(object.id().to_string()),
        };
        Ok((class_name, key))
    }

    fn assign_identifier(&self, object: &ObjectHandle) -> Result<()> {
        let Some(field) = &self.identifier else {
            return Ok(());
        };

        let current = object.read()?.field(field)?;
        if current.is_null() {
            let generated = Uuid::new_v4().to_string();
            debug!("{}: assigned {} = {} on {:?}", self.name, field, generated, object);
            object.write()?.set_field(field, Value::Text(generated))?;
        }
        Ok(())
    }
}

impl ObjectManager for InMemoryObjectManager {
    fn name(&self) -> &str {
        &self.name
    }

    fn persist(&mut self, object: &ObjectHandle) -> Result<()> {
        self.calls.push(ManagerCall::Persist(object.id()));
        self.assign_identifier(object)?;
        self.pending_remove.shift_remove(&object.id());
        self.pending_persist.insert(object.id(), object.clone());
        Ok(())
    }

    fn remove(&mut self, object: &ObjectHandle) -> Result<()> {
        self.calls.push(ManagerCall::Remove(object.id()));
        self.pending_persist.shift_remove(&object.id());
        self.pending_remove.insert(object.id(), object.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.calls.push(ManagerCall::Flush);

        let persisted: Vec<ObjectHandle> = self.pending_persist.drain(..).map(|(_, o)| o).collect();
        for object in persisted {
            let key = self.store_key(&object)?;
            self.store.insert(key, object);
        }

        let removed: Vec<ObjectHandle> = self.pending_remove.drain(..).map(|(_, o)| o).collect();
        for object in &removed {
            self.store.retain(|_, stored| !stored.ptr_eq(object));
        }

        debug!(
            "{}: flushed, {} object(s) stored",
            self.name,
            self.store.len()
        );
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.calls.push(ManagerCall::Clear);
        self.pending_persist.clear();
        self.pending_remove.clear();
        Ok(())
    }

    fn get_reference(&mut self, class_name: &str, key: &Value) -> Result<ObjectHandle> {
        self.calls.push(ManagerCall::GetReference {
            class_name: class_name.to_string(),
            key: key.clone(),
        });

        if let Some(stored) = self.stored(class_name, key) {
            return Ok(stored);
        }

        let instantiate = self.prototypes.get(class_name).ok_or_else(|| {
            anyhow::anyhow!(
                "{}: no stored {} with key {} and no prototype to build a reference",
                self.name,
                class_name,
                key
            )
        })?;

        let placeholder = instantiate();
        if let Some(field) = &self.identifier {
            placeholder.write()?.set_field(field, key.clone())?;
        }
        Ok(placeholder)
    }
}

impl std::fmt::Debug for InMemoryObjectManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectManager")
            .field("name", &self.name)
            .field("identifier", &self.identifier)
            .field("pending_persist", &self.pending_persist.len())
            .field("pending_remove", &self.pending_remove.len())
            .field("stored", &self.store.len())
            .finish()
    }
}
