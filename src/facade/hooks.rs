use log::debug;
use std::cell::RefCell;
use std::rc::Rc;

use super::ObjectAdapterManager;
use crate::core::{ObjectHandle, Result};

/// Forwards a store's own lifecycle hooks to the adapter.
///
/// Call these from the hooks of the store that owns the root objects. Objects
/// whose class has no adapter mapping are ignored.
#[derive(Debug, Clone)]
pub struct LifecycleBridge {
    adapter: Rc<RefCell<ObjectAdapterManager>>,
}

impl LifecycleBridge {
    pub fn new(adapter: Rc<RefCell<ObjectAdapterManager>>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Rc<RefCell<ObjectAdapterManager>> {
        &self.adapter
    }

    pub fn pre_persist(&self, object: &ObjectHandle) -> Result<()> {
        self.forward(object, ObjectAdapterManager::persist_reference)
    }

    pub fn pre_update(&self, object: &ObjectHandle) -> Result<()> {
        self.forward(object, ObjectAdapterManager::persist_reference)
    }

    pub fn pre_remove(&self, object: &ObjectHandle) -> Result<()> {
        self.forward(object, ObjectAdapterManager::remove_reference)
    }

    pub fn on_clear(&self) -> Result<()> {
        self.adapter.try_borrow_mut()?.clear()
    }

    pub fn pre_flush(&self) -> Result<()> {
        self.adapter.try_borrow_mut()?.flush_reference()
    }

    fn forward(
        &self,
        object: &ObjectHandle,
        operation: fn(&mut ObjectAdapterManager, &ObjectHandle) -> Result<()>,
    ) -> Result<()> {
        let mut adapter = self.adapter.try_borrow_mut()?;
        if !adapter.is_mapped(object) {
            debug!("Ignoring {:?}: class has no adapter mapping", object);
            return Ok(());
        }
        operation(&mut adapter, object)
    }
}
