pub mod memory;

pub use memory::{InMemoryObjectManager, ManagerCall};

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::{ObjectHandle, Result, Value};

/// Downstream persistence manager serving one reference kind/name pair.
///
/// Implementations stage work on `persist`/`remove` and apply it on `flush`.
/// They may be called several times per unit of work and must report failures
/// as errors.
pub trait ObjectManager {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    fn persist(&mut self, object: &ObjectHandle) -> Result<()>;

    fn remove(&mut self, object: &ObjectHandle) -> Result<()>;

    fn flush(&mut self) -> Result<()>;

    fn clear(&mut self) -> Result<()>;

    /// Stored object or a placeholder for `class_name` identified by `key`.
    fn get_reference(&mut self, class_name: &str, key: &Value) -> Result<ObjectHandle>;
}

pub type ManagerHandle = Rc<RefCell<dyn ObjectManager>>;

/// Identity of a registered manager (address of its shared cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ManagerId(usize);

impl ManagerId {
    pub fn of(handle: &ManagerHandle) -> Self {
        ManagerId(Rc::as_ptr(handle) as *const () as usize)
    }
}

pub fn manager_handle<M: ObjectManager + 'static>(manager: M) -> ManagerHandle {
    Rc::new(RefCell::new(manager))
}
