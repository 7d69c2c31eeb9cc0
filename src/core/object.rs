// ============================================================================
// Mapped Objects
// ============================================================================
//
// Objects handled by the unit of work are shared, single-owner cells. Field
// access goes through an accessor table (the `Mapped` impl, normally generated
// by `#[derive(Mapped)]`) instead of runtime reflection, and object identity is
// the address of the shared cell.
//
// ============================================================================

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::core::{Result, Value};

/// Accessor table of a mapped class.
///
/// `field`/`set_field` address scalar slots, `reference`/`set_reference` the
/// slots holding a counterpart object. Unknown names fail with
/// [`MappingError::FieldNotFound`](crate::core::MappingError::FieldNotFound).
pub trait Mapped: Any {
    fn class_name(&self) -> &'static str;

    fn field(&self, name: &str) -> Result<Value>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<()>;

    fn reference(&self, name: &str) -> Result<Option<ObjectHandle>>;

    fn set_reference(&mut self, name: &str, reference: Option<ObjectHandle>) -> Result<()>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Static side of the accessor table, used when building class metadata.
pub trait MappedClass: Mapped + Sized {
    const CLASS_NAME: &'static str;
    const FIELDS: &'static [&'static str];
    const REFERENCES: &'static [&'static str];
}

/// Identity of a tracked object (address of its shared cell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "obj_{:x}", self.0)
    }
}

/// Shared handle on a mapped object.
///
/// Clones point at the same object; two handles are the same object exactly
/// when their [`ObjectId`]s are equal.
#[derive(Clone)]
pub struct ObjectHandle {
    inner: Rc<RefCell<dyn Mapped>>,
}

impl ObjectHandle {
    pub fn new<T: Mapped>(object: T) -> Self {
        let inner: Rc<RefCell<dyn Mapped>> = Rc::new(RefCell::new(object));
        Self { inner }
    }

    pub fn id(&self) -> ObjectId {
        ObjectId(Rc::as_ptr(&self.inner) as *const () as usize)
    }

    pub fn ptr_eq(&self, other: &ObjectHandle) -> bool {
        self.id() == other.id()
    }

    pub fn read(&self) -> Result<Ref<'_, dyn Mapped>> {
        Ok(self.inner.try_borrow()?)
    }

    pub fn write(&self) -> Result<RefMut<'_, dyn Mapped>> {
        Ok(self.inner.try_borrow_mut()?)
    }

    pub fn class_name(&self) -> Result<&'static str> {
        Ok(self.read()?.class_name())
    }

    /// Typed read access; `None` when the object is not a `T`.
    pub fn with<T: Mapped, R>(&self, f: impl FnOnce(&T) -> R) -> Result<Option<R>> {
        let object = self.read()?;
        Ok(object.as_any().downcast_ref::<T>().map(f))
    }

    /// Typed write access; `None` when the object is not a `T`.
    pub fn with_mut<T: Mapped, R>(&self, f: impl FnOnce(&mut T) -> R) -> Result<Option<R>> {
        let mut object = self.write()?;
        Ok(object.as_any_mut().downcast_mut::<T>().map(f))
    }
}

impl PartialEq for ObjectHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for ObjectHandle {}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(object) => write!(f, "ObjectHandle({} {})", object.class_name(), self.id()),
            Err(_) => write!(f, "ObjectHandle(<borrowed> {})", self.id()),
        }
    }
}
