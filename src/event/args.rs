use crate::core::ObjectHandle;
use crate::mapping::ClassMetadata;
use crate::unit_of_work::UnitOfWork;

/// Payload of the per-reference lifecycle events.
#[derive(Clone, Copy)]
pub struct LifecycleEventArgs<'a> {
    unit_of_work: &'a UnitOfWork,
    object: &'a ObjectHandle,
    referenced: Option<&'a ObjectHandle>,
    field: &'a str,
}

impl<'a> LifecycleEventArgs<'a> {
    pub fn new(
        unit_of_work: &'a UnitOfWork,
        object: &'a ObjectHandle,
        referenced: Option<&'a ObjectHandle>,
        field: &'a str,
    ) -> Self {
        Self {
            unit_of_work,
            object,
            referenced,
            field,
        }
    }

    pub fn unit_of_work(&self) -> &'a UnitOfWork {
        self.unit_of_work
    }

    /// The object owning the reference field.
    pub fn object(&self) -> &'a ObjectHandle {
        self.object
    }

    /// The counterpart object, if the field held one.
    pub fn referenced(&self) -> Option<&'a ObjectHandle> {
        self.referenced
    }

    pub fn field(&self) -> &'a str {
        self.field
    }
}

/// Payload of the flush and clear events.
#[derive(Clone, Copy)]
pub struct ManagerEventArgs<'a> {
    unit_of_work: &'a UnitOfWork,
}

impl<'a> ManagerEventArgs<'a> {
    pub fn new(unit_of_work: &'a UnitOfWork) -> Self {
        Self { unit_of_work }
    }

    pub fn unit_of_work(&self) -> &'a UnitOfWork {
        self.unit_of_work
    }
}

#[derive(Clone, Copy)]
pub struct LoadClassMetadataEventArgs<'a> {
    metadata: &'a ClassMetadata,
}

impl<'a> LoadClassMetadataEventArgs<'a> {
    pub fn new(metadata: &'a ClassMetadata) -> Self {
        Self { metadata }
    }

    pub fn class_metadata(&self) -> &'a ClassMetadata {
        self.metadata
    }
}

#[derive(Clone, Copy)]
pub enum EventArgs<'a> {
    Lifecycle(LifecycleEventArgs<'a>),
    Manager(ManagerEventArgs<'a>),
    LoadClassMetadata(LoadClassMetadataEventArgs<'a>),
}

impl<'a> EventArgs<'a> {
    pub fn as_lifecycle(&self) -> Option<&LifecycleEventArgs<'a>> {
        match self {
            EventArgs::Lifecycle(args) => Some(args),
            _ => None,
        }
    }

    pub fn unit_of_work(&self) -> Option<&'a UnitOfWork> {
        match self {
            EventArgs::Lifecycle(args) => Some(args.unit_of_work()),
            EventArgs::Manager(args) => Some(args.unit_of_work()),
            EventArgs::LoadClassMetadata(_) => None,
        }
    }
}
