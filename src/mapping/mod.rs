pub mod class_metadata;
pub mod driver;
pub mod factory;
pub mod reference;

pub use class_metadata::{ClassMetadata, FieldMapping, LifecycleCallback};
pub use driver::JsonDriver;
pub use factory::ClassMetadataFactory;
pub use reference::{
    CommonFieldMapping, RawCommonFieldMapping, RawReferenceMapping, ReferenceKind,
    ReferenceMapping, SyncType,
};
