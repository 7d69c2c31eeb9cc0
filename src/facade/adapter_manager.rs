use log::debug;
use std::rc::Rc;

use crate::config::{Configuration, DEFAULT_MANAGER_NAME};
use crate::core::{MappedClass, MappingError, ObjectHandle, Result};
use crate::event::{Event, EventArgs, EventManager, LoadClassMetadataEventArgs};
use crate::manager::ManagerHandle;
use crate::mapping::{ClassMetadata, ClassMetadataFactory, JsonDriver};
use crate::unit_of_work::UnitOfWork;

/// Entry point of the adapter: owns the unit of work and the mapping sources.
///
/// ```
/// use object_adapter::prelude::*;
///
/// #[derive(Mapped, Clone, Default)]
/// #[mapped(class = "app::Page")]
/// struct Page {
///     uuid: Option<String>,
///     title: Option<String>,
/// }
///
/// #[derive(Mapped, Clone, Default)]
/// #[mapped(class = "app::Article")]
/// struct Article {
///     uuid: Option<String>,
///     title: Option<String>,
///     #[mapped(reference)]
///     page: Option<ObjectHandle>,
/// }
///
/// # fn main() -> object_adapter::Result<()> {
/// let pages = manager_handle(InMemoryObjectManager::new("pages").with_identifier("uuid"));
/// let mut oam = ObjectAdapterManager::new(
///     Configuration::new().with_manager(ReferenceKind::Document, "default", pages),
/// )
/// .with_driver(JsonDriver::from_json(r#"{
///     "app::Article": { "page": {
///         "type": "reference-document",
///         "target-object": "app::Page",
///         "referenced-by": "uuid",
///         "inversed-by": "uuid",
///         "common-fields": [
///             { "referenced-by": "title", "inversed-by": "title", "sync-type": "to-reference" }
///         ]
///     } }
/// }"#)?);
/// oam.declare_class::<Page>();
/// oam.register_class::<Article>()?;
///
/// let page = ObjectHandle::new(Page::default());
/// let article = ObjectHandle::new(Article {
///     title: Some("Hello".into()),
///     page: Some(page.clone()),
///     ..Default::default()
/// });
///
/// oam.persist_reference(&article)?;
/// oam.flush_reference()?;
///
/// assert!(article.with(|a: &Article| a.uuid.is_some())?.unwrap_or(false));
/// assert_eq!(page.with(|p: &Page| p.title.clone())?.flatten().as_deref(), Some("Hello"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ObjectAdapterManager {
    unit_of_work: UnitOfWork,
    driver: Option<JsonDriver>,
}

impl ObjectAdapterManager {
    pub fn new(configuration: Configuration) -> Self {
        Self::with_event_manager(configuration, EventManager::new())
    }

    pub fn with_event_manager(configuration: Configuration, event_manager: EventManager) -> Self {
        Self {
            unit_of_work: UnitOfWork::new(
                configuration,
                ClassMetadataFactory::new(),
                event_manager,
            ),
            driver: None,
        }
    }

    /// Mapping document used by [`register_class`](Self::register_class) and
    /// [`load_class_metadata`](Self::load_class_metadata). Every class the
    /// document maps becomes a known reference target.
    pub fn with_driver(mut self, driver: JsonDriver) -> Self {
        let factory = self.unit_of_work.metadata_factory_mut();
        for class_name in driver.all_class_names() {
            factory.declare_type(class_name);
        }
        self.driver = Some(driver);
        self
    }

    pub fn driver(&self) -> Option<&JsonDriver> {
        self.driver.as_ref()
    }

    // ========================================================================
    // Reference operations
    // ========================================================================

    pub fn persist_reference(&mut self, object: &ObjectHandle) -> Result<()> {
        self.unit_of_work.persist(object)
    }

    pub fn remove_reference(&mut self, object: &ObjectHandle) -> Result<()> {
        self.unit_of_work.remove(object)
    }

    pub fn find_reference(&mut self, object: &ObjectHandle) -> Result<()> {
        self.unit_of_work.load_references(object)
    }

    pub fn flush_reference(&mut self) -> Result<()> {
        self.unit_of_work.commit()
    }

    pub fn clear(&mut self) -> Result<()> {
        self.unit_of_work.clear()
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Validate and register metadata, then announce it with `loadClassMetadata`.
    pub fn register_class_metadata(&mut self, metadata: ClassMetadata) -> Result<Rc<ClassMetadata>> {
        let metadata = self.unit_of_work.metadata_factory_mut().register(metadata)?;

        let event_manager = self.unit_of_work.event_manager();
        if event_manager.has_listeners(Event::LoadClassMetadata) {
            event_manager.dispatch_event(
                Event::LoadClassMetadata,
                &EventArgs::LoadClassMetadata(LoadClassMetadataEventArgs::new(&metadata)),
            )?;
        }

        Ok(metadata)
    }

    /// Complete `metadata` from the mapping document and register it.
    pub fn load_class_metadata(&mut self, mut metadata: ClassMetadata) -> Result<Rc<ClassMetadata>> {
        let driver = self
            .driver
            .as_ref()
            .ok_or_else(|| MappingError::ClassNotMapped(metadata.name().to_string()))?;

        let class_name = metadata.name().to_string();
        driver.load_metadata_for_class(&class_name, &mut metadata)?;
        debug!("Loaded mapping of {} from the mapping document", class_name);

        self.register_class_metadata(metadata)
    }

    pub fn register_class<T: MappedClass>(&mut self) -> Result<Rc<ClassMetadata>> {
        self.load_class_metadata(ClassMetadata::for_class::<T>())
    }

    /// Like [`register_class`](Self::register_class); instances built by
    /// `ClassMetadata::new_instance` are clones of `prototype`.
    pub fn register_class_with_prototype<T: MappedClass + Clone>(
        &mut self,
        prototype: T,
    ) -> Result<Rc<ClassMetadata>> {
        self.load_class_metadata(ClassMetadata::for_class::<T>().with_prototype(prototype))
    }

    /// Declare `T` as a reference target whose class has no adapter mapping.
    pub fn declare_class<T: MappedClass>(&mut self) {
        self.unit_of_work
            .metadata_factory_mut()
            .declare_type(T::CLASS_NAME);
    }

    pub fn get_class_metadata(&self, class_name: &str) -> Result<Rc<ClassMetadata>> {
        self.unit_of_work.get_class_metadata(class_name)
    }

    pub fn metadata_factory(&self) -> &ClassMetadataFactory {
        self.unit_of_work.metadata_factory()
    }

    /// Whether the class of `object` has registered metadata.
    pub fn is_mapped(&self, object: &ObjectHandle) -> bool {
        object
            .class_name()
            .map(|class_name| self.metadata_factory().has_metadata_for(class_name))
            .unwrap_or(false)
    }

    // ========================================================================
    // Managers
    // ========================================================================

    pub fn get_manager(&self, object: &ObjectHandle, field: &str) -> Result<ManagerHandle> {
        self.unit_of_work.get_manager(object, field)
    }

    /// Default manager registered for a reference type name.
    pub fn get_manager_by_type(&self, type_name: &str) -> Result<ManagerHandle> {
        self.configuration()
            .get_manager_by_type(type_name, DEFAULT_MANAGER_NAME)
    }

    pub fn configuration(&self) -> &Configuration {
        self.unit_of_work.configuration()
    }

    pub fn configuration_mut(&mut self) -> &mut Configuration {
        self.unit_of_work.configuration_mut()
    }

    pub fn event_manager(&self) -> &EventManager {
        self.unit_of_work.event_manager()
    }

    pub fn event_manager_mut(&mut self) -> &mut EventManager {
        self.unit_of_work.event_manager_mut()
    }

    pub fn unit_of_work(&self) -> &UnitOfWork {
        &self.unit_of_work
    }

    pub fn unit_of_work_mut(&mut self) -> &mut UnitOfWork {
        &mut self.unit_of_work
    }
}
