use indexmap::{IndexMap, IndexSet};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use super::reference::{
    COMMON_FIELD_TYPE, CommonFieldMapping, RawCommonFieldMapping, RawReferenceMapping,
    ReferenceKind, ReferenceMapping, SyncType,
};
use crate::config::DEFAULT_MANAGER_NAME;
use crate::core::{Mapped, MappedClass, MappingError, ObjectHandle, Result};
use crate::event::{Event, LifecycleEventArgs};

pub type LifecycleCallback = Rc<dyn Fn(&LifecycleEventArgs<'_>) -> Result<()>>;

type Instantiator = Rc<dyn Fn() -> ObjectHandle>;

/// A mapped field, as seen by generic metadata consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapping<'a> {
    Common(&'a CommonFieldMapping),
    Reference(&'a ReferenceMapping),
}

/// Mapping description of one class: its reference fields, the common fields
/// mirrored with each counterpart, and its lifecycle callbacks.
pub struct ClassMetadata {
    class_name: String,
    properties: IndexSet<String>,
    referenced_objects: IndexMap<String, ReferenceMapping>,
    common_fields: Vec<CommonFieldMapping>,
    /// `(target_field, inversed_by)` of linking keys synthesized by
    /// `map_referenced_object`; an explicit declaration replaces them.
    implicit_links: HashSet<(String, String)>,
    lifecycle_callbacks: HashMap<Event, Vec<LifecycleCallback>>,
    prototype: Option<Instantiator>,
}

impl ClassMetadata {
    /// `properties` are the slot names the class exposes through its accessor table.
    pub fn new<I, S>(class_name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            class_name: class_name.into(),
            properties: properties.into_iter().map(Into::into).collect(),
            referenced_objects: IndexMap::new(),
            common_fields: Vec::new(),
            implicit_links: HashSet::new(),
            lifecycle_callbacks: HashMap::new(),
            prototype: None,
        }
    }

    pub fn for_class<T: MappedClass>() -> Self {
        Self::new(
            T::CLASS_NAME,
            T::FIELDS.iter().chain(T::REFERENCES.iter()).copied(),
        )
    }

    pub fn name(&self) -> &str {
        &self.class_name
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    // ========================================================================
    // Mapping construction
    // ========================================================================

    /// Map a reference field and register the common field that carries its
    /// linking key back onto the object (`from-reference`).
    pub fn map_referenced_object(
        &mut self,
        mapping: RawReferenceMapping,
    ) -> Result<&ReferenceMapping> {
        let label = mapping
            .field_name
            .clone()
            .unwrap_or_else(|| "reference".to_string());

        let field_name = self.require(mapping.field_name, &label, "name")?;
        let kind: ReferenceKind = self.require(mapping.kind, &label, "type")?.parse()?;
        let target_object = self.require(mapping.target_object, &label, "target-object")?;
        let referenced_by = self.require(mapping.referenced_by, &label, "referenced-by")?;
        let inversed_by = self.require(mapping.inversed_by, &label, "inversed-by")?;

        self.ensure_property(&field_name)?;
        self.ensure_property(&inversed_by)?;

        if self.referenced_objects.contains_key(&field_name) {
            return Err(MappingError::DuplicateFieldMapping {
                class: self.class_name.clone(),
                field: field_name,
            }
            .into());
        }

        let manager = mapping
            .manager
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| DEFAULT_MANAGER_NAME.to_string());

        let reference = ReferenceMapping {
            field_name: field_name.clone(),
            kind,
            target_object,
            referenced_by,
            inversed_by,
            manager,
        };

        let linking = CommonFieldMapping::linking_key(&reference);
        if !self.has_common_field(&linking.target_field, &linking.inversed_by) {
            self.implicit_links
                .insert((linking.target_field.clone(), linking.inversed_by.clone()));
            self.common_fields.push(linking);
        }

        Ok(self
            .referenced_objects
            .entry(field_name)
            .or_insert(reference))
    }

    pub fn map_common_field(&mut self, mapping: RawCommonFieldMapping) -> Result<()> {
        let label = mapping
            .inversed_by
            .clone()
            .unwrap_or_else(|| COMMON_FIELD_TYPE.to_string());

        let kind = self.require(mapping.kind, &label, "type")?;
        if kind != COMMON_FIELD_TYPE {
            return Err(MappingError::WrongMappingType {
                class: self.class_name.clone(),
                expected: COMMON_FIELD_TYPE.to_string(),
                found: kind,
            }
            .into());
        }

        let referenced_by = self.require(mapping.referenced_by, &label, "referenced-by")?;
        let inversed_by = self.require(mapping.inversed_by, &label, "inversed-by")?;
        let target_field = self.require(mapping.target_field, &label, "target-field")?;
        let sync_type = match mapping.sync_type.filter(|s| !s.is_empty()) {
            Some(raw) => raw.parse::<SyncType>()?,
            None => SyncType::default(),
        };

        self.ensure_property(&inversed_by)?;

        let declared = CommonFieldMapping {
            inversed_by,
            referenced_by,
            sync_type,
            target_field,
        };

        let key = (declared.target_field.clone(), declared.inversed_by.clone());
        if self.implicit_links.remove(&key) {
            if let Some(slot) = self
                .common_fields
                .iter_mut()
                .find(|c| c.target_field == key.0 && c.inversed_by == key.1)
            {
                *slot = declared;
            }
            return Ok(());
        }

        if self.has_common_field(&key.0, &key.1) {
            return Err(MappingError::DuplicateFieldMapping {
                class: self.class_name.clone(),
                field: key.1,
            }
            .into());
        }

        self.common_fields.push(declared);
        Ok(())
    }

    /// Every common field must belong to a reference field of this class.
    pub fn validate(&self) -> Result<()> {
        for common in &self.common_fields {
            if !self.referenced_objects.contains_key(&common.target_field) {
                return Err(MappingError::InvalidCommonFieldTarget {
                    class: self.class_name.clone(),
                    field: common.inversed_by.clone(),
                    target: common.target_field.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    fn require(
        &self,
        value: Option<String>,
        mapping: &str,
        attribute: &str,
    ) -> std::result::Result<String, MappingError> {
        value
            .filter(|v| !v.is_empty())
            .ok_or_else(|| MappingError::MissingAttribute {
                class: self.class_name.clone(),
                mapping: mapping.to_string(),
                attribute: attribute.to_string(),
            })
    }

    fn ensure_property(&self, name: &str) -> std::result::Result<(), MappingError> {
        if self.has_property(name) {
            Ok(())
        } else {
            Err(MappingError::ClassHasNoField {
                class: self.class_name.clone(),
                field: name.to_string(),
            })
        }
    }

    fn has_common_field(&self, target_field: &str, inversed_by: &str) -> bool {
        self.common_fields
            .iter()
            .any(|c| c.target_field == target_field && c.inversed_by == inversed_by)
    }

    // ========================================================================
    // Read accessors
    // ========================================================================

    /// Reference mappings in declaration order.
    pub fn referenced_objects(&self) -> impl Iterator<Item = &ReferenceMapping> {
        self.referenced_objects.values()
    }

    pub fn referenced_object(&self, field: &str) -> Option<&ReferenceMapping> {
        self.referenced_objects.get(field)
    }

    pub fn referenced_type(&self, field: &str) -> Option<ReferenceKind> {
        self.referenced_objects.get(field).map(|r| r.kind)
    }

    pub fn common_fields(&self) -> &[CommonFieldMapping] {
        &self.common_fields
    }

    pub fn common_fields_for<'a>(
        &'a self,
        reference_field: &'a str,
    ) -> impl Iterator<Item = &'a CommonFieldMapping> + 'a {
        self.common_fields
            .iter()
            .filter(move |c| c.target_field == reference_field)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.referenced_objects.contains_key(name)
            || self.common_fields.iter().any(|c| c.inversed_by == name)
    }

    pub fn field(&self, name: &str) -> Result<FieldMapping<'_>> {
        if let Some(reference) = self.referenced_objects.get(name) {
            return Ok(FieldMapping::Reference(reference));
        }
        self.common_fields
            .iter()
            .find(|c| c.inversed_by == name)
            .map(FieldMapping::Common)
            .ok_or_else(|| {
                MappingError::FieldNotFound {
                    class: self.class_name.clone(),
                    field: name.to_string(),
                }
                .into()
            })
    }

    /// Common-field slots followed by reference slots, without duplicates.
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: IndexSet<&str> = self
            .common_fields
            .iter()
            .map(|c| c.inversed_by.as_str())
            .collect();
        names.extend(self.referenced_objects.keys().map(String::as_str));
        names.into_iter().collect()
    }

    // ========================================================================
    // Lifecycle callbacks
    // ========================================================================

    pub fn add_lifecycle_callback<F>(&mut self, event: Event, callback: F) -> Result<()>
    where
        F: Fn(&LifecycleEventArgs<'_>) -> Result<()> + 'static,
    {
        if !event.is_lifecycle() {
            return Err(MappingError::InvalidLifecycleEvent(event.to_string()).into());
        }
        self.lifecycle_callbacks
            .entry(event)
            .or_default()
            .push(Rc::new(callback));
        Ok(())
    }

    /// Callback running against the concrete object type. The object is
    /// borrowed mutably while it runs, so it must not be re-borrowed through
    /// the event arguments.
    pub fn add_typed_lifecycle_callback<T, F>(&mut self, event: Event, callback: F) -> Result<()>
    where
        T: Mapped,
        F: Fn(&mut T, &LifecycleEventArgs<'_>) -> Result<()> + 'static,
    {
        self.add_lifecycle_callback(event, move |args| {
            let mut object = args.object().write()?;
            match object.as_any_mut().downcast_mut::<T>() {
                Some(typed) => callback(typed, args),
                None => Ok(()),
            }
        })
    }

    pub fn has_lifecycle_callbacks(&self, event: Event) -> bool {
        self.lifecycle_callbacks
            .get(&event)
            .is_some_and(|callbacks| !callbacks.is_empty())
    }

    pub fn lifecycle_callbacks(&self, event: Event) -> &[LifecycleCallback] {
        self.lifecycle_callbacks
            .get(&event)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    // ========================================================================
    // Instantiation
    // ========================================================================

    /// Instances created by [`new_instance`](Self::new_instance) are clones of
    /// this prototype; no constructor runs.
    pub fn set_prototype<T: MappedClass + Clone>(&mut self, prototype: T) {
        self.prototype = Some(Rc::new(move || ObjectHandle::new(prototype.clone())));
    }

    pub fn with_prototype<T: MappedClass + Clone>(mut self, prototype: T) -> Self {
        self.set_prototype(prototype);
        self
    }

    pub fn is_instantiable(&self) -> bool {
        self.prototype.is_some()
    }

    pub fn new_instance(&self) -> Result<ObjectHandle> {
        match &self.prototype {
            Some(instantiate) => Ok(instantiate()),
            None => Err(MappingError::NotInstantiable(self.class_name.clone()).into()),
        }
    }
}

impl fmt::Debug for ClassMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let callbacks: Vec<_> = self
            .lifecycle_callbacks
            .iter()
            .map(|(event, callbacks)| (event.as_str(), callbacks.len()))
            .collect();
        f.debug_struct("ClassMetadata")
            .field("class_name", &self.class_name)
            .field("referenced_objects", &self.referenced_objects)
            .field("common_fields", &self.common_fields)
            .field("lifecycle_callbacks", &callbacks)
            .field("instantiable", &self.prototype.is_some())
            .finish()
    }
}
