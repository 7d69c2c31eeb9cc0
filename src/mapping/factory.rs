use log::debug;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use super::ClassMetadata;
use crate::core::{MappingError, Result};

/// Registry of validated class metadata, keyed by class name.
///
/// Metadata is immutable once registered; lookups hand out shared handles so a
/// caller can keep using metadata while the registry is borrowed elsewhere.
///
/// Reference targets must be known types: a class with registered metadata,
/// or one declared with [`declare_type`](Self::declare_type).
#[derive(Debug, Default)]
pub struct ClassMetadataFactory {
    metadata: HashMap<String, Rc<ClassMetadata>>,
    known_types: HashSet<String>,
}

impl ClassMetadataFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `class_name` a valid reference target without mapping it.
    pub fn declare_type(&mut self, class_name: impl Into<String>) {
        self.known_types.insert(class_name.into());
    }

    pub fn is_known_type(&self, class_name: &str) -> bool {
        self.known_types.contains(class_name) || self.metadata.contains_key(class_name)
    }

    /// Validate and store metadata, replacing any previous entry for the class.
    pub fn register(&mut self, metadata: ClassMetadata) -> Result<Rc<ClassMetadata>> {
        metadata.validate()?;

        for reference in metadata.referenced_objects() {
            let target = reference.target_object.as_str();
            if target != metadata.name() && !self.is_known_type(target) {
                return Err(MappingError::UnknownTargetType {
                    class: metadata.name().to_string(),
                    field: reference.field_name.clone(),
                    target: target.to_string(),
                }
                .into());
            }
        }

        let name = metadata.name().to_string();
        let metadata = Rc::new(metadata);
        if self
            .metadata
            .insert(name.clone(), Rc::clone(&metadata))
            .is_some()
        {
            debug!("Replaced class metadata for {}", name);
        } else {
            debug!("Registered class metadata for {}", name);
        }

        Ok(metadata)
    }

    pub fn get_metadata_for(&self, class_name: &str) -> Result<Rc<ClassMetadata>> {
        self.metadata
            .get(class_name)
            .cloned()
            .ok_or_else(|| MappingError::ClassNotMapped(class_name.to_string()).into())
    }

    pub fn has_metadata_for(&self, class_name: &str) -> bool {
        self.metadata.contains_key(class_name)
    }

    /// All registered metadata, sorted by class name.
    pub fn all_metadata(&self) -> Vec<Rc<ClassMetadata>> {
        let mut all: Vec<_> = self.metadata.values().cloned().collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}
