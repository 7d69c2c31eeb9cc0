use indexmap::IndexMap;
use log::debug;
use std::fmt;
use std::rc::Rc;

use crate::core::{ConfigurationError, Result};
use crate::manager::ManagerHandle;
use crate::mapping::ReferenceKind;

/// Manager name used when a reference mapping does not name one.
pub const DEFAULT_MANAGER_NAME: &str = "default";

/// Registry of downstream managers keyed by reference kind and manager name.
///
/// ```
/// use object_adapter::{Configuration, InMemoryObjectManager, ReferenceKind, manager_handle};
///
/// let config = Configuration::new()
///     .with_manager(ReferenceKind::Document, "default", manager_handle(InMemoryObjectManager::new("documents")))
///     .with_manager(ReferenceKind::Entity, "default", manager_handle(InMemoryObjectManager::new("entities")));
///
/// assert!(config.has_manager(ReferenceKind::Document, "default"));
/// ```
#[derive(Clone, Default)]
pub struct Configuration {
    managers: IndexMap<(ReferenceKind, String), ManagerHandle>,
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a manager, builder style.
    pub fn with_manager(
        mut self,
        kind: ReferenceKind,
        name: impl Into<String>,
        manager: ManagerHandle,
    ) -> Self {
        self.add_manager(kind, name, manager);
        self
    }

    /// Register a manager, replacing any manager already registered under
    /// the same kind and name.
    pub fn add_manager(&mut self, kind: ReferenceKind, name: impl Into<String>, manager: ManagerHandle) {
        let name = name.into();
        debug!("Registering {} manager '{}'", kind, name);
        self.managers.insert((kind, name), manager);
    }

    pub fn add_manager_by_type(
        &mut self,
        type_name: &str,
        name: impl Into<String>,
        manager: ManagerHandle,
    ) -> Result<()> {
        let kind = Self::parse_kind(type_name)?;
        self.add_manager(kind, name, manager);
        Ok(())
    }

    pub fn get_manager_by_reference_type(
        &self,
        kind: ReferenceKind,
        name: &str,
    ) -> Result<ManagerHandle> {
        self.managers
            .get(&(kind, name.to_string()))
            .map(Rc::clone)
            .ok_or_else(|| {
                ConfigurationError::ManagerNotFound {
                    kind: kind.to_string(),
                    name: name.to_string(),
                }
                .into()
            })
    }

    /// String form of [`get_manager_by_reference_type`](Self::get_manager_by_reference_type).
    pub fn get_manager_by_type(&self, type_name: &str, name: &str) -> Result<ManagerHandle> {
        let kind = Self::parse_kind(type_name)?;
        self.get_manager_by_reference_type(kind, name)
    }

    pub fn has_manager(&self, kind: ReferenceKind, name: &str) -> bool {
        self.managers.contains_key(&(kind, name.to_string()))
    }

    /// Registered managers in registration order.
    pub fn managers(&self) -> impl Iterator<Item = (ReferenceKind, &str, &ManagerHandle)> {
        self.managers
            .iter()
            .map(|((kind, name), manager)| (*kind, name.as_str(), manager))
    }

    fn parse_kind(type_name: &str) -> std::result::Result<ReferenceKind, ConfigurationError> {
        type_name
            .parse()
            .map_err(|_| ConfigurationError::UnknownReferenceType(type_name.to_string()))
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self
            .managers
            .keys()
            .map(|(kind, name)| format!("{}:{}", kind, name))
            .collect();
        f.debug_struct("Configuration").field("managers", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AdapterError;
    use crate::manager::{InMemoryObjectManager, ManagerId, manager_handle};

    #[test]
    fn test_lookup_by_kind_and_name() {
        let documents = manager_handle(InMemoryObjectManager::new("documents"));
        let archive = manager_handle(InMemoryObjectManager::new("archive"));
        let config = Configuration::new()
            .with_manager(ReferenceKind::Document, DEFAULT_MANAGER_NAME, Rc::clone(&documents))
            .with_manager(ReferenceKind::Document, "archive", Rc::clone(&archive));

        let found = config
            .get_manager_by_reference_type(ReferenceKind::Document, "archive")
            .unwrap();
        assert_eq!(ManagerId::of(&found), ManagerId::of(&archive));
        assert_eq!(config.managers().count(), 2);

        match config.get_manager_by_reference_type(ReferenceKind::Entity, DEFAULT_MANAGER_NAME) {
            Err(AdapterError::Configuration(ConfigurationError::ManagerNotFound { kind, name })) => {
                assert_eq!(kind, "reference-entity");
                assert_eq!(name, "default");
            }
            other => panic!("Expected ManagerNotFound, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_unknown_type_name() {
        let mut config = Configuration::new();
        match config.get_manager_by_type("unknown-type", DEFAULT_MANAGER_NAME) {
            Err(AdapterError::Configuration(ConfigurationError::UnknownReferenceType(t))) => {
                assert_eq!(t, "unknown-type")
            }
            other => panic!("Expected UnknownReferenceType, got {:?}", other.map(|_| ())),
        }

        let manager = manager_handle(InMemoryObjectManager::new("entities"));
        assert!(config
            .add_manager_by_type("unknown-type", DEFAULT_MANAGER_NAME, Rc::clone(&manager))
            .is_err());
        config
            .add_manager_by_type("reference-entity", DEFAULT_MANAGER_NAME, manager)
            .unwrap();
        assert!(config.has_manager(ReferenceKind::Entity, DEFAULT_MANAGER_NAME));
    }
}
