use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::MappingError;

pub const COMMON_FIELD_TYPE: &str = "common-field";

/// Which kind of downstream store serves a reference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReferenceKind {
    /// Document-tree (content repository) store.
    #[serde(rename = "reference-document")]
    Document,
    /// Relational entity store.
    #[serde(rename = "reference-entity")]
    Entity,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 2] = [ReferenceKind::Document, ReferenceKind::Entity];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Document => "reference-document",
            ReferenceKind::Entity => "reference-entity",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reference-document" => Ok(ReferenceKind::Document),
            "reference-entity" => Ok(ReferenceKind::Entity),
            other => Err(MappingError::UnknownReferenceKind(other.to_string())),
        }
    }
}

/// Direction in which a common field is copied after bind/update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncType {
    /// Object -> Referenced Object.
    ToReference,
    /// Referenced Object -> Object.
    #[default]
    FromReference,
}

impl SyncType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncType::ToReference => "to-reference",
            SyncType::FromReference => "from-reference",
        }
    }
}

impl fmt::Display for SyncType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncType {
    type Err = MappingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "to-reference" | "to-document" => Ok(SyncType::ToReference),
            "from-reference" | "to-entity" => Ok(SyncType::FromReference),
            other => Err(MappingError::UnknownSyncType(other.to_string())),
        }
    }
}

/// Unvalidated reference mapping, as produced by a driver or by hand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawReferenceMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
}

impl RawReferenceMapping {
    pub fn new(field_name: impl Into<String>, kind: ReferenceKind) -> Self {
        Self {
            field_name: Some(field_name.into()),
            kind: Some(kind.as_str().to_string()),
            ..Default::default()
        }
    }

    pub fn target_object(mut self, target: impl Into<String>) -> Self {
        self.target_object = Some(target.into());
        self
    }

    pub fn referenced_by(mut self, field: impl Into<String>) -> Self {
        self.referenced_by = Some(field.into());
        self
    }

    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inversed_by = Some(field.into());
        self
    }

    pub fn manager(mut self, name: impl Into<String>) -> Self {
        self.manager = Some(name.into());
        self
    }
}

/// Unvalidated common-field mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RawCommonFieldMapping {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversed_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
}

impl RawCommonFieldMapping {
    pub fn new(
        target_field: impl Into<String>,
        inversed_by: impl Into<String>,
        referenced_by: impl Into<String>,
    ) -> Self {
        Self {
            kind: Some(COMMON_FIELD_TYPE.to_string()),
            referenced_by: Some(referenced_by.into()),
            inversed_by: Some(inversed_by.into()),
            sync_type: None,
            target_field: Some(target_field.into()),
        }
    }

    pub fn sync_type(mut self, sync_type: SyncType) -> Self {
        self.sync_type = Some(sync_type.as_str().to_string());
        self
    }
}

/// A validated reference field: the slot on the Object that holds the
/// counterpart, and how the two are linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ReferenceMapping {
    pub field_name: String,
    #[serde(rename = "type")]
    pub kind: ReferenceKind,
    pub target_object: String,
    /// Field on the Referenced Object holding the linking value.
    pub referenced_by: String,
    /// Field on the Object holding the linking value.
    pub inversed_by: String,
    pub manager: String,
}

/// A validated pair of mirrored slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CommonFieldMapping {
    /// Field on the Object.
    pub inversed_by: String,
    /// Field on the Referenced Object.
    pub referenced_by: String,
    pub sync_type: SyncType,
    /// Reference field this pair belongs to.
    pub target_field: String,
}

impl CommonFieldMapping {
    /// The common field carrying a reference's linking key back onto the Object.
    pub fn linking_key(reference: &ReferenceMapping) -> Self {
        Self {
            inversed_by: reference.inversed_by.clone(),
            referenced_by: reference.referenced_by.clone(),
            sync_type: SyncType::FromReference,
            target_field: reference.field_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_kind_parse() {
        assert_eq!(
            "reference-document".parse::<ReferenceKind>().unwrap(),
            ReferenceKind::Document
        );
        match "reference-phpcr".parse::<ReferenceKind>() {
            Err(MappingError::UnknownReferenceKind(kind)) => assert_eq!(kind, "reference-phpcr"),
            other => panic!("Expected UnknownReferenceKind, got {:?}", other),
        }
    }

    #[test]
    fn test_sync_type_accepts_legacy_names() {
        assert_eq!("to-document".parse::<SyncType>().unwrap(), SyncType::ToReference);
        assert_eq!("to-entity".parse::<SyncType>().unwrap(), SyncType::FromReference);
        assert_eq!(SyncType::default(), SyncType::FromReference);
        assert!("sideways".parse::<SyncType>().is_err());
    }

    #[test]
    fn test_linking_key_pulls_from_reference() {
        let reference = ReferenceMapping {
            field_name: "document".into(),
            kind: ReferenceKind::Document,
            target_object: "app::Page".into(),
            referenced_by: "uuid".into(),
            inversed_by: "page_uuid".into(),
            manager: "default".into(),
        };

        let common = CommonFieldMapping::linking_key(&reference);
        assert_eq!(common.inversed_by, "page_uuid");
        assert_eq!(common.referenced_by, "uuid");
        assert_eq!(common.sync_type, SyncType::FromReference);
        assert_eq!(common.target_field, "document");
    }
}
