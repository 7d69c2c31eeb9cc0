// ============================================================================
// JSON Mapping Driver
// ============================================================================
//
// Reads reference mappings from a JSON document:
//
//   {
//     "app::Article": {
//       "document": {
//         "type": "reference-document",
//         "target-object": "app::ArticleDocument",
//         "referenced-by": "uuid",
//         "inversed-by": "uuid",
//         "manager": "default",
//         "common-fields": [
//           { "referenced-by": "title", "inversed-by": "title", "sync-type": "to-reference" }
//         ]
//       }
//     }
//   }
//
// Class and field order of the document is kept, so references are mapped in
// declaration order.
//
// ============================================================================

use indexmap::IndexMap;
use serde::Deserialize;

use super::{ClassMetadata, RawCommonFieldMapping, RawReferenceMapping, reference::COMMON_FIELD_TYPE};
use crate::core::{MappingError, Result};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct ReferenceEntry {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    target_object: Option<String>,
    #[serde(default)]
    referenced_by: Option<String>,
    #[serde(default)]
    inversed_by: Option<String>,
    #[serde(default)]
    manager: Option<String>,
    #[serde(default)]
    common_fields: Vec<CommonFieldEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct CommonFieldEntry {
    #[serde(default)]
    referenced_by: Option<String>,
    #[serde(default)]
    inversed_by: Option<String>,
    #[serde(default)]
    sync_type: Option<String>,
}

type ClassEntry = IndexMap<String, ReferenceEntry>;

/// Literal `"null"` attribute values mean "not set".
fn attribute(value: Option<String>) -> Option<String> {
    value.filter(|v| v != "null")
}

#[derive(Debug, Clone, Default)]
pub struct JsonDriver {
    classes: IndexMap<String, ClassEntry>,
}

impl JsonDriver {
    pub fn from_json(document: &str) -> Result<Self> {
        let classes = serde_json::from_str(document)
            .map_err(|e| MappingError::InvalidMappingDocument(e.to_string()))?;
        Ok(Self { classes })
    }

    pub fn from_value(document: serde_json::Value) -> Result<Self> {
        let classes = serde_json::from_value(document)
            .map_err(|e| MappingError::InvalidMappingDocument(e.to_string()))?;
        Ok(Self { classes })
    }

    /// Merge another document; classes already present are replaced.
    pub fn extend(&mut self, other: JsonDriver) {
        self.classes.extend(other.classes);
    }

    pub fn is_transient(&self, class_name: &str) -> bool {
        !self.classes.contains_key(class_name)
    }

    pub fn all_class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.keys().cloned().collect();
        names.sort();
        names
    }

    /// Map every reference of `class_name` onto `metadata`. Common fields are
    /// mapped before the reference they belong to.
    pub fn load_metadata_for_class(
        &self,
        class_name: &str,
        metadata: &mut ClassMetadata,
    ) -> Result<()> {
        let entry = self
            .classes
            .get(class_name)
            .ok_or_else(|| MappingError::ClassNotMapped(class_name.to_string()))?;

        for (field_name, reference) in entry {
            for common in &reference.common_fields {
                metadata.map_common_field(RawCommonFieldMapping {
                    kind: Some(COMMON_FIELD_TYPE.to_string()),
                    referenced_by: attribute(common.referenced_by.clone()),
                    inversed_by: attribute(common.inversed_by.clone()),
                    sync_type: attribute(common.sync_type.clone()),
                    target_field: Some(field_name.clone()),
                })?;
            }

            metadata.map_referenced_object(RawReferenceMapping {
                field_name: Some(field_name.clone()),
                kind: attribute(reference.kind.clone()),
                target_object: attribute(reference.target_object.clone()),
                referenced_by: attribute(reference.referenced_by.clone()),
                inversed_by: attribute(reference.inversed_by.clone()),
                manager: attribute(reference.manager.clone()),
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::AdapterError;
    use crate::mapping::{ReferenceKind, SyncType};

    const DOCUMENT: &str = r#"{
        "app::Article": {
            "document": {
                "type": "reference-document",
                "target-object": "app::ArticleDocument",
                "referenced-by": "uuid",
                "inversed-by": "uuid",
                "common-fields": [
                    { "referenced-by": "title", "inversed-by": "title", "sync-type": "to-reference" },
                    { "referenced-by": "name", "inversed-by": "name" }
                ]
            },
            "row": {
                "type": "reference-entity",
                "target-object": "app::ArticleRow",
                "referenced-by": "id",
                "inversed-by": "row_id",
                "manager": "archive"
            }
        },
        "app::Author": {}
    }"#;

    fn article_metadata() -> ClassMetadata {
        ClassMetadata::new(
            "app::Article",
            ["uuid", "title", "name", "row_id", "document", "row"],
        )
    }

    #[test]
    fn test_load_metadata_for_class() {
        let driver = JsonDriver::from_json(DOCUMENT).unwrap();
        let mut metadata = article_metadata();
        driver
            .load_metadata_for_class("app::Article", &mut metadata)
            .unwrap();
        metadata.validate().unwrap();

        let fields: Vec<_> = metadata
            .referenced_objects()
            .map(|r| r.field_name.as_str())
            .collect();
        assert_eq!(fields, vec!["document", "row"]);

        let row = metadata.referenced_object("row").unwrap();
        assert_eq!(row.kind, ReferenceKind::Entity);
        assert_eq!(row.manager, "archive");
        assert_eq!(metadata.referenced_object("document").unwrap().manager, "default");

        let commons: Vec<_> = metadata.common_fields_for("document").collect();
        assert_eq!(commons.len(), 3);
        assert_eq!(commons[0].inversed_by, "title");
        assert_eq!(commons[0].sync_type, SyncType::ToReference);
        assert_eq!(commons[1].sync_type, SyncType::FromReference);
    }

    #[test]
    fn test_all_class_names_sorted() {
        let driver = JsonDriver::from_json(DOCUMENT).unwrap();
        assert_eq!(driver.all_class_names(), vec!["app::Article", "app::Author"]);
        assert_eq!(driver.all_class_names(), driver.all_class_names());
        assert!(driver.is_transient("app::Missing"));
    }

    #[test]
    fn test_unknown_class() {
        let driver = JsonDriver::from_json(DOCUMENT).unwrap();
        let mut metadata = article_metadata();
        assert!(matches!(
            driver.load_metadata_for_class("app::Missing", &mut metadata),
            Err(AdapterError::Mapping(MappingError::ClassNotMapped(_)))
        ));
    }

    #[test]
    fn test_null_attribute_is_missing() {
        let driver = JsonDriver::from_json(
            r#"{ "app::Article": { "document": {
                "type": "reference-document",
                "target-object": "null",
                "referenced-by": "uuid",
                "inversed-by": "uuid"
            } } }"#,
        )
        .unwrap();

        let mut metadata = article_metadata();
        match driver.load_metadata_for_class("app::Article", &mut metadata) {
            Err(AdapterError::Mapping(MappingError::MissingAttribute { attribute, .. })) => {
                assert_eq!(attribute, "target-object")
            }
            other => panic!("Expected MissingAttribute, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_document() {
        assert!(matches!(
            JsonDriver::from_json("{ not json"),
            Err(AdapterError::Mapping(MappingError::InvalidMappingDocument(_)))
        ));
    }
}
