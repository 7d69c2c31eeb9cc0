#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use object_adapter::prelude::*;
use object_adapter::{EventManager, Result};

#[derive(Mapped, Clone, Default)]
#[mapped(class = "test::ReferenceMappingObject")]
pub struct ReferenceMappingObject {
    pub id: Option<String>,
    pub uuid: Option<String>,
    pub entity_name: Option<String>,
    #[mapped(reference)]
    pub referenced_field: Option<ObjectHandle>,
}

#[derive(Mapped, Clone, Default)]
#[mapped(class = "test::InvertedReferenceMappingObject")]
pub struct InvertedReferenceMappingObject {
    pub uuid: Option<String>,
    pub name: Option<String>,
    pub doc_name: Option<String>,
}

/// Two references served by two different managers.
#[derive(Mapped, Clone, Default)]
#[mapped(class = "test::DualReferenceObject")]
pub struct DualReferenceObject {
    pub uuid: Option<String>,
    pub row_id: Option<String>,
    pub title: Option<String>,
    #[mapped(reference)]
    pub document: Option<ObjectHandle>,
    #[mapped(reference)]
    pub row: Option<ObjectHandle>,
    #[mapped(skip)]
    pub note: String,
}

#[derive(Mapped, Clone, Default)]
#[mapped(class = "test::ReferencedRow")]
pub struct ReferencedRow {
    pub id: Option<String>,
    pub label: Option<String>,
}

/// Not mapped for the adapter.
#[derive(Mapped, Clone, Default)]
#[mapped(class = "test::Unmapped")]
pub struct Unmapped {
    pub name: Option<String>,
}

pub const MAPPING: &str = r#"{
    "test::ReferenceMappingObject": {
        "referenced_field": {
            "type": "reference-document",
            "target-object": "test::InvertedReferenceMappingObject",
            "referenced-by": "uuid",
            "inversed-by": "uuid",
            "common-fields": [
                { "referenced-by": "doc_name", "inversed-by": "entity_name" }
            ]
        }
    },
    "test::DualReferenceObject": {
        "document": {
            "type": "reference-document",
            "target-object": "test::InvertedReferenceMappingObject",
            "referenced-by": "uuid",
            "inversed-by": "uuid",
            "common-fields": [
                { "referenced-by": "name", "inversed-by": "title", "sync-type": "to-reference" }
            ]
        },
        "row": {
            "type": "reference-entity",
            "target-object": "test::ReferencedRow",
            "referenced-by": "id",
            "inversed-by": "row_id",
            "manager": "rows"
        }
    }
}"#;

pub struct Fixture {
    pub oam: ObjectAdapterManager,
    pub documents: Rc<RefCell<InMemoryObjectManager>>,
    pub rows: Rc<RefCell<InMemoryObjectManager>>,
}

pub fn fixture() -> Fixture {
    fixture_with_events(EventManager::new())
}

pub fn fixture_with_events(event_manager: EventManager) -> Fixture {
    let documents = Rc::new(RefCell::new(
        InMemoryObjectManager::new("documents")
            .with_identifier("uuid")
            .with_prototype(InvertedReferenceMappingObject::default()),
    ));
    let rows = Rc::new(RefCell::new(
        InMemoryObjectManager::new("rows")
            .with_identifier("id")
            .with_prototype(ReferencedRow::default()),
    ));

    let configuration = Configuration::new()
        .with_manager(ReferenceKind::Document, "default", documents.clone())
        .with_manager(ReferenceKind::Entity, "rows", rows.clone());

    let driver = JsonDriver::from_json(MAPPING).expect("test mapping parses");
    let mut oam =
        ObjectAdapterManager::with_event_manager(configuration, event_manager).with_driver(driver);
    oam.declare_class::<InvertedReferenceMappingObject>();
    oam.declare_class::<ReferencedRow>();
    oam.register_class::<ReferenceMappingObject>()
        .expect("ReferenceMappingObject maps");
    oam.register_class::<DualReferenceObject>()
        .expect("DualReferenceObject maps");

    Fixture {
        oam,
        documents,
        rows,
    }
}

pub fn document(doc_name: &str) -> ObjectHandle {
    ObjectHandle::new(InvertedReferenceMappingObject {
        uuid: None,
        name: Some("event-test".to_string()),
        doc_name: Some(doc_name.to_string()),
    })
}

pub fn object_with(referenced: &ObjectHandle) -> ObjectHandle {
    ObjectHandle::new(ReferenceMappingObject {
        id: Some("test-id".to_string()),
        referenced_field: Some(referenced.clone()),
        ..Default::default()
    })
}

pub fn dual_object(title: &str) -> (ObjectHandle, ObjectHandle, ObjectHandle) {
    let document = ObjectHandle::new(InvertedReferenceMappingObject::default());
    let row = ObjectHandle::new(ReferencedRow {
        id: None,
        label: Some("row".to_string()),
    });
    let object = ObjectHandle::new(DualReferenceObject {
        title: Some(title.to_string()),
        document: Some(document.clone()),
        row: Some(row.clone()),
        ..Default::default()
    });
    (object, document, row)
}

pub fn field(object: &ObjectHandle, name: &str) -> Value {
    object
        .read()
        .expect("object not borrowed")
        .field(name)
        .expect("mapped field")
}

pub type EventLog = Rc<RefCell<Vec<(Event, Option<String>)>>>;

/// Records every dispatched event with the reference field it concerns.
pub fn record_events(event_manager: &mut EventManager, events: &[Event]) -> EventLog {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    event_manager.add_event_listener(events, move |event, args| -> Result<()> {
        let field = args.as_lifecycle().map(|args| args.field().to_string());
        sink.borrow_mut().push((event, field));
        Ok(())
    });
    log
}

pub fn fired(log: &EventLog, event: Event) -> bool {
    log.borrow().iter().any(|(e, _)| *e == event)
}

pub fn count(log: &EventLog, event: Event) -> usize {
    log.borrow().iter().filter(|(e, _)| *e == event).count()
}
