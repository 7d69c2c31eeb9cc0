mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::*;
use object_adapter::prelude::*;
use object_adapter::{AdapterError, EventManager, MappingError, Result};

const LIFECYCLE_AND_FLUSH: [Event; 11] = [
    Event::PreBindReference,
    Event::PostBindReference,
    Event::PostLoadReference,
    Event::PreUpdateReference,
    Event::PostUpdateReference,
    Event::PreRemoveReference,
    Event::PostRemoveReference,
    Event::PreFlushReference,
    Event::OnFlushReference,
    Event::PostFlushReference,
    Event::OnClear,
];

#[test]
fn test_event_order_through_bridge() {
    let mut events = EventManager::new();
    let log = record_events(&mut events, &LIFECYCLE_AND_FLUSH);
    let fx = fixture_with_events(events);
    let adapter = Rc::new(RefCell::new(fx.oam));
    let bridge = LifecycleBridge::new(Rc::clone(&adapter));

    let d = document("event-test");
    let a = object_with(&d);

    bridge.pre_persist(&a).unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            (Event::PreBindReference, Some("referenced_field".to_string())),
            (Event::PostBindReference, Some("referenced_field".to_string())),
        ]
    );
    log.borrow_mut().clear();

    bridge.pre_flush().unwrap();
    assert_eq!(
        *log.borrow(),
        vec![
            (Event::PreFlushReference, None),
            (Event::OnFlushReference, None),
            (Event::PostBindReference, Some("referenced_field".to_string())),
            (Event::PostFlushReference, None),
        ]
    );
    log.borrow_mut().clear();

    bridge.on_clear().unwrap();
    assert_eq!(*log.borrow(), vec![(Event::OnClear, None)]);
    log.borrow_mut().clear();

    let loaded = ObjectHandle::new(ReferenceMappingObject {
        uuid: FieldValue::from_value(field(&a, "uuid")).unwrap(),
        ..Default::default()
    });
    adapter.borrow_mut().find_reference(&loaded).unwrap();
    assert!(fired(&log, Event::PostLoadReference));
    assert_eq!(count(&log, Event::PreBindReference), 0);
    log.borrow_mut().clear();

    bridge.pre_remove(&loaded).unwrap();
    assert!(fired(&log, Event::PreRemoveReference));
    assert!(!fired(&log, Event::PostRemoveReference));

    bridge.pre_flush().unwrap();
    assert_eq!(count(&log, Event::PostRemoveReference), 1);
    assert!(!fx.documents.borrow().contains(&d));
}

#[test]
fn test_update_events() {
    let mut events = EventManager::new();
    let log = record_events(&mut events, &LIFECYCLE_AND_FLUSH);
    let mut fx = fixture_with_events(events);
    let a = object_with(&document("x"));

    fx.oam.persist_reference(&a).unwrap();
    fx.oam.flush_reference().unwrap();
    log.borrow_mut().clear();

    fx.oam.persist_reference(&a).unwrap();
    assert_eq!(count(&log, Event::PreUpdateReference), 1);
    assert_eq!(count(&log, Event::PostUpdateReference), 1);
    assert!(!fired(&log, Event::PreBindReference));

    fx.oam.flush_reference().unwrap();
    assert_eq!(count(&log, Event::PostUpdateReference), 2);
    assert!(!fired(&log, Event::PostBindReference));
}

#[test]
fn test_post_events_fire_on_bind_and_once_per_committed_entry() {
    let mut events = EventManager::new();
    let log = record_events(&mut events, &[Event::PostBindReference]);
    let mut fx = fixture_with_events(events);

    let (object, _, _) = dual_object("t");
    fx.oam.persist_reference(&object).unwrap();
    let bound = vec![
        (Event::PostBindReference, Some("document".to_string())),
        (Event::PostBindReference, Some("row".to_string())),
    ];
    assert_eq!(*log.borrow(), bound);
    log.borrow_mut().clear();

    fx.oam.flush_reference().unwrap();
    fx.oam.flush_reference().unwrap();
    assert_eq!(*log.borrow(), bound);
}

#[test]
fn test_bind_order_persist_then_post_event_then_sync() {
    // (event, counterpart key assigned, common field pulled)
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut events = EventManager::new();
    let sink = Rc::clone(&seen);
    events.add_event_listener(
        &[Event::PreBindReference, Event::PostBindReference],
        move |event, args| -> Result<()> {
            let args = args.as_lifecycle().expect("lifecycle payload");
            let referenced = args.referenced().expect("counterpart");
            let keyed = !referenced.read()?.field("uuid")?.is_null();
            let synced = !args.object().read()?.field("entity_name")?.is_null();
            sink.borrow_mut().push((event, keyed, synced));
            Ok(())
        },
    );
    let mut fx = fixture_with_events(events);
    let a = object_with(&document("x"));

    fx.oam.persist_reference(&a).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![
            (Event::PreBindReference, false, false),
            (Event::PostBindReference, true, false),
        ]
    );
    assert_eq!(field(&a, "entity_name"), Value::Text("x".into()));
}

#[test]
fn test_flush_events_fire_with_empty_schedule() {
    let mut events = EventManager::new();
    let log = record_events(&mut events, &LIFECYCLE_AND_FLUSH);
    let mut fx = fixture_with_events(events);

    fx.oam.flush_reference().unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            (Event::PreFlushReference, None),
            (Event::OnFlushReference, None),
            (Event::PostFlushReference, None),
        ]
    );
    assert_eq!(fx.documents.borrow().flush_count(), 0);
}

#[test]
fn test_class_callbacks_run_before_listeners() {
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut events = EventManager::new();
    let sink = Rc::clone(&order);
    events.add_event_listener(&[Event::PreBindReference], move |_, _| -> Result<()> {
        sink.borrow_mut().push("listener");
        Ok(())
    });
    let mut fx = fixture_with_events(events);

    let mut metadata = ClassMetadata::for_class::<ReferenceMappingObject>();
    let sink = Rc::clone(&order);
    metadata
        .add_lifecycle_callback(Event::PreBindReference, move |_| {
            sink.borrow_mut().push("callback");
            Ok(())
        })
        .unwrap();
    fx.oam.load_class_metadata(metadata).unwrap();

    fx.oam
        .persist_reference(&object_with(&document("x")))
        .unwrap();

    assert_eq!(*order.borrow(), vec!["callback", "listener"]);
}

#[test]
fn test_typed_callback_mutates_object() {
    let mut fx = fixture();
    let mut metadata = ClassMetadata::for_class::<ReferenceMappingObject>();
    metadata
        .add_typed_lifecycle_callback(
            Event::PreBindReference,
            |object: &mut ReferenceMappingObject, args| {
                object.id = Some(format!("bound-{}", args.field()));
                Ok(())
            },
        )
        .unwrap();
    fx.oam.load_class_metadata(metadata).unwrap();

    let a = object_with(&document("x"));
    fx.oam.persist_reference(&a).unwrap();

    assert_eq!(field(&a, "id"), Value::Text("bound-referenced_field".into()));
}

#[test]
fn test_listener_sees_unit_of_work_state() {
    let seen = Rc::new(RefCell::new(Vec::new()));

    let mut events = EventManager::new();
    let sink = Rc::clone(&seen);
    events.add_event_listener(&[Event::PostBindReference], move |_, args| -> Result<()> {
        let args = args.as_lifecycle().expect("lifecycle payload");
        let uow = args.unit_of_work();
        let referenced = args.referenced().expect("counterpart");
        sink.borrow_mut().push((
            uow.is_managed(args.object()),
            uow.is_referenced(referenced),
        ));
        Ok(())
    });
    let mut fx = fixture_with_events(events);

    fx.oam
        .persist_reference(&object_with(&document("x")))
        .unwrap();
    fx.oam.flush_reference().unwrap();

    // during persist the pair is tracked only after sync; at commit both are
    assert_eq!(*seen.borrow(), vec![(false, false), (true, true)]);
}

#[test]
fn test_listener_error_stops_persist() {
    let mut events = EventManager::new();
    events.add_event_listener(&[Event::PreBindReference], |_, _| -> Result<()> {
        Err(anyhow::anyhow!("binding vetoed").into())
    });
    let mut fx = fixture_with_events(events);
    let d = document("x");
    let a = object_with(&d);

    let err = fx.oam.persist_reference(&a).unwrap_err();
    assert!(matches!(err, AdapterError::Backend(_)));
    assert!(err.to_string().contains("binding vetoed"));

    assert!(fx.documents.borrow().calls().is_empty());
    assert!(fx.oam.unit_of_work().scheduled_references_for_insert().is_empty());
}

#[test]
fn test_callbacks_only_for_lifecycle_events() {
    let mut metadata = ClassMetadata::for_class::<ReferenceMappingObject>();
    match metadata.add_lifecycle_callback(Event::OnClear, |_| Ok(())) {
        Err(AdapterError::Mapping(MappingError::InvalidLifecycleEvent(event))) => {
            assert_eq!(event, "onClear");
        }
        other => panic!("Expected InvalidLifecycleEvent, got {:?}", other),
    }
    assert!(!metadata.has_lifecycle_callbacks(Event::OnClear));
}

#[test]
fn test_load_class_metadata_event() {
    let classes = Rc::new(RefCell::new(Vec::new()));

    let mut events = EventManager::new();
    let sink = Rc::clone(&classes);
    events.add_event_listener(&[Event::LoadClassMetadata], move |_, args| -> Result<()> {
        if let EventArgs::LoadClassMetadata(args) = args {
            let metadata = args.class_metadata();
            sink.borrow_mut()
                .push((metadata.name().to_string(), metadata.referenced_objects().count()));
        }
        Ok(())
    });
    let _fx = fixture_with_events(events);

    assert_eq!(
        *classes.borrow(),
        vec![
            ("test::ReferenceMappingObject".to_string(), 1),
            ("test::DualReferenceObject".to_string(), 2),
        ]
    );
}

#[test]
fn test_clear_fires_on_clear_every_time() {
    let mut events = EventManager::new();
    let log = record_events(&mut events, &[Event::OnClear]);
    let mut fx = fixture_with_events(events);

    fx.oam.clear().unwrap();
    fx.oam.clear().unwrap();

    assert_eq!(count(&log, Event::OnClear), 2);
    assert_eq!(fx.documents.borrow().clear_count(), 0);
}
