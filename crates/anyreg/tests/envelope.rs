use std::{sync::Arc, time::SystemTime};

use anyreg::{
    AnyValue, Envelope, LegacyAny, Message, MessageCatalog, Registry, RegistryError, wkt,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Test {
    name: String,
    age: i64,
}
impl Message for Test {}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
struct Test2 {
    name: String,
}
impl Message for Test2 {}

fn koye() -> Test {
    Test {
        name: "koye".into(),
        age: 6,
    }
}

#[test]
fn register_then_resolve_type_url() {
    let registry = Registry::new();
    registry.register::<Test>("test");
    assert_eq!(registry.type_url(&Test::default()).expect("type url"), "test");
}

#[test]
fn remarshal_copies_payload() {
    let registry = Registry::new();
    registry.register::<Test>("test");

    let any = registry.marshal_any(&koye()).expect("marshal");
    assert_eq!(any.type_url, "test");

    let mut again = registry.marshal_any(&any).expect("marshal again");
    assert_eq!(again, any);
    assert_ne!(again.value.as_ptr(), any.value.as_ptr());

    again.value[0] ^= 0xff;
    assert_ne!(again.value, any.value);
    assert_eq!(
        registry
            .unmarshal_any(&any)
            .expect("unmarshal")
            .expect("present")
            .downcast::<Test>()
            .map(|t| *t)
            .expect("test"),
        koye()
    );
}

#[test]
fn marshal_unmarshal_any() {
    let registry = Registry::new();
    registry.register::<Test>("test");

    let any = registry.marshal_any(&koye()).expect("marshal");
    let decoded = registry
        .unmarshal_any(&any)
        .expect("unmarshal")
        .expect("present");
    let test = decoded.downcast::<Test>().expect("expected value to cast to Test");
    assert_eq!(test.name, "koye");
    assert_eq!(test.age, 6);
}

#[test]
fn marshal_unmarshal_to() {
    let registry = Registry::new();
    registry.register::<Test>("test");

    let any = registry.marshal_any(&koye()).expect("marshal");
    let mut out = Test::default();
    registry.unmarshal_to(&any, &mut out).expect("unmarshal to");
    assert_eq!(out, koye());
}

#[test]
fn unmarshal_to_wrong_type_fails() {
    let registry = Registry::new();
    registry.register::<Test>("test1");
    registry.register::<Test2>("test2");

    let any = registry.marshal_any(&koye()).expect("marshal");
    let mut out = Test2::default();
    let err = registry.unmarshal_to(&any, &mut out).unwrap_err();
    assert!(matches!(err, RegistryError::TypeMismatch { .. }));
    assert_eq!(
        err.to_string(),
        r#"can't unmarshal type "test1" to output "test2""#
    );
    assert_eq!(out, Test2::default());
}

#[test]
fn is_matches_only_the_marshaled_type() {
    let registry = Registry::new();
    registry.register::<Test>("test");
    registry.register::<Test2>("test2");

    let any = registry.marshal_any(&koye()).expect("marshal");
    assert!(registry.is(&any, &Test::default()));
    assert!(!registry.is(&any, &Test2::default()));
}

#[test]
#[should_panic]
fn registering_different_urls_panics() {
    let registry = Registry::new();
    registry.register::<Test>("test");
    registry.register_with_aliases::<Test>("test", ["two"]);
}

#[test]
fn unmarshal_absent_envelope() {
    let registry = Registry::new();

    let typed: Option<AnyValue> = None;
    assert!(registry.unmarshal_any(&typed).expect("typed none").is_none());

    let untyped: Option<&dyn Envelope> = None;
    assert!(registry.unmarshal_any(&untyped).expect("untyped none").is_none());

    let boxed: Option<Box<LegacyAny>> = None;
    assert!(registry.unmarshal_any(&boxed).expect("boxed none").is_none());
}

#[test]
fn absent_envelope_payload_is_empty() {
    let missing: Option<LegacyAny> = None;
    assert!(missing.value().is_empty());
}

#[test]
fn catalog_fallback_decodes_timestamp() {
    let registry = Registry::new();
    let expected = SystemTime::now();
    let bytes = anyreg_cbor::to_canonical_cbor(&wkt::Timestamp::from(expected)).expect("encode");

    let decoded = registry
        .unmarshal_by_type_url("type.googleapis.com/google.protobuf.Timestamp", &bytes)
        .expect("unmarshal");
    let ts = decoded
        .downcast::<wkt::Timestamp>()
        .expect("failed to convert to Timestamp");
    assert_eq!(ts.to_system_time(), expected);
}

#[test]
fn catalog_types_marshal_without_registration() {
    let registry = Registry::new();
    let any = registry
        .marshal_any(&wkt::StringValue {
            value: "hello".into(),
        })
        .expect("marshal");
    assert_eq!(any.type_url, "type.googleapis.com/google.protobuf.StringValue");

    let mut out = wkt::StringValue::default();
    registry.unmarshal_to(&any, &mut out).expect("unmarshal to");
    assert_eq!(out.value, "hello");
}

#[test]
fn injected_catalog_replaces_well_known_types() {
    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Heartbeat {
        seq: u64,
    }
    impl Message for Heartbeat {}

    let catalog = MessageCatalog::builder()
        .message::<Heartbeat>("agent.v1.Heartbeat")
        .build()
        .expect("catalog");
    let registry = Registry::with_catalog(Arc::new(catalog));

    let any = registry.marshal_any(&Heartbeat { seq: 3 }).expect("marshal");
    assert_eq!(any.type_url, "type.googleapis.com/agent.v1.Heartbeat");
    let decoded = registry
        .unmarshal_any(&any)
        .expect("unmarshal")
        .expect("present");
    assert_eq!(*decoded.downcast::<Heartbeat>().expect("heartbeat"), Heartbeat { seq: 3 });

    let err = registry
        .unmarshal_by_type_url("type.googleapis.com/google.protobuf.Timestamp", &[])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn legacy_and_current_envelopes_are_interchangeable() {
    let registry = Registry::new();
    registry.register::<Test>("test");

    let current = registry.marshal_any(&koye()).expect("marshal");
    let legacy = LegacyAny::new(current.type_url.clone(), current.value.clone());

    let mut from_legacy = Test::default();
    registry.unmarshal_to(&legacy, &mut from_legacy).expect("legacy");
    assert_eq!(from_legacy, koye());
    assert!(registry.is(&legacy, &Test::default()));
    assert_eq!(AnyValue::from(legacy), current);
}

#[test]
fn envelope_survives_transport_as_cbor() {
    let registry = Registry::new();
    registry.register::<Test>("test");

    let any = registry.marshal_any(&koye()).expect("marshal");
    let wire = anyreg_cbor::to_canonical_cbor(&any).expect("encode envelope");
    let received: AnyValue = anyreg_cbor::from_cbor(&wire).expect("decode envelope");

    let decoded = registry
        .unmarshal_by_type_url(received.type_url(), received.value())
        .expect("unmarshal");
    assert_eq!(*decoded.downcast::<Test>().expect("test"), koye());
}
