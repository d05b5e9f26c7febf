//! End-to-end proxy behaviour against the in-memory backend
//!
//! Run with: cargo test --test proxy_integration

use std::sync::Arc;

use docproxy::backend::{AttachmentOptions, BackendSpec, DocumentBackend, MemoryBackend};
use docproxy::document::{Document, JsonMap, RawDocument, Schema, TypedDocument};
use docproxy::view::{ResultSet, ViewItem, ViewOptions, ViewParams};
use docproxy::{Proxy, ProxyError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Test {
    string: String,
}

impl Schema for Test {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Field {
    field: String,
}

impl Schema for Field {}

fn memory() -> Arc<dyn DocumentBackend> {
    Arc::new(MemoryBackend::new())
}

fn tenants() -> Proxy {
    Proxy::with_backends(vec![("customer_1", memory()), ("customer_2", memory())]).unwrap()
}

#[test]
fn test_registry_lifecycle() {
    let mut proxy = tenants();
    assert!(proxy.contains("customer_1"));
    assert!(proxy.contains("customer_2"));

    proxy.remove_backend("customer_1").unwrap();
    assert!(!proxy.contains("customer_1"));
    assert_eq!(proxy.backend_names(), vec!["customer_2".to_string()]);
}

#[test]
fn test_unknown_backend_kinds_rejected() {
    let mut proxy = Proxy::new();
    for kind in ["blah", "123", "couchdb"] {
        let spec = BackendSpec {
            kind: kind.to_string(),
            ..BackendSpec::memory()
        };
        let err = proxy.add_backend_spec("x", &spec).unwrap_err();
        assert!(matches!(err, ProxyError::TypeValidation(_)), "{kind}: {err}");
    }
    assert!(proxy.is_empty());
}

#[tokio::test]
async fn test_save_and_fetch_across_tenants() {
    let mut proxy = Proxy::new();
    proxy.add_backend("A", memory()).unwrap();

    let mut doc = RawDocument::new();
    doc.insert("s", json!("amazing test"));
    proxy.save("A", &mut doc).await.unwrap();

    let id = doc.id().unwrap().to_string();
    assert!(!id.is_empty());
    assert!(!doc.revision().unwrap().is_empty());

    let fetched: RawDocument = proxy.get("A", &id).await.unwrap();
    assert_eq!(fetched.get("s"), Some(&json!("amazing test")));
    assert_eq!(fetched.revision(), doc.revision());

    let err = proxy.get::<RawDocument>("B", &id).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_update_keeps_backend_revision() {
    let proxy = tenants();
    let mut doc = TypedDocument::new(Test {
        string: "first".into(),
    });
    proxy.save("customer_1", &mut doc).await.unwrap();

    for text in ["second", "third"] {
        doc.string = text.into();
        proxy.save("customer_1", &mut doc).await.unwrap();

        let stored: TypedDocument<Test> = proxy
            .get("customer_1", doc.id().unwrap())
            .await
            .unwrap();
        assert_eq!(stored.revision(), doc.revision());
        assert_eq!(stored.string, text);
    }
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let proxy = tenants();
    let mut doc = TypedDocument::new(Test {
        string: "test".into(),
    });
    proxy.save("customer_1", &mut doc).await.unwrap();
    let id = doc.id().unwrap().to_string();

    assert!(proxy
        .get::<TypedDocument<Test>>("customer_1", &id)
        .await
        .is_ok());
    let err = proxy
        .get::<TypedDocument<Test>>("customer_2", &id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete_lifecycle() {
    let proxy = tenants();
    let mut doc = TypedDocument::new(Test {
        string: "test".into(),
    });

    let err = proxy.delete("customer_1", &mut doc).await.unwrap_err();
    assert!(err.is_type_validation());
    assert!(doc.is_new());

    proxy.save("customer_1", &mut doc).await.unwrap();
    let id = doc.id().unwrap().to_string();

    proxy.delete("customer_1", &mut doc).await.unwrap();
    assert!(doc.id().is_none());
    assert!(doc.revision().is_none());

    let err = proxy
        .get::<TypedDocument<Test>>("customer_1", &id)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    // A deleted document can be saved again as a new one
    proxy.save("customer_1", &mut doc).await.unwrap();
    assert_ne!(doc.id(), Some(id.as_str()));
}

#[tokio::test]
async fn test_attachments() {
    let proxy = tenants();
    let mut doc = TypedDocument::new(Test {
        string: "test".into(),
    });
    proxy.save("customer_1", &mut doc).await.unwrap();

    let content = b"\x00binary\xffpayload".to_vec();
    proxy
        .put_attachment(
            "customer_1",
            &mut doc,
            content.clone(),
            &AttachmentOptions::named("test").with_content_length(content.len() as u64),
        )
        .await
        .unwrap();

    let fetched = proxy
        .fetch_attachment("customer_1", &doc, "test")
        .await
        .unwrap();
    assert_eq!(fetched, content);

    let mut doc: TypedDocument<Test> = proxy
        .get("customer_1", doc.id().unwrap())
        .await
        .unwrap();
    let stub = doc.attachments().get("test").unwrap();
    assert_eq!(stub.length, content.len() as u64);

    proxy
        .delete_attachment("customer_1", &mut doc, "test")
        .await
        .unwrap();
    assert!(doc.attachments().is_empty());

    let err = proxy
        .fetch_attachment("customer_1", &doc, "test")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_view_rows_wrap_into_documents() {
    let backend = MemoryBackend::new().with_view("test/all", |doc: &JsonMap| {
        vec![(doc["field"].clone(), json!({ "field": doc["field"] }))]
    });
    let proxy = Proxy::with_backends(vec![("customer_1", Arc::new(backend) as Arc<dyn DocumentBackend>)])
        .unwrap();

    for field in ["test", "test2"] {
        let mut doc = TypedDocument::new(Field {
            field: field.into(),
        });
        proxy.save("customer_1", &mut doc).await.unwrap();
    }

    let results: ResultSet<TypedDocument<Field>> = proxy
        .view("customer_1", "test/all", ViewOptions::default(), ViewParams::new())
        .await
        .unwrap();
    assert_eq!(results.len(), 2);

    let first = results.first().unwrap().unwrap().into_document().unwrap();
    assert_eq!(first.field, "test");
    assert_eq!(first.id(), results.rows()[0].id.as_deref());

    // Restartable: a second pass yields the same documents
    let again = results.documents().unwrap();
    assert_eq!(again.len(), 2);
    assert_eq!(again[1].field, "test2");

    let limited: ResultSet<TypedDocument<Field>> = proxy
        .view(
            "customer_1",
            "test/all",
            ViewOptions::default(),
            ViewParams::new().with_limit(1),
        )
        .await
        .unwrap();
    let items = limited.all().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_document().unwrap().field, "test");
}

#[tokio::test]
async fn test_view_scalar_values_stay_raw() {
    let backend = MemoryBackend::new().with_view("test/count", |doc: &JsonMap| {
        vec![(doc["_id"].clone(), Value::from(1))]
    });
    let proxy = Proxy::with_backends(vec![("customer_1", Arc::new(backend) as Arc<dyn DocumentBackend>)])
        .unwrap();
    let mut doc = RawDocument::new();
    proxy.save("customer_1", &mut doc).await.unwrap();

    let results: ResultSet<RawDocument> = proxy
        .view("customer_1", "test/count", ViewOptions::default(), ViewParams::new())
        .await
        .unwrap();
    for item in &results {
        match item.unwrap() {
            ViewItem::Row(row) => assert_eq!(row.value, Some(json!(1))),
            ViewItem::Document(_) => panic!("scalar value must not be wrapped"),
        }
    }

    let err = proxy
        .view::<RawDocument>("customer_1", "test/missing", ViewOptions::default(), ViewParams::new())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
