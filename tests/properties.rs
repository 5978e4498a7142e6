use entity_rest::{
    CrudService, EntityDescriptor, FieldDescriptor, FieldType, FieldVisibility, KeyTuple, MemoryStore, QuerySpec,
    Record, Serializer,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn entity() -> EntityDescriptor {
    EntityDescriptor::builder("note")
        .field(FieldDescriptor::new("id", FieldType::Integer).autoincrement())
        .field(FieldDescriptor::new("title", FieldType::String).not_null())
        .field(FieldDescriptor::new("body", FieldType::String))
        .field(FieldDescriptor::new("rank", FieldType::Integer))
        .field(FieldDescriptor::new("secret", FieldType::String).hidden())
        .primary_key(["id"])
        .build()
        .unwrap()
}

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
        .block_on(f)
}

fn arb_text() -> impl Strategy<Value = Value> {
    prop_oneof!["[a-z ]{0,8}".prop_map(Value::String), Just(Value::Null)]
}

fn arb_patch() -> impl Strategy<Value = Record> {
    (
        proptest::option::of("[a-z]{1,8}"),
        proptest::option::of(arb_text()),
        proptest::option::of(prop_oneof![any::<i32>().prop_map(|n| json!(n)), Just(Value::Null)]),
        proptest::option::of(arb_text()),
    )
        .prop_map(|(title, body, rank, secret)| {
            let mut r = Record::new();
            if let Some(t) = title {
                r.insert("title".into(), Value::String(t));
            }
            if let Some(b) = body {
                r.insert("body".into(), b);
            }
            if let Some(n) = rank {
                r.insert("rank".into(), n);
            }
            if let Some(s) = secret {
                r.insert("secret".into(), s);
            }
            r
        })
}

proptest! {
    #[test]
    fn patch_is_idempotent(patch in arb_patch()) {
        let e = entity();
        let vis = FieldVisibility::resolve(&e);
        let store = MemoryStore::new();
        let (once, twice) = block_on(async {
            let created = CrudService::create(
                &store,
                &e,
                &vis,
                json!({"title": "seed", "body": "b", "rank": 1}).as_object().unwrap().clone(),
            )
            .await
            .unwrap();
            let key = KeyTuple::from_record(&e, &created);
            let once = CrudService::patch(&store, &e, &vis, &key, patch.clone()).await.unwrap();
            let twice = CrudService::patch(&store, &e, &vis, &key, patch).await.unwrap();
            (once, twice)
        });
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn hidden_fields_are_never_rendered(title in "[a-z]{1,8}", secret in arb_text(), patch in arb_patch()) {
        let e = entity();
        let vis = FieldVisibility::resolve(&e);
        let store = MemoryStore::new();
        let rows = block_on(async {
            let mut payload = Record::new();
            payload.insert("title".into(), Value::String(title));
            payload.insert("secret".into(), secret);
            let created = CrudService::create(&store, &e, &vis, payload).await.unwrap();
            let key = KeyTuple::from_record(&e, &created);
            let patched = CrudService::patch(&store, &e, &vis, &key, patch).await.unwrap();
            let listed = CrudService::list(&store, &e, &QuerySpec::default()).await.unwrap();
            let mut rows = vec![created, patched];
            rows.extend(listed);
            rows
        });
        for row in &rows {
            prop_assert!(row.get("secret").map_or(true, Value::is_null));
            let rendered = Serializer::Default.render(row, &vis);
            prop_assert!(rendered.get("secret").is_none());
        }
    }

    #[test]
    fn paging_partitions_the_collection(count in 0usize..30, offset in 0u64..35, limit in 0u64..12) {
        let e = entity();
        let vis = FieldVisibility::resolve(&e);
        let store = MemoryStore::new();
        let (page, all) = block_on(async {
            for i in 0..count {
                let payload = json!({"title": format!("t{}", i)}).as_object().unwrap().clone();
                CrudService::create(&store, &e, &vis, payload).await.unwrap();
            }
            let spec = QuerySpec { offset, limit: Some(limit), ..QuerySpec::default() };
            let page = CrudService::list(&store, &e, &spec).await.unwrap();
            let all = CrudService::list(&store, &e, &QuerySpec::default()).await.unwrap();
            (page, all)
        });
        let expected: Vec<Record> = all.into_iter().skip(offset as usize).take(limit as usize).collect();
        prop_assert_eq!(page, expected);
    }
}
