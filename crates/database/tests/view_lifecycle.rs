//! Integration tests for view lifecycle operations and queries through the
//! `Database` facade.

use docview_core::{Collation, ErrorKind, Object, Properties, Value};
use docview_database::{Database, DatabaseConfig, Emitter, View, ViewDefinition};
use docview_query::{Count, QueryOptions, Stats, Sum};
use docview_storage::{properties, MemoryRevisionLog};
use std::sync::Arc;

/// Orders as `[customer, total]` keys with the order total as value.
fn orders_view(db: &Database) -> View {
    db.define_view(
        "orders",
        "1",
        ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
            let (Some(customer), Some(total)) = (doc.get("customer"), doc.get("total")) else {
                return;
            };
            emit.emit(vec![customer.clone(), total.clone()], total.clone());
        })
        .with_reduce(Sum),
    )
    .unwrap()
}

fn order(customer: &str, total: i64) -> Properties {
    let mut doc = Properties::new();
    doc.insert("customer", customer);
    doc.insert("total", total);
    doc
}

fn populated() -> (Arc<MemoryRevisionLog>, Database, View) {
    let log = Arc::new(MemoryRevisionLog::new());
    log.put("o1", "1-a", order("ann", 5));
    log.put("o2", "1-a", order("bob", 7));
    log.put("o3", "1-a", order("ann", 3));
    log.put("o4", "1-a", order("cat", 1));
    let db = Database::new(log.clone(), DatabaseConfig::default());
    let view = orders_view(&db);
    view.update_index().unwrap();
    (log, db, view)
}

#[test]
fn test_group_level_reduce() {
    let (_, _, view) = populated();
    let rows = view.query(&QueryOptions::new().group_level(1)).unwrap();
    let got: Vec<(Value, Value)> = rows.into_iter().map(|r| (r.key, r.value)).collect();
    assert_eq!(
        got,
        vec![
            (Value::from(vec![Value::from("ann")]), Value::from(8)),
            (Value::from(vec![Value::from("bob")]), Value::from(7)),
            (Value::from(vec![Value::from("cat")]), Value::from(1)),
        ]
    );

    let total = view.query(&QueryOptions::new().reduce(true)).unwrap();
    assert_eq!(total.len(), 1);
    assert_eq!(total[0].key, Value::Null);
    assert_eq!(total[0].value, Value::from(16));
}

#[test]
fn test_prefix_range_for_one_customer() {
    let (_, _, view) = populated();
    let options = QueryOptions::new()
        .start_key(vec![Value::from("ann")])
        .end_key(vec![Value::from("ann")])
        .prefix_match_level(1);
    let rows = view.query(&options).unwrap();
    let docs: Vec<_> = rows.iter().filter_map(|r| r.doc_id.clone()).collect();
    assert_eq!(docs, vec!["o3".to_string(), "o1".to_string()]);
}

#[test]
fn test_reduce_unavailable_without_reducer() {
    let log = Arc::new(MemoryRevisionLog::new());
    log.put("a", "1-a", order("ann", 1));
    let db = Database::new(log, DatabaseConfig::default());
    let view = db
        .define_view(
            "plain",
            "1",
            ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
                if let Some(c) = doc.get("customer") {
                    emit.emit(c.clone(), Value::Null);
                }
            }),
        )
        .unwrap();
    view.update_index().unwrap();
    let err = view.query(&QueryOptions::new().reduce(true)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ReduceUnavailable);
    let grouped = view.query(&QueryOptions::new().group(true)).unwrap();
    assert_eq!(grouped[0].value, Value::Null);
}

#[test]
fn test_builtin_reducers() {
    let log = Arc::new(MemoryRevisionLog::new());
    for (i, n) in [4, 1, 7].iter().enumerate() {
        log.put(&format!("d{}", i), "1-a", properties([("n", *n)]));
    }
    let db = Database::new(log, DatabaseConfig::default());
    let map = |doc: &Properties, emit: &mut Emitter| {
        if let Some(n) = doc.get("n") {
            emit.emit("all", n.clone());
        }
    };
    let count = db.define_view("count", "1", ViewDefinition::new(map).with_reduce(Count)).unwrap();
    let stats = db.define_view("stats", "1", ViewDefinition::new(map).with_reduce(Stats)).unwrap();
    count.update_index().unwrap();
    stats.update_index().unwrap();

    let rows = count.query(&QueryOptions::new().reduce(true)).unwrap();
    assert_eq!(rows[0].value, Value::from(3));

    let rows = stats.query(&QueryOptions::new().group(true)).unwrap();
    let summary = rows[0].value.as_object().unwrap();
    assert_eq!(summary.get("sum"), Some(&Value::from(12)));
    assert_eq!(summary.get("min"), Some(&Value::from(1)));
    assert_eq!(summary.get("max"), Some(&Value::from(7)));
    assert_eq!(summary.get("count"), Some(&Value::from(3)));
}

#[test]
fn test_include_docs_with_link() {
    let log = Arc::new(MemoryRevisionLog::new());
    log.put("ann", "1-a", properties([("name", "Ann Lee")]));
    log.put("o1", "1-a", order("ann", 5));
    let db = Database::new(log, DatabaseConfig::default());
    let view = db
        .define_view(
            "order_customers",
            "1",
            ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
                if let Some(customer) = doc.get("customer") {
                    let link: Object = [("_id", customer.clone())].into_iter().collect();
                    emit.emit(customer.clone(), link);
                    emit.emit(customer.clone(), Value::Null);
                }
            }),
        )
        .unwrap();
    view.update_index().unwrap();

    let rows = view.query(&QueryOptions::new().include_docs(true)).unwrap();
    assert_eq!(rows.len(), 2);
    let linked = rows[0].document.as_ref().unwrap();
    assert_eq!(linked.get("name"), Some(&Value::from("Ann Lee")));
    let own = rows[1].document.as_ref().unwrap();
    assert_eq!(own.get("_id"), Some(&Value::from("o1")));
}

#[test]
fn test_custom_link_field() {
    let log = Arc::new(MemoryRevisionLog::new());
    log.put("ann", "1-a", properties([("name", "Ann Lee")]));
    log.put("o1", "1-a", order("ann", 5));
    let db = Database::new(log, DatabaseConfig::default().with_link_field("ref"));
    let view = db
        .define_view(
            "v",
            "1",
            ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
                if let Some(customer) = doc.get("customer") {
                    let link: Object = [("ref", customer.clone())].into_iter().collect();
                    emit.emit(1, link);
                }
            }),
        )
        .unwrap();
    view.update_index().unwrap();
    let rows = view.query(&QueryOptions::new().include_docs(true)).unwrap();
    assert_eq!(rows[0].document.as_ref().unwrap().get("name"), Some(&Value::from("Ann Lee")));
}

#[test]
fn test_collation_change_resets_index() {
    let (_, _, view) = populated();
    assert_eq!(view.collation().unwrap(), Collation::Unicode);
    assert!(!view.set_collation(Collation::Unicode).unwrap());
    assert!(view.set_collation(Collation::Raw).unwrap());
    assert_eq!(view.total_rows().unwrap(), 0);
    assert_eq!(view.last_sequence_indexed().unwrap(), 0);

    view.update_index().unwrap();
    assert_eq!(view.total_rows().unwrap(), 4);
    assert_eq!(view.collation().unwrap(), Collation::Raw);
}

#[test]
fn test_ascii_collation_is_case_sensitive() {
    let log = Arc::new(MemoryRevisionLog::new());
    for (i, name) in ["b", "B", "a", "A"].iter().enumerate() {
        log.put(&format!("d{}", i), "1-a", properties([("name", *name)]));
    }
    let db = Database::new(log, DatabaseConfig::default());
    let view = db
        .define_view(
            "names",
            "1",
            ViewDefinition::new(|doc: &Properties, emit: &mut Emitter| {
                if let Some(name) = doc.get("name") {
                    emit.emit(name.clone(), Value::Null);
                }
            }),
        )
        .unwrap();

    view.update_index().unwrap();
    let unicode: Vec<Value> = view.query(&QueryOptions::new()).unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(unicode, ["a", "A", "b", "B"].map(Value::from).to_vec());

    view.set_collation(Collation::Ascii).unwrap();
    view.update_index().unwrap();
    let ascii: Vec<Value> = view.query(&QueryOptions::new()).unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(ascii, ["A", "B", "a", "b"].map(Value::from).to_vec());
}

#[test]
fn test_delete_index_and_rebuild() {
    let (_, _, view) = populated();
    view.delete_index().unwrap();
    assert!(view.dump().unwrap().is_empty());
    assert_eq!(view.last_sequence_indexed().unwrap(), 0);
    view.update_index().unwrap();
    assert_eq!(view.dump().unwrap().len(), 4);
}

#[test]
fn test_delete_view_invalidates_handle() {
    let (_, db, view) = populated();
    view.delete().unwrap();
    assert_eq!(view.query(&QueryOptions::new()).unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(view.update_index().unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(view.total_rows().unwrap_err().kind(), ErrorKind::NotFound);
    assert_eq!(db.view("orders").unwrap_err().kind(), ErrorKind::NotFound);
    assert!(db.view_names().is_empty());

    let again = orders_view(&db);
    assert_eq!(again.last_sequence_indexed().unwrap(), 0);
    assert_eq!(view.dump().unwrap_err().kind(), ErrorKind::NotFound);
    again.update_index().unwrap();
    assert_eq!(again.total_rows().unwrap(), 4);
}

#[test]
fn test_recount_and_changed_at() {
    let (log, _, view) = populated();
    assert_eq!(view.recount_total_rows().unwrap(), 4);
    assert_eq!(view.last_sequence_changed_at().unwrap(), 4);

    // A document the map ignores advances the view without changing rows.
    log.put("note", "1-a", properties([("text", "hi")]));
    view.update_index().unwrap();
    assert_eq!(view.last_sequence_indexed().unwrap(), 5);
    assert_eq!(view.last_sequence_changed_at().unwrap(), 4);
}

#[test]
fn test_opened_handle_keeps_definition() {
    let (_, db, _) = populated();
    let reopened = db.view("orders").unwrap();
    assert!(reopened.definition().has_reduce());
    let rows = reopened.query(&QueryOptions::new().reduce(true)).unwrap();
    assert_eq!(rows[0].value, Value::from(16));
}
