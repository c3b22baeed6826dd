//! Integration tests against a live Cassandra/Scylla node.
//!
//! Run with a node on 127.0.0.1:9042:
//! `cargo test -p polystore-cassandra -- --ignored`

use polystore_cassandra::CassandraStore;
use polystore_core::{CassandraConfig, Column, ColumnType, Value};
use polystore_storage::{Connection, Filter, TableStorage};
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn local_config() -> CassandraConfig {
    CassandraConfig {
        enabled: true,
        hosts: vec!["127.0.0.1".to_string()],
        keyspace: "polystore_test".to_string(),
        username: "cassandra".to_string(),
        password: "cassandra".to_string(),
    }
}

#[tokio::test]
#[ignore]
async fn create_insert_select_delete_roundtrip() {
    init_tracing();
    let store = CassandraStore::new(local_config());
    store.connect().await.unwrap();
    assert!(store.is_connected().await);

    let columns = vec![
        Column::primary(ColumnType::Uuid, "id"),
        Column::new(ColumnType::Text, "name"),
        Column::new(ColumnType::Integer, "score"),
        Column::new(ColumnType::Boolean, "active"),
        Column::new(ColumnType::BigInt, "ts"),
    ];
    store
        .create_table_if_not_exists("players", &columns)
        .await
        .unwrap();

    let id = Uuid::new_v4();
    store
        .insert_into(
            "players",
            &keys(&["id", "name", "score", "active", "ts"]),
            &[
                id.into(),
                "ada".into(),
                5.into(),
                true.into(),
                1_700_000_000_000i64.into(),
            ],
        )
        .await;

    let rows = store
        .select_all("players", Some(&Filter::new("id", id)))
        .await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.cell(0, "name"), Some(&Value::Text("ada".to_string())));
    assert_eq!(rows.cell(0, "score"), Some(&Value::Int(5)));
    assert_eq!(rows.cell(0, "active"), Some(&Value::Bool(true)));

    store.delete_from("players", &Filter::new("id", id)).await;
    let rows = store
        .select_all("players", Some(&Filter::new("id", id)))
        .await;
    assert!(rows.is_empty());

    store.disconnect().await;
    assert!(!store.is_connected().await);
}

#[tokio::test]
#[ignore]
async fn operations_while_disconnected_return_empty() {
    init_tracing();
    let store = CassandraStore::new(local_config());
    assert!(!store.is_connected().await);
    let rows = store.select_all("players", None).await;
    assert!(rows.is_empty());
}
