//! Integration tests against a live MySQL server.
//!
//! Run with a server on 127.0.0.1:3306 and a `network` database:
//! `cargo test -p polystore-mysql -- --ignored`

use polystore_core::{Column, ColumnType, MySqlConfig, Value};
use polystore_mysql::MySqlStore;
use polystore_storage::{Connection, Filter, TableStorage};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn local_config() -> MySqlConfig {
    MySqlConfig {
        enabled: true,
        ..MySqlConfig::default()
    }
}

#[tokio::test]
#[ignore]
async fn insert_select_delete_scenario() {
    init_tracing();
    let store = MySqlStore::new(local_config());
    store.connect().await.unwrap();

    store
        .create_table_if_not_exists(
            "t",
            &[
                Column::primary(ColumnType::Integer, "id"),
                Column::new(ColumnType::Text, "name"),
            ],
        )
        .await
        .unwrap();
    store.delete_from("t", &Filter::new("id", 1)).await;
    store.delete_from("t", &Filter::new("id", 2)).await;

    store
        .insert_into("t", &keys(&["id", "name"]), &[1.into(), "a".into()])
        .await;
    store
        .insert_into("t", &keys(&["id", "name"]), &[2.into(), "b".into()])
        .await;

    let rows = store.select_all("t", None).await;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows.cell(0, "id"), Some(&Value::Int(1)));
    assert_eq!(rows.cell(0, "name"), Some(&Value::Text("a".to_string())));
    assert_eq!(rows.cell(1, "id"), Some(&Value::Int(2)));
    assert_eq!(rows.cell(1, "name"), Some(&Value::Text("b".to_string())));

    store.delete_from("t", &Filter::new("id", 1)).await;
    let rows = store.select_all("t", None).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.cell(0, "id"), Some(&Value::Int(2)));

    store.disconnect().await;
    assert!(!store.is_connected().await);
}

#[tokio::test]
#[ignore]
async fn update_rewrites_matching_rows() {
    init_tracing();
    let store = MySqlStore::new(local_config());
    store.connect().await.unwrap();

    store
        .create_table_if_not_exists(
            "u",
            &[
                Column::primary(ColumnType::Integer, "id"),
                Column::new(ColumnType::Text, "name"),
                Column::new(ColumnType::Boolean, "active"),
            ],
        )
        .await
        .unwrap();
    store.delete_from("u", &Filter::new("id", 7)).await;

    store
        .insert_into(
            "u",
            &keys(&["id", "name", "active"]),
            &[7.into(), "old".into(), false.into()],
        )
        .await;
    store
        .update(
            "u",
            &keys(&["name", "active"]),
            &["new".into(), true.into()],
            &Filter::new("id", 7),
        )
        .await;

    let rows = store.select_all("u", Some(&Filter::new("id", 7))).await;
    assert_eq!(rows.cell(0, "name"), Some(&Value::Text("new".to_string())));
    assert_eq!(rows.cell(0, "active"), Some(&Value::Bool(true)));
}
