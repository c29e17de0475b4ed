//! Integration tests against a live PostgreSQL
//!
//! The database comes from the file named by `TABLEHAUS_CONFIG` (or
//! `./tablehaus.toml`). Without one every test returns early.

use std::sync::Arc;

use tablehaus::prelude::*;
use uuid::Uuid;

fn setup_manager() -> Option<Arc<ConnectionManager>> {
    match AppConfig::load() {
        Ok(config) => Some(Arc::new(ConnectionManager::new(config.database))),
        Err(e) => {
            eprintln!("skipping database test: {}", e);
            None
        }
    }
}

fn unique(prefix: &str) -> String {
    format!("{}_{}", prefix, Uuid::new_v4().simple())
}

async fn drop_table(manager: &ConnectionManager, name: &str) {
    let sql = format!("drop table if exists \"{}\" cascade", name);
    let _ = manager.execute(&sql, Vec::new(), true).await;
}

async fn orders_table(manager: &ConnectionManager) -> BaseTable {
    let table = BaseTable::declare(
        &unique("orders"),
        vec![
            FieldDescriptor::string("id").primary_key(),
            FieldDescriptor::float("total"),
        ],
    )
    .expect("valid schema");
    table.create_table(manager).await.expect("create table");
    table
}

#[tokio::test]
async fn test_order_lifecycle() {
    let Some(manager) = setup_manager() else { return };
    let orders = orders_table(&manager).await;

    let mut order = Record::new().with("id", "o1").with("total", 9.5);
    assert_eq!(orders.insert(&mut order, manager.as_ref()).await.unwrap(), 1);

    let found = orders
        .find_by_primary_key(&[SqlValue::from("o1")], manager.as_ref())
        .await
        .unwrap()
        .expect("inserted row");
    assert_eq!(found, Record::new().with("id", "o1").with("total", 9.5));

    let mut changed = found.clone();
    changed.set("total", 12.0);
    assert_eq!(orders.save_change(&changed, manager.as_ref()).await.unwrap(), 1);
    let found = orders
        .find_by_primary_key(&[SqlValue::from("o1")], manager.as_ref())
        .await
        .unwrap()
        .expect("updated row");
    assert_eq!(found.get_as::<f64>("total"), Some(12.0));
    assert_eq!(found.get_as::<String>("id"), Some("o1".to_string()));

    assert_eq!(orders.delete(&found, manager.as_ref()).await.unwrap(), 1);
    assert!(orders
        .find_by_primary_key(&[SqlValue::from("o1")], manager.as_ref())
        .await
        .unwrap()
        .is_none());

    drop_table(&manager, orders.name()).await;
    manager.close().await;
}

/// A single-connection pool, so a connection held by a finished or dropped
/// stream makes the next statement time out
fn single_connection_manager() -> Option<Arc<ConnectionManager>> {
    let config = AppConfig::load().ok()?;
    let database = config
        .database
        .with_pool_size(1, 1)
        .with_connection_timeout(3);
    Some(Arc::new(ConnectionManager::new(database)))
}

async fn assert_pool_available(manager: &ConnectionManager) {
    match manager.query("select 1 as \"one\"", Vec::new(), None).await {
        Ok(rows) => assert_eq!(rows.len(), 1),
        Err(e) if e.is_pool_timeout() => panic!("stream kept its pooled connection"),
        Err(e) => panic!("unexpected error: {}", e),
    }
}

#[tokio::test]
async fn test_streaming_releases_connection_on_early_stop() {
    let Some(manager) = single_connection_manager() else { return };
    let orders = orders_table(&manager).await;

    for (id, total) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
        let mut row = Record::new().with("id", id).with("total", total);
        orders.insert(&mut row, manager.as_ref()).await.unwrap();
    }

    let ordered = Criteria::new().order_by("\"id\"");
    let mut stream = orders.stream_all(&ordered, &manager).await.unwrap();
    let first = stream.next().await.unwrap().unwrap();
    assert_eq!(first.get_as::<String>("id"), Some("a".to_string()));
    assert_eq!(stream.rows_read(), 1);
    assert!(!stream.is_finished());
    drop(stream);
    assert_pool_available(&manager).await;

    // a full pass yields table order and ends cleanly
    let rows: Vec<Record> = orders
        .stream_all(&ordered, &manager)
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let ids: Vec<String> = rows.iter().filter_map(|r| r.get_as("id")).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);

    assert_eq!(orders.count(None, manager.as_ref()).await.unwrap(), 3);

    drop_table(&manager, orders.name()).await;
    manager.close().await;
}

#[tokio::test]
async fn test_streaming_releases_connection_on_error() {
    let Some(manager) = single_connection_manager() else { return };
    let orders = orders_table(&manager).await;

    for (id, total) in [("a", 1.0), ("b", 2.0), ("c", 3.0)] {
        let mut row = Record::new().with("id", id).with("total", total);
        orders.insert(&mut row, manager.as_ref()).await.unwrap();
    }

    // the row with total 2.0 divides by zero
    let sql = format!(
        "select 1.0 / (\"total\" - ?) as \"ratio\" from \"{}\"",
        orders.name()
    );
    let mut stream = manager
        .streaming_query(&sql, vec![SqlValue::from(2.0)])
        .await
        .unwrap();
    let mut failed = false;
    while let Some(item) = stream.next().await {
        if item.is_err() {
            failed = true;
        }
    }
    assert!(failed);
    assert!(stream.is_finished());

    // the stream is still alive here but its connection is back in the pool
    assert_pool_available(&manager).await;
    drop(stream);

    drop_table(&manager, orders.name()).await;
    manager.close().await;
}

#[tokio::test]
async fn test_transaction_rollback_discards_writes() {
    let Some(manager) = setup_manager() else { return };
    let orders = orders_table(&manager).await;

    let tx = manager.begin().await.unwrap();
    let mut order = Record::new().with("id", "tx1").with("total", 5.0);
    orders.insert(&mut order, &tx).await.unwrap();
    assert!(orders
        .find_by_primary_key(&[SqlValue::from("tx1")], &tx)
        .await
        .unwrap()
        .is_some());
    tx.rollback().await.unwrap();

    assert!(orders
        .find_by_primary_key(&[SqlValue::from("tx1")], manager.as_ref())
        .await
        .unwrap()
        .is_none());

    drop_table(&manager, orders.name()).await;
    manager.close().await;
}

#[tokio::test]
async fn test_failed_statement_rolls_back_without_autocommit() {
    let Some(manager) = setup_manager() else { return };
    let orders = orders_table(&manager).await;

    let mut order = Record::new().with("id", "dup").with("total", 1.0);
    orders.insert(&mut order, manager.as_ref()).await.unwrap();

    let err = manager
        .execute(
            orders.schema().insert_sql(),
            vec![SqlValue::from(2.0), SqlValue::from("dup")],
            false,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutionError::Database(_)));

    // the pool is still usable and the original row is untouched
    let rows = orders.find_all(&Criteria::new(), manager.as_ref()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get_as::<f64>("total"), Some(1.0));

    drop_table(&manager, orders.name()).await;
    manager.close().await;
}

#[tokio::test]
async fn test_close_then_reconnect() {
    let Some(manager) = setup_manager() else { return };
    manager.connect().await.unwrap();
    assert!(manager.is_connected().await);
    manager.close().await;
    manager.close().await;
    assert!(!manager.is_connected().await);

    manager.health_check().await.unwrap();
    assert!(manager.is_connected().await);
    manager.close().await;
}

#[tokio::test]
async fn test_projection_fold_and_view() {
    let Some(manager) = setup_manager() else { return };
    let users = BaseTable::declare(
        &unique("users"),
        vec![
            FieldDescriptor::integer("id").primary_key(),
            FieldDescriptor::string("name"),
        ],
    )
    .unwrap();
    let posts = BaseTable::declare(
        &unique("posts"),
        vec![
            FieldDescriptor::integer("id").primary_key(),
            FieldDescriptor::integer("author"),
            FieldDescriptor::string("title"),
        ],
    )
    .unwrap();
    users.create_table(manager.as_ref()).await.unwrap();
    posts.create_table(manager.as_ref()).await.unwrap();

    for (id, name) in [(1i64, "ada"), (2, "bob")] {
        let mut user = Record::new().with("id", id).with("name", name);
        users.insert(&mut user, manager.as_ref()).await.unwrap();
    }
    for (id, author, title) in [(10i64, 1i64, "hello"), (11, 2, "world")] {
        let mut post = Record::new()
            .with("id", id)
            .with("author", author)
            .with("title", title);
        posts.insert(&mut post, manager.as_ref()).await.unwrap();
    }

    let projection = JoinedProjection::declare(
        "user_posts",
        &[
            JoinSource::new(users.name(), "u"),
            JoinSource::new(posts.name(), "p"),
        ],
        vec![
            FieldDescriptor::integer("user_id").prefix("u").column("id").primary_key(),
            FieldDescriptor::string("name").prefix("u"),
            FieldDescriptor::string("title").prefix("p"),
        ],
    )
    .unwrap();
    // an i32 key finds the BIGINT row and the record compares equal
    let ada = users
        .find_by_primary_key(&[SqlValue::from(1)], manager.as_ref())
        .await
        .unwrap();
    assert_eq!(ada, Some(Record::new().with("id", 1).with("name", "ada")));

    let join = Criteria::new().filter("u.\"id\" = p.\"author\"", Vec::new());

    let folded = projection.select_map(&join, manager.as_ref()).await.unwrap();
    assert_eq!(folded.len(), 2);
    assert_eq!(
        folded[&SqlValue::from(2)].get_as::<String>("title"),
        Some("world".to_string())
    );
    assert_eq!(
        projection
            .count(join.get_filter(), manager.as_ref())
            .await
            .unwrap(),
        2
    );

    let view_name = unique("user_names");
    manager
        .execute(
            &format!(
                "create view \"{}\" as select \"name\" from \"{}\"",
                view_name,
                users.name()
            ),
            Vec::new(),
            true,
        )
        .await
        .unwrap();
    let view = View::declare(&view_name, Vec::new()).unwrap();
    let names = view
        .find_all(&Criteria::new().order_by("\"name\"").limit(1), manager.as_ref())
        .await
        .unwrap();
    assert_eq!(names.len(), 1);
    assert_eq!(names[0].get_as::<String>("name"), Some("ada".to_string()));

    let _ = manager
        .execute(&format!("drop view if exists \"{}\"", view_name), Vec::new(), true)
        .await;
    drop_table(&manager, posts.name()).await;
    drop_table(&manager, users.name()).await;
    manager.close().await;
}
