//! Orders walkthrough: declare a table, insert through a serde model, read
//! it back, stream, update inside a transaction and clean up.
//!
//! Needs a database configured via `TABLEHAUS_CONFIG` or `./tablehaus.toml`.
//! Run with `cargo run --example orders`.

use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tablehaus::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct Order {
    id: String,
    customer: String,
    total: f64,
    placed_at: Option<DateTime<Utc>>,
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let mut haus = TableHaus::from_config().context("loading database configuration")?;
    haus.health_check().await?;
    println!("Database connected");

    let orders = haus.register_table(
        "demo_orders",
        vec![
            FieldDescriptor::string("id").primary_key().ddl("VARCHAR(36)"),
            FieldDescriptor::string("customer"),
            FieldDescriptor::float("total").default_value(0.0),
            FieldDescriptor::datetime("placed_at").default_with(|| SqlValue::from(Utc::now())),
        ],
    )?;
    let manager = haus.manager().clone();
    orders.create_table(manager.as_ref()).await?;

    for (customer, total) in [("ada", 9.5), ("bob", 21.0), ("cy", 3.25)] {
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            customer: customer.to_string(),
            total,
            placed_at: None,
        };
        let mut record = Record::from_serializable(&order)?;
        orders.insert(&mut record, manager.as_ref()).await?;
        println!("Inserted {} ({})", order.id, order.customer);
    }

    let top = orders
        .find_all(
            &Criteria::new()
                .filter("\"total\" > ?", vec![SqlValue::from(5.0)])
                .order_by("\"total\" desc"),
            manager.as_ref(),
        )
        .await?;
    for record in &top {
        let order: Order = record.deserialize()?;
        println!("Over 5.00: {} paid {:.2}", order.customer, order.total);
    }

    let mut stream = orders
        .stream_all(&Criteria::new().order_by("\"customer\""), &manager)
        .await?;
    while let Some(record) = stream.try_next().await? {
        println!("Streamed {}", record.get_as::<String>("customer").unwrap_or_default());
    }

    if let Some(first) = top.first() {
        let tx = manager.begin().await?;
        let mut changed = first.clone();
        changed.set("total", 12.0);
        orders.save_change(&changed, &tx).await?;
        tx.commit().await?;
        println!("Updated {:?}", changed.get("id"));
    }

    println!("Orders stored: {}", orders.count(None, manager.as_ref()).await?);

    manager
        .execute("drop table if exists \"demo_orders\"", Vec::new(), true)
        .await?;
    haus.on_shutdown().await;
    Ok(())
}
