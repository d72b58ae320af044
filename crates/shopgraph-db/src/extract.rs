//! Full-table extraction of the six source entities.
//!
//! Every run reads complete snapshots: no filters, no watermarks. Columns
//! are cast in SQL so that each table decodes into a fixed tuple shape.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use shopgraph_core::{Category, Customer, EntityKind, Event, Order, OrderItem, Product};
use tracing::info;

use crate::pool::{DbError, DbResult, PgSource};

/// One extracted table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Table {
    Categories(Vec<Category>),
    Products(Vec<Product>),
    Customers(Vec<Customer>),
    Orders(Vec<Order>),
    OrderItems(Vec<OrderItem>),
    Events(Vec<Event>),
}

impl Table {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Categories(_) => EntityKind::Category,
            Self::Products(_) => EntityKind::Product,
            Self::Customers(_) => EntityKind::Customer,
            Self::Orders(_) => EntityKind::Order,
            Self::OrderItems(_) => EntityKind::OrderItem,
            Self::Events(_) => EntityKind::Event,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Categories(rows) => rows.len(),
            Self::Products(rows) => rows.len(),
            Self::Customers(rows) => rows.len(),
            Self::Orders(rows) => rows.len(),
            Self::OrderItems(rows) => rows.len(),
            Self::Events(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A store the pipeline can probe and read tables from.
#[async_trait]
pub trait SourceStore: Send + Sync {
    /// Trivial query used by the readiness gate.
    async fn probe(&self) -> DbResult<()>;

    /// Read every row of one table, in store order.
    async fn extract(&self, entity: EntityKind) -> DbResult<Table>;
}

/// All six tables of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub customers: Vec<Customer>,
    pub orders: Vec<Order>,
    pub order_items: Vec<OrderItem>,
    pub events: Vec<Event>,
}

impl SourceSnapshot {
    /// Replace the rows of the table's entity.
    pub fn insert(&mut self, table: Table) {
        match table {
            Table::Categories(rows) => self.categories = rows,
            Table::Products(rows) => self.products = rows,
            Table::Customers(rows) => self.customers = rows,
            Table::Orders(rows) => self.orders = rows,
            Table::OrderItems(rows) => self.order_items = rows,
            Table::Events(rows) => self.events = rows,
        }
    }

    /// Row count of one entity.
    pub fn len(&self, entity: EntityKind) -> usize {
        match entity {
            EntityKind::Category => self.categories.len(),
            EntityKind::Product => self.products.len(),
            EntityKind::Customer => self.customers.len(),
            EntityKind::Order => self.orders.len(),
            EntityKind::OrderItem => self.order_items.len(),
            EntityKind::Event => self.events.len(),
        }
    }

    pub fn total_rows(&self) -> usize {
        EntityKind::LOAD_ORDER.iter().map(|k| self.len(*k)).sum()
    }
}

/// An in-memory snapshot doubles as a source, for tests and dry runs.
#[async_trait]
impl SourceStore for SourceSnapshot {
    async fn probe(&self) -> DbResult<()> {
        Ok(())
    }

    async fn extract(&self, entity: EntityKind) -> DbResult<Table> {
        Ok(match entity {
            EntityKind::Category => Table::Categories(self.categories.clone()),
            EntityKind::Product => Table::Products(self.products.clone()),
            EntityKind::Customer => Table::Customers(self.customers.clone()),
            EntityKind::Order => Table::Orders(self.orders.clone()),
            EntityKind::OrderItem => Table::OrderItems(self.order_items.clone()),
            EntityKind::Event => Table::Events(self.events.clone()),
        })
    }
}

#[async_trait]
impl SourceStore for PgSource {
    async fn probe(&self) -> DbResult<()> {
        self.ping().await
    }

    async fn extract(&self, entity: EntityKind) -> DbResult<Table> {
        let pool = &self.pool;
        let query_err = |source: sqlx::Error| DbError::Query { entity, source };

        let table = match entity {
            EntityKind::Category => {
                let rows = sqlx::query_as::<_, (i64, Option<String>)>(
                    "SELECT id::bigint, name::text FROM categories",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::Categories(
                    rows.into_iter()
                        .map(|(id, name)| Category { id, name })
                        .collect(),
                )
            }
            EntityKind::Product => {
                let rows = sqlx::query_as::<_, (i64, Option<String>, Option<f64>, Option<i64>)>(
                    "SELECT id::bigint, name::text, price::float8, category_id::bigint FROM products",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::Products(
                    rows.into_iter()
                        .map(|(id, name, price, category_id)| Product {
                            id,
                            name,
                            price,
                            category_id,
                        })
                        .collect(),
                )
            }
            EntityKind::Customer => {
                let rows = sqlx::query_as::<_, (i64, Option<String>, Option<NaiveDate>)>(
                    "SELECT id::bigint, name::text, join_date::date FROM customers",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::Customers(
                    rows.into_iter()
                        .map(|(id, name, join_date)| Customer { id, name, join_date })
                        .collect(),
                )
            }
            EntityKind::Order => {
                let rows = sqlx::query_as::<_, (i64, Option<i64>, Option<NaiveDateTime>)>(
                    "SELECT id::bigint, customer_id::bigint, ts::timestamp FROM orders",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::Orders(
                    rows.into_iter()
                        .map(|(id, customer_id, ts)| Order { id, customer_id, ts })
                        .collect(),
                )
            }
            EntityKind::OrderItem => {
                let rows = sqlx::query_as::<_, (i64, i64, Option<i64>)>(
                    "SELECT order_id::bigint, product_id::bigint, quantity::bigint FROM order_items",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::OrderItems(
                    rows.into_iter()
                        .map(|(order_id, product_id, quantity)| OrderItem {
                            order_id,
                            product_id,
                            quantity,
                        })
                        .collect(),
                )
            }
            EntityKind::Event => {
                let rows = sqlx::query_as::<_, (i64, i64, Option<String>, Option<NaiveDateTime>)>(
                    "SELECT customer_id::bigint, product_id::bigint, event_type::text, ts::timestamp FROM events",
                )
                .fetch_all(pool)
                .await
                .map_err(query_err)?;

                Table::Events(
                    rows.into_iter()
                        .map(|(customer_id, product_id, event_type, ts)| Event {
                            customer_id,
                            product_id,
                            // NULL never matches a known discriminator.
                            event_type: event_type.unwrap_or_default(),
                            ts,
                        })
                        .collect(),
                )
            }
        };

        Ok(table)
    }
}

/// Read all six tables into one snapshot. The first failure aborts.
pub async fn extract_all<S>(store: &S) -> DbResult<SourceSnapshot>
where
    S: SourceStore + ?Sized,
{
    info!("Extracting data from source...");

    let mut snapshot = SourceSnapshot::default();
    for entity in EntityKind::EXTRACT_ORDER {
        let table = store.extract(entity).await?;
        snapshot.insert(table);
    }

    info!(
        customers = snapshot.customers.len(),
        categories = snapshot.categories.len(),
        products = snapshot.products.len(),
        orders = snapshot.orders.len(),
        order_items = snapshot.order_items.len(),
        events = snapshot.events.len(),
        "Extracted rows"
    );

    Ok(snapshot)
}
