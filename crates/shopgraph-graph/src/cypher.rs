//! Cypher rendering for write batches.
//!
//! Each batch becomes one `UNWIND $rows AS row` statement:
//! - (:Category), (:Customer) merged by id
//! - (:Product)-[:IN_CATEGORY]->(:Category)
//! - (:Customer)-[:PLACED]->(:Order)
//! - (:Order)-[:CONTAINS {quantity}]->(:Product)
//! - (:Customer)-[:VIEWED|CLICKED|ADDED_TO_CART {last_ts}]->(:Product)
//!
//! Nodes are merged before the parent `MATCH`, so a missing parent drops
//! only the edge. Edge-only batches match both endpoints first.

use neo4rs::{BoltMap, BoltNull, BoltString, BoltType, Query};

use crate::sink::WriteBatch;

const CATEGORIES: &str = "UNWIND $rows AS row
MERGE (c:Category {id: row.id})
SET c.name = row.name";

const PRODUCTS: &str = "UNWIND $rows AS row
MERGE (p:Product {id: row.id})
SET p.name = row.name,
    p.price = row.price
WITH p, row
MATCH (c:Category {id: row.category_id})
MERGE (p)-[:IN_CATEGORY]->(c)";

const CUSTOMERS: &str = "UNWIND $rows AS row
MERGE (c:Customer {id: row.id})
SET c.name = row.name,
    c.join_date = row.join_date";

const ORDERS: &str = "UNWIND $rows AS row
MERGE (o:Order {id: row.id})
SET o.ts = row.ts
WITH o, row
MATCH (c:Customer {id: row.customer_id})
MERGE (c)-[:PLACED]->(o)";

const ORDER_ITEMS: &str = "UNWIND $rows AS row
MATCH (o:Order {id: row.order_id})
MATCH (p:Product {id: row.product_id})
MERGE (o)-[r:CONTAINS]->(p)
SET r.quantity = row.quantity";

/// Cypher text for a batch.
pub fn statement(batch: &WriteBatch<'_>) -> String {
    match batch {
        WriteBatch::Categories(_) => CATEGORIES.to_string(),
        WriteBatch::Products(_) => PRODUCTS.to_string(),
        WriteBatch::Customers(_) => CUSTOMERS.to_string(),
        WriteBatch::Orders(_) => ORDERS.to_string(),
        WriteBatch::OrderItems(_) => ORDER_ITEMS.to_string(),
        // Relationship types cannot be parameters; the label comes from a closed enum.
        WriteBatch::Events { kind, .. } => format!(
            "UNWIND $rows AS row
MATCH (c:Customer {{id: row.customer_id}})
MATCH (p:Product {{id: row.product_id}})
MERGE (c)-[r:{}]->(p)
SET r.last_ts = row.ts",
            kind.edge().as_str()
        ),
    }
}

/// The `$rows` parameter: one map per row.
pub fn rows(batch: &WriteBatch<'_>) -> Vec<BoltType> {
    match batch {
        WriteBatch::Categories(rows) => rows
            .iter()
            .map(|c| row_map(vec![("id", c.id.into()), ("name", nullable(c.name.as_deref()))]))
            .collect(),
        WriteBatch::Products(rows) => rows
            .iter()
            .map(|p| {
                row_map(vec![
                    ("id", p.id.into()),
                    ("name", nullable(p.name.as_deref())),
                    ("price", nullable(p.price)),
                    ("category_id", nullable(p.category_id)),
                ])
            })
            .collect(),
        WriteBatch::Customers(rows) => rows
            .iter()
            .map(|c| {
                row_map(vec![
                    ("id", c.id.into()),
                    ("name", nullable(c.name.as_deref())),
                    ("join_date", nullable(c.join_date)),
                ])
            })
            .collect(),
        WriteBatch::Orders(rows) => rows
            .iter()
            .map(|o| {
                row_map(vec![
                    ("id", o.id.into()),
                    ("customer_id", nullable(o.customer_id)),
                    ("ts", nullable(o.ts)),
                ])
            })
            .collect(),
        WriteBatch::OrderItems(rows) => rows
            .iter()
            .map(|i| {
                row_map(vec![
                    ("order_id", i.order_id.into()),
                    ("product_id", i.product_id.into()),
                    ("quantity", nullable(i.quantity)),
                ])
            })
            .collect(),
        WriteBatch::Events { rows, .. } => rows
            .iter()
            .map(|e| {
                row_map(vec![
                    ("customer_id", e.customer_id.into()),
                    ("product_id", e.product_id.into()),
                    ("ts", nullable(e.ts)),
                ])
            })
            .collect(),
    }
}

/// Statement plus parameters, ready to run.
pub fn render(batch: &WriteBatch<'_>) -> Query {
    Query::new(statement(batch)).param("rows", rows(batch))
}

fn nullable<T: Into<BoltType>>(value: Option<T>) -> BoltType {
    value.map(Into::into).unwrap_or(BoltType::Null(BoltNull))
}

fn row_map(fields: Vec<(&str, BoltType)>) -> BoltType {
    BoltType::Map(BoltMap::from_iter(
        fields
            .into_iter()
            .map(|(key, value)| (BoltString::from(key), value)),
    ))
}
