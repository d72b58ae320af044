//! The write surface the pipeline needs from a graph store.

use async_trait::async_trait;
use shopgraph_core::{
    Category, Customer, EdgeKind, EntityKind, Event, EventKind, Order, OrderItem, Product,
};

use crate::error::GraphResult;

/// One bounded group of rows, written as a single idempotent upsert.
#[derive(Debug, Clone, Copy)]
pub enum WriteBatch<'a> {
    Categories(&'a [Category]),
    /// Also merges `IN_CATEGORY` when the category exists.
    Products(&'a [Product]),
    Customers(&'a [Customer]),
    /// Also merges `PLACED` when the customer exists.
    Orders(&'a [Order]),
    /// `CONTAINS` edges between existing orders and products.
    OrderItems(&'a [OrderItem]),
    /// Customer→product edges of one event class.
    Events {
        kind: EventKind,
        rows: &'a [&'a Event],
    },
}

impl WriteBatch<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Categories(_) => EntityKind::Category,
            Self::Products(_) => EntityKind::Product,
            Self::Customers(_) => EntityKind::Customer,
            Self::Orders(_) => EntityKind::Order,
            Self::OrderItems(_) => EntityKind::OrderItem,
            Self::Events { .. } => EntityKind::Event,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Categories(rows) => rows.len(),
            Self::Products(rows) => rows.len(),
            Self::Customers(rows) => rows.len(),
            Self::Orders(rows) => rows.len(),
            Self::OrderItems(rows) => rows.len(),
            Self::Events { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Relationship this batch may create, if any.
    pub fn edge(&self) -> Option<EdgeKind> {
        match self {
            Self::Categories(_) | Self::Customers(_) => None,
            Self::Products(_) => Some(EdgeKind::InCategory),
            Self::Orders(_) => Some(EdgeKind::Placed),
            Self::OrderItems(_) => Some(EdgeKind::Contains),
            Self::Events { kind, .. } => Some(kind.edge()),
        }
    }
}

/// A graph store the pipeline can probe, initialize and load.
#[async_trait]
pub trait GraphSink: Send + Sync {
    /// Trivial query used by the readiness gate.
    async fn probe(&self) -> GraphResult<()>;

    /// Run one schema or maintenance statement.
    async fn run_statement(&self, statement: &str) -> GraphResult<()>;

    /// Upsert one batch. A batch is applied entirely or not at all.
    async fn write(&self, batch: &WriteBatch<'_>) -> GraphResult<()>;
}
