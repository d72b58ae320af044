//! Shopgraph Core Library
//!
//! Domain model and pipeline primitives for migrating the relational shop
//! dataset into a property graph.

pub mod batch;
pub mod error;
pub mod events;
pub mod model;
pub mod readiness;
pub mod schema;

pub use batch::{chunk, Batches, DEFAULT_BATCH_SIZE};
pub use error::{CoreError, CoreResult};
pub use events::{route, EventKind, RoutedEvents};
pub use model::{
    Category, Customer, EdgeKind, EntityKind, Event, NodeLabel, Order, OrderItem, Product,
};
pub use readiness::{await_ready, RetryPolicy};
pub use schema::split_statements;
