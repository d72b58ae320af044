use std::num::NonZeroUsize;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use shopgraph_core::{
    Category, CoreError, Customer, EdgeKind, EntityKind, Event, NodeLabel, Order, OrderItem,
    Product, RetryPolicy,
};
use shopgraph_db::{DbError, DbResult, SourceSnapshot, SourceStore, Table};
use shopgraph_graph::{
    run_pipeline, GraphLoader, GraphSink, MemoryGraph, PipelineError, PipelineOptions, WriteBatch,
};

const SCHEMA: &str = include_str!("../../../schema/queries.cypher");

fn ts(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn event(customer_id: i64, product_id: i64, event_type: &str, at: NaiveDateTime) -> Event {
    Event {
        customer_id,
        product_id,
        event_type: event_type.to_string(),
        ts: Some(at),
    }
}

/// One row per table: the "Ada buys a Novel" scenario.
fn bookshop() -> SourceSnapshot {
    SourceSnapshot {
        categories: vec![Category { id: 1, name: Some("Books".to_string()) }],
        products: vec![Product {
            id: 10,
            name: Some("Novel".to_string()),
            price: Some(9.99),
            category_id: Some(1),
        }],
        customers: vec![Customer {
            id: 100,
            name: Some("Ada".to_string()),
            join_date: NaiveDate::from_ymd_opt(2023, 1, 1),
        }],
        orders: vec![Order { id: 1000, customer_id: Some(100), ts: Some(ts(1, 9)) }],
        order_items: vec![OrderItem { order_id: 1000, product_id: 10, quantity: Some(2) }],
        events: vec![event(100, 10, "view", ts(2, 10))],
    }
}

fn options() -> PipelineOptions {
    PipelineOptions {
        retry: RetryPolicy {
            interval: Duration::from_secs(2),
            timeout: Duration::from_secs(10),
            max_attempts: None,
        },
        batch_size: NonZeroUsize::new(2).unwrap(),
        schema: Some(SCHEMA.to_string()),
    }
}

#[tokio::test]
async fn test_end_to_end_bookshop() {
    let graph = MemoryGraph::new();
    let report = run_pipeline(&bookshop(), &graph, &options()).await.unwrap();

    assert_eq!(graph.total_nodes(), 4);
    let category = graph.node(NodeLabel::Category, 1).unwrap();
    assert_eq!(category["name"], Value::from("Books"));
    let product = graph.node(NodeLabel::Product, 10).unwrap();
    assert_eq!(product["name"], Value::from("Novel"));
    assert_eq!(product["price"], Value::from(9.99));
    let customer = graph.node(NodeLabel::Customer, 100).unwrap();
    assert_eq!(customer["join_date"], Value::from("2023-01-01"));
    assert!(graph.node(NodeLabel::Order, 1000).is_some());

    assert_eq!(graph.total_edges(), 4);
    assert!(graph.edge(EdgeKind::InCategory, 10, 1).is_some());
    assert!(graph.edge(EdgeKind::Placed, 100, 1000).is_some());
    let contains = graph.edge(EdgeKind::Contains, 1000, 10).unwrap();
    assert_eq!(contains["quantity"], Value::from(2));
    let viewed = graph.edge(EdgeKind::Viewed, 100, 10).unwrap();
    assert_eq!(viewed["last_ts"], Value::from(ts(2, 10).to_string()));

    assert_eq!(report.extracted.values().sum::<usize>(), 6);
    assert!(report.schema_statements > 0);
    assert_eq!(report.load.unmapped_events, 0);
}

#[tokio::test]
async fn test_second_run_creates_no_duplicates() {
    let graph = MemoryGraph::new();
    let source = bookshop();

    run_pipeline(&source, &graph, &options()).await.unwrap();
    let (nodes, edges) = (graph.total_nodes(), graph.total_edges());

    run_pipeline(&source, &graph, &options()).await.unwrap();
    assert_eq!(graph.total_nodes(), nodes);
    assert_eq!(graph.total_edges(), edges);
}

#[tokio::test]
async fn test_rerun_overwrites_changed_properties() {
    let graph = MemoryGraph::new();
    run_pipeline(&bookshop(), &graph, &options()).await.unwrap();

    let mut changed = bookshop();
    changed.products[0].price = Some(12.5);
    changed.order_items[0].quantity = Some(3);
    run_pipeline(&changed, &graph, &options()).await.unwrap();

    assert_eq!(graph.node(NodeLabel::Product, 10).unwrap()["price"], Value::from(12.5));
    assert_eq!(graph.edge(EdgeKind::Contains, 1000, 10).unwrap()["quantity"], Value::from(3));
    assert_eq!(graph.node_count(NodeLabel::Product), 1);
}

#[tokio::test]
async fn test_out_of_order_load_leaves_edge_absent() {
    let graph = MemoryGraph::new();
    let source = bookshop();
    let loader = GraphLoader::new(&graph, NonZeroUsize::new(10).unwrap());

    // Orders before customers: the PLACED edge has nothing to attach to.
    loader.load_batch(&WriteBatch::Orders(&source.orders)).await.unwrap();
    loader.load_batch(&WriteBatch::Customers(&source.customers)).await.unwrap();

    assert!(graph.node(NodeLabel::Order, 1000).is_some());
    assert!(graph.node(NodeLabel::Customer, 100).is_some());
    assert_eq!(graph.edge_count(EdgeKind::Placed), 0);

    // Order items before products: no CONTAINS, and no stray nodes either.
    loader.load_batch(&WriteBatch::OrderItems(&source.order_items)).await.unwrap();
    assert_eq!(graph.edge_count(EdgeKind::Contains), 0);
    assert_eq!(graph.node_count(NodeLabel::Product), 0);
}

#[tokio::test]
async fn test_each_event_type_produces_its_edge() {
    let graph = MemoryGraph::new();
    let mut source = bookshop();
    source.customers.push(Customer { id: 101, name: None, join_date: None });
    source.events = vec![
        event(100, 10, "view", ts(2, 1)),
        event(100, 10, "click", ts(2, 2)),
        event(101, 10, "add_to_cart", ts(2, 3)),
        event(101, 10, "wishlist", ts(2, 4)),
        event(101, 10, "VIEW", ts(2, 5)),
    ];

    let report = run_pipeline(&source, &graph, &options()).await.unwrap();

    assert!(graph.edge(EdgeKind::Viewed, 100, 10).is_some());
    assert!(graph.edge(EdgeKind::Clicked, 100, 10).is_some());
    assert!(graph.edge(EdgeKind::AddedToCart, 101, 10).is_some());
    // Customer 101 only has the add_to_cart edge; the unknown types produced nothing.
    assert!(graph.edge(EdgeKind::Viewed, 101, 10).is_none());
    assert!(graph.edge(EdgeKind::Clicked, 101, 10).is_none());
    assert_eq!(report.load.unmapped_events, 2);
}

#[tokio::test]
async fn test_repeated_events_collapse_to_last_processed_row() {
    let graph = MemoryGraph::new();
    let mut source = bookshop();
    // Extraction order, not timestamp order, decides last_ts.
    source.events = vec![
        event(100, 10, "view", ts(5, 0)),
        event(100, 10, "view", ts(3, 0)),
        event(100, 10, "view", ts(4, 0)),
    ];

    run_pipeline(&source, &graph, &options()).await.unwrap();

    assert_eq!(graph.edge_count(EdgeKind::Viewed), 1);
    let viewed = graph.edge(EdgeKind::Viewed, 100, 10).unwrap();
    assert_eq!(viewed["last_ts"], Value::from(ts(4, 0).to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_unreachable_graph_times_out() {
    let graph = MemoryGraph::new().unavailable_for(u32::MAX);
    let start = tokio::time::Instant::now();

    let err = run_pipeline(&bookshop(), &graph, &options()).await.unwrap_err();

    match err {
        PipelineError::Readiness(CoreError::ReadinessTimeout { store, .. }) => {
            assert_eq!(store, "graph store")
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(12));
    assert_eq!(graph.writes(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_slow_graph_is_waited_for() {
    let graph = MemoryGraph::new().unavailable_for(2);
    run_pipeline(&bookshop(), &graph, &options()).await.unwrap();
    assert_eq!(graph.total_nodes(), 4);
}

#[tokio::test]
async fn test_schema_failure_aborts_before_load() {
    let graph = MemoryGraph::new().rejecting_statements("Customer");
    let err = run_pipeline(&bookshop(), &graph, &options()).await.unwrap_err();

    assert!(matches!(err, PipelineError::SchemaApply { .. }));
    assert_eq!(graph.writes(), 0);
}

#[tokio::test]
async fn test_missing_schema_is_not_fatal() {
    let graph = MemoryGraph::new();
    let options = PipelineOptions {
        schema: None,
        ..options()
    };

    let report = run_pipeline(&bookshop(), &graph, &options).await.unwrap();
    assert_eq!(report.schema_statements, 0);
    assert!(graph.statements().is_empty());
    assert_eq!(graph.total_nodes(), 4);
}

/// A source whose `orders` table cannot be read.
struct BrokenOrders(SourceSnapshot);

#[async_trait]
impl SourceStore for BrokenOrders {
    async fn probe(&self) -> DbResult<()> {
        Ok(())
    }

    async fn extract(&self, entity: EntityKind) -> DbResult<Table> {
        if entity == EntityKind::Order {
            return Err(DbError::Query {
                entity,
                source: sqlx_error(),
            });
        }
        self.0.extract(entity).await
    }
}

fn sqlx_error() -> shopgraph_db::pool::SqlxError {
    shopgraph_db::pool::SqlxError::Protocol("relation \"orders\" does not exist".to_string())
}

#[tokio::test]
async fn test_extraction_failure_writes_nothing() {
    let graph = MemoryGraph::new();
    let err = run_pipeline(&BrokenOrders(bookshop()), &graph, &options()).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Extraction(DbError::Query { entity: EntityKind::Order, .. })
    ));
    assert_eq!(graph.writes(), 0);
}

#[tokio::test]
async fn test_load_failure_leaves_committed_prefix() {
    // Batch size 2: categories (1 batch) and products (1 batch) succeed.
    let graph = MemoryGraph::new().rejecting_writes_after(2);
    let err = run_pipeline(&bookshop(), &graph, &options()).await.unwrap_err();

    match err {
        PipelineError::Load(load) => {
            assert_eq!(load.kind, EntityKind::Customer);
            assert_eq!(load.batch, 0);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(graph.edge(EdgeKind::InCategory, 10, 1).is_some());
    assert_eq!(graph.node_count(NodeLabel::Customer), 0);
}

#[tokio::test]
async fn test_trait_objects_are_accepted() {
    let graph = MemoryGraph::new();
    let source = bookshop();
    let source: &dyn SourceStore = &source;
    let sink: &dyn GraphSink = &graph;

    run_pipeline(source, sink, &options()).await.unwrap();
    assert_eq!(graph.total_edges(), 4);
}
