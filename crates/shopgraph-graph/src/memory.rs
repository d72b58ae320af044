//! In-memory graph store with the same merge semantics as the Cypher in
//! [`crate::cypher`].
//!
//! Used as a substitute sink in tests and dry runs. Supports failure
//! injection (unavailable probes, rejected statements, rejected writes).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;
use shopgraph_core::{EdgeKind, NodeLabel};

use crate::error::{GraphError, GraphResult};
use crate::sink::{GraphSink, WriteBatch};

/// Node or edge properties. Setting a property to null removes it.
pub type Properties = BTreeMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct NodeKey {
    label: NodeLabel,
    id: i64,
}

/// Edges are unique per (type, start, end); endpoint labels follow from the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct EdgeKey {
    kind: EdgeKind,
    from: i64,
    to: i64,
}

#[derive(Debug, Default)]
struct State {
    nodes: BTreeMap<NodeKey, Properties>,
    edges: BTreeMap<EdgeKey, Properties>,
    statements: Vec<String>,
    writes: usize,
}

impl State {
    fn merge_node(&mut self, label: NodeLabel, id: i64, props: Vec<(&str, Value)>) {
        let node = self.nodes.entry(NodeKey { label, id }).or_default();
        set_all(node, props);
    }

    fn has_node(&self, label: NodeLabel, id: Option<i64>) -> bool {
        id.is_some_and(|id| self.nodes.contains_key(&NodeKey { label, id }))
    }

    /// `MATCH` both endpoints, then `MERGE` the edge. Missing endpoints skip the row.
    fn merge_edge(&mut self, kind: EdgeKind, from: Option<i64>, to: Option<i64>, props: Vec<(&str, Value)>) {
        let (from_label, to_label) = kind.endpoints();
        if !self.has_node(from_label, from) || !self.has_node(to_label, to) {
            return;
        }
        if let (Some(from), Some(to)) = (from, to) {
            let edge = self.edges.entry(EdgeKey { kind, from, to }).or_default();
            set_all(edge, props);
        }
    }

    fn apply(&mut self, batch: &WriteBatch<'_>) {
        match batch {
            WriteBatch::Categories(rows) => {
                for c in rows.iter() {
                    self.merge_node(NodeLabel::Category, c.id, vec![("name", text(c.name.as_deref()))]);
                }
            }
            WriteBatch::Products(rows) => {
                for p in rows.iter() {
                    self.merge_node(
                        NodeLabel::Product,
                        p.id,
                        vec![("name", text(p.name.as_deref())), ("price", json(p.price))],
                    );
                    self.merge_edge(EdgeKind::InCategory, Some(p.id), p.category_id, Vec::new());
                }
            }
            WriteBatch::Customers(rows) => {
                for c in rows.iter() {
                    self.merge_node(
                        NodeLabel::Customer,
                        c.id,
                        vec![
                            ("name", text(c.name.as_deref())),
                            ("join_date", text(c.join_date.map(|d| d.to_string()).as_deref())),
                        ],
                    );
                }
            }
            WriteBatch::Orders(rows) => {
                for o in rows.iter() {
                    self.merge_node(
                        NodeLabel::Order,
                        o.id,
                        vec![("ts", text(o.ts.map(|t| t.to_string()).as_deref()))],
                    );
                    self.merge_edge(EdgeKind::Placed, o.customer_id, Some(o.id), Vec::new());
                }
            }
            WriteBatch::OrderItems(rows) => {
                for i in rows.iter() {
                    self.merge_edge(
                        EdgeKind::Contains,
                        Some(i.order_id),
                        Some(i.product_id),
                        vec![("quantity", json(i.quantity))],
                    );
                }
            }
            WriteBatch::Events { kind, rows } => {
                for e in rows.iter() {
                    self.merge_edge(
                        kind.edge(),
                        Some(e.customer_id),
                        Some(e.product_id),
                        vec![("last_ts", text(e.ts.map(|t| t.to_string()).as_deref()))],
                    );
                }
            }
        }
    }
}

fn set_all(target: &mut Properties, props: Vec<(&str, Value)>) {
    for (key, value) in props {
        if value.is_null() {
            target.remove(key);
        } else {
            target.insert(key.to_string(), value);
        }
    }
}

fn text(value: Option<&str>) -> Value {
    value.map(Value::from).unwrap_or(Value::Null)
}

fn json<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// An in-memory property graph.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    state: Mutex<State>,
    unavailable_probes: AtomicU32,
    reject_statements_containing: Option<String>,
    reject_writes_after: Option<usize>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `probes` probes, as a store that is still starting.
    pub fn unavailable_for(self, probes: u32) -> Self {
        self.unavailable_probes.store(probes, Ordering::SeqCst);
        self
    }

    /// Reject schema statements containing `pattern`.
    pub fn rejecting_statements(mut self, pattern: impl Into<String>) -> Self {
        self.reject_statements_containing = Some(pattern.into());
        self
    }

    /// Accept `writes` batch writes, then reject every further one.
    pub fn rejecting_writes_after(mut self, writes: usize) -> Self {
        self.reject_writes_after = Some(writes);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Properties of a node, if it exists.
    pub fn node(&self, label: NodeLabel, id: i64) -> Option<Properties> {
        self.lock().nodes.get(&NodeKey { label, id }).cloned()
    }

    /// Properties of an edge, if it exists.
    pub fn edge(&self, kind: EdgeKind, from: i64, to: i64) -> Option<Properties> {
        self.lock().edges.get(&EdgeKey { kind, from, to }).cloned()
    }

    pub fn node_count(&self, label: NodeLabel) -> usize {
        self.lock().nodes.keys().filter(|k| k.label == label).count()
    }

    pub fn edge_count(&self, kind: EdgeKind) -> usize {
        self.lock().edges.keys().filter(|k| k.kind == kind).count()
    }

    pub fn total_nodes(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn total_edges(&self) -> usize {
        self.lock().edges.len()
    }

    /// Schema statements applied so far, in order.
    pub fn statements(&self) -> Vec<String> {
        self.lock().statements.clone()
    }

    /// Number of accepted batch writes.
    pub fn writes(&self) -> usize {
        self.lock().writes
    }
}

#[async_trait]
impl GraphSink for MemoryGraph {
    async fn probe(&self) -> GraphResult<()> {
        let pending = self.unavailable_probes.load(Ordering::SeqCst);
        if pending > 0 {
            self.unavailable_probes.store(pending - 1, Ordering::SeqCst);
            return Err(GraphError::Rejected("connection refused".to_string()));
        }
        Ok(())
    }

    async fn run_statement(&self, statement: &str) -> GraphResult<()> {
        if let Some(pattern) = &self.reject_statements_containing {
            if statement.contains(pattern.as_str()) {
                return Err(GraphError::Rejected(format!("statement contains '{}'", pattern)));
            }
        }
        self.lock().statements.push(statement.to_string());
        Ok(())
    }

    async fn write(&self, batch: &WriteBatch<'_>) -> GraphResult<()> {
        let mut state = self.lock();
        if self.reject_writes_after.is_some_and(|limit| state.writes >= limit) {
            return Err(GraphError::Rejected(format!("{} batch refused", batch.kind())));
        }
        state.apply(batch);
        state.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopgraph_core::{Category, Customer, Event, EventKind, Order, OrderItem, Product};

    fn product(id: i64, category_id: i64) -> Product {
        Product { id, name: Some(format!("p{id}")), price: Some(1.5), category_id: Some(category_id) }
    }

    #[tokio::test]
    async fn test_merge_overwrites_properties() {
        let graph = MemoryGraph::new();
        let first = [Category { id: 1, name: Some("Books".to_string()) }];
        let second = [Category { id: 1, name: Some("Novels".to_string()) }];

        graph.write(&WriteBatch::Categories(&first)).await.unwrap();
        graph.write(&WriteBatch::Categories(&second)).await.unwrap();

        assert_eq!(graph.node_count(NodeLabel::Category), 1);
        let node = graph.node(NodeLabel::Category, 1).unwrap();
        assert_eq!(node["name"], Value::from("Novels"));
    }

    #[tokio::test]
    async fn test_product_without_category_still_creates_node() {
        let graph = MemoryGraph::new();
        graph.write(&WriteBatch::Products(&[product(10, 1)])).await.unwrap();

        assert!(graph.node(NodeLabel::Product, 10).is_some());
        assert_eq!(graph.edge_count(EdgeKind::InCategory), 0);
    }

    #[tokio::test]
    async fn test_edges_need_both_endpoints() {
        let graph = MemoryGraph::new();
        let orders = [Order { id: 1000, customer_id: Some(100), ts: None }];
        let items = [OrderItem { order_id: 1000, product_id: 10, quantity: Some(2) }];

        graph.write(&WriteBatch::Orders(&orders)).await.unwrap();
        graph.write(&WriteBatch::OrderItems(&items)).await.unwrap();

        assert_eq!(graph.total_edges(), 0);
        assert!(graph.node(NodeLabel::Order, 1000).is_some());
    }

    #[tokio::test]
    async fn test_event_edge_keeps_last_processed_timestamp() {
        let graph = MemoryGraph::new();
        let customers = [Customer { id: 100, name: None, join_date: None }];
        graph.write(&WriteBatch::Customers(&customers)).await.unwrap();
        graph.write(&WriteBatch::Products(&[product(10, 1)])).await.unwrap();

        let late = chrono::NaiveDate::from_ymd_opt(2024, 5, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let early = chrono::NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let events = [
            Event { customer_id: 100, product_id: 10, event_type: "click".to_string(), ts: Some(late) },
            Event { customer_id: 100, product_id: 10, event_type: "click".to_string(), ts: Some(early) },
        ];
        let refs: Vec<&Event> = events.iter().collect();
        graph
            .write(&WriteBatch::Events { kind: EventKind::Click, rows: &refs })
            .await
            .unwrap();

        assert_eq!(graph.edge_count(EdgeKind::Clicked), 1);
        let edge = graph.edge(EdgeKind::Clicked, 100, 10).unwrap();
        assert_eq!(edge["last_ts"], Value::from(early.to_string()));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let graph = MemoryGraph::new()
            .unavailable_for(1)
            .rejecting_statements("DROP")
            .rejecting_writes_after(1);

        assert!(graph.probe().await.is_err());
        assert!(graph.probe().await.is_ok());

        assert!(graph.run_statement("DROP INDEX x").await.is_err());
        assert!(graph.run_statement("RETURN 1").await.is_ok());
        assert_eq!(graph.statements(), vec!["RETURN 1".to_string()]);

        let categories = [Category { id: 1, name: None }];
        assert!(graph.write(&WriteBatch::Categories(&categories)).await.is_ok());
        assert!(graph.write(&WriteBatch::Categories(&categories)).await.is_err());
        assert_eq!(graph.writes(), 1);
    }
}
