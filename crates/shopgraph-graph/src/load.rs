//! Batched, idempotent loading of a source snapshot into the graph.
//!
//! Kinds are written in [`EntityKind::LOAD_ORDER`]; each later kind only
//! matches nodes merged by an earlier one. There is no cross-batch
//! transaction: when a batch fails, the batches before it stay committed.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;

use shopgraph_core::{chunk, route, EntityKind, Event, EventKind};
use shopgraph_db::SourceSnapshot;
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::sink::{GraphSink, WriteBatch};

/// Rows and batches written for one entity kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindReport {
    pub rows: usize,
    pub batches: usize,
}

impl KindReport {
    fn merge(&mut self, other: KindReport) {
        self.rows += other.rows;
        self.batches += other.batches;
    }
}

/// Result of a load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub kinds: BTreeMap<EntityKind, KindReport>,
    /// Event rows written per event class.
    pub events: BTreeMap<EventKind, usize>,
    /// Event rows skipped for an unknown `event_type`.
    pub unmapped_events: usize,
}

impl LoadReport {
    pub fn kind(&self, kind: EntityKind) -> KindReport {
        self.kinds.get(&kind).copied().unwrap_or_default()
    }

    pub fn total_batches(&self) -> usize {
        self.kinds.values().map(|k| k.batches).sum()
    }
}

/// Writes snapshots to a [`GraphSink`] in bounded batches.
pub struct GraphLoader<'a, G: GraphSink + ?Sized> {
    sink: &'a G,
    batch_size: NonZeroUsize,
}

impl<'a, G: GraphSink + ?Sized> GraphLoader<'a, G> {
    pub fn new(sink: &'a G, batch_size: NonZeroUsize) -> Self {
        Self { sink, batch_size }
    }

    /// Issue one upsert for one batch.
    pub async fn load_batch(&self, batch: &WriteBatch<'_>) -> crate::GraphResult<()> {
        self.sink.write(batch).await
    }

    /// Load every kind of the snapshot in dependency order.
    pub async fn load_snapshot(&self, snapshot: &SourceSnapshot) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();

        for kind in EntityKind::LOAD_ORDER {
            info!(rows = snapshot.len(kind), "Loading {} into graph...", kind);

            let written = match kind {
                EntityKind::Category => {
                    self.load_rows(kind, &snapshot.categories, WriteBatch::Categories).await?
                }
                EntityKind::Product => {
                    self.load_rows(kind, &snapshot.products, WriteBatch::Products).await?
                }
                EntityKind::Customer => {
                    self.load_rows(kind, &snapshot.customers, WriteBatch::Customers).await?
                }
                EntityKind::Order => self.load_rows(kind, &snapshot.orders, WriteBatch::Orders).await?,
                EntityKind::OrderItem => {
                    self.load_rows(kind, &snapshot.order_items, WriteBatch::OrderItems).await?
                }
                EntityKind::Event => self.load_events(&snapshot.events, &mut report).await?,
            };

            report.kinds.entry(kind).or_default().merge(written);
        }

        Ok(report)
    }

    /// Route events by `event_type` and write each class as its own edge type.
    ///
    /// Unknown event types are skipped and counted in `report`.
    pub async fn load_events(&self, events: &[Event], report: &mut LoadReport) -> Result<KindReport, LoadError> {
        let routed = route(events);

        if !routed.unmapped.is_empty() {
            let mut unknown: Vec<&str> = routed.unmapped.iter().map(|e| e.event_type.as_str()).collect();
            unknown.sort_unstable();
            unknown.dedup();
            warn!(
                rows = routed.unmapped.len(),
                event_types = ?unknown,
                "Skipping events with unknown event_type"
            );
        }
        report.unmapped_events += routed.unmapped.len();

        let mut written = KindReport::default();
        for (event_kind, rows) in routed.classes() {
            if rows.is_empty() {
                continue;
            }
            debug!(event_type = %event_kind, edge = %event_kind.edge(), rows = rows.len(), "Loading event class");

            let class = self
                .load_rows(EntityKind::Event, rows, |rows| WriteBatch::Events { kind: event_kind, rows })
                .await?;
            *report.events.entry(event_kind).or_default() += class.rows;
            written.merge(class);
        }

        Ok(written)
    }

    async fn load_rows<'r, T>(
        &self,
        kind: EntityKind,
        rows: &'r [T],
        make: impl Fn(&'r [T]) -> WriteBatch<'r>,
    ) -> Result<KindReport, LoadError> {
        let batches = chunk(rows, self.batch_size);
        let total = batches.len();
        let mut written = KindReport::default();

        for (index, group) in batches.iter().enumerate() {
            let batch = make(group);
            self.load_batch(&batch).await.map_err(|source| LoadError {
                kind,
                batch: index,
                rows: group.len(),
                source,
            })?;

            written.rows += group.len();
            written.batches += 1;
            debug!(kind = %kind, batch = index + 1, of = total, rows = group.len(), "Batch written");
        }

        Ok(written)
    }
}
