//! Terminal output formatting.

use colored::Colorize;
use shopgraph_core::{EntityKind, EventKind};
use shopgraph_graph::{GraphCounts, SyncReport};

/// Print the summary of a finished migration.
pub fn print_report(report: &SyncReport, counts: Option<&GraphCounts>) {
    println!();
    println!("{}", "Migration complete".green().bold());
    println!("{}: {}", "Schema statements".bold(), report.schema_statements);
    println!();

    println!("{:<14} {:>10} {:>10} {:>9}", "Table", "Extracted", "Loaded", "Batches");
    println!("{}", "─".repeat(46));

    for kind in EntityKind::LOAD_ORDER {
        let extracted = report.extracted.get(&kind).copied().unwrap_or_default();
        let loaded = report.load.kind(kind);
        let rows = if loaded.rows == extracted {
            loaded.rows.to_string().normal()
        } else {
            loaded.rows.to_string().yellow()
        };
        println!(
            "{:<14} {:>10} {:>10} {:>9}",
            kind.table(),
            extracted,
            rows,
            loaded.batches
        );
    }

    if !report.load.events.is_empty() || report.load.unmapped_events > 0 {
        println!();
        println!("{}", "Events".bold());
        for kind in EventKind::ALL {
            if let Some(rows) = report.load.events.get(&kind) {
                println!("  {:<12} → {:<14} {}", kind.as_str(), kind.edge().as_str(), rows);
            }
        }
        if report.load.unmapped_events > 0 {
            println!(
                "  {}",
                format!("{} rows skipped (unknown event_type)", report.load.unmapped_events).yellow()
            );
        }
    }

    if let Some(counts) = counts {
        println!();
        println!(
            "{}: {} nodes, {} relationships",
            "Graph totals".bold(),
            counts.nodes.to_string().cyan(),
            counts.relationships.to_string().cyan()
        );
    }
}
