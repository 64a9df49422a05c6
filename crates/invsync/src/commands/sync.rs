//! Sync command handler.

use invsync_api::{FileStore, SnapshotFile};
use invsync_core::{KindCounts, SyncReport, Synchronizer};
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{GlobalOpts, SyncArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CountsRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Created")]
    created: String,
    #[tabled(rename = "Updated")]
    updated: String,
    #[tabled(rename = "Unchanged")]
    unchanged: String,
    #[tabled(rename = "Deleted")]
    deleted: String,
}

impl CountsRow {
    fn new(kind: &str, counts: &KindCounts, color: bool) -> Self {
        Self {
            kind: output::paint_label(kind, color),
            created: output::paint_count(counts.created, color),
            updated: output::paint_count(counts.updated, color),
            unchanged: output::paint_count(counts.unchanged, color),
            deleted: output::paint_count(counts.deleted, color),
        }
    }
}

fn format_report(report: &SyncReport, color: bool) -> String {
    let rows = [
        CountsRow::new("clusters", &report.clusters, color),
        CountsRow::new("hosts", &report.hosts, color),
    ];
    let table = Table::new(rows).with(Style::rounded()).to_string();
    if report.is_noop() {
        format!("{table}\nAlready in sync.")
    } else {
        table
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: SyncArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let resolved = config::resolve(global)?;
    let inventory_path = resolved
        .inventory
        .clone()
        .ok_or_else(|| CliError::MissingSetting {
            setting: "inventory".into(),
            flag: "--inventory".into(),
        })?;

    let inventory = SnapshotFile::open(&inventory_path)
        .await
        .map_err(|source| CliError::Inventory {
            path: inventory_path.display().to_string(),
            source,
        })?;
    let store = FileStore::new(&resolved.store, &resolved.sync.scope.namespace);
    let sync = Synchronizer::new(inventory, store, resolved.sync);
    let cancel = util::interrupt_token();

    if args.watch {
        let interval = args.interval.unwrap_or(sync.config().interval);
        if interval.is_zero() {
            return Err(CliError::Validation {
                field: "interval".into(),
                reason: "must be greater than zero".into(),
            });
        }
        if !global.quiet {
            eprintln!(
                "Syncing scope '{}' every {}; Ctrl-C to stop",
                sync.config().scope.name,
                humantime::format_duration(interval)
            );
        }
        sync.run_periodic(interval, &cancel).await;
        return Ok(());
    }

    let report = sync.run_pass(&cancel).await?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &report,
        |r| format_report(r, color),
        |r| r.writes().to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
