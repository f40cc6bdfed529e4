use crate::commands::{print_json, Context};
use anyhow::Result;
use clap::Args;
use pledgeline_core::dto::StatusCountDto;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Args)]
pub struct ReportArgs {}

#[derive(Debug, Args)]
pub struct RecalcArgs {}

#[derive(Debug, Serialize)]
struct StatusReport {
    total: usize,
    statuses: Vec<StatusCountDto>,
}

#[derive(Debug, Serialize)]
struct RecalcReport {
    customers: usize,
    changed: usize,
}

pub fn status_report(ctx: &Context<'_>, _args: ReportArgs) -> Result<()> {
    let counts = ctx.store.customers().status_counts()?;
    let report = StatusReport {
        total: counts.iter().map(|(_, count)| count).sum(),
        statuses: counts
            .iter()
            .map(|(kind, count)| StatusCountDto {
                status: kind.label().to_string(),
                count: *count,
            })
            .collect(),
    };

    if ctx.json {
        return print_json(&report);
    }

    for row in &report.statuses {
        println!("{:<12} {:>6}", row.status, row.count);
    }
    println!("{:<12} {:>6}", "Total", report.total);
    Ok(())
}

pub fn recalculate(ctx: &Context<'_>, _args: RecalcArgs) -> Result<()> {
    let changed = ctx.store.customers().recalculate_all(ctx.now)?;
    let customers = ctx.store.customers().list_all()?.len();
    info!(customers, changed, "recalculated statuses");

    if ctx.json {
        return print_json(&RecalcReport { customers, changed });
    }
    println!("recalculated {customers} customers, {changed} changed");
    Ok(())
}
