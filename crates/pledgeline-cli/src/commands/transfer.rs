use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{parse_time, parse_time_end};
use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use pledgeline_core::rules::ExportWindow;
use pledgeline_core::time::format_timestamp_date;
use pledgeline_import::csv_export::{export_customers_csv, ExportKind};
use pledgeline_import::csv_import::{parse_customer_csv, CsvImportOptions};
use pledgeline_import::paids::{paid_at_from_filename, parse_paids};
use pledgeline_store::repo::PaidsImport;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Subcommand)]
pub enum ImportCommand {
    /// Merge a customer CSV into the book by phone number
    Csv(ImportCsvArgs),
    /// Record payments for the phone numbers listed in a paids TXT file
    Paids(ImportPaidsArgs),
}

#[derive(Debug, Subcommand)]
pub enum ExportCommand {
    Csv(ExportCsvArgs),
}

#[derive(Debug, Args)]
pub struct ImportCsvArgs {
    pub file: PathBuf,
    /// Parse and report without writing
    #[arg(long)]
    pub dry_run: bool,
    /// Keep phone numbers exactly as written
    #[arg(long)]
    pub keep_phone_punctuation: bool,
}

#[derive(Debug, Args)]
pub struct ImportPaidsArgs {
    /// Filename must contain the payment date unless --date is given
    pub file: PathBuf,
    #[arg(long)]
    pub date: Option<String>,
    /// Payment disposition name; defaults to paids.disposition from config
    #[arg(long)]
    pub disposition: Option<String>,
}

#[derive(Debug, Args)]
pub struct ExportCsvArgs {
    /// Only customers eligible for mailings, name and address columns
    #[arg(long)]
    pub mailing: bool,
    #[arg(long)]
    pub from: Option<String>,
    #[arg(long)]
    pub to: Option<String>,
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct CsvImportSummary {
    file: String,
    dry_run: bool,
    created: usize,
    updated: usize,
    appended: usize,
    duplicates: usize,
    skipped: usize,
    warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PaidsSummary {
    file: String,
    paid_on: String,
    applied: usize,
    carried_from_sale: usize,
    duplicates: usize,
    not_found: Vec<String>,
    warnings: Vec<String>,
}

pub fn import_csv(ctx: &Context<'_>, args: ImportCsvArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("open import file {}", args.file.display()))?;
    let catalog = ctx.store.dispositions().catalog()?;
    let options = CsvImportOptions {
        strip_phone_punctuation: ctx.config.import.strip_phone_punctuation
            && !args.keep_phone_punctuation,
        default_agent: ctx.config.import.default_agent.clone(),
    };
    let parsed = parse_customer_csv(file, &catalog, &options)
        .with_context(|| format!("parse {}", args.file.display()))?;

    let mut summary = CsvImportSummary {
        file: args.file.display().to_string(),
        dry_run: args.dry_run,
        created: 0,
        updated: 0,
        appended: 0,
        duplicates: 0,
        skipped: parsed.skipped,
        warnings: parsed.warnings,
    };

    if args.dry_run {
        summary.appended = parsed.records.len();
    } else {
        let report = ctx.store.customers().import_batch(ctx.now, parsed.records)?;
        summary.created = report.created;
        summary.updated = report.updated;
        summary.appended = report.appended;
        summary.duplicates = report.duplicates;
        summary.skipped += report.skipped;
        summary.warnings.extend(report.warnings);
    }
    info!(
        created = summary.created,
        updated = summary.updated,
        skipped = summary.skipped,
        dry_run = summary.dry_run,
        "csv import finished"
    );

    if ctx.json {
        return print_json(&summary);
    }

    for warning in &summary.warnings {
        warn!("{}", warning);
    }
    if summary.dry_run {
        println!(
            "dry run: {} rows ready, {} skipped",
            summary.appended, summary.skipped
        );
    } else {
        println!(
            "imported {}: {} created, {} updated, {} events added, {} duplicates, {} skipped",
            summary.file,
            summary.created,
            summary.updated,
            summary.appended,
            summary.duplicates,
            summary.skipped
        );
    }
    Ok(())
}

pub fn import_paids(ctx: &Context<'_>, args: ImportPaidsArgs) -> Result<()> {
    let data = fs::read_to_string(&args.file)
        .with_context(|| format!("read paids file {}", args.file.display()))?;
    let paid_at = match args.date.as_deref() {
        Some(raw) => parse_time(raw)?,
        None => paid_at_from_filename(&args.file)?,
    };
    let parsed = parse_paids(&data);
    if parsed.phones.is_empty() {
        return Err(invalid_input(format!(
            "no phone numbers in {}",
            args.file.display()
        )));
    }

    let report = ctx.store.customers().import_paids(
        ctx.now,
        &PaidsImport {
            phones: parsed.phones,
            paid_at,
            disposition_name: args
                .disposition
                .unwrap_or_else(|| ctx.config.paids.disposition.clone()),
            default_agent: ctx.config.paids.default_agent.clone(),
        },
    )?;
    info!(
        applied = report.applied,
        not_found = report.not_found.len(),
        "paids import finished"
    );

    let summary = PaidsSummary {
        file: args.file.display().to_string(),
        paid_on: format_timestamp_date(paid_at),
        applied: report.applied,
        carried_from_sale: report.carried_from_sale,
        duplicates: report.duplicates,
        not_found: report.not_found,
        warnings: parsed.warnings,
    };

    if ctx.json {
        return print_json(&summary);
    }

    println!(
        "paids {} ({}): {} applied, {} carried from open sales, {} duplicates",
        summary.file,
        summary.paid_on,
        summary.applied,
        summary.carried_from_sale,
        summary.duplicates
    );
    if !summary.not_found.is_empty() {
        println!("not found: {}", summary.not_found.join(", "));
    }
    for warning in &summary.warnings {
        warn!("{}", warning);
    }
    Ok(())
}

pub fn export_csv(ctx: &Context<'_>, args: ExportCsvArgs) -> Result<()> {
    let window = ExportWindow {
        from: args.from.as_deref().map(parse_time).transpose()?,
        to: args.to.as_deref().map(parse_time_end).transpose()?,
    };
    if let (Some(from), Some(to)) = (window.from, window.to) {
        if from > to {
            return Err(invalid_input("--from must not be after --to"));
        }
    }
    let kind = if args.mailing {
        ExportKind::Mailing
    } else {
        ExportKind::Full
    };

    let customers = ctx.store.customers().list_all()?;
    let catalog = ctx.store.dispositions().catalog()?;

    let report = match &args.out {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("create export file {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let report =
                export_customers_csv(&mut writer, &customers, &catalog, ctx.now, kind, window)?;
            writer.flush()?;
            report
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            export_customers_csv(&mut handle, &customers, &catalog, ctx.now, kind, window)?
        }
    };
    info!(
        written = report.written,
        excluded = report.excluded,
        "csv export finished"
    );

    if let Some(path) = &args.out {
        if ctx.json {
            return print_json(&report);
        }
        println!(
            "exported {} customers to {} ({} excluded)",
            report.written,
            path.display(),
            report.excluded
        );
    }
    Ok(())
}
