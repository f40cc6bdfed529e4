use crate::commands::{print_json, Context};
use crate::error::invalid_input;
use crate::util::{parse_exclude_action, parse_modifiers, resolve_disposition};
use anyhow::Result;
use clap::{Args, Subcommand};
use pledgeline_core::domain::{Disposition, ExcludeAction};
use pledgeline_core::dto::DispositionDto;
use pledgeline_store::repo::{CatalogChange, DispositionNew, DispositionUpdate};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Subcommand)]
pub enum DispositionCommand {
    /// Add a disposition to the catalog
    Add(AddDispositionArgs),
    /// Change a disposition's name, modifiers or parameters
    Edit(EditDispositionArgs),
    /// Delete a disposition; customers showing it fall back to the default
    Rm(RemoveDispositionArgs),
    Ls(ListDispositionsArgs),
}

#[derive(Debug, Args)]
pub struct AddDispositionArgs {
    pub name: String,
    /// dnc, sale, payment, invoice, timeout, exclude-count, cancel
    #[arg(long = "modifier", value_name = "MODIFIER")]
    pub modifiers: Vec<String>,
    #[arg(long)]
    pub timeout_days: Option<i32>,
    #[arg(long)]
    pub exclude_after: Option<i32>,
    #[arg(long, value_name = "none|dnc|timeout")]
    pub exclude_action: Option<String>,
    #[arg(long)]
    pub exclude_timeout_days: Option<i32>,
}

#[derive(Debug, Args)]
pub struct EditDispositionArgs {
    /// Disposition id or name
    pub disposition: String,
    #[arg(long)]
    pub name: Option<String>,
    /// Replaces the modifier set; pass an empty string to clear it
    #[arg(long = "modifier", value_name = "MODIFIER")]
    pub modifiers: Option<Vec<String>>,
    #[arg(long)]
    pub timeout_days: Option<i32>,
    #[arg(long)]
    pub exclude_after: Option<i32>,
    #[arg(long, value_name = "none|dnc|timeout")]
    pub exclude_action: Option<String>,
    #[arg(long)]
    pub exclude_timeout_days: Option<i32>,
}

#[derive(Debug, Args)]
pub struct RemoveDispositionArgs {
    pub disposition: String,
}

#[derive(Debug, Args)]
pub struct ListDispositionsArgs {}

#[derive(Debug, Serialize)]
struct CatalogChangeReport {
    disposition: DispositionDto,
    recalculated: usize,
    reassigned: usize,
}

impl From<&CatalogChange> for CatalogChangeReport {
    fn from(change: &CatalogChange) -> Self {
        Self {
            disposition: DispositionDto::from(&change.disposition),
            recalculated: change.recalculated,
            reassigned: change.reassigned,
        }
    }
}

pub fn add_disposition(ctx: &Context<'_>, args: AddDispositionArgs) -> Result<()> {
    let exclude_action = match args.exclude_action.as_deref() {
        Some(raw) => parse_exclude_action(raw)?,
        None => ExcludeAction::None,
    };
    let change = ctx.store.dispositions().create(
        ctx.now,
        DispositionNew {
            name: args.name,
            modifiers: parse_modifiers(&args.modifiers)?,
            timeout_days: args.timeout_days,
            exclude_after_attempts: args.exclude_after,
            exclude_action,
            exclude_action_timeout_days: args.exclude_timeout_days,
        },
    )?;
    info!(
        id = %change.disposition.id,
        recalculated = change.recalculated,
        "disposition created"
    );
    print_change(ctx, "created", &change)
}

pub fn edit_disposition(ctx: &Context<'_>, args: EditDispositionArgs) -> Result<()> {
    let disposition = resolve_disposition(ctx, &args.disposition)?;

    let mut update = DispositionUpdate::default();
    if let Some(name) = args.name {
        update.name = Some(name);
    }
    if let Some(modifiers) = args.modifiers {
        update.modifiers = Some(parse_modifiers(&modifiers)?);
    }
    if let Some(days) = args.timeout_days {
        update.timeout_days = Some(Some(days));
    }
    if let Some(attempts) = args.exclude_after {
        update.exclude_after_attempts = Some(Some(attempts));
    }
    if let Some(raw) = args.exclude_action {
        update.exclude_action = Some(parse_exclude_action(&raw)?);
    }
    if let Some(days) = args.exclude_timeout_days {
        update.exclude_action_timeout_days = Some(Some(days));
    }

    if update_is_empty(&update) {
        return Err(invalid_input("no updates provided"));
    }

    let change = ctx
        .store
        .dispositions()
        .update(ctx.now, disposition.id, update)?;
    info!(
        id = %change.disposition.id,
        recalculated = change.recalculated,
        "disposition updated"
    );
    print_change(ctx, "updated", &change)
}

pub fn remove_disposition(ctx: &Context<'_>, args: RemoveDispositionArgs) -> Result<()> {
    let disposition = resolve_disposition(ctx, &args.disposition)?;
    let change = ctx.store.dispositions().delete(ctx.now, disposition.id)?;
    info!(
        id = %change.disposition.id,
        reassigned = change.reassigned,
        recalculated = change.recalculated,
        "disposition deleted"
    );
    print_change(ctx, "deleted", &change)
}

pub fn list_dispositions(ctx: &Context<'_>, _args: ListDispositionsArgs) -> Result<()> {
    let dispositions = ctx.store.dispositions().list()?;
    if ctx.json {
        let dtos: Vec<DispositionDto> = dispositions.iter().map(DispositionDto::from).collect();
        return print_json(&dtos);
    }

    for disposition in &dispositions {
        println!("{}", format_disposition_line(disposition));
    }
    Ok(())
}

fn print_change(ctx: &Context<'_>, verb: &str, change: &CatalogChange) -> Result<()> {
    if ctx.json {
        return print_json(&CatalogChangeReport::from(change));
    }
    println!(
        "{verb} {} {} ({} statuses changed)",
        change.disposition.id, change.disposition.name, change.recalculated
    );
    if change.reassigned > 0 {
        println!("{} customers moved to the default disposition", change.reassigned);
    }
    Ok(())
}

fn format_disposition_line(disposition: &Disposition) -> String {
    let mut line = format!("{}  {}", disposition.id, disposition.name);
    if disposition.is_default {
        line.push_str("  [default]");
    }
    if !disposition.modifiers.is_empty() {
        line.push_str(&format!("  [{}]", disposition.modifiers.to_labels()));
    }
    if let Some(days) = disposition.timeout_days() {
        line.push_str(&format!("  timeout={days}d"));
    }
    if let Some(rule) = disposition.exclude_rule() {
        line.push_str(&format!(
            "  after {} -> {}",
            rule.after_attempts,
            rule.action.as_str()
        ));
        if let Some(days) = rule.action_timeout_days {
            line.push_str(&format!(" {days}d"));
        }
    }
    line
}

fn update_is_empty(update: &DispositionUpdate) -> bool {
    update.name.is_none()
        && update.modifiers.is_none()
        && update.timeout_days.is_none()
        && update.exclude_after_attempts.is_none()
        && update.exclude_action.is_none()
        && update.exclude_action_timeout_days.is_none()
}
