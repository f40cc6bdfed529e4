use crate::commands::Context;
use crate::error::{invalid_input, not_found};
use anyhow::{Context as _, Result};
use pledgeline_core::domain::{
    parse_amount_cents, CustomerId, Disposition, DispositionId, ExcludeAction, ModifierSet,
};
use pledgeline_core::rules::StatusKind;
use pledgeline_core::time::{parse_local_timestamp, DAY_SECONDS};
use std::str::FromStr;

pub fn parse_customer_id(raw: &str) -> Result<CustomerId> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("customer id cannot be empty"));
    }
    CustomerId::from_str(trimmed).map_err(|_| invalid_input("invalid customer id"))
}

/// Accepts a disposition id or its exact name.
pub fn resolve_disposition(ctx: &Context<'_>, raw: &str) -> Result<Disposition> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("disposition cannot be empty"));
    }
    if let Ok(id) = DispositionId::from_str(trimmed) {
        if let Some(disposition) = ctx.store.dispositions().get(id)? {
            return Ok(disposition);
        }
    }
    ctx.store
        .dispositions()
        .find_by_name(trimmed)?
        .ok_or_else(|| not_found(format!("disposition not found: {trimmed}")))
}

pub fn parse_time(raw: &str) -> Result<i64> {
    parse_local_timestamp(raw).with_context(|| format!("invalid time '{}'", raw.trim()))
}

/// Like `parse_time`, but a bare date means the end of that day.
pub fn parse_time_end(raw: &str) -> Result<i64> {
    let start = parse_time(raw)?;
    if raw.trim().contains([' ', 'T', ':']) {
        Ok(start)
    } else {
        Ok(start + DAY_SECONDS - 1)
    }
}

pub fn parse_amount(raw: &str) -> Result<i64> {
    parse_amount_cents(raw).with_context(|| "parse amount")
}

pub fn parse_modifiers(raw: &[String]) -> Result<ModifierSet> {
    let joined = raw.join(",");
    ModifierSet::parse_labels(&joined).with_context(|| "parse modifiers")
}

pub fn parse_exclude_action(raw: &str) -> Result<ExcludeAction> {
    ExcludeAction::parse(raw).ok_or_else(|| {
        invalid_input(format!(
            "invalid exclude action '{raw}': expected none|dnc|timeout"
        ))
    })
}

pub fn parse_status(raw: &str) -> Result<StatusKind> {
    StatusKind::parse(raw).ok_or_else(|| {
        let expected: Vec<&str> = StatusKind::all().iter().map(|kind| kind.as_str()).collect();
        invalid_input(format!(
            "invalid status '{}': expected {}",
            raw.trim(),
            expected.join("|")
        ))
    })
}

/// Empty string clears an optional field.
pub fn normalize_optional_value(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_optional_value, parse_modifiers, parse_status, parse_time, parse_time_end};
    use pledgeline_core::domain::Modifier;
    use pledgeline_core::rules::StatusKind;

    #[test]
    fn parse_time_end_covers_whole_day() {
        let start = parse_time("2024-03-15").expect("start");
        let end = parse_time_end("2024-03-15").expect("end");
        assert_eq!(end - start, 86_399);
        let exact = parse_time_end("2024-03-15 10:00").expect("exact");
        assert_eq!(exact, parse_time("2024-03-15 10:00").expect("time"));
    }

    #[test]
    fn parse_modifiers_accepts_repeats_and_lists() {
        let set = parse_modifiers(&["sale,payment".to_string(), "dnc".to_string()]).expect("set");
        assert!(set.contains(Modifier::Sale));
        assert!(set.contains(Modifier::Payment));
        assert!(set.contains(Modifier::Dnc));
        assert!(parse_modifiers(&["bogus".to_string()]).is_err());
    }

    #[test]
    fn parse_status_reports_choices() {
        assert_eq!(parse_status("open_order").expect("status"), StatusKind::OpenOrder);
        let err = parse_status("pending").unwrap_err();
        assert!(err.to_string().contains("open_order"));
    }

    #[test]
    fn normalize_optional_value_clears_blank() {
        assert_eq!(normalize_optional_value("  ".to_string()), None);
        assert_eq!(
            normalize_optional_value(" Austin ".to_string()),
            Some("Austin".to_string())
        );
    }
}
