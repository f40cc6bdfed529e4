use crate::domain::{Disposition, DispositionCatalog, DispositionEvent, DispositionId, Modifier};
use crate::time::{add_days, format_timestamp_date};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a customer, derived from history and the catalog.
/// Only `Timeout` carries a payload: the instant the suspension ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Dnc,
    Timeout {
        until: i64,
    },
    Paid,
    OpenOrder,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    Active,
    Dnc,
    Timeout,
    Paid,
    OpenOrder,
    Cancelled,
}

impl StatusKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            StatusKind::Active => "active",
            StatusKind::Dnc => "dnc",
            StatusKind::Timeout => "timeout",
            StatusKind::Paid => "paid",
            StatusKind::OpenOrder => "open_order",
            StatusKind::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "active" => Some(StatusKind::Active),
            "dnc" => Some(StatusKind::Dnc),
            "timeout" => Some(StatusKind::Timeout),
            "paid" => Some(StatusKind::Paid),
            "open_order" => Some(StatusKind::OpenOrder),
            "cancelled" | "canceled" => Some(StatusKind::Cancelled),
            _ => None,
        }
    }

    pub const fn all() -> &'static [StatusKind] {
        &[
            StatusKind::Active,
            StatusKind::Dnc,
            StatusKind::Timeout,
            StatusKind::Paid,
            StatusKind::OpenOrder,
            StatusKind::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            StatusKind::Active => "Active",
            StatusKind::Dnc => "DNC",
            StatusKind::Timeout => "Timeout",
            StatusKind::Paid => "Paid",
            StatusKind::OpenOrder => "Open Order",
            StatusKind::Cancelled => "Cancelled",
        }
    }
}

impl CustomerStatus {
    pub const fn kind(self) -> StatusKind {
        match self {
            CustomerStatus::Active => StatusKind::Active,
            CustomerStatus::Dnc => StatusKind::Dnc,
            CustomerStatus::Timeout { .. } => StatusKind::Timeout,
            CustomerStatus::Paid => StatusKind::Paid,
            CustomerStatus::OpenOrder => StatusKind::OpenOrder,
            CustomerStatus::Cancelled => StatusKind::Cancelled,
        }
    }

    pub const fn label(self) -> &'static str {
        self.kind().label()
    }

    pub const fn until(self) -> Option<i64> {
        match self {
            CustomerStatus::Timeout { until } => Some(until),
            _ => None,
        }
    }

    pub fn detail(self) -> Option<String> {
        self.until()
            .map(|until| format!("until {}", format_timestamp_date(until)))
    }

    /// Rebuilds a status from its stored kind and timeout end.
    pub fn from_parts(kind: StatusKind, until: Option<i64>) -> Option<Self> {
        Some(match kind {
            StatusKind::Active => CustomerStatus::Active,
            StatusKind::Dnc => CustomerStatus::Dnc,
            StatusKind::Timeout => CustomerStatus::Timeout { until: until? },
            StatusKind::Paid => CustomerStatus::Paid,
            StatusKind::OpenOrder => CustomerStatus::OpenOrder,
            StatusKind::Cancelled => CustomerStatus::Cancelled,
        })
    }
}

/// History in effective-time order. Entries sharing a timestamp keep their
/// insertion order.
pub fn chronological(history: &[DispositionEvent]) -> Vec<&DispositionEvent> {
    let mut indexed: Vec<(usize, &DispositionEvent)> = history.iter().enumerate().collect();
    indexed.sort_by_key(|(index, event)| (event.disposition_time, *index));
    indexed.into_iter().map(|(_, event)| event).collect()
}

/// Derives the lifecycle status. First matching rule wins: DNC, then a
/// running timeout on the latest entry, then the sale cycle, then Active.
pub fn derive_status(
    history: &[DispositionEvent],
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> CustomerStatus {
    let ordered = chronological(history);
    let Some(latest) = ordered.last().copied() else {
        return CustomerStatus::Active;
    };

    if is_dnc(&ordered, catalog) {
        return CustomerStatus::Dnc;
    }

    if let Some(until) = running_timeout(latest, &ordered, catalog, now_utc) {
        return CustomerStatus::Timeout { until };
    }

    if let Some(status) = sale_cycle(&ordered, catalog) {
        return status;
    }

    CustomerStatus::Active
}

fn disposition_of<'a>(
    event: &DispositionEvent,
    catalog: &'a DispositionCatalog,
) -> Option<&'a Disposition> {
    catalog.get(&event.disposition_id)
}

fn carries(event: &DispositionEvent, catalog: &DispositionCatalog, modifier: Modifier) -> bool {
    disposition_of(event, catalog).is_some_and(|disposition| disposition.has(modifier))
}

fn usage_count(ordered: &[&DispositionEvent], id: DispositionId) -> usize {
    ordered
        .iter()
        .filter(|event| event.disposition_id == id)
        .count()
}

fn is_dnc(ordered: &[&DispositionEvent], catalog: &DispositionCatalog) -> bool {
    if ordered
        .iter()
        .any(|event| carries(event, catalog, Modifier::Dnc))
    {
        return true;
    }

    let mut checked: Vec<DispositionId> = Vec::new();
    for event in ordered {
        if checked.contains(&event.disposition_id) {
            continue;
        }
        checked.push(event.disposition_id);
        let Some(rule) = disposition_of(event, catalog).and_then(Disposition::exclude_rule) else {
            continue;
        };
        if rule.action == crate::domain::ExcludeAction::Dnc
            && rule.is_reached(usage_count(ordered, event.disposition_id))
        {
            return true;
        }
    }
    false
}

fn running_timeout(
    latest: &DispositionEvent,
    ordered: &[&DispositionEvent],
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> Option<i64> {
    let disposition = disposition_of(latest, catalog)?;

    if let Some(days) = disposition.timeout_days() {
        let until = add_days(latest.disposition_time, days);
        if now_utc < until {
            return Some(until);
        }
    }

    let rule = disposition.exclude_rule()?;
    if rule.action != crate::domain::ExcludeAction::TimeOut
        || !rule.is_reached(usage_count(ordered, latest.disposition_id))
    {
        return None;
    }
    let until = add_days(latest.disposition_time, rule.action_timeout_days?);
    (now_utc < until).then_some(until)
}

fn sale_cycle(
    ordered: &[&DispositionEvent],
    catalog: &DispositionCatalog,
) -> Option<CustomerStatus> {
    let sale_index = ordered
        .iter()
        .rposition(|event| carries(event, catalog, Modifier::Sale))?;

    if carries(ordered[sale_index], catalog, Modifier::Payment) {
        return Some(CustomerStatus::Paid);
    }

    for event in &ordered[sale_index + 1..] {
        if carries(event, catalog, Modifier::Payment) {
            return Some(CustomerStatus::Paid);
        }
        if carries(event, catalog, Modifier::Cancel) {
            return Some(CustomerStatus::Cancelled);
        }
    }

    Some(CustomerStatus::OpenOrder)
}
