use crate::domain::ids::DispositionId;
use serde::{Deserialize, Serialize};

/// One entry of a customer's call history. `disposition_time` is the
/// effective time of the call, which may predate the moment it was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionEvent {
    pub disposition_id: DispositionId,
    pub disposition_time: i64,
    pub agent_number: String,
    pub amount_cents: Option<i64>,
    pub tickets_ad: Option<String>,
    pub notes: String,
    pub program: Option<String>,
    pub lead_list: Option<String>,
}

impl DispositionEvent {
    pub fn new(disposition_id: DispositionId, disposition_time: i64, agent_number: &str) -> Self {
        Self {
            disposition_id,
            disposition_time,
            agent_number: agent_number.to_string(),
            amount_cents: None,
            tickets_ad: None,
            notes: String::new(),
            program: None,
            lead_list: None,
        }
    }

    /// True when `other` differs in a field that warrants a new history entry.
    pub fn differs_meaningfully(&self, other: &DispositionEvent) -> bool {
        self.disposition_id != other.disposition_id
            || self.disposition_time != other.disposition_time
            || self.amount_cents != other.amount_cents
            || self.notes != other.notes
    }
}
