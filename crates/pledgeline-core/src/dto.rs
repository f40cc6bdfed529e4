use crate::domain::{
    format_amount_cents, Customer, CustomerId, Disposition, DispositionCatalog, DispositionEvent,
    DispositionId,
};
use serde::{Deserialize, Serialize};

pub const UNKNOWN_DISPOSITION_LABEL: &str = "Unknown disposition";

fn disposition_name(catalog: &DispositionCatalog, id: &DispositionId) -> String {
    catalog
        .get(id)
        .map(|disposition| disposition.name.clone())
        .unwrap_or_else(|| UNKNOWN_DISPOSITION_LABEL.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionDto {
    pub id: DispositionId,
    pub name: String,
    pub modifiers: Vec<String>,
    pub timeout_days: Option<i32>,
    pub exclude_after_attempts: Option<i32>,
    pub exclude_action: String,
    pub exclude_action_timeout_days: Option<i32>,
    pub is_default: bool,
}

impl From<&Disposition> for DispositionDto {
    fn from(value: &Disposition) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            modifiers: value
                .modifiers
                .iter()
                .map(|modifier| modifier.as_str().to_string())
                .collect(),
            timeout_days: value.timeout_days,
            exclude_after_attempts: value.exclude_after_attempts,
            exclude_action: value.exclude_action.as_str().to_string(),
            exclude_action_timeout_days: value.exclude_action_timeout_days,
            is_default: value.is_default,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispositionEventDto {
    pub disposition_id: DispositionId,
    pub disposition: String,
    pub disposition_time: i64,
    pub agent_number: String,
    pub amount: Option<String>,
    pub tickets_ad: Option<String>,
    pub notes: String,
    pub program: Option<String>,
    pub lead_list: Option<String>,
}

impl DispositionEventDto {
    pub fn new(event: &DispositionEvent, catalog: &DispositionCatalog) -> Self {
        Self {
            disposition_id: event.disposition_id,
            disposition: disposition_name(catalog, &event.disposition_id),
            disposition_time: event.disposition_time,
            agent_number: event.agent_number.clone(),
            amount: event.amount_cents.map(format_amount_cents),
            tickets_ad: event.tickets_ad.clone(),
            notes: event.notes.clone(),
            program: event.program.clone(),
            lead_list: event.lead_list.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerListItemDto {
    pub id: CustomerId,
    pub phone: String,
    pub display_name: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub disposition: Option<String>,
    pub disposition_time: Option<i64>,
}

impl CustomerListItemDto {
    pub fn new(customer: &Customer, catalog: &DispositionCatalog) -> Self {
        Self {
            id: customer.id,
            phone: customer.phone.clone(),
            display_name: customer.display_name(),
            status: customer.status.label().to_string(),
            status_detail: customer.status.detail(),
            disposition: customer
                .current
                .as_ref()
                .map(|current| disposition_name(catalog, &current.disposition_id)),
            disposition_time: customer
                .current
                .as_ref()
                .map(|current| current.disposition_time),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetailDto {
    pub id: CustomerId,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub source: String,
    pub status: String,
    pub status_detail: Option<String>,
    pub current: Option<DispositionEventDto>,
    pub history: Vec<DispositionEventDto>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl CustomerDetailDto {
    pub fn new(customer: &Customer, catalog: &DispositionCatalog) -> Self {
        Self {
            id: customer.id,
            phone: customer.phone.clone(),
            first_name: customer.first_name.clone(),
            last_name: customer.last_name.clone(),
            email: customer.email.clone(),
            address: customer.address.clone(),
            city: customer.city.clone(),
            state: customer.state.clone(),
            zip: customer.zip.clone(),
            source: customer.source.as_str().to_string(),
            status: customer.status.label().to_string(),
            status_detail: customer.status.detail(),
            current: customer
                .current
                .as_ref()
                .map(|current| DispositionEventDto::new(current, catalog)),
            history: crate::rules::chronological(&customer.history)
                .into_iter()
                .map(|event| DispositionEventDto::new(event, catalog))
                .collect(),
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCountDto {
    pub status: String,
    pub count: usize,
}
