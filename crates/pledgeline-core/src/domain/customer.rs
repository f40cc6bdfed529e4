use crate::domain::event::DispositionEvent;
use crate::domain::ids::CustomerId;
use crate::error::CoreError;
use crate::rules::status::CustomerStatus;
use serde::{Deserialize, Serialize};

/// Whether the customer has given before ("PC", previous contributor) or
/// came from a cold list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSource {
    Pc,
    #[default]
    Cold,
}

impl CustomerSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            CustomerSource::Pc => "pc",
            CustomerSource::Cold => "cold",
        }
    }

    pub fn parse(value: &str) -> Result<Self, CoreError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pc" | "previous contributor" => Ok(CustomerSource::Pc),
            "cold" | "" => Ok(CustomerSource::Cold),
            other => Err(CoreError::InvalidCustomerSource(other.to_string())),
        }
    }
}

/// Biographical fields carried by edits and import records.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CustomerContact {
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub source: CustomerSource,
}

impl CustomerContact {
    /// Overwrites the customer's contact fields; the incoming values are
    /// treated as more current.
    pub fn apply_to(&self, customer: &mut Customer) {
        customer.phone = self.phone.trim().to_string();
        customer.first_name = self.first_name.trim().to_string();
        customer.last_name = self.last_name.trim().to_string();
        customer.email = self.email.clone();
        customer.address = self.address.clone();
        customer.city = self.city.clone();
        customer.state = self.state.clone();
        customer.zip = self.zip.clone();
        customer.source = self.source;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub phone: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub source: CustomerSource,
    pub current: Option<DispositionEvent>,
    pub history: Vec<DispositionEvent>,
    pub status: CustomerStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Customer {
    pub fn new(now_utc: i64, phone: &str) -> Self {
        Self {
            id: CustomerId::new(),
            phone: phone.trim().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            source: CustomerSource::Cold,
            current: None,
            history: Vec::new(),
            status: CustomerStatus::Active,
            created_at: now_utc,
            updated_at: now_utc,
        }
    }

    pub fn from_contact(now_utc: i64, contact: &CustomerContact) -> Self {
        let mut customer = Self::new(now_utc, &contact.phone);
        contact.apply_to(&mut customer);
        customer
    }

    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        name.trim().to_string()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.phone.trim().is_empty() {
            return Err(CoreError::EmptyPhone);
        }
        Ok(())
    }
}
