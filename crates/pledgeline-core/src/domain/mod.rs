pub mod amount;
pub mod catalog;
pub mod customer;
pub mod disposition;
pub mod event;
pub mod ids;
pub mod modifier;
pub mod phone;

pub use amount::{format_amount_cents, parse_amount_cents};
pub use catalog::DispositionCatalog;
pub use customer::{Customer, CustomerContact, CustomerSource};
pub use disposition::{Disposition, ExcludeAction, ExcludeRule, DEFAULT_DISPOSITION_NAME};
pub use event::DispositionEvent;
pub use ids::{CustomerId, DispositionId};
pub use modifier::{Modifier, ModifierSet};
pub use phone::normalize_phone_for_match;
