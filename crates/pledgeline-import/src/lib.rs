pub mod csv_export;
pub mod csv_import;
pub mod error;
pub mod paids;

pub use error::{ImportError, Result};
