pub mod customers;
pub mod dispositions;

use crate::error::Result;
use rusqlite::Connection;

pub use customers::{
    CustomerEdit, CustomerFilter, CustomerNew, CustomerUpdate, CustomersRepo, PaidsImport,
};
pub use dispositions::{CatalogChange, DispositionNew, DispositionUpdate, DispositionsRepo};

/// Runs `f` inside a transaction unless the caller already opened one.
pub(crate) fn in_transaction<T>(
    conn: &Connection,
    f: impl FnOnce(&Connection) -> Result<T>,
) -> Result<T> {
    if conn.is_autocommit() {
        let tx = conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    } else {
        f(conn)
    }
}
