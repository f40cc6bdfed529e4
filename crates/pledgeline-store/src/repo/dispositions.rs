use crate::error::{Result, StoreError};
use crate::repo::customers::{load_all, recalculate_inner, write_customer_row};
use crate::repo::in_transaction;
use pledgeline_core::domain::{
    Disposition, DispositionCatalog, DispositionId, ExcludeAction, ModifierSet,
};
use pledgeline_core::rules::{reassign_deleted_disposition, recalculate_all};
use pledgeline_core::CoreError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

const DISPOSITION_COLUMNS: &str = "id, name, modifiers, timeout_days, exclude_after_attempts,
     exclude_action, exclude_action_timeout_days, is_default";

#[derive(Debug, Clone)]
pub struct DispositionNew {
    pub name: String,
    pub modifiers: ModifierSet,
    pub timeout_days: Option<i32>,
    pub exclude_after_attempts: Option<i32>,
    pub exclude_action: ExcludeAction,
    pub exclude_action_timeout_days: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct DispositionUpdate {
    pub name: Option<String>,
    pub modifiers: Option<ModifierSet>,
    pub timeout_days: Option<Option<i32>>,
    pub exclude_after_attempts: Option<Option<i32>>,
    pub exclude_action: Option<ExcludeAction>,
    pub exclude_action_timeout_days: Option<Option<i32>>,
}

/// Outcome of a catalog write. Every catalog write re-derives all statuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogChange {
    pub disposition: Disposition,
    pub recalculated: usize,
    pub reassigned: usize,
}

pub struct DispositionsRepo<'a> {
    conn: &'a Connection,
}

impl<'a> DispositionsRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn list(&self) -> Result<Vec<Disposition>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DISPOSITION_COLUMNS} FROM dispositions
             ORDER BY is_default DESC, name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut dispositions = Vec::new();
        while let Some(row) = rows.next()? {
            dispositions.push(disposition_from_row(row)?);
        }
        Ok(dispositions)
    }

    pub fn catalog(&self) -> Result<DispositionCatalog> {
        load_catalog(self.conn)
    }

    pub fn get(&self, id: DispositionId) -> Result<Option<Disposition>> {
        get_inner(self.conn, id)
    }

    pub fn find_by_name(&self, name: &str) -> Result<Option<Disposition>> {
        Ok(load_catalog(self.conn)?.find_by_name(name).cloned())
    }

    pub fn create(&self, now_utc: i64, input: DispositionNew) -> Result<CatalogChange> {
        in_transaction(self.conn, |conn| {
            let disposition = Disposition {
                id: DispositionId::new(),
                name: input.name,
                modifiers: input.modifiers,
                timeout_days: input.timeout_days,
                exclude_after_attempts: input.exclude_after_attempts,
                exclude_action: input.exclude_action,
                exclude_action_timeout_days: input.exclude_action_timeout_days,
                is_default: false,
            }
            .normalized();
            disposition.validate()?;
            ensure_unique_name(conn, &disposition)?;

            conn.execute(
                "INSERT INTO dispositions (id, name, modifiers, timeout_days, exclude_after_attempts,
                    exclude_action, exclude_action_timeout_days, is_default, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8);",
                params![
                    disposition.id.to_string(),
                    disposition.name,
                    disposition.modifiers.to_labels(),
                    disposition.timeout_days,
                    disposition.exclude_after_attempts,
                    disposition.exclude_action.as_str(),
                    disposition.exclude_action_timeout_days,
                    now_utc,
                ],
            )?;

            let catalog = load_catalog(conn)?;
            let recalculated = recalculate_inner(conn, &catalog, now_utc)?;
            Ok(CatalogChange {
                disposition,
                recalculated,
                reassigned: 0,
            })
        })
    }

    pub fn update(
        &self,
        now_utc: i64,
        id: DispositionId,
        update: DispositionUpdate,
    ) -> Result<CatalogChange> {
        in_transaction(self.conn, |conn| {
            let mut disposition =
                get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

            if let Some(name) = update.name {
                if disposition.is_default && name.trim() != disposition.name {
                    return Err(StoreError::DefaultDispositionLocked);
                }
                disposition.name = name;
            }
            if let Some(modifiers) = update.modifiers {
                disposition.modifiers = modifiers;
            }
            if let Some(days) = update.timeout_days {
                disposition.timeout_days = days;
            }
            if let Some(attempts) = update.exclude_after_attempts {
                disposition.exclude_after_attempts = attempts;
            }
            if let Some(action) = update.exclude_action {
                disposition.exclude_action = action;
            }
            if let Some(days) = update.exclude_action_timeout_days {
                disposition.exclude_action_timeout_days = days;
            }

            let disposition = disposition.normalized();
            disposition.validate()?;
            ensure_unique_name(conn, &disposition)?;

            conn.execute(
                "UPDATE dispositions SET name = ?2, modifiers = ?3, timeout_days = ?4,
                    exclude_after_attempts = ?5, exclude_action = ?6,
                    exclude_action_timeout_days = ?7, updated_at = ?8
                 WHERE id = ?1;",
                params![
                    disposition.id.to_string(),
                    disposition.name,
                    disposition.modifiers.to_labels(),
                    disposition.timeout_days,
                    disposition.exclude_after_attempts,
                    disposition.exclude_action.as_str(),
                    disposition.exclude_action_timeout_days,
                    now_utc,
                ],
            )?;

            let catalog = load_catalog(conn)?;
            let recalculated = recalculate_inner(conn, &catalog, now_utc)?;
            Ok(CatalogChange {
                disposition,
                recalculated,
                reassigned: 0,
            })
        })
    }

    /// Removes a disposition. Snapshots pointing at it move to the default;
    /// history rows keep the old id.
    pub fn delete(&self, now_utc: i64, id: DispositionId) -> Result<CatalogChange> {
        in_transaction(self.conn, |conn| {
            let disposition =
                get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
            if disposition.is_default {
                return Err(StoreError::DefaultDispositionLocked);
            }

            conn.execute("DELETE FROM dispositions WHERE id = ?1;", [id.to_string()])?;

            let catalog = load_catalog(conn)?;
            let replacement = catalog
                .default_disposition()
                .ok_or(StoreError::MissingDefaultDisposition)?
                .id;

            let mut customers = load_all(conn)?;
            let reassigned = reassign_deleted_disposition(&mut customers, id, replacement);
            let before: Vec<_> = customers.iter().map(|customer| customer.status).collect();
            let recalculated = recalculate_all(&mut customers, &catalog, now_utc);
            for (customer, previous) in customers.iter().zip(before) {
                let moved = customer
                    .current
                    .as_ref()
                    .is_some_and(|current| current.disposition_id == replacement);
                if moved || customer.status != previous {
                    write_customer_row(conn, customer)?;
                }
            }

            Ok(CatalogChange {
                disposition,
                recalculated,
                reassigned,
            })
        })
    }
}

pub(crate) fn load_catalog(conn: &Connection) -> Result<DispositionCatalog> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DISPOSITION_COLUMNS} FROM dispositions;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut catalog = DispositionCatalog::new();
    while let Some(row) = rows.next()? {
        catalog.insert(disposition_from_row(row)?);
    }
    if catalog.default_disposition().is_none() {
        return Err(StoreError::MissingDefaultDisposition);
    }
    Ok(catalog)
}

fn get_inner(conn: &Connection, id: DispositionId) -> Result<Option<Disposition>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DISPOSITION_COLUMNS} FROM dispositions WHERE id = ?1;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(disposition_from_row(row)?)),
        None => Ok(None),
    }
}

fn ensure_unique_name(conn: &Connection, disposition: &Disposition) -> Result<()> {
    let clash: Option<String> = conn
        .query_row(
            "SELECT id FROM dispositions WHERE name = ?1 AND id != ?2 LIMIT 1;",
            params![disposition.name, disposition.id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(StoreError::DuplicateDisposition(disposition.name.clone()));
    }
    Ok(())
}

fn disposition_from_row(row: &Row<'_>) -> Result<Disposition> {
    let id_raw: String = row.get(0)?;
    let id = DispositionId::from_str(&id_raw).map_err(|_| StoreError::InvalidId(id_raw))?;
    let modifiers_raw: String = row.get(2)?;
    let action_raw: String = row.get(5)?;
    let exclude_action = ExcludeAction::parse(&action_raw)
        .ok_or_else(|| CoreError::InvalidExcludeAction(action_raw.clone()))?;
    let is_default: i64 = row.get(7)?;

    Ok(Disposition {
        id,
        name: row.get(1)?,
        modifiers: ModifierSet::parse_labels(&modifiers_raw)?,
        timeout_days: row.get(3)?,
        exclude_after_attempts: row.get(4)?,
        exclude_action,
        exclude_action_timeout_days: row.get(6)?,
        is_default: is_default != 0,
    })
}
