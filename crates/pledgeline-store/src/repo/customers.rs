use crate::error::{Result, StoreError};
use crate::repo::dispositions::load_catalog;
use crate::repo::in_transaction;
use pledgeline_core::domain::{
    Customer, CustomerContact, CustomerId, CustomerSource, DispositionCatalog, DispositionEvent,
    DispositionId,
};
use pledgeline_core::rules::{
    apply_manual_edit, merge_import, merge_paids, recalculate_all, refresh_customer,
    CustomerStatus, ImportRecord, MergeReport, PaidsInput, PaidsReport, StatusKind,
};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;
use std::str::FromStr;

const CUSTOMER_COLUMNS: &str = "id, phone, first_name, last_name, email, address, city, state, zip, source,
     current_disposition_id, current_disposition_time, current_agent_number, current_amount_cents,
     current_tickets_ad, current_notes, current_program, current_lead_list,
     status, status_until, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "disposition_id, disposition_time, agent_number, amount_cents, tickets_ad, notes, program, lead_list";

#[derive(Debug, Clone)]
pub struct CustomerNew {
    pub contact: CustomerContact,
    pub disposition: Option<DispositionEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<Option<String>>,
    pub address: Option<Option<String>>,
    pub city: Option<Option<String>>,
    pub state: Option<Option<String>>,
    pub zip: Option<Option<String>>,
    pub source: Option<CustomerSource>,
}

/// Edit-form payload: no id means a new customer.
#[derive(Debug, Clone)]
pub struct CustomerEdit {
    pub id: Option<CustomerId>,
    pub contact: CustomerContact,
    pub disposition: Option<DispositionEvent>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub status: Option<StatusKind>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaidsImport {
    pub phones: Vec<String>,
    pub paid_at: i64,
    pub disposition_name: String,
    pub default_agent: String,
}

pub struct CustomersRepo<'a> {
    conn: &'a Connection,
}

impl<'a> CustomersRepo<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn create(&self, now_utc: i64, input: CustomerNew) -> Result<Customer> {
        in_transaction(self.conn, |conn| create_inner(conn, now_utc, input))
    }

    pub fn get(&self, id: CustomerId) -> Result<Option<Customer>> {
        get_inner(self.conn, id)
    }

    pub fn list(&self, filter: &CustomerFilter) -> Result<Vec<Customer>> {
        let mut sql = format!("SELECT {CUSTOMER_COLUMNS} FROM customers WHERE 1 = 1");
        let mut values: Vec<String> = Vec::new();
        if let Some(status) = filter.status {
            values.push(status.as_str().to_string());
            sql.push_str(&format!(" AND status = ?{}", values.len()));
        }
        if let Some(phone) = filter.phone.as_deref() {
            values.push(phone.trim().to_string());
            sql.push_str(&format!(" AND phone = ?{}", values.len()));
        }
        sql.push_str(
            " ORDER BY last_name COLLATE NOCASE ASC, first_name COLLATE NOCASE ASC, created_at ASC, id ASC;",
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
        let mut customers = Vec::new();
        while let Some(row) = rows.next()? {
            customers.push(customer_from_row(row)?);
        }
        attach_history(self.conn, &mut customers)?;
        Ok(customers)
    }

    pub fn list_all(&self) -> Result<Vec<Customer>> {
        self.list(&CustomerFilter::default())
    }

    pub fn find_by_phone(&self, phone: &str) -> Result<Vec<Customer>> {
        self.list(&CustomerFilter {
            phone: Some(phone.to_string()),
            ..Default::default()
        })
    }

    pub fn update(&self, now_utc: i64, id: CustomerId, update: CustomerUpdate) -> Result<Customer> {
        in_transaction(self.conn, |conn| update_inner(conn, now_utc, id, update))
    }

    /// Records a hand-entered disposition. Returns the customer and whether a
    /// new history entry was appended.
    pub fn update_disposition(
        &self,
        now_utc: i64,
        id: CustomerId,
        event: DispositionEvent,
    ) -> Result<(Customer, bool)> {
        in_transaction(self.conn, |conn| {
            update_disposition_inner(conn, now_utc, id, event)
        })
    }

    /// Entry point for the edit form: creates or updates contact fields, then
    /// reconciles the disposition, all in one transaction.
    pub fn add_or_update(&self, now_utc: i64, edit: CustomerEdit) -> Result<Customer> {
        in_transaction(self.conn, |conn| match edit.id {
            None => create_inner(
                conn,
                now_utc,
                CustomerNew {
                    contact: edit.contact,
                    disposition: edit.disposition,
                },
            ),
            Some(id) => {
                let mut customer =
                    get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
                edit.contact.apply_to(&mut customer);
                customer.validate()?;
                customer.updated_at = now_utc;
                let catalog = load_catalog(conn)?;
                match edit.disposition {
                    Some(event) => {
                        if apply_manual_edit(&mut customer, event, &catalog, now_utc) {
                            write_history(conn, &customer)?;
                        }
                    }
                    None => refresh_customer(&mut customer, &catalog, now_utc),
                }
                write_customer_row(conn, &customer)?;
                Ok(customer)
            }
        })
    }

    pub fn delete(&self, id: CustomerId) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM customers WHERE id = ?1;", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    /// Merges import records by phone and persists every touched customer.
    pub fn import_batch(&self, now_utc: i64, records: Vec<ImportRecord>) -> Result<MergeReport> {
        in_transaction(self.conn, |conn| {
            let catalog = load_catalog(conn)?;
            let mut customers = load_all(conn)?;
            let report = merge_import(&mut customers, records, &catalog, now_utc);
            persist_touched(conn, &customers, &report.touched)?;
            Ok(report)
        })
    }

    pub fn import_paids(&self, now_utc: i64, input: &PaidsImport) -> Result<PaidsReport> {
        in_transaction(self.conn, |conn| {
            let catalog = load_catalog(conn)?;
            let payment = catalog
                .find_by_name(&input.disposition_name)
                .ok_or_else(|| {
                    StoreError::NotFound(format!("disposition {}", input.disposition_name))
                })?
                .id;
            let mut customers = load_all(conn)?;
            let report = merge_paids(
                &mut customers,
                PaidsInput {
                    phones: &input.phones,
                    paid_at: input.paid_at,
                    payment_disposition: payment,
                    default_agent: &input.default_agent,
                },
                &catalog,
                now_utc,
            );
            persist_touched(conn, &customers, &report.touched)?;
            Ok(report)
        })
    }

    /// Re-derives every stored status; returns how many changed.
    pub fn recalculate_all(&self, now_utc: i64) -> Result<usize> {
        in_transaction(self.conn, |conn| {
            let catalog = load_catalog(conn)?;
            recalculate_inner(conn, &catalog, now_utc)
        })
    }

    pub fn status_counts(&self) -> Result<Vec<(StatusKind, usize)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT status, COUNT(*) FROM customers GROUP BY status;")?;
        let mut rows = stmt.query([])?;
        let mut counts: HashMap<StatusKind, usize> = HashMap::new();
        while let Some(row) = rows.next()? {
            let raw: String = row.get(0)?;
            let count: i64 = row.get(1)?;
            let kind = StatusKind::parse(&raw).ok_or(StoreError::InvalidStatus(raw))?;
            counts.insert(kind, count.max(0) as usize);
        }
        Ok(StatusKind::all()
            .iter()
            .map(|kind| (*kind, counts.get(kind).copied().unwrap_or(0)))
            .collect())
    }
}

fn create_inner(conn: &Connection, now_utc: i64, input: CustomerNew) -> Result<Customer> {
    let mut customer = Customer::from_contact(now_utc, &input.contact);
    customer.validate()?;
    let catalog = load_catalog(conn)?;
    match input.disposition {
        Some(event) => {
            apply_manual_edit(&mut customer, event, &catalog, now_utc);
        }
        None => refresh_customer(&mut customer, &catalog, now_utc),
    }
    write_customer_row(conn, &customer)?;
    write_history(conn, &customer)?;
    Ok(customer)
}

fn update_inner(
    conn: &Connection,
    now_utc: i64,
    id: CustomerId,
    update: CustomerUpdate,
) -> Result<Customer> {
    let mut customer = get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    if let Some(value) = update.phone {
        customer.phone = value.trim().to_string();
    }
    if let Some(value) = update.first_name {
        customer.first_name = value;
    }
    if let Some(value) = update.last_name {
        customer.last_name = value;
    }
    if let Some(value) = update.email {
        customer.email = value;
    }
    if let Some(value) = update.address {
        customer.address = value;
    }
    if let Some(value) = update.city {
        customer.city = value;
    }
    if let Some(value) = update.state {
        customer.state = value;
    }
    if let Some(value) = update.zip {
        customer.zip = value;
    }
    if let Some(value) = update.source {
        customer.source = value;
    }

    customer.updated_at = now_utc;
    customer.validate()?;
    write_customer_row(conn, &customer)?;
    Ok(customer)
}

fn update_disposition_inner(
    conn: &Connection,
    now_utc: i64,
    id: CustomerId,
    event: DispositionEvent,
) -> Result<(Customer, bool)> {
    let mut customer = get_inner(conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    let catalog = load_catalog(conn)?;
    let appended = apply_manual_edit(&mut customer, event, &catalog, now_utc);
    if appended {
        write_history(conn, &customer)?;
    }
    write_customer_row(conn, &customer)?;
    Ok((customer, appended))
}

pub(crate) fn recalculate_inner(
    conn: &Connection,
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> Result<usize> {
    let mut customers = load_all(conn)?;
    let before: Vec<CustomerStatus> = customers.iter().map(|customer| customer.status).collect();
    let changed = recalculate_all(&mut customers, catalog, now_utc);
    for (customer, previous) in customers.iter().zip(before) {
        if customer.status != previous {
            write_customer_row(conn, customer)?;
        }
    }
    Ok(changed)
}

fn persist_touched(conn: &Connection, customers: &[Customer], touched: &[CustomerId]) -> Result<()> {
    for customer in customers.iter().filter(|c| touched.contains(&c.id)) {
        write_customer_row(conn, customer)?;
        write_history(conn, customer)?;
    }
    Ok(())
}

fn get_inner(conn: &Connection, id: CustomerId) -> Result<Option<Customer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    let Some(row) = rows.next()? else {
        return Ok(None);
    };
    let mut customer = customer_from_row(row)?;
    customer.history = load_history(conn, id)?;
    Ok(Some(customer))
}

pub(crate) fn load_all(conn: &Connection) -> Result<Vec<Customer>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY created_at ASC, id ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut customers = Vec::new();
    while let Some(row) = rows.next()? {
        customers.push(customer_from_row(row)?);
    }
    attach_history(conn, &mut customers)?;
    Ok(customers)
}

fn load_history(conn: &Connection, id: CustomerId) -> Result<Vec<DispositionEvent>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {HISTORY_COLUMNS} FROM disposition_history WHERE customer_id = ?1 ORDER BY seq ASC;"
    ))?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut history = Vec::new();
    while let Some(row) = rows.next()? {
        history.push(event_from_row(row, 0)?);
    }
    Ok(history)
}

fn attach_history(conn: &Connection, customers: &mut [Customer]) -> Result<()> {
    if customers.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare(&format!(
        "SELECT customer_id, {HISTORY_COLUMNS} FROM disposition_history ORDER BY seq ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut by_customer: HashMap<CustomerId, Vec<DispositionEvent>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let id = parse_customer_id(row.get(0)?)?;
        by_customer
            .entry(id)
            .or_default()
            .push(event_from_row(row, 1)?);
    }
    for customer in customers.iter_mut() {
        customer.history = by_customer.remove(&customer.id).unwrap_or_default();
    }
    Ok(())
}

/// Upserts the customer row including snapshot and status columns.
pub(crate) fn write_customer_row(conn: &Connection, customer: &Customer) -> Result<()> {
    let current = customer.current.as_ref();
    conn.execute(
        "INSERT INTO customers (id, phone, first_name, last_name, email, address, city, state, zip, source,
            current_disposition_id, current_disposition_time, current_agent_number, current_amount_cents,
            current_tickets_ad, current_notes, current_program, current_lead_list,
            status, status_until, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)
         ON CONFLICT(id) DO UPDATE SET
            phone = excluded.phone,
            first_name = excluded.first_name,
            last_name = excluded.last_name,
            email = excluded.email,
            address = excluded.address,
            city = excluded.city,
            state = excluded.state,
            zip = excluded.zip,
            source = excluded.source,
            current_disposition_id = excluded.current_disposition_id,
            current_disposition_time = excluded.current_disposition_time,
            current_agent_number = excluded.current_agent_number,
            current_amount_cents = excluded.current_amount_cents,
            current_tickets_ad = excluded.current_tickets_ad,
            current_notes = excluded.current_notes,
            current_program = excluded.current_program,
            current_lead_list = excluded.current_lead_list,
            status = excluded.status,
            status_until = excluded.status_until,
            updated_at = excluded.updated_at;",
        params![
            customer.id.to_string(),
            customer.phone,
            customer.first_name,
            customer.last_name,
            customer.email,
            customer.address,
            customer.city,
            customer.state,
            customer.zip,
            customer.source.as_str(),
            current.map(|c| c.disposition_id.to_string()),
            current.map(|c| c.disposition_time),
            current.map(|c| c.agent_number.clone()),
            current.and_then(|c| c.amount_cents),
            current.and_then(|c| c.tickets_ad.clone()),
            current.map(|c| c.notes.clone()),
            current.and_then(|c| c.program.clone()),
            current.and_then(|c| c.lead_list.clone()),
            customer.status.kind().as_str(),
            customer.status.until(),
            customer.created_at,
            customer.updated_at,
        ],
    )?;
    Ok(())
}

/// Rewrites the history rows in their in-memory order, which keeps `seq`
/// monotonic with insertion order.
fn write_history(conn: &Connection, customer: &Customer) -> Result<()> {
    let id = customer.id.to_string();
    conn.execute(
        "DELETE FROM disposition_history WHERE customer_id = ?1;",
        [&id],
    )?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO disposition_history (customer_id, {HISTORY_COLUMNS})
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);"
    ))?;
    for event in &customer.history {
        stmt.execute(params![
            id,
            event.disposition_id.to_string(),
            event.disposition_time,
            event.agent_number,
            event.amount_cents,
            event.tickets_ad,
            event.notes,
            event.program,
            event.lead_list,
        ])?;
    }
    Ok(())
}

fn parse_customer_id(raw: String) -> Result<CustomerId> {
    CustomerId::from_str(&raw).map_err(|_| StoreError::InvalidId(raw))
}

fn parse_disposition_id(raw: String) -> Result<DispositionId> {
    DispositionId::from_str(&raw).map_err(|_| StoreError::InvalidId(raw))
}

fn event_from_row(row: &Row<'_>, offset: usize) -> Result<DispositionEvent> {
    Ok(DispositionEvent {
        disposition_id: parse_disposition_id(row.get(offset)?)?,
        disposition_time: row.get(offset + 1)?,
        agent_number: row.get(offset + 2)?,
        amount_cents: row.get(offset + 3)?,
        tickets_ad: row.get(offset + 4)?,
        notes: row.get(offset + 5)?,
        program: row.get(offset + 6)?,
        lead_list: row.get(offset + 7)?,
    })
}

fn customer_from_row(row: &Row<'_>) -> Result<Customer> {
    let id = parse_customer_id(row.get(0)?)?;
    let source_raw: String = row.get(9)?;
    let current_id: Option<String> = row.get(10)?;
    let current = match current_id {
        Some(raw) => Some(DispositionEvent {
            disposition_id: parse_disposition_id(raw)?,
            disposition_time: row.get::<_, Option<i64>>(11)?.unwrap_or_default(),
            agent_number: row.get::<_, Option<String>>(12)?.unwrap_or_default(),
            amount_cents: row.get(13)?,
            tickets_ad: row.get(14)?,
            notes: row.get::<_, Option<String>>(15)?.unwrap_or_default(),
            program: row.get(16)?,
            lead_list: row.get(17)?,
        }),
        None => None,
    };
    let status_raw: String = row.get(18)?;
    let status_until: Option<i64> = row.get(19)?;
    let status = StatusKind::parse(&status_raw)
        .and_then(|kind| CustomerStatus::from_parts(kind, status_until))
        .ok_or_else(|| StoreError::InvalidStatus(status_raw.clone()))?;

    Ok(Customer {
        id,
        phone: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        email: row.get(4)?,
        address: row.get(5)?,
        city: row.get(6)?,
        state: row.get(7)?,
        zip: row.get(8)?,
        source: CustomerSource::parse(&source_raw)?,
        current,
        history: Vec::new(),
        status,
        created_at: row.get(20)?,
        updated_at: row.get(21)?,
    })
}
