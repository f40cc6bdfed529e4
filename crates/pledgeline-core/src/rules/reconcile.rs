use crate::domain::{
    normalize_phone_for_match, Customer, CustomerContact, CustomerId, DispositionCatalog,
    DispositionEvent, DispositionId, Modifier,
};
use crate::rules::status::{chronological, derive_status, CustomerStatus};
use serde::Serialize;
use std::collections::HashMap;

/// One externally sourced record: contact fields plus a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub contact: CustomerContact,
    pub event: DispositionEvent,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub touched: Vec<CustomerId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidsInput<'a> {
    pub phones: &'a [String],
    pub paid_at: i64,
    pub payment_disposition: DispositionId,
    pub default_agent: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PaidsReport {
    pub applied: usize,
    pub carried_from_sale: usize,
    pub duplicates: usize,
    pub not_found: Vec<String>,
    #[serde(skip)]
    pub touched: Vec<CustomerId>,
}

/// Sets the snapshot from the entry with the latest effective time. A
/// snapshot never points at a disposition missing from the catalog; those
/// fall back to the catalog default.
pub fn project_current(customer: &mut Customer, catalog: &DispositionCatalog) {
    let latest = chronological(&customer.history).last().map(|event| (*event).clone());
    customer.current = latest.map(|mut event| {
        if catalog.get(&event.disposition_id).is_none() {
            if let Some(default) = catalog.default_disposition() {
                event.disposition_id = default.id;
            }
        }
        event
    });
}

/// The single write path for derived fields: snapshot, then status.
pub fn refresh_customer(customer: &mut Customer, catalog: &DispositionCatalog, now_utc: i64) {
    project_current(customer, catalog);
    customer.status = derive_status(&customer.history, catalog, now_utc);
}

/// Records a disposition chosen by hand. An entry is appended only when it
/// differs from the last recorded one in disposition, time, amount or notes,
/// so re-saving unrelated fields adds no history. Returns whether it was
/// appended.
pub fn apply_manual_edit(
    customer: &mut Customer,
    edit: DispositionEvent,
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> bool {
    let appended = match customer.history.last() {
        Some(last) => last.differs_meaningfully(&edit),
        None => true,
    };
    if appended {
        customer.history.push(edit);
        customer.updated_at = now_utc;
    }
    refresh_customer(customer, catalog, now_utc);
    appended
}

/// Appends `event` unless an entry with the same effective time exists.
pub fn append_unless_duplicate(customer: &mut Customer, event: DispositionEvent) -> bool {
    if customer
        .history
        .iter()
        .any(|existing| existing.disposition_time == event.disposition_time)
    {
        return false;
    }
    customer.history.push(event);
    true
}

/// Appends `event` unless the same disposition is already recorded at the
/// same effective time.
pub fn append_unless_duplicate_event(customer: &mut Customer, event: DispositionEvent) -> bool {
    if customer.history.iter().any(|existing| {
        existing.disposition_id == event.disposition_id
            && existing.disposition_time == event.disposition_time
    }) {
        return false;
    }
    customer.history.push(event);
    true
}

/// Merges import records into `customers` by exact phone. Unknown phones
/// become new customers; known ones take the record's contact fields and
/// gain its event unless that timestamp is already recorded. Every touched
/// customer is refreshed once the whole batch is applied.
pub fn merge_import(
    customers: &mut Vec<Customer>,
    records: Vec<ImportRecord>,
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> MergeReport {
    let mut report = MergeReport::default();
    let mut by_phone: HashMap<String, usize> = HashMap::new();
    for (index, customer) in customers.iter().enumerate() {
        by_phone.entry(customer.phone.clone()).or_insert(index);
    }
    let existing_len = customers.len();
    let mut touched: Vec<usize> = Vec::new();

    for (row, record) in records.into_iter().enumerate() {
        let phone = record.contact.phone.trim().to_string();
        if phone.is_empty() {
            report.skipped += 1;
            report.warnings.push(format!("record {}: missing phone", row + 1));
            continue;
        }

        match by_phone.get(&phone).copied() {
            Some(index) => {
                let customer = &mut customers[index];
                record.contact.apply_to(customer);
                customer.updated_at = now_utc;
                if append_unless_duplicate(customer, record.event) {
                    report.appended += 1;
                } else {
                    report.duplicates += 1;
                }
                if index < existing_len && !touched.contains(&index) {
                    report.updated += 1;
                }
                if !touched.contains(&index) {
                    touched.push(index);
                }
            }
            None => {
                let mut customer = Customer::from_contact(now_utc, &record.contact);
                customer.history.push(record.event);
                customers.push(customer);
                let index = customers.len() - 1;
                by_phone.insert(phone, index);
                touched.push(index);
                report.created += 1;
                report.appended += 1;
            }
        }
    }

    for index in touched {
        let customer = &mut customers[index];
        refresh_customer(customer, catalog, now_utc);
        report.touched.push(customer.id);
    }
    report
}

/// Records payments for a list of phone numbers, matched with punctuation
/// stripped. A customer with an open order has the sale's agent, amount and
/// tickets carried onto the payment; anyone else is credited to the default
/// agent with no amount. Unmatched phones are reported, never created.
pub fn merge_paids(
    customers: &mut [Customer],
    input: PaidsInput<'_>,
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> PaidsReport {
    let mut report = PaidsReport::default();
    let mut by_phone: HashMap<String, usize> = HashMap::new();
    for (index, customer) in customers.iter().enumerate() {
        if let Some(key) = normalize_phone_for_match(&customer.phone) {
            by_phone.entry(key).or_insert(index);
        }
    }

    for raw in input.phones {
        let Some(index) = normalize_phone_for_match(raw).and_then(|key| by_phone.get(&key).copied())
        else {
            report.not_found.push(raw.trim().to_string());
            continue;
        };

        let customer = &mut customers[index];
        let mut payment =
            DispositionEvent::new(input.payment_disposition, input.paid_at, input.default_agent);
        if derive_status(&customer.history, catalog, now_utc) == CustomerStatus::OpenOrder {
            if let Some(sale) = latest_sale(&customer.history, catalog) {
                payment.agent_number = sale.agent_number.clone();
                payment.amount_cents = sale.amount_cents;
                payment.tickets_ad = sale.tickets_ad.clone();
                report.carried_from_sale += 1;
            }
        }

        if append_unless_duplicate_event(customer, payment) {
            report.applied += 1;
            customer.updated_at = now_utc;
        } else {
            report.duplicates += 1;
        }
        refresh_customer(customer, catalog, now_utc);
        if !report.touched.contains(&customer.id) {
            report.touched.push(customer.id);
        }
    }
    report
}

fn latest_sale<'a>(
    history: &'a [DispositionEvent],
    catalog: &DispositionCatalog,
) -> Option<&'a DispositionEvent> {
    chronological(history).into_iter().rev().find(|event| {
        catalog
            .get(&event.disposition_id)
            .is_some_and(|disposition| disposition.has(Modifier::Sale))
    })
}

#[cfg(test)]
mod tests {
    use super::{
        apply_manual_edit, merge_import, merge_paids, ImportRecord, PaidsInput,
    };
    use crate::domain::{Customer, CustomerContact, DispositionEvent};
    use crate::rules::status::tests::{event, fixture, NOW};
    use crate::rules::status::CustomerStatus;

    fn contact(phone: &str, first: &str) -> CustomerContact {
        CustomerContact {
            phone: phone.to_string(),
            first_name: first.to_string(),
            last_name: "Donor".to_string(),
            ..Default::default()
        }
    }

    fn record(phone: &str, event: DispositionEvent) -> ImportRecord {
        ImportRecord {
            contact: contact(phone, "Pat"),
            event,
        }
    }

    #[test]
    fn manual_edit_appends_only_on_meaningful_change() {
        let fx = fixture();
        let mut customer = Customer::new(NOW, "5550001");

        assert!(apply_manual_edit(&mut customer, event(fx.sale, 10), &fx.catalog, NOW));
        assert_eq!(customer.status, CustomerStatus::OpenOrder);

        let mut resave = event(fx.sale, 10);
        resave.program = Some("Spring".to_string());
        assert!(!apply_manual_edit(&mut customer, resave, &fx.catalog, NOW));
        assert_eq!(customer.history.len(), 1);

        let mut with_amount = event(fx.sale, 10);
        with_amount.amount_cents = Some(5_000);
        assert!(apply_manual_edit(&mut customer, with_amount, &fx.catalog, NOW));

        let mut with_notes = event(fx.sale, 10);
        with_notes.amount_cents = Some(5_000);
        with_notes.notes = "call after 5".to_string();
        assert!(apply_manual_edit(&mut customer, with_notes, &fx.catalog, NOW));

        assert!(apply_manual_edit(&mut customer, event(fx.payment, 11), &fx.catalog, NOW));
        assert_eq!(customer.history.len(), 4);
        assert_eq!(customer.status, CustomerStatus::Paid);
        assert_eq!(
            customer.current.as_ref().map(|current| current.disposition_id),
            Some(fx.payment)
        );
    }

    #[test]
    fn manual_edit_with_older_time_keeps_latest_snapshot() {
        let fx = fixture();
        let mut customer = Customer::new(NOW, "5550001");
        apply_manual_edit(&mut customer, event(fx.plain, 20), &fx.catalog, NOW);
        apply_manual_edit(&mut customer, event(fx.sale, 10), &fx.catalog, NOW);

        let current = customer.current.as_ref().expect("snapshot");
        assert_eq!(current.disposition_id, fx.plain);
        assert_eq!(customer.status, CustomerStatus::OpenOrder);
    }

    #[test]
    fn import_creates_and_merges_by_phone() {
        let fx = fixture();
        let mut customers = Vec::new();
        let report = merge_import(
            &mut customers,
            vec![record("5550001", event(fx.sale, 1))],
            &fx.catalog,
            NOW,
        );
        assert_eq!(report.created, 1);
        assert_eq!(customers[0].status, CustomerStatus::OpenOrder);

        let mut update = record("5550001", event(fx.payment, 2));
        update.contact.first_name = "Patricia".to_string();
        let report = merge_import(&mut customers, vec![update], &fx.catalog, NOW);
        assert_eq!(report.created, 0);
        assert_eq!(report.updated, 1);
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].first_name, "Patricia");
        assert_eq!(customers[0].history.len(), 2);
        assert_eq!(customers[0].status, CustomerStatus::Paid);
    }

    #[test]
    fn import_suppresses_duplicate_timestamps() {
        let fx = fixture();
        let mut customers = Vec::new();
        let batch = vec![record("5550001", event(fx.sale, 1))];
        merge_import(&mut customers, batch.clone(), &fx.catalog, NOW);
        let report = merge_import(&mut customers, batch, &fx.catalog, NOW);

        assert_eq!(report.duplicates, 1);
        assert_eq!(customers[0].history.len(), 1);
    }

    #[test]
    fn import_backfill_keeps_latest_snapshot() {
        let fx = fixture();
        let mut customers = Vec::new();
        merge_import(
            &mut customers,
            vec![record("5550001", event(fx.plain, 50))],
            &fx.catalog,
            NOW,
        );
        merge_import(
            &mut customers,
            vec![record("5550001", event(fx.sale, 10))],
            &fx.catalog,
            NOW,
        );

        let customer = &customers[0];
        assert_eq!(customer.history.len(), 2);
        let current = customer.current.as_ref().expect("snapshot");
        assert_eq!(current.disposition_id, fx.plain);
        assert_eq!(current.disposition_time, 50);
        assert_eq!(customer.status, CustomerStatus::OpenOrder);
    }

    #[test]
    fn import_skips_records_without_phone() {
        let fx = fixture();
        let mut customers = Vec::new();
        let report = merge_import(
            &mut customers,
            vec![
                record("  ", event(fx.sale, 1)),
                record("5550002", event(fx.plain, 1)),
                record("5550002", event(fx.busy, 2)),
            ],
            &fx.catalog,
            NOW,
        );
        assert_eq!(report.skipped, 1);
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(report.appended, 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(customers.len(), 1);
        assert_eq!(report.touched, vec![customers[0].id]);
    }

    #[test]
    fn paids_carry_sale_figures_onto_payment() {
        let fx = fixture();
        let mut customers = Vec::new();
        let mut sale = event(fx.sale, 1);
        sale.agent_number = "207".to_string();
        sale.amount_cents = Some(12_500);
        sale.tickets_ad = Some("4 tickets".to_string());
        merge_import(
            &mut customers,
            vec![
                record("(555) 000-1111", sale),
                record("555-000-2222", event(fx.plain, 1)),
            ],
            &fx.catalog,
            NOW,
        );

        let phones = vec![
            "5550001111".to_string(),
            "555.000.2222".to_string(),
            "5559999999".to_string(),
        ];
        let report = merge_paids(
            &mut customers,
            PaidsInput {
                phones: &phones,
                paid_at: 100,
                payment_disposition: fx.payment,
                default_agent: "HOUSE",
            },
            &fx.catalog,
            NOW,
        );

        assert_eq!(report.applied, 2);
        assert_eq!(report.carried_from_sale, 1);
        assert_eq!(report.not_found, vec!["5559999999".to_string()]);

        let paid = &customers[0];
        assert_eq!(paid.status, CustomerStatus::Paid);
        let payment = paid.history.last().expect("payment");
        assert_eq!(payment.agent_number, "207");
        assert_eq!(payment.amount_cents, Some(12_500));
        assert_eq!(payment.tickets_ad.as_deref(), Some("4 tickets"));

        let other = customers[1].history.last().expect("payment");
        assert_eq!(other.agent_number, "HOUSE");
        assert_eq!(other.amount_cents, None);
    }

    #[test]
    fn paids_do_not_duplicate_same_day_payment() {
        let fx = fixture();
        let mut customers = Vec::new();
        merge_import(
            &mut customers,
            vec![record("5550001111", event(fx.sale, 1))],
            &fx.catalog,
            NOW,
        );
        let phones = vec!["5550001111".to_string(), "555-000-1111".to_string()];
        let report = merge_paids(
            &mut customers,
            PaidsInput {
                phones: &phones,
                paid_at: 100,
                payment_disposition: fx.payment,
                default_agent: "HOUSE",
            },
            &fx.catalog,
            NOW,
        );
        assert_eq!(report.applied, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(customers[0].history.len(), 2);
        assert_eq!(report.touched.len(), 1);
    }

    #[test]
    fn paids_apply_when_payment_shares_the_sale_timestamp() {
        let fx = fixture();
        let mut customers = Vec::new();
        merge_import(
            &mut customers,
            vec![record("5550002222", event(fx.sale, 1))],
            &fx.catalog,
            NOW,
        );
        let sale_time = customers[0].history[0].disposition_time;
        let phones = vec!["5550002222".to_string()];
        let report = merge_paids(
            &mut customers,
            PaidsInput {
                phones: &phones,
                paid_at: sale_time,
                payment_disposition: fx.payment,
                default_agent: "HOUSE",
            },
            &fx.catalog,
            NOW,
        );
        assert_eq!(report.applied, 1);
        assert_eq!(report.duplicates, 0);
        assert_eq!(customers[0].history.len(), 2);
        assert_eq!(customers[0].status, CustomerStatus::Paid);
    }
}
