use crate::error::Result;
use pledgeline_core::domain::{format_amount_cents, Customer, DispositionCatalog};
use pledgeline_core::dto::UNKNOWN_DISPOSITION_LABEL;
use pledgeline_core::rules::{derive_status, is_customer_exportable, ExportWindow};
use pledgeline_core::time::format_timestamp_datetime;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// Every customer with status and current disposition.
    Full,
    /// Name and address of customers eligible for mailings.
    Mailing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    pub written: usize,
    pub excluded: usize,
}

#[derive(Debug, Serialize)]
struct FullRow<'a> {
    id: String,
    phone: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    email: Option<&'a str>,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    zip: Option<&'a str>,
    source: &'a str,
    status: &'a str,
    status_detail: Option<String>,
    disposition: Option<&'a str>,
    disposition_time: Option<String>,
    agent_number: Option<&'a str>,
    amount: Option<String>,
    notes: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MailingRow<'a> {
    first_name: &'a str,
    last_name: &'a str,
    address: Option<&'a str>,
    city: Option<&'a str>,
    state: Option<&'a str>,
    zip: Option<&'a str>,
    phone: &'a str,
}

/// Writes customers as CSV. `Full` writes every customer inside `window`
/// (the window is ignored when unbounded); `Mailing` keeps only customers
/// that pass `is_customer_exportable`. Status is derived at `now_utc`, not
/// read from the stored field.
pub fn export_customers_csv<W: Write>(
    writer: W,
    customers: &[Customer],
    catalog: &DispositionCatalog,
    now_utc: i64,
    kind: ExportKind,
    window: ExportWindow,
) -> Result<ExportReport> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    let mut report = ExportReport::default();

    for customer in customers {
        match kind {
            ExportKind::Full => {
                let in_window = window.is_unbounded()
                    || customer
                        .current
                        .as_ref()
                        .is_some_and(|current| window.contains(current.disposition_time));
                if !in_window {
                    report.excluded += 1;
                    continue;
                }
                wtr.serialize(full_row(customer, catalog, now_utc))?;
            }
            ExportKind::Mailing => {
                if !is_customer_exportable(customer, catalog, now_utc, window) {
                    report.excluded += 1;
                    continue;
                }
                wtr.serialize(MailingRow {
                    first_name: &customer.first_name,
                    last_name: &customer.last_name,
                    address: customer.address.as_deref(),
                    city: customer.city.as_deref(),
                    state: customer.state.as_deref(),
                    zip: customer.zip.as_deref(),
                    phone: &customer.phone,
                })?;
            }
        }
        report.written += 1;
    }

    wtr.flush()?;
    Ok(report)
}

fn full_row<'a>(customer: &'a Customer, catalog: &'a DispositionCatalog, now_utc: i64) -> FullRow<'a> {
    let status = derive_status(&customer.history, catalog, now_utc);
    let current = customer.current.as_ref();
    FullRow {
        id: customer.id.to_string(),
        phone: &customer.phone,
        first_name: &customer.first_name,
        last_name: &customer.last_name,
        email: customer.email.as_deref(),
        address: customer.address.as_deref(),
        city: customer.city.as_deref(),
        state: customer.state.as_deref(),
        zip: customer.zip.as_deref(),
        source: customer.source.as_str(),
        status: status.label(),
        status_detail: status.detail(),
        disposition: current.map(|current| {
            catalog
                .get(&current.disposition_id)
                .map(|disposition| disposition.name.as_str())
                .unwrap_or(UNKNOWN_DISPOSITION_LABEL)
        }),
        disposition_time: current.map(|current| format_timestamp_datetime(current.disposition_time)),
        agent_number: current.map(|current| current.agent_number.as_str()),
        amount: current
            .and_then(|current| current.amount_cents)
            .map(format_amount_cents),
        notes: current
            .map(|current| current.notes.as_str())
            .filter(|notes| !notes.is_empty()),
    }
}

#[cfg(test)]
mod tests {
    use super::{export_customers_csv, ExportKind};
    use pledgeline_core::domain::{
        Customer, Disposition, DispositionCatalog, DispositionEvent, DispositionId, Modifier,
        ModifierSet,
    };
    use pledgeline_core::rules::{refresh_customer, ExportWindow};

    const NOW: i64 = 1_700_000_000;

    fn disposition(name: &str, modifiers: &[Modifier]) -> Disposition {
        let mut disposition = Disposition::system_default();
        disposition.id = DispositionId::new();
        disposition.name = name.to_string();
        disposition.modifiers = modifiers.iter().copied().collect::<ModifierSet>();
        disposition.is_default = false;
        disposition
    }

    fn customer(
        phone: &str,
        last: &str,
        event: Option<DispositionEvent>,
        catalog: &DispositionCatalog,
    ) -> Customer {
        let mut customer = Customer::new(NOW, phone);
        customer.first_name = "Pat".to_string();
        customer.last_name = last.to_string();
        customer.city = Some("Springfield".to_string());
        customer.history.extend(event);
        refresh_customer(&mut customer, catalog, NOW);
        customer
    }

    #[test]
    fn mailing_export_drops_dnc_customers() {
        let sale = disposition("Sale", &[Modifier::Sale]);
        let dnc = disposition("DNC", &[Modifier::Dnc]);
        let mut sale_event = DispositionEvent::new(sale.id, NOW - 100, "101");
        sale_event.amount_cents = Some(5_000);
        let dnc_event = DispositionEvent::new(dnc.id, NOW - 100, "101");
        let catalog: DispositionCatalog = [Disposition::system_default(), sale, dnc]
            .into_iter()
            .collect();
        let customers = vec![
            customer("5550001", "Buyer", Some(sale_event), &catalog),
            customer("5550002", "Blocked", Some(dnc_event), &catalog),
        ];

        let mut out = Vec::new();
        let report = export_customers_csv(
            &mut out,
            &customers,
            &catalog,
            NOW,
            ExportKind::Mailing,
            ExportWindow::default(),
        )
        .expect("export");
        assert_eq!(report.written, 1);
        assert_eq!(report.excluded, 1);

        let text = String::from_utf8(out).expect("utf8");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "first_name,last_name,address,city,state,zip,phone");
        assert_eq!(lines[1], "Pat,Buyer,,Springfield,,,5550001");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn full_export_includes_status_and_window() {
        let sale = disposition("Sale", &[Modifier::Sale]);
        let mut sale_event = DispositionEvent::new(sale.id, NOW - 100, "101");
        sale_event.amount_cents = Some(5_000);
        let catalog: DispositionCatalog = [Disposition::system_default(), sale]
            .into_iter()
            .collect();
        let customers = vec![
            customer("5550001", "Buyer", Some(sale_event), &catalog),
            customer("5550003", "Fresh", None, &catalog),
        ];

        let mut out = Vec::new();
        let report = export_customers_csv(
            &mut out,
            &customers,
            &catalog,
            NOW,
            ExportKind::Full,
            ExportWindow::default(),
        )
        .expect("export");
        assert_eq!(report.written, 2);
        let text = String::from_utf8(out).expect("utf8");
        assert!(text.starts_with("id,phone,first_name,last_name,"));
        assert!(text.contains(",Open Order,,Sale,"));
        assert!(text.contains(",101,50.00,"));

        let mut out = Vec::new();
        let report = export_customers_csv(
            &mut out,
            &customers,
            &catalog,
            NOW,
            ExportKind::Full,
            ExportWindow {
                from: Some(NOW - 200),
                to: Some(NOW),
            },
        )
        .expect("export");
        assert_eq!(report.written, 1);
        assert_eq!(report.excluded, 1);
    }
}
