use crate::domain::{Customer, DispositionCatalog};
use crate::rules::status::{derive_status, StatusKind};

/// Optional inclusive bounds on the customer's current disposition time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportWindow {
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl ExportWindow {
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        self.from.map_or(true, |from| timestamp >= from)
            && self.to.map_or(true, |to| timestamp <= to)
    }
}

/// Mailing-list eligibility. Built on `derive_status` so it follows the same
/// DNC, exclude-count and timeout rules as the stored status.
pub fn is_customer_exportable(
    customer: &Customer,
    catalog: &DispositionCatalog,
    now_utc: i64,
    window: ExportWindow,
) -> bool {
    let status = derive_status(&customer.history, catalog, now_utc);
    if matches!(status.kind(), StatusKind::Dnc | StatusKind::Timeout) {
        return false;
    }
    if window.is_unbounded() {
        return true;
    }
    customer
        .current
        .as_ref()
        .is_some_and(|current| window.contains(current.disposition_time))
}

#[cfg(test)]
mod tests {
    use super::{is_customer_exportable, ExportWindow};
    use crate::domain::Customer;
    use crate::rules::reconcile::refresh_customer;
    use crate::rules::status::tests::{event, fixture, NOW};
    use crate::time::DAY_SECONDS;

    #[test]
    fn dnc_and_running_timeouts_are_not_exportable() {
        let fx = fixture();
        let mut dnc = Customer::new(NOW, "1");
        dnc.history = vec![event(fx.dnc, 1)];
        let mut waiting = Customer::new(NOW, "2");
        waiting.history = vec![event(fx.callback, NOW - DAY_SECONDS)];
        let mut open = Customer::new(NOW, "3");
        open.history = vec![event(fx.sale, 1)];

        let window = ExportWindow::default();
        assert!(!is_customer_exportable(&dnc, &fx.catalog, NOW, window));
        assert!(!is_customer_exportable(&waiting, &fx.catalog, NOW, window));
        assert!(is_customer_exportable(&open, &fx.catalog, NOW, window));
    }

    #[test]
    fn window_filters_on_current_disposition_time() {
        let fx = fixture();
        let mut customer = Customer::new(NOW, "1");
        customer.history = vec![event(fx.plain, 500)];
        refresh_customer(&mut customer, &fx.catalog, NOW);

        let inside = ExportWindow {
            from: Some(500),
            to: Some(600),
        };
        let outside = ExportWindow {
            from: Some(501),
            to: None,
        };
        assert!(is_customer_exportable(&customer, &fx.catalog, NOW, inside));
        assert!(!is_customer_exportable(&customer, &fx.catalog, NOW, outside));
        assert!(!is_customer_exportable(
            &Customer::new(NOW, "2"),
            &fx.catalog,
            NOW,
            outside
        ));
    }
}
