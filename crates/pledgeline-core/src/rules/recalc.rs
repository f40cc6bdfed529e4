use crate::domain::{Customer, DispositionCatalog, DispositionId};
use crate::rules::status::derive_status;

/// Re-derives every customer's status against `catalog`. A catalog edit can
/// change what an existing history entry means, so nothing short of the full
/// collection is safe. Returns how many statuses changed.
pub fn recalculate_all(
    customers: &mut [Customer],
    catalog: &DispositionCatalog,
    now_utc: i64,
) -> usize {
    let mut changed = 0;
    for customer in customers.iter_mut() {
        let status = derive_status(&customer.history, catalog, now_utc);
        if status != customer.status {
            customer.status = status;
            changed += 1;
        }
    }
    changed
}

/// Points snapshots that reference `deleted` at `replacement`. History
/// entries keep the deleted id.
pub fn reassign_deleted_disposition(
    customers: &mut [Customer],
    deleted: DispositionId,
    replacement: DispositionId,
) -> usize {
    let mut rewritten = 0;
    for customer in customers.iter_mut() {
        if let Some(current) = customer.current.as_mut() {
            if current.disposition_id == deleted {
                current.disposition_id = replacement;
                rewritten += 1;
            }
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::{reassign_deleted_disposition, recalculate_all};
    use crate::domain::{Customer, DispositionId, Modifier};
    use crate::rules::reconcile::refresh_customer;
    use crate::rules::status::tests::{event, fixture, NOW};
    use crate::rules::status::CustomerStatus;

    fn customer_with(history: Vec<crate::domain::DispositionEvent>) -> Customer {
        let mut customer = Customer::new(NOW, "5550001");
        customer.history = history;
        customer
    }

    #[test]
    fn catalog_change_reaches_existing_history() {
        let mut fx = fixture();
        let mut customers = vec![
            customer_with(vec![event(fx.plain, 1)]),
            customer_with(vec![event(fx.sale, 1)]),
        ];
        for customer in customers.iter_mut() {
            refresh_customer(customer, &fx.catalog, NOW);
        }
        assert_eq!(customers[0].status, CustomerStatus::Active);

        let mut plain = fx.catalog.get(&fx.plain).cloned().expect("plain");
        plain.modifiers.insert(Modifier::Dnc);
        fx.catalog.insert(plain);

        let changed = recalculate_all(&mut customers, &fx.catalog, NOW);
        assert_eq!(changed, 1);
        assert_eq!(customers[0].status, CustomerStatus::Dnc);
        assert_eq!(customers[1].status, CustomerStatus::OpenOrder);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let fx = fixture();
        let mut customers = vec![
            customer_with(vec![event(fx.busy, 1), event(fx.busy, 2)]),
            customer_with(vec![event(fx.sale, 1), event(fx.cancel, 2)]),
            customer_with(Vec::new()),
        ];
        recalculate_all(&mut customers, &fx.catalog, NOW);
        let first: Vec<CustomerStatus> = customers.iter().map(|c| c.status).collect();
        let changed = recalculate_all(&mut customers, &fx.catalog, NOW);
        let second: Vec<CustomerStatus> = customers.iter().map(|c| c.status).collect();

        assert_eq!(changed, 0);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                CustomerStatus::Dnc,
                CustomerStatus::Cancelled,
                CustomerStatus::Active
            ]
        );
    }

    #[test]
    fn deleting_a_disposition_rewrites_snapshot_only() {
        let mut fx = fixture();
        let mut customers = vec![customer_with(vec![event(fx.sale, 1)])];
        refresh_customer(&mut customers[0], &fx.catalog, NOW);

        fx.catalog.remove(&fx.sale);
        let replacement = DispositionId::system_default();
        let rewritten = reassign_deleted_disposition(&mut customers, fx.sale, replacement);
        recalculate_all(&mut customers, &fx.catalog, NOW);

        assert_eq!(rewritten, 1);
        let customer = &customers[0];
        assert_eq!(
            customer.current.as_ref().map(|c| c.disposition_id),
            Some(replacement)
        );
        assert_eq!(customer.history[0].disposition_id, fx.sale);
        assert_eq!(customer.status, CustomerStatus::Active);
    }
}
