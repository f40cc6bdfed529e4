use pledgeline_core::domain::{
    CustomerContact, Disposition, DispositionEvent, ExcludeAction, Modifier,
};
use pledgeline_core::rules::{CustomerStatus, ImportRecord};
use pledgeline_store::error::StoreError;
use pledgeline_store::repo::{CustomerNew, DispositionNew, PaidsImport};
use pledgeline_store::Store;

const NOW: i64 = 1_700_000_000;

fn store() -> Store {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");
    store
}

fn add_disposition(store: &Store, name: &str, modifiers: &[Modifier]) -> Disposition {
    store
        .dispositions()
        .create(
            NOW,
            DispositionNew {
                name: name.to_string(),
                modifiers: modifiers.iter().copied().collect(),
                timeout_days: None,
                exclude_after_attempts: None,
                exclude_action: ExcludeAction::None,
                exclude_action_timeout_days: None,
            },
        )
        .expect("create disposition")
        .disposition
}

fn record(phone: &str, last: &str, event: DispositionEvent) -> ImportRecord {
    ImportRecord {
        contact: CustomerContact {
            phone: phone.to_string(),
            last_name: last.to_string(),
            ..Default::default()
        },
        event,
    }
}

#[test]
fn import_creates_and_merges_by_phone() {
    let store = store();
    let sale = add_disposition(&store, "Sale", &[Modifier::Sale]);
    let payment = add_disposition(&store, "Payment", &[Modifier::Payment]);

    let first = store
        .customers()
        .import_batch(
            NOW,
            vec![
                record("5550001", "Knuth", DispositionEvent::new(sale.id, 100, "7")),
                record("5550002", "Ritchie", DispositionEvent::new(sale.id, 100, "7")),
            ],
        )
        .expect("first import");
    assert_eq!(first.created, 2);
    assert_eq!(first.updated, 0);

    let second = store
        .customers()
        .import_batch(
            NOW,
            vec![
                record("5550001", "Knuth", DispositionEvent::new(payment.id, 200, "7")),
                record("", "Nobody", DispositionEvent::new(payment.id, 200, "7")),
            ],
        )
        .expect("second import");
    assert_eq!(second.created, 0);
    assert_eq!(second.updated, 1);
    assert_eq!(second.skipped, 1);

    let knuth = store.customers().find_by_phone("5550001").expect("find");
    assert_eq!(knuth.len(), 1);
    assert_eq!(knuth[0].history.len(), 2);
    assert_eq!(knuth[0].status, CustomerStatus::Paid);

    let ritchie = store.customers().find_by_phone("5550002").expect("find");
    assert_eq!(ritchie[0].status, CustomerStatus::OpenOrder);
}

#[test]
fn reimporting_the_same_event_is_suppressed() {
    let store = store();
    let sale = add_disposition(&store, "Sale", &[Modifier::Sale]);
    let batch = || vec![record("5550003", "Thompson", DispositionEvent::new(sale.id, 100, "7"))];

    store.customers().import_batch(NOW, batch()).expect("first");
    let again = store.customers().import_batch(NOW, batch()).expect("second");
    assert_eq!(again.duplicates, 1);
    assert_eq!(again.appended, 0);

    let customers = store.customers().find_by_phone("5550003").expect("find");
    assert_eq!(customers[0].history.len(), 1);
}

#[test]
fn exclude_count_threshold_applies_across_imports() {
    let store = store();
    let busy = store
        .dispositions()
        .create(
            NOW,
            DispositionNew {
                name: "Busy".to_string(),
                modifiers: [Modifier::ExcludeCount].into_iter().collect(),
                timeout_days: None,
                exclude_after_attempts: Some(2),
                exclude_action: ExcludeAction::Dnc,
                exclude_action_timeout_days: None,
            },
        )
        .expect("create")
        .disposition;

    store
        .customers()
        .import_batch(
            NOW,
            vec![record("5550004", "Pike", DispositionEvent::new(busy.id, 100, "7"))],
        )
        .expect("once");
    let once = store.customers().find_by_phone("5550004").expect("find");
    assert_eq!(once[0].status, CustomerStatus::Active);

    store
        .customers()
        .import_batch(
            NOW,
            vec![record("5550004", "Pike", DispositionEvent::new(busy.id, 200, "7"))],
        )
        .expect("twice");
    let twice = store.customers().find_by_phone("5550004").expect("find");
    assert_eq!(twice[0].status, CustomerStatus::Dnc);
}

#[test]
fn paids_carry_the_open_sale() {
    let store = store();
    let sale = add_disposition(&store, "Sale", &[Modifier::Sale]);
    add_disposition(&store, "Paid", &[Modifier::Payment]);

    let mut sold = DispositionEvent::new(sale.id, 100, "314");
    sold.amount_cents = Some(2_500);
    sold.tickets_ad = Some("4 tickets".to_string());
    let open = store
        .customers()
        .create(
            NOW,
            CustomerNew {
                contact: CustomerContact {
                    phone: "(555) 000-0005".to_string(),
                    ..Default::default()
                },
                disposition: Some(sold),
            },
        )
        .expect("create open order");
    let walk_in = store
        .customers()
        .create(
            NOW,
            CustomerNew {
                contact: CustomerContact {
                    phone: "5550006".to_string(),
                    ..Default::default()
                },
                disposition: None,
            },
        )
        .expect("create walk-in");

    let report = store
        .customers()
        .import_paids(
            NOW,
            &PaidsImport {
                phones: vec![
                    "555-000-0005".to_string(),
                    "5550006".to_string(),
                    "5559999".to_string(),
                ],
                paid_at: 500,
                disposition_name: "Paid".to_string(),
                default_agent: "HOUSE".to_string(),
            },
        )
        .expect("import paids");
    assert_eq!(report.applied, 2);
    assert_eq!(report.carried_from_sale, 1);
    assert_eq!(report.not_found, vec!["5559999".to_string()]);

    let open = store
        .customers()
        .get(open.id)
        .expect("get")
        .expect("exists");
    assert_eq!(open.status, CustomerStatus::Paid);
    let payment = open.current.expect("snapshot");
    assert_eq!(payment.agent_number, "314");
    assert_eq!(payment.amount_cents, Some(2_500));
    assert_eq!(payment.tickets_ad.as_deref(), Some("4 tickets"));

    let walk_in = store
        .customers()
        .get(walk_in.id)
        .expect("get")
        .expect("exists");
    let payment = walk_in.current.expect("snapshot");
    assert_eq!(payment.agent_number, "HOUSE");
    assert_eq!(payment.amount_cents, None);
}

#[test]
fn paids_require_a_known_disposition() {
    let store = store();
    let err = store
        .customers()
        .import_paids(
            NOW,
            &PaidsImport {
                phones: vec!["5550007".to_string()],
                paid_at: 500,
                disposition_name: "Paid".to_string(),
                default_agent: "HOUSE".to_string(),
            },
        )
        .expect_err("missing disposition");
    assert!(matches!(err, StoreError::NotFound(_)));
}
