use pledgeline_core::domain::{DispositionId, DEFAULT_DISPOSITION_NAME};
use pledgeline_store::Store;

#[test]
fn migrations_apply_once() {
    let store = Store::open_in_memory().expect("open in memory");
    assert_eq!(store.schema_version().expect("version before"), 0);
    store.migrate().expect("migrate");
    store.migrate().expect("migrate again");

    let version: i64 = store
        .connection()
        .query_row("SELECT version FROM pledgeline_schema LIMIT 1;", [], |row| {
            row.get(0)
        })
        .expect("schema version");
    assert_eq!(version, 1);
    assert_eq!(store.schema_version().expect("version"), 1);
}

#[test]
fn fresh_store_is_seeded_with_default_disposition() {
    let store = Store::open_in_memory().expect("open in memory");
    store.migrate().expect("migrate");

    let dispositions = store.dispositions().list().expect("list");
    assert_eq!(dispositions.len(), 1);
    assert_eq!(dispositions[0].id, DispositionId::system_default());
    assert_eq!(dispositions[0].name, DEFAULT_DISPOSITION_NAME);
    assert!(dispositions[0].is_default);
    assert!(dispositions[0].modifiers.is_empty());
}
