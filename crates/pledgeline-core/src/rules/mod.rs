pub mod export;
pub mod recalc;
pub mod reconcile;
pub mod status;

pub use export::{is_customer_exportable, ExportWindow};
pub use recalc::{reassign_deleted_disposition, recalculate_all};
pub use reconcile::{
    append_unless_duplicate, append_unless_duplicate_event, apply_manual_edit, merge_import,
    merge_paids, project_current, refresh_customer, ImportRecord, MergeReport, PaidsInput,
    PaidsReport,
};
pub use status::{chronological, derive_status, CustomerStatus, StatusKind};
