use crate::domain::disposition::Disposition;
use crate::domain::ids::DispositionId;
use std::collections::HashMap;

/// Every known disposition, keyed by id. Status derivation always takes the
/// catalog as an argument; there is no ambient copy of it.
#[derive(Debug, Clone, Default)]
pub struct DispositionCatalog {
    by_id: HashMap<DispositionId, Disposition>,
}

impl DispositionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, disposition: Disposition) -> Option<Disposition> {
        self.by_id.insert(disposition.id, disposition)
    }

    pub fn remove(&mut self, id: &DispositionId) -> Option<Disposition> {
        self.by_id.remove(id)
    }

    pub fn get(&self, id: &DispositionId) -> Option<&Disposition> {
        self.by_id.get(id)
    }

    /// Exact, case-sensitive name lookup; the first match by id order wins
    /// when names collide.
    pub fn find_by_name(&self, name: &str) -> Option<&Disposition> {
        let trimmed = name.trim();
        self.by_id
            .values()
            .filter(|disposition| disposition.name == trimmed)
            .min_by_key(|disposition| disposition.id)
    }

    pub fn default_disposition(&self) -> Option<&Disposition> {
        self.by_id
            .values()
            .filter(|disposition| disposition.is_default)
            .min_by_key(|disposition| disposition.id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Dispositions sorted by name, for listings.
    pub fn sorted(&self) -> Vec<&Disposition> {
        let mut items: Vec<&Disposition> = self.by_id.values().collect();
        items.sort_by(|a, b| {
            a.name
                .to_ascii_lowercase()
                .cmp(&b.name.to_ascii_lowercase())
                .then(a.id.cmp(&b.id))
        });
        items
    }
}

impl FromIterator<Disposition> for DispositionCatalog {
    fn from_iter<I: IntoIterator<Item = Disposition>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for disposition in iter {
            catalog.insert(disposition);
        }
        catalog
    }
}

#[cfg(test)]
mod tests {
    use super::DispositionCatalog;
    use crate::domain::{Disposition, DispositionId, ExcludeAction, ModifierSet};

    fn named(name: &str) -> Disposition {
        Disposition {
            id: DispositionId::new(),
            name: name.to_string(),
            modifiers: ModifierSet::empty(),
            timeout_days: None,
            exclude_after_attempts: None,
            exclude_action: ExcludeAction::None,
            exclude_action_timeout_days: None,
            is_default: false,
        }
    }

    #[test]
    fn lookup_by_id_and_name() {
        let busy = named("Busy");
        let busy_id = busy.id;
        let catalog: DispositionCatalog =
            [busy, named("Sale"), Disposition::system_default()].into_iter().collect();

        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get(&busy_id).map(|d| d.name.as_str()), Some("Busy"));
        assert_eq!(catalog.find_by_name(" Sale ").map(|d| d.name.as_str()), Some("Sale"));
        assert!(catalog.find_by_name("sale").is_none());
        assert_eq!(
            catalog.default_disposition().map(|d| d.id),
            Some(DispositionId::system_default())
        );
    }
}
