use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Behavioral tag carried by a disposition. The vocabulary is fixed; only
/// which dispositions carry which tags is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modifier {
    Dnc,
    Sale,
    Payment,
    Invoice,
    #[serde(rename = "timeout")]
    TimeOut,
    ExcludeCount,
    Cancel,
}

impl Modifier {
    pub const fn as_str(self) -> &'static str {
        match self {
            Modifier::Dnc => "dnc",
            Modifier::Sale => "sale",
            Modifier::Payment => "payment",
            Modifier::Invoice => "invoice",
            Modifier::TimeOut => "timeout",
            Modifier::ExcludeCount => "exclude-count",
            Modifier::Cancel => "cancel",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dnc" => Some(Modifier::Dnc),
            "sale" => Some(Modifier::Sale),
            "payment" => Some(Modifier::Payment),
            "invoice" => Some(Modifier::Invoice),
            "timeout" => Some(Modifier::TimeOut),
            "exclude-count" | "excludecount" => Some(Modifier::ExcludeCount),
            "cancel" => Some(Modifier::Cancel),
            _ => None,
        }
    }

    pub const fn all() -> &'static [Modifier] {
        &[
            Modifier::Dnc,
            Modifier::Sale,
            Modifier::Payment,
            Modifier::Invoice,
            Modifier::TimeOut,
            Modifier::ExcludeCount,
            Modifier::Cancel,
        ]
    }

    const fn bit(self) -> u8 {
        match self {
            Modifier::Dnc => 1 << 0,
            Modifier::Sale => 1 << 1,
            Modifier::Payment => 1 << 2,
            Modifier::Invoice => 1 << 3,
            Modifier::TimeOut => 1 << 4,
            Modifier::ExcludeCount => 1 << 5,
            Modifier::Cancel => 1 << 6,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of modifiers backed by a bit mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Modifier>", into = "Vec<Modifier>")]
pub struct ModifierSet(u8);

impl ModifierSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, modifier: Modifier) -> bool {
        self.0 & modifier.bit() != 0
    }

    pub fn insert(&mut self, modifier: Modifier) {
        self.0 |= modifier.bit();
    }

    pub fn remove(&mut self, modifier: Modifier) {
        self.0 &= !modifier.bit();
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Modifier> {
        Modifier::all()
            .iter()
            .copied()
            .filter(move |modifier| self.contains(*modifier))
    }

    /// Comma separated labels, used for storage and display.
    pub fn to_labels(self) -> String {
        self.iter()
            .map(Modifier::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn parse_labels(raw: &str) -> Result<Self, CoreError> {
        let mut set = Self::empty();
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let modifier = Modifier::parse(trimmed)
                .ok_or_else(|| CoreError::InvalidModifier(trimmed.to_string()))?;
            set.insert(modifier);
        }
        Ok(set)
    }
}

impl FromIterator<Modifier> for ModifierSet {
    fn from_iter<I: IntoIterator<Item = Modifier>>(iter: I) -> Self {
        let mut set = Self::empty();
        for modifier in iter {
            set.insert(modifier);
        }
        set
    }
}

impl From<Vec<Modifier>> for ModifierSet {
    fn from(value: Vec<Modifier>) -> Self {
        value.into_iter().collect()
    }
}

impl From<ModifierSet> for Vec<Modifier> {
    fn from(value: ModifierSet) -> Self {
        value.iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Modifier, ModifierSet};

    #[test]
    fn parse_round_trip() {
        for modifier in Modifier::all() {
            let parsed = Modifier::parse(modifier.as_str()).expect("parse modifier");
            assert_eq!(*modifier, parsed);
        }
    }

    #[test]
    fn set_ignores_duplicates_and_order() {
        let a: ModifierSet = [Modifier::Sale, Modifier::Payment, Modifier::Sale]
            .into_iter()
            .collect();
        let b: ModifierSet = [Modifier::Payment, Modifier::Sale].into_iter().collect();
        assert_eq!(a, b);
        assert!(a.contains(Modifier::Sale));
        assert!(!a.contains(Modifier::Dnc));
    }

    #[test]
    fn labels_parse_and_render() {
        let set = ModifierSet::parse_labels(" Sale , timeout,,").unwrap();
        assert_eq!(set.to_labels(), "sale,timeout");
        assert!(ModifierSet::parse_labels("sale,bogus").is_err());
    }
}
