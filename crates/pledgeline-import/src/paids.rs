use crate::error::{ImportError, Result};
use chrono::{Datelike, NaiveDate};
use pledgeline_core::time::local_date_to_timestamp;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct ParsedPaids {
    pub phones: Vec<String>,
    pub warnings: Vec<String>,
}

/// One phone number per line. Blank lines and `#` comments are ignored; a
/// line with no digits is reported and dropped.
pub fn parse_paids(data: &str) -> ParsedPaids {
    let mut parsed = ParsedPaids::default();
    for (index, line) in data.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if !trimmed.chars().any(|ch| ch.is_ascii_digit()) {
            parsed
                .warnings
                .push(format!("line {}: '{trimmed}' is not a phone number", index + 1));
            continue;
        }
        parsed.phones.push(trimmed.to_string());
    }
    parsed
}

/// Finds the payment date embedded in a paids filename. Accepts
/// `YYYY-MM-DD`, `YYYYMMDD`, `MM-DD-YYYY` and `MMDDYYYY`; the first
/// candidate that forms a real date wins.
pub fn date_from_filename(path: &Path) -> Result<NaiveDate> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| ImportError::Parse(format!("invalid filename: {}", path.display())))?;

    for candidate in date_candidates(stem) {
        if let Some(date) = parse_candidate(candidate) {
            return Ok(date);
        }
    }

    Err(ImportError::Parse(format!(
        "no date (YYYY-MM-DD, YYYYMMDD, MM-DD-YYYY or MMDDYYYY) in filename: {}",
        path.display()
    )))
}

/// Local midnight of the date in the filename.
pub fn paid_at_from_filename(path: &Path) -> Result<i64> {
    let date = date_from_filename(path)?;
    Ok(local_date_to_timestamp(date)?)
}

fn date_candidates(stem: &str) -> Vec<&str> {
    stem.split(|ch: char| !(ch.is_ascii_digit() || ch == '-'))
        .map(|part| part.trim_matches('-'))
        .filter(|part| part.len() >= 8)
        .collect()
}

fn parse_candidate(candidate: &str) -> Option<NaiveDate> {
    let formats: &[&str] = if candidate.contains('-') {
        &["%Y-%m-%d", "%m-%d-%Y"]
    } else if candidate.len() == 8 {
        &["%Y%m%d", "%m%d%Y"]
    } else {
        &[]
    };
    formats
        .iter()
        .filter_map(|format| NaiveDate::parse_from_str(candidate, format).ok())
        .find(|date| date.year() >= 1900)
}

#[cfg(test)]
mod tests {
    use super::{date_from_filename, parse_paids};
    use chrono::NaiveDate;
    use std::path::Path;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("date")
    }

    #[test]
    fn parses_phone_lines() {
        let parsed = parse_paids("5551234567\n\n# header\n(555) 765-4321\nsee attached\n");
        assert_eq!(parsed.phones, vec!["5551234567", "(555) 765-4321"]);
        assert_eq!(parsed.warnings.len(), 1);
        assert!(parsed.warnings[0].starts_with("line 5"));
    }

    #[test]
    fn reads_each_filename_date_form() {
        assert_eq!(
            date_from_filename(Path::new("paids-2024-03-15.txt")).unwrap(),
            date(2024, 3, 15)
        );
        assert_eq!(
            date_from_filename(Path::new("/tmp/paids_20240315.txt")).unwrap(),
            date(2024, 3, 15)
        );
        assert_eq!(
            date_from_filename(Path::new("PAIDS 03-15-2024.txt")).unwrap(),
            date(2024, 3, 15)
        );
        assert_eq!(
            date_from_filename(Path::new("paids03152024.txt")).unwrap(),
            date(2024, 3, 15)
        );
    }

    #[test]
    fn rejects_filenames_without_a_date() {
        let err = date_from_filename(Path::new("paids.txt")).unwrap_err();
        assert!(err.to_string().contains("no date"));
        assert!(date_from_filename(Path::new("paids-2024-13-45.txt")).is_err());
    }
}
