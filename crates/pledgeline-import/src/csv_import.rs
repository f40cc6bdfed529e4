use crate::error::{ImportError, Result};
use pledgeline_core::domain::{
    parse_amount_cents, CustomerContact, CustomerSource, DispositionCatalog, DispositionEvent,
};
use pledgeline_core::rules::ImportRecord;
use pledgeline_core::time::parse_local_timestamp;
use std::io::Read;

#[derive(Debug, Clone)]
pub struct CsvImportOptions {
    /// Keep only digits (and a leading `+`) in the phone column.
    pub strip_phone_punctuation: bool,
    /// Agent recorded when a row leaves the agent column blank.
    pub default_agent: String,
}

#[derive(Debug, Clone, Default)]
pub struct ParsedImport {
    pub records: Vec<ImportRecord>,
    pub skipped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Phone,
    FirstName,
    LastName,
    Email,
    Address,
    City,
    State,
    Zip,
    Source,
    Disposition,
    DispositionTime,
    Agent,
    Amount,
    TicketsAd,
    Notes,
    Program,
    LeadList,
}

impl Column {
    /// Headers match case-insensitively with spaces, dashes and underscores
    /// ignored, so "First Name", "first_name" and "FIRSTNAME" are the same.
    fn from_header(raw: &str) -> Option<Self> {
        let key: String = raw
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .map(|ch| ch.to_ascii_lowercase())
            .collect();
        let column = match key.as_str() {
            "phone" | "phonenumber" | "telephone" => Column::Phone,
            "firstname" | "first" => Column::FirstName,
            "lastname" | "last" => Column::LastName,
            "email" | "emailaddress" => Column::Email,
            "address" | "street" => Column::Address,
            "city" => Column::City,
            "state" => Column::State,
            "zip" | "zipcode" | "postalcode" => Column::Zip,
            "source" | "customersource" => Column::Source,
            "disposition" | "dispositionname" => Column::Disposition,
            "dispositiontime" | "dispositiondate" | "date" => Column::DispositionTime,
            "agent" | "agentnumber" => Column::Agent,
            "amount" => Column::Amount,
            "ticketsad" | "tickets" => Column::TicketsAd,
            "notes" | "currentnotes" => Column::Notes,
            "program" => Column::Program,
            "leadlist" => Column::LeadList,
            _ => return None,
        };
        Some(column)
    }
}

struct ColumnMap {
    slots: Vec<(Column, usize)>,
}

impl ColumnMap {
    fn new(headers: &csv::StringRecord, warnings: &mut Vec<String>) -> Result<Self> {
        let mut slots: Vec<(Column, usize)> = Vec::new();
        for (index, header) in headers.iter().enumerate() {
            match Column::from_header(header) {
                Some(column) if slots.iter().any(|(seen, _)| *seen == column) => {
                    warnings.push(format!("duplicate column '{header}' ignored"));
                }
                Some(column) => slots.push((column, index)),
                None if header.trim().is_empty() => {}
                None => warnings.push(format!("unknown column '{header}' ignored")),
            }
        }

        let map = Self { slots };
        for (column, name) in [
            (Column::Phone, "phone"),
            (Column::Disposition, "disposition"),
            (Column::DispositionTime, "disposition_time"),
        ] {
            if map.index(column).is_none() {
                return Err(ImportError::MissingColumn(name));
            }
        }
        Ok(map)
    }

    fn index(&self, column: Column) -> Option<usize> {
        self.slots
            .iter()
            .find(|(candidate, _)| *candidate == column)
            .map(|(_, index)| *index)
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: Column) -> Option<&'r str> {
        self.index(column)
            .and_then(|index| record.get(index))
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Parses a customer CSV into import records. Each row must name a phone, a
/// disposition known to `catalog`, and a disposition time; rows that do not
/// are skipped with a reason rather than failing the batch.
pub fn parse_customer_csv<R: Read>(
    reader: R,
    catalog: &DispositionCatalog,
    options: &CsvImportOptions,
) -> Result<ParsedImport> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut parsed = ParsedImport::default();
    let headers = reader.headers()?.clone();
    let columns = ColumnMap::new(&headers, &mut parsed.warnings)?;

    for (index, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                parsed.skipped += 1;
                parsed.warnings.push(format!("row {line}: {err}"));
                continue;
            }
        };
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }

        match parse_row(&columns, &record, catalog, options, &mut parsed.warnings, line) {
            Ok(import) => parsed.records.push(import),
            Err(reason) => {
                parsed.skipped += 1;
                parsed.warnings.push(format!("row {line}: {reason}"));
            }
        }
    }

    Ok(parsed)
}

fn parse_row(
    columns: &ColumnMap,
    record: &csv::StringRecord,
    catalog: &DispositionCatalog,
    options: &CsvImportOptions,
    warnings: &mut Vec<String>,
    line: usize,
) -> std::result::Result<ImportRecord, String> {
    let raw_phone = columns
        .get(record, Column::Phone)
        .ok_or_else(|| "missing phone".to_string())?;
    let phone = if options.strip_phone_punctuation {
        strip_phone_punctuation(raw_phone)
    } else {
        raw_phone.to_string()
    };
    if phone.is_empty() {
        return Err(format!("phone '{raw_phone}' has no digits"));
    }

    let disposition_name = columns
        .get(record, Column::Disposition)
        .ok_or_else(|| "missing disposition".to_string())?;
    let disposition = catalog
        .find_by_name(disposition_name)
        .ok_or_else(|| format!("unknown disposition '{disposition_name}'"))?;

    let raw_time = columns
        .get(record, Column::DispositionTime)
        .ok_or_else(|| "missing disposition time".to_string())?;
    let disposition_time = parse_local_timestamp(raw_time)
        .map_err(|err| format!("invalid disposition time '{raw_time}': {err}"))?;

    let amount_cents = columns
        .get(record, Column::Amount)
        .map(parse_amount_cents)
        .transpose()
        .map_err(|err| err.to_string())?;

    let source = match columns.get(record, Column::Source) {
        Some(raw) => CustomerSource::parse(raw).unwrap_or_else(|_| {
            warnings.push(format!("row {line}: unknown source '{raw}', using cold"));
            CustomerSource::Cold
        }),
        None => CustomerSource::Cold,
    };

    let owned = |column| columns.get(record, column).map(str::to_string);
    let agent = columns
        .get(record, Column::Agent)
        .unwrap_or(options.default_agent.as_str());

    let mut event = DispositionEvent::new(disposition.id, disposition_time, agent);
    event.amount_cents = amount_cents;
    event.tickets_ad = owned(Column::TicketsAd);
    event.notes = owned(Column::Notes).unwrap_or_default();
    event.program = owned(Column::Program);
    event.lead_list = owned(Column::LeadList);

    Ok(ImportRecord {
        contact: CustomerContact {
            phone,
            first_name: owned(Column::FirstName).unwrap_or_default(),
            last_name: owned(Column::LastName).unwrap_or_default(),
            email: owned(Column::Email),
            address: owned(Column::Address),
            city: owned(Column::City),
            state: owned(Column::State),
            zip: owned(Column::Zip),
            source,
        },
        event,
    })
}

pub fn strip_phone_punctuation(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    if trimmed.starts_with('+') {
        out.push('+');
    }
    out.extend(trimmed.chars().filter(|ch| ch.is_ascii_digit()));
    if out == "+" {
        out.clear();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{parse_customer_csv, strip_phone_punctuation, CsvImportOptions};
    use crate::error::ImportError;
    use pledgeline_core::domain::{
        CustomerSource, Disposition, DispositionCatalog, DispositionId, Modifier, ModifierSet,
    };

    fn catalog() -> (DispositionCatalog, DispositionId) {
        let mut sale = Disposition::system_default();
        sale.id = DispositionId::new();
        sale.name = "Sale".to_string();
        sale.modifiers = ModifierSet::from_iter([Modifier::Sale]);
        sale.is_default = false;
        let id = sale.id;
        let catalog = [Disposition::system_default(), sale].into_iter().collect();
        (catalog, id)
    }

    fn options(strip: bool) -> CsvImportOptions {
        CsvImportOptions {
            strip_phone_punctuation: strip,
            default_agent: "IMPORT".to_string(),
        }
    }

    #[test]
    fn parses_rows_with_loose_headers() {
        let (catalog, sale) = catalog();
        let data = "\
Phone,First Name,LAST_NAME,Disposition,Disposition Date,Amount,Agent,Source,Notes
(555) 123-4567,Ada,Lovelace,Sale,2024-03-15,\"$1,250.50\",314,pc,pledged
555.987.6543,Grace,Hopper,Sale,03/16/2024 10:30,,,,
";
        let parsed = parse_customer_csv(data.as_bytes(), &catalog, &options(true)).expect("parse");
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records.len(), 2);

        let first = &parsed.records[0];
        assert_eq!(first.contact.phone, "5551234567");
        assert_eq!(first.contact.last_name, "Lovelace");
        assert_eq!(first.contact.source, CustomerSource::Pc);
        assert_eq!(first.event.disposition_id, sale);
        assert_eq!(first.event.amount_cents, Some(125_050));
        assert_eq!(first.event.agent_number, "314");
        assert_eq!(first.event.notes, "pledged");

        let second = &parsed.records[1];
        assert_eq!(second.contact.phone, "5559876543");
        assert_eq!(second.event.agent_number, "IMPORT");
        assert_eq!(second.event.amount_cents, None);
        assert!(second.event.disposition_time > first.event.disposition_time);
    }

    #[test]
    fn skips_rows_with_reasons() {
        let (catalog, _) = catalog();
        let data = "\
phone,disposition,disposition_time
,Sale,2024-03-15
5551112222,Refused,2024-03-15
5553334444,Sale,not a date
5556667777,Sale,2024-03-15
";
        let parsed = parse_customer_csv(data.as_bytes(), &catalog, &options(false)).expect("parse");
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 3);
        assert!(parsed.warnings[0].starts_with("row 2: missing phone"));
        assert!(parsed.warnings[1].contains("unknown disposition 'Refused'"));
        assert!(parsed.warnings[2].starts_with("row 4: invalid disposition time"));
    }

    #[test]
    fn keeps_punctuation_when_not_stripping() {
        let (catalog, _) = catalog();
        let data = "phone,disposition,date\n555-000-1111,Sale,2024-01-02\n";
        let parsed = parse_customer_csv(data.as_bytes(), &catalog, &options(false)).expect("parse");
        assert_eq!(parsed.records[0].contact.phone, "555-000-1111");
    }

    #[test]
    fn requires_core_columns() {
        let (catalog, _) = catalog();
        let data = "phone,disposition\n5550001111,Sale\n";
        let err = parse_customer_csv(data.as_bytes(), &catalog, &options(true)).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("disposition_time")));
    }

    #[test]
    fn strip_phone_keeps_leading_plus() {
        assert_eq!(strip_phone_punctuation(" +1 (555) 010-9999 "), "+15550109999");
        assert_eq!(strip_phone_punctuation("n/a"), "");
        assert_eq!(strip_phone_punctuation("+"), "");
    }
}
