// Module for loading the CSV sources. It reads each file, indexes the header row,
// and hands every row to the normalizer. Missing columns read as empty text.
use std::collections::HashMap;
use std::path::Path;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord, Trim};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{LoadError, Result};
use crate::preprocess::{
    location_from_row, normalize_fighter, parse_count, parse_number, CombinedBout, Coordinates,
    EventRow, Fight, Fighter,
};

/// Raw `fighter_details.csv` row. Every field stays textual until normalization.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawFighter {
    pub id: String,
    pub name: String,
    pub nick_name: String,
    pub wins: String,
    pub losses: String,
    pub draws: String,
    pub height: String,
    pub weight: String,
    pub reach: String,
    pub stance: String,
    pub dob: String,
    pub splm: String,
    pub str_acc: String,
    pub sapm: String,
    pub str_def: String,
    pub td_avg: String,
    pub td_avg_acc: String,
    pub td_def: String,
    pub sub_avg: String,
}

/// A parsed CSV file: header row, column positions, and the non-blank records.
pub struct Table {
    headers: StringRecord,
    columns: HashMap<String, usize>,
    records: Vec<StringRecord>,
}

impl Table {
    pub fn rows(&self) -> impl Iterator<Item = RawRow<'_>> {
        self.records.iter().map(move |record| RawRow { columns: &self.columns, record })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Field access by column name over one record.
pub struct RawRow<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a StringRecord,
}

impl<'a> RawRow<'a> {
    pub fn text(&self, field: &str) -> &'a str {
        self.columns
            .get(field)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
            .unwrap_or("")
    }

    pub fn owned(&self, field: &str) -> String {
        self.text(field).to_string()
    }

    pub fn number(&self, field: &str) -> f64 {
        parse_number(self.text(field))
    }

    pub fn count(&self, field: &str) -> u32 {
        parse_count(self.text(field))
    }
}

fn line_of(record: &StringRecord) -> u64 {
    record.position().map(|p| p.line()).unwrap_or(0)
}

pub async fn read_table(path: &Path) -> Result<Table> {
    let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_table(&bytes, path)
}

pub fn parse_table(bytes: &[u8], path: &Path) -> Result<Table> {
    let csv_err = |source: csv::Error| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut rdr = ReaderBuilder::new()
        .delimiter(b',')
        .flexible(true)
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(bytes);

    let headers = rdr.headers().map_err(csv_err)?.clone();
    let mut columns = HashMap::with_capacity(headers.len());
    for (i, name) in headers.iter().enumerate() {
        columns.entry(name.to_string()).or_insert(i);
    }

    let mut records = Vec::new();
    for result in rdr.records() {
        let mut raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping unreadable row");
                continue;
            }
        };

        // Skip completely empty lines
        if raw.iter().all(|f| f.is_empty()) {
            continue;
        }
        if raw.len() != headers.len() {
            debug!(
                path = %path.display(),
                line = line_of(&raw),
                expected = headers.len(),
                found = raw.len(),
                "row width differs from header; missing fields default"
            );
        }
        // Short rows are padded so every header has a (possibly empty) field.
        while raw.len() < headers.len() {
            raw.push_field("");
        }
        records.push(raw);
    }

    Ok(Table { headers, columns, records })
}

pub async fn load_fighters(path: &Path, today: NaiveDate) -> Result<Vec<Fighter>> {
    let table = read_table(path).await?;
    let mut out = Vec::with_capacity(table.len());
    for raw in &table.records {
        match raw.deserialize::<RawFighter>(Some(&table.headers)) {
            Ok(rec) if rec.id.trim().is_empty() => {
                warn!(line = line_of(raw), "skipping fighter row without an id");
            }
            Ok(rec) => out.push(normalize_fighter(rec, today)),
            Err(e) => {
                warn!(line = line_of(raw), error = %e, "skipping malformed fighter row");
            }
        }
    }
    info!(path = %path.display(), count = out.len(), "loaded fighters");
    Ok(out)
}

pub async fn load_events(path: &Path) -> Result<Vec<EventRow>> {
    let table = read_table(path).await?;
    let out: Vec<EventRow> = table.rows().map(|row| EventRow::from_row(&row)).collect();
    info!(path = %path.display(), count = out.len(), "loaded event rows");
    Ok(out)
}

pub async fn load_fights(path: &Path) -> Result<Vec<Fight>> {
    let table = read_table(path).await?;
    let out: Vec<Fight> = table.rows().map(|row| Fight::from_row(&row)).collect();
    info!(path = %path.display(), count = out.len(), "loaded fights");
    Ok(out)
}

pub async fn load_bouts(path: &Path) -> Result<Vec<CombinedBout>> {
    let table = read_table(path).await?;
    let out: Vec<CombinedBout> = table.rows().map(|row| CombinedBout::from_row(&row)).collect();
    info!(path = %path.display(), count = out.len(), "loaded combined bout records");
    Ok(out)
}

pub async fn load_locations(path: &Path) -> Result<HashMap<String, Coordinates>> {
    let table = read_table(path).await?;
    let mut out = HashMap::with_capacity(table.len());
    for row in table.rows() {
        match location_from_row(&row) {
            Some((location, coords)) => {
                out.insert(location, coords);
            }
            None => debug!(location = row.text("location"), "skipping location without coordinates"),
        }
    }
    info!(path = %path.display(), count = out.len(), "loaded location coordinates");
    Ok(out)
}
