//! Conversion between worksheet tables and typed book records.

use std::collections::BTreeMap;

use crate::error::{Result, ToolError};
use crate::model::columns::{
    AUTHOR, DESCRIPTION, DESTINATION, ID, ISBN, OBSERVED, PUBLISHER, QUANTITY, REFERENCE,
    SURNAME, TITLE, URL,
};
use crate::model::{BookRecord, NewBook, ObservedCollection, ReferenceCollection, SheetTable};
use crate::search::build_catalog_url;

/// Suffix given to looked-up columns that clash with existing ones.
pub const INFOS_SUFFIX: &str = "_infos";

/// Describes how the columns of an inventory map onto [`BookRecord`].
#[derive(Debug, Clone, Copy)]
struct Schema {
    required: &'static [&'static str],
    author_column: &'static str,
}

const REFERENCE_SCHEMA: Schema = Schema {
    required: &REFERENCE,
    author_column: AUTHOR,
};

const OBSERVED_SCHEMA: Schema = Schema {
    required: &OBSERVED,
    author_column: SURNAME,
};

/// Builds the reference collection, failing on missing columns.
pub fn reference_from_table(table: &SheetTable, source: &str) -> Result<ReferenceCollection> {
    records_from_table(table, REFERENCE_SCHEMA, source).map(ReferenceCollection::from)
}

/// Builds a want-list, failing on missing columns.
pub fn observed_from_table(table: &SheetTable, source: &str) -> Result<ObservedCollection> {
    records_from_table(table, OBSERVED_SCHEMA, source).map(ObservedCollection::from)
}

fn records_from_table(table: &SheetTable, schema: Schema, source: &str) -> Result<Vec<BookRecord>> {
    let missing = table.missing_columns(schema.required);
    if !missing.is_empty() {
        return Err(ToolError::InvalidWorkbook(format!(
            "{source}: missing required column(s) {}",
            missing.join(", ")
        )));
    }

    let mut records = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let mut record = BookRecord::default();
        for (column, cell) in table.columns.iter().zip(row) {
            let value = cell.trim();
            match column.as_str() {
                ID => record.id = non_empty(value),
                ISBN => record.isbn = non_empty(value),
                TITLE => record.title = value.to_string(),
                PUBLISHER => record.publisher = non_empty(value),
                QUANTITY => record.quantity = parse_quantity(value)?,
                DESTINATION => record.destination = non_empty(value),
                name if name == schema.author_column => record.author = value.to_string(),
                "" => {}
                name => {
                    record.extra.insert(name.to_string(), value.to_string());
                }
            }
        }
        records.push(record);
    }
    Ok(records)
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn parse_quantity(value: &str) -> Result<u32> {
    if value.is_empty() {
        return Ok(0);
    }
    if let Ok(quantity) = value.parse::<u32>() {
        return Ok(quantity);
    }
    match value.parse::<f64>() {
        Ok(number) if number >= 0.0 && number.fract() == 0.0 && number <= f64::from(u32::MAX) => {
            Ok(number as u32)
        }
        _ => Err(ToolError::InvalidLiteral {
            column: QUANTITY.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Reads back the cell of `column` for a record loaded with `author_column`.
fn record_value(record: &BookRecord, column: &str, author_column: &str) -> String {
    let optional = |value: &Option<String>| value.clone().unwrap_or_default();
    match column {
        ID => optional(&record.id),
        ISBN => optional(&record.isbn),
        TITLE => record.title.clone(),
        PUBLISHER => optional(&record.publisher),
        QUANTITY => record.quantity.to_string(),
        DESTINATION => optional(&record.destination),
        name if name == author_column => record.author.clone(),
        name => record.extra.get(name).cloned().unwrap_or_default(),
    }
}

/// Rows already held, with the number of copies still missing.
pub fn existing_table(sheet_name: &str, records: &[BookRecord]) -> SheetTable {
    let columns = [ID, TITLE, QUANTITY, DESTINATION];
    let mut table = SheetTable::new(sheet_name, to_strings(&columns));
    table.rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| record_value(record, column, AUTHOR))
                .collect()
        })
        .collect();
    table
}

/// New titles with the columns of the want-list they came from plus `URL`.
pub fn new_books_table(sheet_name: &str, source_columns: &[String], books: &[NewBook]) -> SheetTable {
    let mut columns: Vec<String> = source_columns
        .iter()
        .filter(|column| !column.is_empty() && column.as_str() != URL)
        .cloned()
        .collect();
    columns.push(URL.to_string());

    let mut table = SheetTable::new(sheet_name, columns);
    table.rows = books
        .iter()
        .map(|book| {
            table
                .columns
                .iter()
                .map(|column| {
                    if column == URL {
                        book.url.clone()
                    } else {
                        record_value(&book.record, column, SURNAME)
                    }
                })
                .collect()
        })
        .collect();
    table
}

/// Column layout of resolved book information.
pub fn info_columns() -> Vec<String> {
    to_strings(&[ISBN, TITLE, AUTHOR, PUBLISHER, URL, DESCRIPTION])
}

/// One row per resolved record; placeholders keep only their ISBN.
pub fn book_info_table(sheet_name: &str, records: &[BookRecord]) -> SheetTable {
    let mut table = SheetTable::new(sheet_name, info_columns());
    table.rows = records.iter().map(info_row).collect();
    table
}

fn info_row(record: &BookRecord) -> Vec<String> {
    let isbn = record
        .identifier
        .clone()
        .or_else(|| record.isbn.clone())
        .unwrap_or_default();
    let url = if record.is_empty() || isbn.is_empty() {
        String::new()
    } else {
        build_catalog_url(&isbn)
    };
    vec![
        isbn,
        record.title.clone(),
        record.author.clone(),
        record.publisher.clone().unwrap_or_default(),
        url,
        record.description.clone().unwrap_or_default(),
    ]
}

/// Appends resolved information to the rows of `table`, keyed by row index.
///
/// Rows without an entry in `infos` are dropped. Looked-up columns whose name
/// already exists in `table` receive the [`INFOS_SUFFIX`].
pub fn join_infos(
    table: &SheetTable,
    sheet_name: &str,
    infos: &BTreeMap<usize, BookRecord>,
) -> SheetTable {
    let mut columns = table.columns.clone();
    for column in info_columns() {
        if table.column_index(&column).is_some() {
            columns.push(format!("{column}{INFOS_SUFFIX}"));
        } else {
            columns.push(column);
        }
    }

    let mut joined = SheetTable::new(sheet_name, columns);
    for (idx, record) in infos {
        if let Some(row) = table.rows.get(*idx) {
            let mut cells = row.clone();
            cells.resize(table.columns.len(), String::new());
            cells.extend(info_row(record));
            joined.rows.push(cells);
        }
    }
    joined
}

/// Makes `raw` acceptable as an Excel sheet name.
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Sheet".to_string();
    }

    sanitized.chars().take(31).collect()
}

fn to_strings(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|column| column.to_string()).collect()
}
