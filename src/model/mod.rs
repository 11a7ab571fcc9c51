use std::collections::BTreeMap;

/// Column labels used by the inventory spreadsheets.
pub mod columns {
    pub const ID: &str = "id";
    pub const ISBN: &str = "ISBN";
    pub const TITLE: &str = "Titre";
    pub const PUBLISHER: &str = "Editeur";
    pub const AUTHOR: &str = "Auteur";
    pub const QUANTITY: &str = "Nombre";
    pub const SURNAME: &str = "Nom";
    pub const DESTINATION: &str = "Destination";
    pub const URL: &str = "URL";
    pub const DESCRIPTION: &str = "description";

    /// Columns a reference inventory must carry.
    pub const REFERENCE: [&str; 6] = [ID, ISBN, TITLE, PUBLISHER, AUTHOR, QUANTITY];
    /// Columns a want-list must carry.
    pub const OBSERVED: [&str; 4] = [TITLE, SURNAME, QUANTITY, DESTINATION];
}

/// Metadata for a single work, either read from an inventory row or produced
/// by a catalogue lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookRecord {
    /// Row identifier of the reference inventory.
    pub id: Option<String>,
    /// Canonical ISBN-13 when the record comes from a lookup.
    pub identifier: Option<String>,
    /// ISBN as written in the source sheet.
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    pub publisher: Option<String>,
    pub description: Option<String>,
    /// Copies owned (reference) or wanted (observed).
    pub quantity: u32,
    /// Output routing of a want-list row.
    pub destination: Option<String>,
    /// Any other column of the source sheet, kept for write-back.
    pub extra: BTreeMap<String, String>,
}

impl BookRecord {
    /// Creates a record with the given title and author.
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// An empty record standing in for a failed lookup of `isbn`.
    pub fn placeholder(isbn: impl Into<String>) -> Self {
        Self {
            isbn: Some(isbn.into()),
            ..Self::default()
        }
    }

    /// Whether the record carries any catalogue data.
    pub fn is_empty(&self) -> bool {
        self.identifier.is_none() && self.title.is_empty()
    }
}

/// The system of record, e.g. the books already on the shelves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceCollection {
    pub records: Vec<BookRecord>,
}

/// A want-list to reconcile against the reference collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservedCollection {
    pub records: Vec<BookRecord>,
}

impl From<Vec<BookRecord>> for ReferenceCollection {
    fn from(records: Vec<BookRecord>) -> Self {
        Self { records }
    }
}

impl From<Vec<BookRecord>> for ObservedCollection {
    fn from(records: Vec<BookRecord>) -> Self {
        Self { records }
    }
}

/// Observed record that has no counterpart in the reference collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub record: BookRecord,
    /// Retail search link built from title and author.
    pub url: String,
}

/// Output of a reconciliation run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconciliationResult {
    /// Known titles with the number of copies still missing.
    pub existing: Vec<BookRecord>,
    /// Titles absent from the reference collection.
    pub new: Vec<NewBook>,
}

/// Result of resolving one batch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome<T> {
    Resolved(T),
    /// The catalogue has no answer; not an error.
    NotFound,
    /// The lookup failed; the batch carried on.
    Failed(String),
}

impl<T> LookupOutcome<T> {
    pub fn resolved(self) -> Option<T> {
        match self {
            LookupOutcome::Resolved(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, LookupOutcome::Failed(_))
    }
}

/// A table that is read from or materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    pub fn new(sheet_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Position of `column`, if present.
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Lists the entries of `required` that are not columns of the table.
    pub fn missing_columns<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|column| self.column_index(column).is_none())
            .collect()
    }
}
