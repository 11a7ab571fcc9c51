use std::collections::BTreeMap;
use std::fs;

use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::{Result, ToolError};
use crate::io::excel_read;
use crate::io::excel_write;
use crate::lookup::{MetadataService, Resolver};
use crate::model::columns::ISBN;
use crate::model::{
    BookRecord, LookupOutcome, ObservedCollection, ReconciliationResult, ReferenceCollection,
    SheetTable,
};
use crate::reconcile::reconcile;
use crate::tables::{self, INFOS_SUFFIX};

/// Export name of the titles already held.
pub const EXISTING_BOOKS: &str = "existing_books";
/// Export name of the titles missing from the reference collection.
pub const NEW_BOOKS: &str = "new_books";

/// Loads the reference inventory from the output directory.
#[instrument(level = "info", skip_all, fields(file = %config.reference_file))]
pub fn fetch_reference_database(config: &Config) -> Result<ReferenceCollection> {
    let path = config.workbook_path(&config.reference_file);
    let table = excel_read::read_table(&path)?;
    let reference = tables::reference_from_table(&table, &path.display().to_string())?;
    info!(records = reference.records.len(), "reference database loaded");
    Ok(reference)
}

/// Loads the want-list and the column order of its sheet.
#[instrument(level = "info", skip_all, fields(file = %config.observed_file))]
pub fn load_observed(config: &Config) -> Result<(ObservedCollection, Vec<String>)> {
    let path = config.workbook_path(&config.observed_file);
    let table = excel_read::read_table(&path)?;
    let observed = tables::observed_from_table(&table, &path.display().to_string())?;
    info!(records = observed.records.len(), "want-list loaded");
    Ok((observed, table.columns))
}

/// Reconciles the want-list against the reference and exports both sides as
/// `existing_books.xlsx` and `new_books.xlsx`.
#[instrument(
    level = "info",
    skip_all,
    fields(reference = reference.records.len(), observed = observed.records.len())
)]
pub fn compare_with_reference(
    config: &Config,
    reference: &ReferenceCollection,
    observed: &ObservedCollection,
    observed_columns: &[String],
) -> Result<ReconciliationResult> {
    let result = reconcile(reference, observed);
    info!(
        existing = result.existing.len(),
        new = result.new.len(),
        "comparison with reference database completed"
    );

    let existing = tables::existing_table(EXISTING_BOOKS, &result.existing);
    let new = tables::new_books_table(NEW_BOOKS, observed_columns, &result.new);
    export_table(config, EXISTING_BOOKS, &existing)?;
    export_table(config, NEW_BOOKS, &new)?;
    Ok(result)
}

/// Resolves every ISBN. Failed lookups yield a placeholder holding only the
/// ISBN so that the output keeps one record per input.
#[instrument(level = "info", skip_all, fields(count = isbns.len()))]
pub async fn fetch_book_info_from_isbn<S: MetadataService>(
    resolver: &Resolver<S>,
    isbns: &[String],
) -> Result<Vec<BookRecord>> {
    let outcomes = resolver.resolve_identifiers(isbns).await?;
    Ok(isbns
        .iter()
        .zip(outcomes)
        .map(|(isbn, outcome)| match outcome {
            LookupOutcome::Resolved(record) => record,
            LookupOutcome::NotFound | LookupOutcome::Failed(_) => BookRecord::placeholder(isbn),
        })
        .collect())
}

/// Searches the ISBN of each `(title, author)` pair, expands them to every
/// edition, and resolves the information of each edition.
///
/// Records are sorted by title; unresolved placeholders come last. When
/// `filename_out` is set the records are exported under that name.
#[instrument(level = "info", skip_all, fields(count = queries.len()))]
pub async fn fetch_book_infos<S: MetadataService>(
    config: &Config,
    resolver: &Resolver<S>,
    queries: &[(String, String)],
    filename_out: Option<&str>,
) -> Result<Vec<BookRecord>> {
    let isbns: Vec<String> = resolver
        .resolve_texts(queries)
        .await?
        .into_iter()
        .filter_map(LookupOutcome::resolved)
        .collect();
    debug!(isbns = ?isbns, "ISBNs found");

    let editions = resolver.expand_all(&isbns).await?;
    let mut records = fetch_book_info_from_isbn(resolver, &editions).await?;
    records.sort_by(|lhs, rhs| {
        lhs.title
            .is_empty()
            .cmp(&rhs.title.is_empty())
            .then_with(|| lhs.title.cmp(&rhs.title))
    });
    info!(records = records.len(), "research and data retrieval completed");

    if let Some(name) = filename_out {
        let table = tables::book_info_table(name, &records);
        export_table(config, name, &table)?;
    }
    Ok(records)
}

/// Looks up every ISBN of the workbook `filename` and writes the rows that
/// resolved, extended with the catalogue data, to `{filename}_infos.xlsx`.
#[instrument(level = "info", skip_all, fields(file = %filename))]
pub async fn check_book_list<S: MetadataService>(
    config: &Config,
    resolver: &Resolver<S>,
    filename: &str,
) -> Result<SheetTable> {
    let path = config.workbook_path(filename);
    let table = excel_read::read_table(&path)?;
    let isbn_idx = table.column_index(ISBN).ok_or_else(|| {
        ToolError::InvalidWorkbook(format!(
            "{}: missing required column(s) {ISBN}",
            path.display()
        ))
    })?;

    let isbns: Vec<String> = table
        .rows
        .iter()
        .map(|row| row.get(isbn_idx).cloned().unwrap_or_default())
        .collect();
    let outcomes = resolver.resolve_identifiers(&isbns).await?;
    let infos: BTreeMap<usize, BookRecord> = outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(idx, outcome)| outcome.resolved().map(|record| (idx, record)))
        .collect();
    info!(rows = table.rows.len(), resolved = infos.len(), "book list checked");

    let name = format!("{filename}{INFOS_SUFFIX}");
    let joined = tables::join_infos(&table, &name, &infos);
    export_table(config, &name, &joined)?;
    Ok(joined)
}

/// Writes `table` to `{output_dir}/{name}.xlsx`, replacing the file.
pub fn export_table(config: &Config, name: &str, table: &SheetTable) -> Result<()> {
    fs::create_dir_all(&config.output_dir)?;
    let path = config.workbook_path(name);
    let mut table = table.clone();
    table.sheet_name = tables::sanitize_sheet_name(&table.sheet_name);
    excel_write::write_table(&path, &table)
}
