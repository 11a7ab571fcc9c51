use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::info;

use crate::error::Result;
use crate::model::SheetTable;

/// Writes the table as the single worksheet of a new workbook at `path`,
/// replacing any existing file.
pub fn write_table(path: &Path, table: &SheetTable) -> Result<()> {
    let mut workbook_writer = Workbook::new();

    let worksheet = workbook_writer.add_worksheet();
    worksheet.set_name(&table.sheet_name)?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in table.rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            if cell.is_empty() {
                continue;
            }
            worksheet.write_string((row_idx + 1) as u32, col_idx as u16, cell)?;
        }
    }

    if !table.columns.is_empty() {
        let col_end = (table.columns.len() as u16).saturating_sub(1);
        worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
    }

    workbook_writer.save(path)?;
    info!(path = %path.display(), rows = table.rows.len(), "workbook exported");
    Ok(())
}
