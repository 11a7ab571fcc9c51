use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::SheetTable;

/// Reads the first worksheet of a workbook. The first row holds the column
/// names; fully empty rows are skipped.
pub fn read_table(path: &Path) -> Result<SheetTable> {
    if !path.exists() {
        return Err(ToolError::MissingInput(path.to_path_buf()));
    }
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("{}: no worksheet", path.display())))?;
    let range = read_required_sheet(&mut workbook, &sheet_name)?;
    let table = range_to_table(&sheet_name, &range);
    debug!(
        path = %path.display(),
        sheet = %table.sheet_name,
        rows = table.rows.len(),
        "worksheet loaded"
    );
    Ok(table)
}

fn read_required_sheet<R: std::io::Read + std::io::Seek>(
    workbook: &mut Xlsx<R>,
    name: &str,
) -> Result<calamine::Range<DataType>> {
    let range_result = workbook
        .worksheet_range(name)
        .ok_or_else(|| ToolError::InvalidWorkbook(format!("missing sheet '{name}'")))?;
    let range = range_result.map_err(ToolError::from)?;
    Ok(range)
}

fn range_to_table(sheet_name: &str, range: &calamine::Range<DataType>) -> SheetTable {
    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell_to_string(Some(cell)).trim().to_string())
            .collect(),
        None => Vec::new(),
    };

    let mut table = SheetTable::new(sheet_name, columns);
    for row in rows {
        let cells: Vec<String> = (0..table.columns.len())
            .map(|idx| cell_to_string(row.get(idx)))
            .collect();
        if cells.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        table.rows.push(cells);
    }
    table
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
