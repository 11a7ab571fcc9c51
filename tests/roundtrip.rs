use book_infos::ToolError;
use book_infos::config::Config;
use book_infos::io::excel_read;
use book_infos::io::excel_write;
use book_infos::model::SheetTable;
use book_infos::pipeline;
use tempfile::tempdir;

fn sheet(columns: &[&str], rows: &[&[&str]]) -> SheetTable {
    let mut table = SheetTable::new(
        "Sheet1",
        columns.iter().map(|column| column.to_string()).collect(),
    );
    table.rows = rows
        .iter()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();
    table
}

fn config_in(dir: &std::path::Path) -> Config {
    Config {
        output_dir: dir.to_path_buf(),
        reference_file: "reference".to_string(),
        observed_file: "wants".to_string(),
        ..Config::default()
    }
}

#[test]
fn excel_roundtrip_preserves_table() {
    let table = sheet(
        &["Titre", "Nom", "Nombre"],
        &[&["Le Petit Prince", "Saint-Exupéry", "2"], &["Dune", "", "1"]],
    );
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("books.xlsx");

    excel_write::write_table(&path, &table).expect("Excel written");
    let restored = excel_read::read_table(&path).expect("Excel read");

    assert_eq!(table, restored);
}

#[test]
fn compare_exports_existing_and_new_books() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());

    let reference = sheet(
        &["id", "ISBN", "Titre", "Editeur", "Auteur", "Nombre"],
        &[
            &["1", "9780441172719", "Dune", "Ace", "Frank Herbert", "2"],
            &["2", "", "L'Étranger", "Gallimard", "Albert Camus", "1"],
        ],
    );
    let wants = sheet(
        &["Titre", "Nom", "Prénom", "Nombre", "Destination"],
        &[
            &["dune", "Herbert", "Frank", "5", "Salon"],
            &["Le Petit Prince", "Saint-Exupéry", "Antoine", "1", "Chambre"],
            &["L'etranger", "Camus", "Albert", "1", "Bureau"],
        ],
    );
    excel_write::write_table(&config.workbook_path("reference"), &reference)
        .expect("reference written");
    excel_write::write_table(&config.workbook_path("wants"), &wants).expect("wants written");

    let reference = pipeline::fetch_reference_database(&config).expect("reference loaded");
    let (observed, columns) = pipeline::load_observed(&config).expect("want-list loaded");
    let result = pipeline::compare_with_reference(&config, &reference, &observed, &columns)
        .expect("comparison");
    assert_eq!(result.existing.len(), 1);
    assert_eq!(result.new.len(), 1);

    let existing = excel_read::read_table(&config.workbook_path(pipeline::EXISTING_BOOKS))
        .expect("existing_books read");
    assert_eq!(existing.columns, vec!["id", "Titre", "Nombre", "Destination"]);
    assert_eq!(existing.rows, vec![vec!["1", "Dune", "3", "Salon"]]);

    let new = excel_read::read_table(&config.workbook_path(pipeline::NEW_BOOKS))
        .expect("new_books read");
    assert_eq!(
        new.columns,
        vec!["Titre", "Nom", "Prénom", "Nombre", "Destination", "URL"]
    );
    assert_eq!(new.rows.len(), 1);
    assert_eq!(new.rows[0][0], "Le Petit Prince");
    assert!(new.rows[0][5].contains("Search=Le+Petit+Prince+Saint-Exupéry+poche&sft=1&sa=0"));
}

#[test]
fn reference_without_required_columns_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let reference = sheet(&["Titre", "Nombre"], &[&["Dune", "1"]]);
    excel_write::write_table(&config.workbook_path("reference"), &reference)
        .expect("reference written");

    let error = pipeline::fetch_reference_database(&config).unwrap_err();
    match error {
        ToolError::InvalidWorkbook(message) => {
            assert!(message.contains("reference.xlsx"));
            assert!(message.contains("Auteur"));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn missing_reference_file_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_in(temp_dir.path());
    let error = pipeline::fetch_reference_database(&config).unwrap_err();
    assert!(matches!(error, ToolError::MissingInput(_)));
}
