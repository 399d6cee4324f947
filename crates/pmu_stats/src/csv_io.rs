use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use log::debug;

use crate::error::{Error, Result};
use crate::table::{Cell, Table};

/// Loads a table from a CSV file with a header row.
///
/// `index_column` names the header column holding the row labels; every other
/// header column becomes a table column, verbatim and in file order.
///
/// # Errors
///
/// * [`Error::MissingInput`] if `path` does not exist
/// * [`Error::MissingIndexColumn`] if the header lacks `index_column`
/// * [`Error::InvalidCell`] if a non-empty cell is not numeric
pub fn load_table(path: &Path, index_column: &str) -> Result<Table> {
    if !path.exists() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let table = read_table(File::open(path)?, index_column)?;
    debug!(
        "Loaded {} rows and {} columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

pub fn read_table<R: Read>(reader: R, index_column: &str) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let index = headers
        .iter()
        .position(|header| header == index_column)
        .ok_or_else(|| Error::MissingIndexColumn(index_column.to_string()))?;

    let columns: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, header)| header.to_string())
        .collect();
    let mut table = Table::new(index_column, columns.clone());

    for record in reader.records() {
        let record = record?;
        let label = record.get(index).unwrap_or_default().to_string();

        let mut cells = Vec::with_capacity(columns.len());
        let values = record
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, value)| value);
        for (column, value) in columns.iter().zip(values) {
            if value.trim().is_empty() {
                cells.push(None);
                continue;
            }
            let cell = Cell::parse(value).ok_or_else(|| Error::InvalidCell {
                row: label.clone(),
                column: column.clone(),
                value: value.to_string(),
            })?;
            cells.push(Some(cell));
        }

        table.push_row(label, cells);
    }

    Ok(table)
}

/// Writes `table` as CSV: the index column first, absent cells left empty.
pub fn write_table<W: Write>(writer: W, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    let mut header = vec![table.index_name()];
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in table.rows() {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(row.label.clone());
        record.extend(
            row.cells
                .iter()
                .map(|cell| cell.map(|cell| cell.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes `table` to a CSV file at `path`, replacing any existing file.
pub fn save_table(path: &Path, table: &Table) -> Result<()> {
    write_table(File::create(path)?, table)?;
    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_pmu_output;
    use crate::rates::add_miss_rates;

    const RESULTS: &str = "\
workload,instructions,l1i_ref,l1i_miss,l1d_ref,l1d_miss,llc_miss,cycles
idle,1000,500,50,400,40,4,2000
stream,10,0,0,0,,1,20
";

    #[test]
    fn test_read_table() {
        let table = read_table(RESULTS.as_bytes(), "workload").unwrap();

        assert_eq!(table.index_name(), "workload");
        assert_eq!(
            table.columns(),
            &["instructions", "l1i_ref", "l1i_miss", "l1d_ref", "l1d_miss", "llc_miss", "cycles"]
        );
        assert_eq!(table.labels().collect::<Vec<_>>(), vec!["idle", "stream"]);
        assert_eq!(table.cell("idle", "cycles"), Some(Cell::Int(2000)));
        assert_eq!(table.cell("stream", "l1d_miss"), None);
    }

    #[test]
    fn test_index_column_anywhere() {
        let text = "cycles,workload\n7,a\n";
        let table = read_table(text.as_bytes(), "workload").unwrap();

        assert_eq!(table.columns(), &["cycles"]);
        assert_eq!(table.cell("a", "cycles"), Some(Cell::Int(7)));
    }

    #[test]
    fn test_missing_index_column() {
        let result = read_table(RESULTS.as_bytes(), "phase");
        assert!(matches!(result, Err(Error::MissingIndexColumn(name)) if name == "phase"));
    }

    #[test]
    fn test_invalid_cell() {
        let text = "workload,cycles\na,lots\n";
        match read_table(text.as_bytes(), "workload") {
            Err(Error::InvalidCell { row, column, value }) => {
                assert_eq!(row, "a");
                assert_eq!(column, "cycles");
                assert_eq!(value, "lots");
            }
            other => panic!("Expected InvalidCell, got {:?}", other),
        }
    }

    #[test]
    fn test_non_finite_cell_is_invalid() {
        let text = "workload,cycles,l1d_miss_rate\na,10,inf\n";
        match read_table(text.as_bytes(), "workload") {
            Err(Error::InvalidCell { row, column, value }) => {
                assert_eq!(row, "a");
                assert_eq!(column, "l1d_miss_rate");
                assert_eq!(value, "inf");
            }
            other => panic!("Expected InvalidCell, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.csv");

        let result = load_table(&path, "workload");
        assert!(matches!(result, Err(Error::MissingInput(missing)) if missing == path));
    }

    #[test]
    fn test_round_trip_keeps_labels_and_raw_columns() {
        let sections = parse_pmu_output(
            "\
==== PMU statistics for sequential ====
instructions: 1000
l1i_ref: 500
l1d_ref: 3
l1d_miss: 1
==== PMU statistics for random ====
instructions: 2000
cycles: 9
",
        )
        .unwrap();
        let mut table = Table::from_sections("phase", &sections);
        add_miss_rates(&mut table);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("random_results.csv");
        save_table(&path, &table).unwrap();
        let reloaded = load_table(&path, "phase").unwrap();

        assert_eq!(reloaded.columns(), table.columns());
        assert_eq!(
            reloaded.labels().collect::<Vec<_>>(),
            table.labels().collect::<Vec<_>>()
        );
        for column in ["instructions", "l1i_ref", "l1d_ref", "l1d_miss", "cycles"] {
            for label in ["sequential", "random"] {
                assert_eq!(reloaded.cell(label, column), table.cell(label, column));
            }
        }
        let rate = reloaded.value("sequential", "l1d_miss_rate").unwrap();
        assert!((rate - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_write_table() {
        let table = read_table(RESULTS.as_bytes(), "workload").unwrap();
        let mut out = Vec::new();
        write_table(&mut out, &table).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), RESULTS);
    }
}
