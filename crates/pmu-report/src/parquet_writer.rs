use std::io::Write;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use arrow_array::builder::{Float64Builder, Int64Builder, StringBuilder};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use parquet::arrow::arrow_writer::ArrowWriter;
use pmu_stats::{Cell, Table};

/// Writes an aggregated PMU table to a Parquet file
pub struct ParquetWriter<W: Write + Send> {
    writer: ArrowWriter<W>,
    schema: SchemaRef,
}

impl<W: Write + Send> ParquetWriter<W> {
    /// Creates a writer whose schema follows `table`'s columns.
    ///
    /// The label column is Utf8. A column holding only integers is Int64,
    /// anything else is Float64. Metric columns are nullable.
    pub fn new(writer: W, table: &Table) -> Result<Self> {
        // Label first, then one field per table column
        let mut fields = vec![Field::new(table.index_name(), DataType::Utf8, false)];
        for (index, column) in table.columns().iter().enumerate() {
            fields.push(Field::new(column, column_type(table, index), true));
        }
        let schema = Arc::new(Schema::new(fields));

        let arrow_writer = ArrowWriter::try_new(writer, schema.clone(), None)
            .map_err(|e| anyhow!("Failed to create Arrow writer: {}", e))?;

        Ok(Self {
            writer: arrow_writer,
            schema,
        })
    }

    /// Writes every row of `table` as one record batch
    pub fn write(&mut self, table: &Table) -> Result<()> {
        let batch = self.table_to_batch(table)?;

        // Write batch
        self.writer
            .write(&batch)
            .map_err(|e| anyhow!("Failed to write batch to Parquet: {}", e))?;

        Ok(())
    }

    /// Closes the writer, finishing the Parquet file
    pub fn close(self) -> Result<()> {
        self.writer
            .close()
            .map(|_| ())
            .map_err(|e| anyhow!("Failed to close Parquet writer: {}", e))
    }

    fn table_to_batch(&self, table: &Table) -> Result<RecordBatch> {
        let rows = table.len();

        // Row labels
        let mut label_builder = StringBuilder::with_capacity(rows, rows * 16);
        for label in table.labels() {
            label_builder.append_value(label);
        }

        // Metric columns, absent cells as nulls
        let mut arrays: Vec<ArrayRef> = vec![Arc::new(label_builder.finish())];
        for (index, field) in self.schema.fields().iter().skip(1).enumerate() {
            let cells = table.rows().iter().map(|row| row.cells[index]);
            let array: ArrayRef = match field.data_type() {
                DataType::Int64 => {
                    let mut builder = Int64Builder::with_capacity(rows);
                    for cell in cells {
                        match cell {
                            Some(Cell::Int(value)) => builder.append_value(value),
                            _ => builder.append_null(),
                        }
                    }
                    Arc::new(builder.finish())
                }
                _ => {
                    let mut builder = Float64Builder::with_capacity(rows);
                    for cell in cells {
                        builder.append_option(cell.map(Cell::as_f64));
                    }
                    Arc::new(builder.finish())
                }
            };
            arrays.push(array);
        }

        RecordBatch::try_new(self.schema.clone(), arrays)
            .map_err(|e| anyhow!("Failed to create RecordBatch: {}", e))
    }
}

fn column_type(table: &Table, index: usize) -> DataType {
    let all_ints = table
        .rows()
        .iter()
        .all(|row| !matches!(row.cells[index], Some(Cell::Float(_))));
    let rate = pmu_stats::MissRate::ALL
        .iter()
        .any(|rate| rate.name() == table.columns()[index]);

    if all_ints && !rate {
        DataType::Int64
    } else {
        DataType::Float64
    }
}
