use std::collections::BTreeSet;
use std::fmt;

use log::debug;

use crate::metric::Metric;
use crate::section::Sections;

/// A single numeric table value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
}

impl Cell {
    /// Reads a cell from its textual form, preferring integers.
    ///
    /// Infinities and NaN are rejected.
    pub fn parse(text: &str) -> Option<Cell> {
        let text = text.trim();
        if let Ok(value) = text.parse::<i64>() {
            return Some(Cell::Int(value));
        }
        text.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Cell::Float)
    }

    pub fn as_f64(self) -> f64 {
        match self {
            Cell::Int(value) => value as f64,
            Cell::Float(value) => value,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Int(value) => write!(f, "{}", value),
            Cell::Float(value) => write!(f, "{}", value),
        }
    }
}

/// One labelled row; `cells` is parallel to the table's columns
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub label: String,
    pub cells: Vec<Option<Cell>>,
}

/// Which metrics each section actually reported.
///
/// Built once when sections become a table, so that a metric the benchmark
/// never printed can be told apart from one that printed zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    columns: Vec<Metric>,
    rows: Vec<(String, BTreeSet<Metric>)>,
}

impl Schema {
    pub fn infer(sections: &Sections) -> Self {
        let mut columns = Vec::new();
        let mut rows = Vec::with_capacity(sections.len());

        for section in sections {
            for metric in section.metrics.keys() {
                if !columns.contains(metric) {
                    columns.push(*metric);
                }
            }
            rows.push((
                section.label.clone(),
                section.metrics.keys().copied().collect(),
            ));
        }

        Self { columns, rows }
    }

    /// Union of reported metrics, in the order they were first seen
    pub fn columns(&self) -> &[Metric] {
        &self.columns
    }

    pub fn is_present(&self, label: &str, metric: Metric) -> bool {
        self.rows
            .iter()
            .any(|(row, present)| row == label && present.contains(&metric))
    }

    /// (label, metric) pairs that are columns of the table but were never
    /// reported for that row
    pub fn missing(&self) -> Vec<(&str, Metric)> {
        let mut missing = Vec::new();
        for (label, present) in &self.rows {
            for metric in &self.columns {
                if !present.contains(metric) {
                    missing.push((label.as_str(), *metric));
                }
            }
        }
        missing
    }
}

/// Rows of counter values indexed by phase or workload label
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index_name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(index_name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index_name: index_name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Lays out parsed sections as rows, one column per reported metric.
    pub fn from_sections(index_name: impl Into<String>, sections: &Sections) -> Self {
        let schema = Schema::infer(sections);
        for (label, metric) in schema.missing() {
            debug!("Section '{}' did not report {}", label, metric);
        }

        let columns = schema
            .columns()
            .iter()
            .map(|metric| metric.name().to_string())
            .collect();
        let mut table = Table::new(index_name, columns);

        for section in sections {
            let cells = schema
                .columns()
                .iter()
                .map(|metric| section.get(*metric).map(Cell::Int))
                .collect();
            table.push_row(section.label.clone(), cells);
        }

        table
    }

    pub fn index_name(&self) -> &str {
        &self.index_name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Returns the index of `name`, appending an empty column if needed
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.cells.push(None);
        }
        self.columns.len() - 1
    }

    /// Appends a row, or replaces the cells of an existing row with the
    /// same label in place.
    ///
    /// `cells` is padded or truncated to the number of columns.
    pub fn push_row(&mut self, label: String, mut cells: Vec<Option<Cell>>) {
        cells.resize(self.columns.len(), None);
        match self.rows.iter().position(|row| row.label == label) {
            Some(index) => self.rows[index].cells = cells,
            None => self.rows.push(Row { label, cells }),
        }
    }

    pub fn cell(&self, label: &str, column: &str) -> Option<Cell> {
        let column = self.column_index(column)?;
        let row = self.rows.iter().find(|row| row.label == label)?;
        row.cells[column]
    }

    pub fn value(&self, label: &str, column: &str) -> Option<f64> {
        self.cell(label, column).map(Cell::as_f64)
    }

    pub(crate) fn set(&mut self, row: usize, column: usize, cell: Cell) {
        self.rows[row].cells[column] = Some(cell);
    }

    /// Value of `column` in row `row`, reading an absent cell or column as 0
    fn value_or_zero(&self, row: usize, column: &str) -> f64 {
        self.column_index(column)
            .and_then(|index| self.rows[row].cells[index])
            .map_or(0.0, Cell::as_f64)
    }

    /// Every value of `column` in row order, absent cells read as 0
    pub fn column_or_zero(&self, column: &str) -> Vec<f64> {
        (0..self.rows.len())
            .map(|row| self.value_or_zero(row, column))
            .collect()
    }

    /// (label, column) pairs without a value
    pub fn missing_cells(&self) -> Vec<(&str, &str)> {
        let mut missing = Vec::new();
        for row in &self.rows {
            for (column, cell) in self.columns.iter().zip(&row.cells) {
                if cell.is_none() {
                    missing.push((row.label.as_str(), column.as_str()));
                }
            }
        }
        missing
    }
}

impl fmt::Display for Table {
    /// Renders the table as right-aligned text columns, absent cells as NaN
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .map(|cell| match cell {
                        Some(Cell::Int(value)) => value.to_string(),
                        Some(Cell::Float(value)) => format!("{:.6}", value),
                        None => "NaN".to_string(),
                    })
                    .collect()
            })
            .collect();

        let label_width = self
            .rows
            .iter()
            .map(|row| row.label.len())
            .chain(std::iter::once(self.index_name.len()))
            .max()
            .unwrap_or(0);
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                rendered
                    .iter()
                    .map(|cells| cells[index].len())
                    .chain(std::iter::once(column.len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        write!(f, "{:<width$}", self.index_name, width = label_width)?;
        for (column, width) in self.columns.iter().zip(&widths) {
            write!(f, "  {:>width$}", column, width = width)?;
        }
        writeln!(f)?;

        for (row, cells) in self.rows.iter().zip(&rendered) {
            write!(f, "{:<width$}", row.label, width = label_width)?;
            for (cell, width) in cells.iter().zip(&widths) {
                write!(f, "  {:>width$}", cell, width = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
