use crate::error::{GeocodeError, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// A CSV file held in memory as text cells.
///
/// Cells are kept exactly as read so that untouched columns are written back
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows with empty cells.
    ///
    /// A row with more cells than there are headers is an error: the extra
    /// cells would have no column to be written back under.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let width = headers.len();
        let mut padded = Vec::with_capacity(rows.len());
        for (i, mut row) in rows.into_iter().enumerate() {
            if row.len() > width {
                return Err(GeocodeError::Table(format!(
                    "row {} has {} cells but the header has {} columns",
                    i + 1,
                    row.len(),
                    width
                )));
            }
            row.resize(width, String::new());
            padded.push(row);
        }
        Ok(Self {
            headers,
            rows: padded,
        })
    }

    /// Read comma-delimited text with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(headers, rows)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        log::info!(
            "Loaded {} rows with {} columns from {}",
            table.len(),
            table.headers.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cells of one column in row order
    pub fn column(&self, name: &str) -> Option<impl Iterator<Item = &str> + '_> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }

    /// Copy of the first `n` rows, for showing the operator what was loaded
    pub fn preview(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Add a column at the right edge. Missing values are written as empty cells.
    pub fn append_column(&mut self, name: &str, values: Vec<Option<String>>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(GeocodeError::Table(format!(
                "column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        self.headers.push(name.to_string());
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value.unwrap_or_default());
        }
        Ok(())
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn to_path(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.to_writer(file)?;
        log::info!("Wrote {} rows to {}", self.len(), path.display());
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.to_writer(&mut buf)?;
        String::from_utf8(buf).map_err(|e| GeocodeError::Table(e.to_string()))
    }
}
