//! Header-based numeric CSV reader

use crate::error::DatasetError;
use std::fs;
use std::path::Path;

/// Numeric columns keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CsvTable {
    headers: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl CsvTable {
    /// Read and parse a CSV file
    pub fn read(path: &Path) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(path).map_err(|e| DatasetError::io(path, e))?;
        Self::parse(&text, path)
    }

    /// Parse CSV text; `path` is only used in error messages.
    ///
    /// The first non-empty line is the header. An empty cell ends its column,
    /// so shorter columns (e.g. a single `RPM` value) are allowed.
    pub fn parse(text: &str, path: &Path) -> Result<Self, DatasetError> {
        let mut lines = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let headers: Vec<String> = match lines.next() {
            Some((_, line)) => line.split(',').map(|h| unquote(h).to_string()).collect(),
            None => {
                return Err(DatasetError::MalformedCsv {
                    path: path.to_path_buf(),
                    line: 1,
                    reason: "missing header".into(),
                })
            }
        };

        let mut columns = vec![Vec::new(); headers.len()];
        let mut ended = vec![false; headers.len()];

        for (idx, line) in lines {
            let cells: Vec<&str> = line.split(',').collect();
            if cells.len() > headers.len() {
                return Err(DatasetError::MalformedCsv {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: format!("{} cells for {} columns", cells.len(), headers.len()),
                });
            }

            for (col, cell) in cells.iter().enumerate() {
                let cell = unquote(cell);
                if cell.is_empty() {
                    ended[col] = true;
                    continue;
                }
                if ended[col] {
                    return Err(DatasetError::MalformedCsv {
                        path: path.to_path_buf(),
                        line: idx + 1,
                        reason: format!("gap in column {}", headers[col]),
                    });
                }
                let value = cell.parse::<f64>().map_err(|e| DatasetError::MalformedCsv {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    reason: format!("{}: {e}", headers[col]),
                })?;
                columns[col].push(value);
            }
            for flag in ended.iter_mut().skip(cells.len()) {
                *flag = true;
            }
        }

        Ok(Self { headers, columns })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Column with exactly this header
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.headers
            .iter()
            .position(|h| h == name)
            .map(|i| self.columns[i].as_slice())
    }

    /// First column whose header ends with `suffix`
    pub fn column_ending_with(&self, suffix: &str) -> Option<&[f64]> {
        self.headers
            .iter()
            .position(|h| h.ends_with(suffix))
            .map(|i| self.columns[i].as_slice())
    }

    /// Take ownership of a column by exact header
    pub fn take_column(&mut self, name: &str) -> Option<Vec<f64>> {
        let i = self.headers.iter().position(|h| h == name)?;
        Some(std::mem::take(&mut self.columns[i]))
    }

    /// Take ownership of the first column whose header ends with `suffix`
    pub fn take_column_ending_with(&mut self, suffix: &str) -> Option<Vec<f64>> {
        let i = self.headers.iter().position(|h| h.ends_with(suffix))?;
        Some(std::mem::take(&mut self.columns[i]))
    }
}

fn unquote(cell: &str) -> &str {
    cell.trim().trim_matches('"').trim()
}
