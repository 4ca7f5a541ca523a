//! Loading finite series from CSV, JSON or plain text files.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Error type for data loading operations.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read file: {0}")]
    ReadError(String),

    #[error("Failed to parse CSV: {0}")]
    CsvError(String),

    #[error("Failed to parse JSON: {0}")]
    JsonError(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("No numeric data found in file")]
    NoNumericData,
}

/// Load values from a file, picking the format from its extension.
///
/// Unknown extensions are read as whitespace- or comma-separated numbers.
pub fn load_values(path: &Path, column: Option<&str>) -> Result<Vec<f64>, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path, column),
        "json" => load_json(path, column),
        _ => load_plain(path),
    }
}

/// Load one column of a CSV file with headers.
///
/// The column is matched by name first, then by index. Without a column the
/// first column containing a number is used. Non-numeric cells are skipped.
pub fn load_csv(path: &Path, column: Option<&str>) -> Result<Vec<f64>, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::ReadError(e.to_string()))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|e| LoadError::CsvError(e.to_string()))?
        .clone();

    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .map_err(|e| LoadError::CsvError(e.to_string()))?;

    let col_idx = match column {
        Some(col) => headers
            .iter()
            .position(|h| h == col)
            .or_else(|| col.parse::<usize>().ok().filter(|&i| i < headers.len()))
            .ok_or_else(|| LoadError::ColumnNotFound(col.to_string()))?,
        None => (0..headers.len())
            .find(|&i| {
                records
                    .iter()
                    .any(|r| r.get(i).is_some_and(|v| v.trim().parse::<f64>().is_ok()))
            })
            .ok_or(LoadError::NoNumericData)?,
    };

    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.get(col_idx))
        .filter_map(|v| v.trim().parse::<f64>().ok())
        .collect();

    if values.is_empty() {
        return Err(LoadError::NoNumericData);
    }
    Ok(values)
}

/// Load a JSON array of numbers, an array of objects, or an object holding one.
pub fn load_json(path: &Path, column: Option<&str>) -> Result<Vec<f64>, LoadError> {
    let file = File::open(path).map_err(|e| LoadError::ReadError(e.to_string()))?;
    let json: serde_json::Value = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LoadError::JsonError(e.to_string()))?;

    if let Some(arr) = json.as_array() {
        if arr.iter().all(|v| v.is_number()) {
            return non_empty(arr.iter().filter_map(|v| v.as_f64()).collect());
        }

        let keys: Vec<&str> = match column {
            Some(col) => vec![col],
            None => vec!["value", "values", "data", "y"],
        };
        for key in keys {
            let data: Vec<f64> = arr
                .iter()
                .filter_map(|obj| obj.get(key).and_then(|v| v.as_f64()))
                .collect();
            if !data.is_empty() {
                return Ok(data);
            }
        }
    }

    if let Some(obj) = json.as_object() {
        let keys: Vec<&str> = match column {
            Some(col) => vec![col],
            None => vec!["data", "values", "series", "y"],
        };
        for key in keys {
            if let Some(arr) = obj.get(key).and_then(|v| v.as_array()) {
                let data: Vec<f64> = arr.iter().filter_map(|v| v.as_f64()).collect();
                if !data.is_empty() {
                    return Ok(data);
                }
            }
        }
    }

    Err(LoadError::NoNumericData)
}

/// Load numbers separated by whitespace or commas. Non-numeric tokens are skipped.
pub fn load_plain(path: &Path) -> Result<Vec<f64>, LoadError> {
    let text = fs::read_to_string(path).map_err(|e| LoadError::ReadError(e.to_string()))?;
    non_empty(
        text.split(|c: char| c.is_whitespace() || c == ',')
            .filter_map(|token| token.trim().parse::<f64>().ok())
            .collect(),
    )
}

fn non_empty(values: Vec<f64>) -> Result<Vec<f64>, LoadError> {
    if values.is_empty() {
        Err(LoadError::NoNumericData)
    } else {
        Ok(values)
    }
}
