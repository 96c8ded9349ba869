//! Housing dataset loading
//!
//! Reads the raw CSV by header name and splits it into the fixed feature
//! columns and the `price` target. Yes/no flag columns are mapped to 1/0.

use anyhow::{Context, Result};
use serving_lib::models::FEATURE_NAMES;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

/// Target column name
pub const TARGET_COLUMN: &str = "price";

/// Feature matrix plus target vector, row-aligned
#[derive(Debug, Clone)]
pub struct Dataset {
    pub records: Vec<[f64; 6]>,
    pub targets: Vec<f64>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Load the dataset from a CSV file with a header row.
pub fn load_csv(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open dataset {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut lines = reader.lines();

    let header = lines
        .next()
        .ok_or_else(|| anyhow::anyhow!("dataset {} is empty", path.display()))?
        .context("failed to read header")?;
    let columns: Vec<String> = header
        .split(',')
        .map(|c| c.trim().to_lowercase())
        .collect();

    let mut feature_indices = [0usize; 6];
    for (slot, name) in feature_indices.iter_mut().zip(FEATURE_NAMES.iter()) {
        *slot = columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| anyhow::anyhow!("dataset is missing column {:?}", name))?;
    }
    let target_index = columns
        .iter()
        .position(|c| c == TARGET_COLUMN)
        .ok_or_else(|| anyhow::anyhow!("dataset is missing column {:?}", TARGET_COLUMN))?;

    let mut records = Vec::new();
    let mut targets = Vec::new();

    for (line_no, line) in lines.enumerate() {
        let line = line.with_context(|| format!("failed to read row {}", line_no + 2))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(|f| f.trim()).collect();

        let mut record = [0.0f64; 6];
        for (slot, &index) in record.iter_mut().zip(&feature_indices) {
            *slot = parse_value(fields.get(index).copied().unwrap_or(""))
                .with_context(|| format!("row {}, column {:?}", line_no + 2, columns[index]))?;
        }
        let target = parse_value(fields.get(target_index).copied().unwrap_or(""))
            .with_context(|| format!("row {}, column {:?}", line_no + 2, TARGET_COLUMN))?;

        records.push(record);
        targets.push(target);
    }

    if records.is_empty() {
        anyhow::bail!("dataset {} has no data rows", path.display());
    }

    info!(rows = records.len(), path = %path.display(), "Dataset loaded");
    Ok(Dataset { records, targets })
}

/// Parse a numeric cell, accepting yes/no flags.
fn parse_value(raw: &str) -> Result<f64> {
    match raw.to_lowercase().as_str() {
        "yes" => Ok(1.0),
        "no" => Ok(0.0),
        other => other
            .parse::<f64>()
            .with_context(|| format!("unparsable value {:?}", raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_numeric_and_flag_columns() {
        let file = write_csv(
            "price,area,bedrooms,bathrooms,stories,mainroad,guestroom\n\
             1300000,3000,3,2,1,yes,no\n\
             900000,2100,2,1,2,no,yes\n",
        );
        let dataset = load_csv(file.path()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records[0], [3000.0, 3.0, 2.0, 1.0, 1.0, 0.0]);
        assert_eq!(dataset.records[1], [2100.0, 2.0, 1.0, 2.0, 0.0, 1.0]);
        assert_eq!(dataset.targets, vec![1_300_000.0, 900_000.0]);
    }

    #[test]
    fn test_header_order_does_not_matter() {
        let file = write_csv(
            "guestroom,price,area,bedrooms,bathrooms,stories,mainroad\n\
             no,1300000,3000,3,2,1,yes\n",
        );
        let dataset = load_csv(file.path()).unwrap();
        assert_eq!(dataset.records[0], [3000.0, 3.0, 2.0, 1.0, 1.0, 0.0]);
    }

    #[test]
    fn test_missing_column_rejected() {
        let file = write_csv("price,area,bedrooms\n1300000,3000,3\n");
        let err = load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("missing column"));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let file = write_csv("price,area,bedrooms,bathrooms,stories,mainroad,guestroom\n");
        let err = load_csv(file.path()).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn test_unparsable_value_rejected() {
        let file = write_csv(
            "price,area,bedrooms,bathrooms,stories,mainroad,guestroom\n\
             1300000,large,3,2,1,yes,no\n",
        );
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_blank_lines_skipped() {
        let file = write_csv(
            "price,area,bedrooms,bathrooms,stories,mainroad,guestroom\n\
             1300000,3000,3,2,1,1,0\n\
             \n",
        );
        assert_eq!(load_csv(file.path()).unwrap().len(), 1);
    }
}
