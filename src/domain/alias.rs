use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::errors::{SahamError, SahamResult};

#[derive(Debug, Deserialize)]
struct AliasRow {
    #[serde(rename = "Kode")]
    code: String,
    #[serde(rename = "Nama Perusahaan")]
    name: String,
}

/// Code -> company name mapping backed by the alias CSV
/// (columns `Kode`, `Nama Perusahaan`). Names are stored as written in the
/// file; listing-suffix cleanup happens during keyword derivation.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    names: HashMap<String, String>,
}

impl AliasTable {
    pub fn load<P: AsRef<Path>>(path: P) -> SahamResult<Self> {
        let path = path.as_ref();
        let mut reader = csv::Reader::from_path(path).map_err(|e| csv_error(path, e))?;

        let mut names = HashMap::new();
        for record in reader.deserialize() {
            let row: AliasRow = record.map_err(|e| csv_error(path, e))?;
            let code = row.code.trim().to_uppercase();
            if code.is_empty() {
                continue;
            }
            names.insert(code, row.name.trim().to_string());
        }

        Ok(Self { names })
    }

    pub fn get(&self, code: &str) -> Option<&str> {
        self.names
            .get(&code.trim().to_uppercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn csv_error(path: &Path, e: csv::Error) -> SahamError {
    SahamError::CsvFile {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}
