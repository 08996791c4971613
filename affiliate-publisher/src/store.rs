use crate::types::{CsvRecord, PublisherError, Result, RowStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::PathBuf;
use tracing::{debug, info};

/// Row store backed by one comma-separated file with a header line.
pub struct CsvStore<R> {
    path: PathBuf,
    _record: PhantomData<R>,
}

impl<R> CsvStore<R>
where
    R: CsvRecord + DeserializeOwned + Serialize,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load rows, treating an absent file as zero rows.
    pub fn load_optional(&self) -> Result<Vec<R>> {
        if !self.exists() {
            debug!("{} does not exist, using no rows", self.path.display());
            return Ok(Vec::new());
        }
        self.load()
    }

    fn check_columns(&self, headers: &csv::StringRecord) -> Result<()> {
        let missing: Vec<String> = R::COLUMNS
            .iter()
            .filter(|column| !headers.iter().any(|header| header == **column))
            .map(|column| column.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PublisherError::MissingColumns {
                path: self.path.clone(),
                columns: missing,
            })
        }
    }
}

impl<R> RowStore<R> for CsvStore<R>
where
    R: CsvRecord + DeserializeOwned + Serialize,
{
    type Error = PublisherError;

    fn load(&self) -> Result<Vec<R>> {
        // Short rows fall back to empty fields
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        self.check_columns(&headers)?;

        let rows = reader
            .deserialize::<R>()
            .collect::<std::result::Result<Vec<R>, csv::Error>>()?;

        debug!("Loaded {} rows from {}", rows.len(), self.path.display());
        Ok(rows)
    }

    fn save(&self, rows: &[R]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Stage beside the target, then rename over it
        let staging = self.path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_path(&staging)?;
            writer.write_record(R::COLUMNS)?;
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&staging, &self.path)?;

        info!("Saved {} rows to {}", rows.len(), self.path.display());
        Ok(())
    }
}
