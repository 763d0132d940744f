use std::path::Path;

use anyhow::Result;
use log::info;

use super::ArchiveQuery;
use crate::data::loader::{load_file, ObsCoreTable};
use crate::data::model::SpectralWindow;
use crate::error::ArchiveError;

/// Offline archive backed by a dump loaded once from disk.
pub struct FileArchive {
    table: ObsCoreTable,
}

impl FileArchive {
    pub fn open(path: &Path) -> Result<Self> {
        let table = load_file(path)?;
        info!("Loaded {} archive rows from {}", table.len(), path.display());
        Ok(Self { table })
    }

    pub fn from_table(table: ObsCoreTable) -> Self {
        Self { table }
    }
}

impl ArchiveQuery for FileArchive {
    fn query(&self, target: &str) -> Result<Vec<SpectralWindow>, ArchiveError> {
        Ok(self.table.select_source(target).into_windows(Some(target))?)
    }
}
