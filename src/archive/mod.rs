//! Archive collaborators: querying spectral windows per target and
//! retrieving MOUS datasets.
//!
//! ```text
//!  target name ──► NameResolver (Sesame) ──► ICRS ra/dec
//!                                               │
//!                                               ▼
//!                              AlmaTap: ADQL cone search on ivoa.obscore
//!                                               │
//!                                               ▼
//!                              ObsCoreTable ──► Vec<SpectralWindow>
//! ```
//!
//! [`FileArchive`] answers the same queries from a dump on disk.

pub mod datalink;
pub mod file;
pub mod sesame;
pub mod tap;

pub use datalink::DatalinkDownloader;
pub use file::FileArchive;
pub use sesame::{NameResolver, Sesame};
pub use tap::AlmaTap;

use crate::data::model::SpectralWindow;
use crate::error::ArchiveError;

/// Spectral-window search around one named target.
///
/// An empty result is a normal outcome. Duplicate windows across repeated
/// queries are passed through untouched.
pub trait ArchiveQuery {
    fn query(&self, target: &str) -> Result<Vec<SpectralWindow>, ArchiveError>;
}

/// Retrieval of one MOUS dataset.
pub trait BulkDownload {
    fn download(&self, dataset_id: &str) -> Result<(), ArchiveError>;
}
