use thiserror::Error;

/// A spectral window the coverage matcher refuses to evaluate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WindowError {
    #[error("invalid window in {dataset_id}: min {freq_min_ghz} GHz > max {freq_max_ghz} GHz")]
    InvalidWindow {
        dataset_id: String,
        freq_min_ghz: f64,
        freq_max_ghz: f64,
    },
    #[error("window in {dataset_id} has non-finite frequency bounds")]
    NonFiniteBounds { dataset_id: String },
}

/// Problems turning an archive table into spectral windows.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("archive table is missing required column: {0}")]
    MissingColumn(&'static str),
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("malformed archive table: {0}")]
    Malformed(String),
}

/// Failures of the archive and download collaborators.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("could not resolve target name '{0}'")]
    Unresolved(String),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no downloadable products listed for {0}")]
    NoProducts(String),
}
