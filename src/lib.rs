//! SiO(v=0) coverage search over public ALMA observations of the MAPS disks.
//!
//! Archive rows are harmonized into spectral windows, matched against the
//! SiO rest-frequency table, grouped per MOUS and exported as CSV and LaTeX.

pub mod archive;
pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{run, RunReport};
