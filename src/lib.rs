pub mod analyze;
pub mod blob;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
mod metrics;
mod server;
#[cfg(test)]
mod test_utils;

pub use config::Opts;
pub use db::{ImageRecord, ImageStore};
pub use error::{Error, Result};
pub use ingest::{Ingestor, Upload};
