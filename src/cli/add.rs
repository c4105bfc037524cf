use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use clap::Parser;

use super::open_store;
use crate::analyze::default_extractor;
use crate::blob::S3BlobSink;
use crate::cli::SubCommandExtend;
use crate::config::{Opts, S3Options};
use crate::ingest::{Ingestor, Upload};

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    #[command(flatten)]
    pub s3: S3Options,
    /// 图片路径
    pub image: PathBuf,
    /// 情感分数
    #[arg(long)]
    pub sentiment: Option<String>,
}

impl SubCommandExtend for AddCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let bytes = tokio::fs::read(&self.image).await?;
        let file_name = self
            .image
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let sink = Arc::new(S3BlobSink::new(&self.s3).await?);
        let ingestor =
            Ingestor::new(open_store(opts)?, sink, default_extractor()?, &self.s3.public_host);

        let upload =
            Upload { bytes: Bytes::from(bytes), file_name, sentiment: self.sentiment.clone() };
        let record = ingestor.ingest(upload).await?;
        println!("{}", String::from_utf8_lossy(&record));
        Ok(())
    }
}
