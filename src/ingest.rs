use std::io::Write;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use axum::body::Bytes;
use log::{debug, info, warn};
use tempfile::NamedTempFile;
use tokio::task::spawn_blocking;
use uuid::Uuid;

use crate::analyze::FeatureExtractor;
use crate::blob::{self, BlobSink, Visibility};
use crate::db::{ImageRecord, ImageStore};
use crate::error::{Error, Result};
use crate::metrics;

/// 一次上传的原始数据
#[derive(Debug, Clone)]
pub struct Upload {
    /// 图片内容
    pub bytes: Bytes,
    /// 原始文件名，仅用于保留扩展名
    pub file_name: String,
    /// 未解析的情感分数
    pub sentiment: Option<String>,
}

/// 上传处理流水线
///
/// 暂存 -> 特征提取 -> 上传对象存储 -> 写入元数据
#[derive(Clone)]
pub struct Ingestor {
    store: ImageStore,
    sink: Arc<dyn BlobSink>,
    extractor: Arc<dyn FeatureExtractor>,
    public_host: String,
}

impl Ingestor {
    pub fn new(
        store: ImageStore,
        sink: Arc<dyn BlobSink>,
        extractor: Arc<dyn FeatureExtractor>,
        public_host: impl Into<String>,
    ) -> Self {
        Self { store, sink, extractor, public_host: public_host.into() }
    }

    pub fn store(&self) -> &ImageStore {
        &self.store
    }

    /// 处理一次上传，返回已提交记录的编码
    ///
    /// NOTE: 对象上传成功但记录提交失败时，对象不会被删除
    pub async fn ingest(&self, upload: Upload) -> Result<Vec<u8>> {
        let start = Instant::now();
        let result = self.run(upload).await;
        let label = match &result {
            Ok(_) => "ok",
            Err(Error::Validation(_)) => "invalid",
            Err(Error::Upstream(_)) => "upstream",
            Err(Error::Store(_)) => "store",
            Err(_) => "internal",
        };
        metrics::inc_ingest(label, start.elapsed().as_secs_f32());
        result
    }

    async fn run(&self, upload: Upload) -> Result<Vec<u8>> {
        if upload.bytes.is_empty() {
            return Err(Error::Validation("上传的图片为空".to_string()));
        }

        let id = Uuid::new_v4().to_string();
        let key = blob::object_key(&upload.file_name);
        debug!("[{id}] 开始处理上传 {} ({} bytes)", upload.file_name, upload.bytes.len());

        // 暂存文件持有到函数结束，无论成功与否都会被删除
        let extractor = self.extractor.clone();
        let bytes = upload.bytes.clone();
        let suffix = blob::extension(&upload.file_name);
        let (stage, features) = spawn_blocking(move || -> Result<_> {
            let stage = stage_upload(&bytes, &suffix)?;
            let features = extractor.extract(stage.path()).map_err(Error::upstream)?;
            Ok((stage, features))
        })
        .await
        .map_err(Error::upstream)??;
        debug!("[{id}] tone={:.2} brightness={:.2}", features.tone, features.brightness);

        self.sink.put(&key, upload.bytes, Visibility::PublicRead).await.map_err(Error::upstream)?;
        debug!("[{id}] 已上传对象 {key}");

        let record = ImageRecord {
            image_url: blob::public_url(&self.public_host, &key),
            id,
            sentiment: parse_sentiment(upload.sentiment.as_deref()),
            brightness: features.brightness,
            tone: features.tone,
            created: unix_now(),
        };

        let store = self.store.clone();
        let id = record.id.clone();
        let committed = spawn_blocking(move || store.create(&record))
            .await
            .unwrap_or_else(|err| Err(Error::from(err)));
        drop(stage);

        match committed {
            Ok(bytes) => {
                info!("[{id}] 记录已写入: {key}");
                Ok(bytes)
            }
            Err(err) => {
                warn!("[{id}] 记录写入失败，对象 {key} 已上传但没有对应记录: {err}");
                Err(err)
            }
        }
    }
}

/// 将上传内容写入带有相同扩展名的临时文件
fn stage_upload(bytes: &[u8], suffix: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new().prefix("objectx-").suffix(suffix).tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

/// 解析情感分数，缺失、无法解析或非有限值时返回 0
pub fn parse_sentiment(raw: Option<&str>) -> f64 {
    raw.and_then(|s| s.parse::<f64>().ok()).filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn unix_now() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or_default()
}
