//! 单元测试共用的对象存储与特征提取替身

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::body::Bytes;

use crate::analyze::{FeatureExtractor, Features};
use crate::blob::{BlobSink, Visibility};

/// 所有替身都要求上传内容为这段字节
pub const FAKE_IMAGE: &[u8] = b"fake image bytes";

/// 记录每次 put 的对象存储，`fail` 为真时总是失败
#[derive(Default)]
pub struct StubSink {
    pub fail: bool,
    pub puts: Mutex<Vec<(String, Visibility, usize)>>,
}

impl StubSink {
    pub fn failing() -> Self {
        Self { fail: true, ..Default::default() }
    }
}

#[async_trait]
impl BlobSink for StubSink {
    async fn put(&self, key: &str, bytes: Bytes, visibility: Visibility) -> Result<()> {
        if self.fail {
            return Err(anyhow!("connection refused"));
        }
        self.puts.lock().unwrap().push((key.to_string(), visibility, bytes.len()));
        Ok(())
    }
}

/// 返回固定特征，并记下每次读取的暂存文件路径
pub struct StubExtractor {
    pub result: Option<Features>,
    pub staged: Mutex<Vec<PathBuf>>,
}

impl StubExtractor {
    pub fn new(tone: f64, brightness: f64) -> Self {
        Self { result: Some(Features { tone, brightness }), staged: Mutex::default() }
    }

    pub fn failing() -> Self {
        Self { result: None, staged: Mutex::default() }
    }
}

impl FeatureExtractor for StubExtractor {
    fn extract(&self, path: &Path) -> Result<Features> {
        assert!(path.exists(), "暂存文件应当存在");
        assert_eq!(std::fs::read(path)?, FAKE_IMAGE);
        self.staged.lock().unwrap().push(path.to_path_buf());
        self.result.ok_or_else(|| anyhow!("无法解码图片"))
    }
}
