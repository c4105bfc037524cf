use std::path::Path;

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::config::{BehaviorVersion, Builder as S3ConfigBuilder, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use axum::body::Bytes;
use log::{debug, info};
use uuid::Uuid;

use crate::config::S3Options;

/// 对象的访问权限
///
/// 目前上传的图片都需要通过 CDN 公开访问
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    PublicRead,
}

impl Visibility {
    fn canned_acl(self) -> ObjectCannedAcl {
        match self {
            Visibility::PublicRead => ObjectCannedAcl::PublicRead,
        }
    }
}

/// 对象存储
#[async_trait]
pub trait BlobSink: Send + Sync {
    /// 将 `bytes` 持久化到 `key`，成功返回后对象即可通过公开地址访问
    async fn put(&self, key: &str, bytes: Bytes, visibility: Visibility) -> Result<()>;
}

/// 生成对象 key，保留原文件的扩展名
///
/// `photo.jpg` -> `<uuid>.jpg`，没有扩展名时只有 uuid
pub fn object_key(file_name: &str) -> String {
    format!("{}{}", Uuid::new_v4(), extension(file_name))
}

/// 返回带 `.` 的扩展名，没有扩展名时返回空字符串
pub fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

/// 拼接 CDN 地址与对象 key
pub fn public_url(host: &str, key: &str) -> String {
    format!("{}/{}", host.trim_end_matches('/'), key)
}

fn content_type(key: &str) -> &'static str {
    match extension(key).to_ascii_lowercase().as_str() {
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".webp" => "image/webp",
        ".gif" => "image/gif",
        ".bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// S3 兼容的对象存储，例如 DigitalOcean Spaces
pub struct S3BlobSink {
    client: S3Client,
    bucket: String,
}

impl S3BlobSink {
    pub async fn new(opts: &S3Options) -> Result<Self> {
        let mut builder = match (&opts.key, &opts.secret) {
            (Some(key), Some(secret)) => S3ConfigBuilder::new()
                .behavior_version(BehaviorVersion::latest())
                .credentials_provider(Credentials::new(key, secret, None, None, "objectx")),
            _ => {
                debug!("未提供 access key，使用默认凭证链");
                let sdk_config = aws_config::defaults(BehaviorVersion::latest()).load().await;
                S3ConfigBuilder::from(&sdk_config)
            }
        };
        builder = builder
            .region(Region::new(opts.region.clone()))
            .endpoint_url(&opts.endpoint)
            .force_path_style(opts.path_style);

        info!("对象存储: {} (bucket: {})", opts.endpoint, opts.bucket);

        Ok(Self { client: S3Client::from_conf(builder.build()), bucket: opts.bucket.clone() })
    }
}

#[async_trait]
impl BlobSink for S3BlobSink {
    async fn put(&self, key: &str, bytes: Bytes, visibility: Visibility) -> Result<()> {
        let size = bytes.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .acl(visibility.canned_acl())
            .content_type(content_type(key))
            .content_length(size as i64)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .with_context(|| format!("上传对象失败: {key}"))?;
        debug!("已上传对象 {key} ({size} bytes)");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::jpg("photo.jpg", ".jpg")]
    #[case::nested("a/b/c.png", ".png")]
    #[case::double("archive.tar.gz", ".gz")]
    #[case::none("README", "")]
    #[case::hidden(".bashrc", "")]
    fn test_extension(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(extension(name), expected);
    }

    #[test]
    fn test_object_key() {
        let a = object_key("photo.jpg");
        let b = object_key("photo.jpg");
        assert!(a.ends_with(".jpg"));
        assert_eq!(a.len(), 36 + 4);
        assert_ne!(a, b);
        assert_eq!(object_key("noext").len(), 36);
    }

    #[test]
    fn test_public_url() {
        assert_eq!(public_url("https://cdn.example", "x.jpg"), "https://cdn.example/x.jpg");
        assert_eq!(public_url("https://cdn.example/", "x.jpg"), "https://cdn.example/x.jpg");
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type("a.JPG"), "image/jpeg");
        assert_eq!(content_type("a.webp"), "image/webp");
        assert_eq!(content_type("a"), "application/octet-stream");
    }

    #[test]
    fn test_public_read_acl() {
        assert_eq!(Visibility::PublicRead.canned_acl(), ObjectCannedAcl::PublicRead);
    }
}
