use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::StoreError;

/// 图片记录
///
/// 除 `id` 外，值为 0 或空的字段在编码时省略，解码时缺失字段按 0 处理
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImageRecord {
    /// 记录 ID，同时也是数据库中的 key
    pub id: String,
    /// 上传者给出的情感分数
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub sentiment: f64,
    /// HSV 中 V 通道的均值
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub brightness: f64,
    /// HSV 中 H 通道的均值，已乘 2 归一化到 0~360
    #[serde(default, skip_serializing_if = "is_zero_f64")]
    pub tone: f64,
    /// 提交时的 Unix 时间戳（秒）
    #[serde(default, skip_serializing_if = "is_zero_i64")]
    pub created: i64,
    /// 图片在 CDN 上的公开地址
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub image_url: String,
}

impl ImageRecord {
    /// 删除操作返回的确认记录，只包含 ID
    pub fn acknowledge(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    pub fn encode(&self) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(self).map_err(StoreError::Encode)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, StoreError> {
        serde_json::from_slice(bytes).map_err(StoreError::Decode)
    }
}

fn is_zero_f64(v: &f64) -> bool {
    *v == 0.0
}

fn is_zero_i64(v: &i64) -> bool {
    *v == 0
}
