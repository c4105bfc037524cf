use axum::body::Bytes;
use axum_typed_multipart::{FieldData, TryFromMultipart};
use serde::Serialize;
use utoipa::ToSchema;

/// 上传请求参数
#[derive(TryFromMultipart)]
pub struct UploadRequest {
    pub image: FieldData<Bytes>,
    pub sentiment: Option<String>,
}

/// 上传表单（用于API文档）
#[derive(Debug, ToSchema)]
#[allow(unused)]
pub struct UploadForm {
    /// 上传的图片文件，文件名的扩展名会被保留
    #[schema(format = Binary, content_media_type = "application/octet-stream")]
    pub image: String,
    /// 情感分数，无法解析时按 0 处理
    pub sentiment: Option<String>,
}

/// 错误响应
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
