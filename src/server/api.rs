use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_typed_multipart::{TypedMultipart, TypedMultipartError};
use log::info;
use tokio::task::spawn_blocking;

use super::error::Result;
use super::state::AppState;
use super::types::*;
use crate::db::ImageRecord;
use crate::error::Error;
use crate::ingest::Upload;
use crate::metrics;

/// 数据库中已是 JSON 编码，直接返回原始字节
fn raw_json(status: StatusCode, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// 列出图片记录
///
/// 按 ID 的字节序返回前 N 条，与创建时间无关
#[utoipa::path(
    get,
    path = "/images",
    responses(
        (status = 200, body = BTreeMap<String, ImageRecord>),
        (status = 500, body = ErrorResponse),
    )
)]
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BTreeMap<String, ImageRecord>>> {
    let store = state.store();
    let limit = state.list_limit;
    let records = spawn_blocking(move || store.list_first(limit)).await??;
    Ok(Json(records))
}

/// 上传图片并创建记录
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, body = ImageRecord),
        (status = 400, body = ErrorResponse),
        (status = 502, body = ErrorResponse),
    )
)]
pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    data: std::result::Result<TypedMultipart<UploadRequest>, TypedMultipartError>,
) -> Result<Response> {
    let TypedMultipart(data) = data.map_err(|err| Error::Validation(err.to_string()))?;
    let file_name = data.image.metadata.file_name.unwrap_or_default();
    info!("收到上传: {file_name}");

    let upload = Upload { bytes: data.image.contents, file_name, sentiment: data.sentiment };
    let bytes = state.ingestor.ingest(upload).await?;
    Ok(raw_json(StatusCode::CREATED, bytes))
}

/// 获取单条记录
#[utoipa::path(
    get,
    path = "/images/{id}",
    params(("id" = String, Path, description = "记录 ID")),
    responses(
        (status = 200, body = ImageRecord),
        (status = 404, body = ErrorResponse),
    )
)]
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let store = state.store();
    let bytes = spawn_blocking(move || store.get_one(&id)).await??;
    Ok(raw_json(StatusCode::OK, bytes))
}

/// 删除单条记录
///
/// 记录不存在时同样返回成功，响应中只包含 ID
#[utoipa::path(
    delete,
    path = "/images/{id}",
    params(("id" = String, Path, description = "记录 ID")),
    responses(
        (status = 200, body = ImageRecord),
    )
)]
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let store = state.store();
    info!("删除记录: {id}");
    let bytes = spawn_blocking(move || store.delete(&id)).await??;
    Ok(raw_json(StatusCode::OK, bytes))
}

/// prometheus 指标
pub async fn metrics_handler() -> Response {
    match metrics::gather_text() {
        Ok(text) => text.into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

pub async fn method_not_allowed(method: Method) -> Response {
    let message = format!("不支持 {method} 方法");
    (StatusCode::METHOD_NOT_ALLOWED, Json(ErrorResponse { message })).into_response()
}

pub async fn not_found() -> Response {
    let message = "接口不存在".to_string();
    (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
}
