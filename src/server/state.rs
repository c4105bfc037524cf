use std::sync::Arc;

use crate::db::ImageStore;
use crate::ingest::Ingestor;

/// 应用状态
pub struct AppState {
    /// 上传处理流水线，同时持有数据库
    pub ingestor: Ingestor,
    /// 列表接口返回的最大记录数
    pub list_limit: usize,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(ingestor: Ingestor, list_limit: usize) -> Arc<Self> {
        Arc::new(AppState { ingestor, list_limit })
    }

    pub fn store(&self) -> ImageStore {
        self.ingestor.store().clone()
    }
}
