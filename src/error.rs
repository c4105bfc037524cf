use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// 元数据存储相关错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// LMDB 环境或事务错误
    #[error("数据库错误: {0}")]
    Heed(#[from] heed::Error),
    /// 存储的值不是合法的图片记录
    #[error("记录解码失败: {0}")]
    Decode(#[source] serde_json::Error),
    /// 图片记录编码失败
    #[error("记录编码失败: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("后台任务异常退出: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// 服务对外暴露的错误分类
#[derive(Debug, Error)]
pub enum Error {
    /// 请求本身不合法，例如缺少上传字段
    #[error("{0}")]
    Validation(String),
    /// 对象存储或特征提取失败
    #[error("上游服务错误: {0}")]
    Upstream(#[source] anyhow::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    /// 暂存上传文件时的本地 IO 错误
    #[error("本地 IO 错误: {0}")]
    Io(#[from] std::io::Error),
    /// 点查时 key 不存在
    #[error("图片 (id: {0}) 不存在")]
    NotFound(String),
}

impl Error {
    pub fn upstream<E: Into<anyhow::Error>>(err: E) -> Self {
        Self::Upstream(err.into())
    }
}

impl From<heed::Error> for Error {
    fn from(err: heed::Error) -> Self {
        Self::Store(StoreError::Heed(err))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Store(StoreError::Join(err))
    }
}
