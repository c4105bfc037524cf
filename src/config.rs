use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use clap::{Parser, Subcommand};
use directories::ProjectDirs;

use crate::cli::*;

static CONF_DIR: LazyLock<ConfDir> = LazyLock::new(|| {
    let proj_dirs = ProjectDirs::from("", "objectx", "objectx").expect("failed to get project dir");
    ConfDir { path: proj_dirs.config_dir().to_path_buf() }
});

fn default_config_dir() -> &'static str {
    CONF_DIR.path().to_str().unwrap()
}

#[derive(Parser, Debug, Clone)]
pub struct S3Options {
    /// S3 兼容对象存储的地址
    #[arg(long = "s3-endpoint", default_value = "https://ams3.digitaloceanspaces.com")]
    pub endpoint: String,
    /// 对象存储区域
    #[arg(long = "s3-region", default_value = "us-east-1")]
    pub region: String,
    /// 存放图片的 bucket
    #[arg(long = "s3-bucket", default_value = "objectx")]
    pub bucket: String,
    /// 是否使用 path-style 访问，MinIO 等需要开启
    #[arg(long = "s3-path-style")]
    pub path_style: bool,
    /// access key，不填则使用默认凭证链
    #[arg(long = "s3-key", env = "SPACES_KEY", hide_env_values = true)]
    pub key: Option<String>,
    /// secret key
    #[arg(long = "s3-secret", env = "SPACES_SECRET", hide_env_values = true)]
    pub secret: Option<String>,
    /// 对外公开访问图片的 CDN 地址
    #[arg(long, value_name = "URL", default_value = "https://objectx.ams3.cdn.digitaloceanspaces.com")]
    pub public_host: String,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "objectx", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcmd: SubCommand,
    /// objectx 配置文件目录
    #[arg(short, long, global = true, default_value = default_config_dir())]
    pub conf_dir: ConfDir,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SubCommand {
    /// 启动 HTTP 服务
    Server(ServerCommand),
    /// 上传本地图片并写入记录
    Add(AddCommand),
    /// 列出数据库中的记录
    List(ListCommand),
    /// 显示单条记录
    Show(ShowCommand),
    /// 删除单条记录
    Delete(DeleteCommand),
}

#[derive(Debug, Clone)]
pub struct ConfDir {
    path: PathBuf,
}

impl ConfDir {
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    /// 返回数据库文件的路径
    pub fn database(&self) -> PathBuf {
        self.path.join("main.db")
    }
}

impl FromStr for ConfDir {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self { path: PathBuf::from(s) })
    }
}
