mod add;
mod delete;
mod list;
pub mod server;
mod show;

pub use add::*;
pub use delete::*;
pub use list::*;
pub use server::*;
pub use show::*;

use crate::config::Opts;
use crate::db::ImageStore;

pub trait SubCommandExtend {
    fn run(&self, opts: &Opts) -> impl std::future::Future<Output = anyhow::Result<()>> + Send;
}

/// 打开配置目录下的数据库
fn open_store(opts: &Opts) -> anyhow::Result<ImageStore> {
    Ok(ImageStore::open(opts.conf_dir.database())?)
}
