use anyhow::Result;
use clap::Parser;
use log::info;

use super::open_store;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// 记录 ID，不存在时同样视为成功
    pub id: String,
}

impl SubCommandExtend for DeleteCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = open_store(opts)?;
        let bytes = store.delete(&self.id)?;
        info!("已删除记录 {}", self.id);
        println!("{}", String::from_utf8_lossy(&bytes));
        Ok(())
    }
}
