use anyhow::Result;
use clap::Parser;
use log::info;

use super::open_store;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// 最多显示的记录数量
    #[arg(long, value_name = "N", default_value_t = 40)]
    pub max: usize,
}

impl SubCommandExtend for ListCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = open_store(opts)?;
        let records = store.list_first(self.max)?;
        println!("{}", serde_json::to_string_pretty(&records)?);
        info!("显示 {} 条，共 {} 条记录", records.len(), store.len()?);
        Ok(())
    }
}
