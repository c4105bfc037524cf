use anyhow::Result;
use clap::Parser;

use super::open_store;
use crate::cli::SubCommandExtend;
use crate::config::Opts;

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// 记录 ID
    pub id: String,
}

impl SubCommandExtend for ShowCommand {
    async fn run(&self, opts: &Opts) -> Result<()> {
        let store = open_store(opts)?;
        let bytes = store.get_one(&self.id)?;
        println!("{}", String::from_utf8_lossy(&bytes));
        Ok(())
    }
}
