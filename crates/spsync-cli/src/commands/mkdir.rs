//! `spsync mkdir` - create a folder

use anyhow::Result;
use clap::Args;

use super::{open_store, report_item, GlobalArgs};

#[derive(Debug, Args)]
pub struct MkdirCommand {
    /// Folder path inside the library, e.g. /Reports/2024
    pub path: String,

    /// Fail instead of creating missing parent folders
    ///
    /// Every invocation starts with an empty path cache, so with this flag
    /// only top-level folders can be created.
    #[arg(long)]
    pub no_parents: bool,
}

impl MkdirCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let mut store = open_store(global).await?;
        let id = store.mkdir(&self.path, !self.no_parents).await?;
        report_item(global, "Created", &self.path, id);
        Ok(())
    }
}
