//! `spsync upload` - upload a local file

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;

use super::{open_store, report_item, GlobalArgs};

#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Local file to upload
    pub local: PathBuf,

    /// Destination path inside the library
    pub remote: String,

    /// Fail instead of creating missing parent folders
    ///
    /// Every invocation starts with an empty path cache, so with this flag
    /// only files at the library root can be uploaded.
    #[arg(long)]
    pub no_parents: bool,
}

impl UploadCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> Result<()> {
        if !self.local.is_file() {
            bail!("{} is not a file", self.local.display());
        }

        let mut store = open_store(global).await?;
        let id = store
            .upload(&self.local, &self.remote, !self.no_parents)
            .await?;
        report_item(global, "Uploaded", &self.remote, id);
        Ok(())
    }
}
