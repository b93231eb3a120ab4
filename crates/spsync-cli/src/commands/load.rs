//! `spsync load` - fetch an item through a loader, then annotate it

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{collect_attrs, open_store, parse_attr, report, GlobalArgs};

#[derive(Debug, Args)]
pub struct LoadCommand {
    /// Loader to use (`file` is built in)
    pub source: String,

    /// Source-specific location of the content
    pub uri: String,

    /// Destination path inside the library
    pub dest: String,

    /// Metadata to write after loading, as KEY=VALUE (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attr)]
    pub attrs: Vec<(String, String)>,

    /// Fail instead of creating missing parent folders
    #[arg(long)]
    pub no_parents: bool,
}

impl LoadCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let attrs = collect_attrs(&self.attrs);
        let mut store = open_store(global).await?;
        let loaded = store
            .load(&self.source, &self.uri, &self.dest, &attrs, !self.no_parents)
            .await?;

        report(
            global,
            &format!("load {} -> {}", self.uri, self.dest),
            loaded.map(|()| {
                (
                    format!("Loaded {} -> {}", self.uri, self.dest),
                    json!({"source": self.source, "uri": self.uri, "dest": self.dest}),
                )
            }),
        );
        Ok(())
    }
}
