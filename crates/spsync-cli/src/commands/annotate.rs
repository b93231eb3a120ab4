//! `spsync annotate` - write metadata to an existing item

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::{collect_attrs, open_store, parse_attr, report, GlobalArgs};

#[derive(Debug, Args)]
pub struct AnnotateCommand {
    /// Item path inside the library
    pub path: String,

    /// Attribute as KEY=VALUE; repeat a key to build a list
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attr, required = true)]
    pub attrs: Vec<(String, String)>,
}

impl AnnotateCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> Result<()> {
        let attrs = collect_attrs(&self.attrs);
        let mut store = open_store(global).await?;
        let fields = store.annotate(&self.path, &attrs).await?;

        report(
            global,
            &format!("annotate {}", self.path),
            fields.map(|fields| {
                (
                    format!("Annotated {} ({} attributes)", self.path, attrs.len()),
                    json!({"path": self.path, "attributes": attrs, "fields": fields}),
                )
            }),
        );
        Ok(())
    }
}
