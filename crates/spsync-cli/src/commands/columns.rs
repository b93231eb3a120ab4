//! `spsync columns` - list, create and delete library columns

use anyhow::{Context, Result};
use clap::Subcommand;
use serde_json::{json, Value};

use super::{open_store, report, GlobalArgs};

#[derive(Debug, Subcommand)]
pub enum ColumnsCommand {
    /// Show the library's columns
    List {
        /// Refetch instead of using cached definitions
        #[arg(long)]
        reload: bool,
    },
    /// Create a column, or update it if it exists
    Create {
        /// Column name
        name: String,
        /// JSON merged over the default definition,
        /// e.g. '{"text": {"maxLength": 255}}'
        #[arg(long, default_value = "{}")]
        details: String,
    },
    /// Delete a column if present
    Delete {
        /// Column name
        name: String,
    },
}

impl ColumnsCommand {
    pub async fn execute(&self, global: &GlobalArgs) -> Result<()> {
        match self {
            ColumnsCommand::List { reload } => Self::execute_list(*reload, global).await,
            ColumnsCommand::Create { name, details } => {
                Self::execute_create(name, details, global).await
            }
            ColumnsCommand::Delete { name } => Self::execute_delete(name, global).await,
        }
    }

    async fn execute_list(reload: bool, global: &GlobalArgs) -> Result<()> {
        let mut store = open_store(global).await?;
        let formatter = global.formatter();

        let Some(columns) = store.list_columns(reload).await? else {
            formatter.skipped("columns list");
            return Ok(());
        };

        formatter.print_json(&serde_json::to_value(&columns)?);
        for column in columns.values() {
            let label = column.display_name.as_deref().unwrap_or(&column.name);
            formatter.info(&format!("{:<32} {:<32} {}", column.name, label, column.id));
        }
        Ok(())
    }

    async fn execute_create(name: &str, details: &str, global: &GlobalArgs) -> Result<()> {
        let details: Value =
            serde_json::from_str(details).context("--details must be a JSON object")?;
        if !details.is_object() {
            anyhow::bail!("--details must be a JSON object");
        }

        let mut store = open_store(global).await?;
        let created = store.create_column(name, &details).await?;
        report(
            global,
            &format!("column {name}"),
            created.map(|column| {
                (
                    format!("Column {name} saved ({})", column.id),
                    json!({"name": name, "id": column.id}),
                )
            }),
        );
        Ok(())
    }

    async fn execute_delete(name: &str, global: &GlobalArgs) -> Result<()> {
        let mut store = open_store(global).await?;
        let deleted = store.delete_column(name).await?;
        report(
            global,
            &format!("column {name}"),
            deleted.map(|removed| {
                let message = if removed {
                    format!("Column {name} removed")
                } else {
                    format!("Column {name} not present")
                };
                (message, json!({"name": name, "removed": removed}))
            }),
        );
        Ok(())
    }
}
